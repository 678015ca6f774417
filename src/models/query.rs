//! Alpha Vantage request descriptor
//!
//! The upstream API is sensitive to query parameter order, so the query string
//! is assembled by hand in the order `function`, `symbol`, `apikey`,
//! `datatype` instead of through a serializer.

use crate::constants::{ALPHAVANTAGE_BASE_URL, COMPACT_MAX_POINTS};
use crate::error::{Error, Result};
use crate::models::Period;
use std::fmt;
use std::str::FromStr;

/// `outputsize` tier for daily series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 rows
    Compact,
    /// Full history
    Full,
}

impl OutputSize {
    /// Pick the tier for a period and point count. Weekly and monthly series
    /// have no tiers upstream.
    pub fn for_request(period: Period, points: usize) -> Option<Self> {
        if !period.supports_output_size() {
            None
        } else if points <= COMPACT_MAX_POINTS {
            Some(OutputSize::Compact)
        } else {
            Some(OutputSize::Full)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Response format requested from upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Csv,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Csv => "csv",
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(DataType::Csv),
            other => Err(Error::Config(format!(
                "unsupported data type '{}': only csv responses are supported",
                other
            ))),
        }
    }
}

/// Immutable description of one upstream request
#[derive(Clone, PartialEq)]
pub struct TickerQuery {
    symbol: String,
    period: Period,
    output_size: Option<OutputSize>,
    data_type: DataType,
    api_key: String,
}

impl TickerQuery {
    /// Build a query, rejecting any format other than CSV before anything is
    /// sent over the network.
    pub fn new(
        symbol: &str,
        period: Period,
        output_size: Option<OutputSize>,
        data_type: &str,
        api_key: &str,
    ) -> Result<Self> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(Error::Config("ticker symbol is empty".to_string()));
        }
        if api_key.is_empty() {
            return Err(Error::Config("api key is not set".to_string()));
        }

        Ok(Self {
            symbol: symbol.to_string(),
            period,
            output_size,
            data_type: data_type.parse()?,
            api_key: api_key.to_string(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn function(&self) -> &'static str {
        self.period.to_function()
    }

    pub fn output_size(&self) -> Option<OutputSize> {
        self.output_size
    }

    /// Query string in the order the API expects. `outputsize` goes last and
    /// only when a tier applies.
    pub fn query_string(&self) -> String {
        let mut query = format!(
            "function={}&symbol={}&apikey={}&datatype={}",
            self.function(),
            urlencoding::encode(&self.symbol),
            urlencoding::encode(&self.api_key),
            self.data_type.as_str()
        );
        if let Some(size) = self.output_size {
            query.push_str("&outputsize=");
            query.push_str(size.as_str());
        }
        query
    }

    /// Full request URL against `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}?{}", base_url.trim_end_matches(['?', '/']), self.query_string())
    }

    /// Request URL against the public Alpha Vantage endpoint
    pub fn default_url(&self) -> String {
        self.url(ALPHAVANTAGE_BASE_URL)
    }
}

// Keep the credential out of logs
impl fmt::Debug for TickerQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickerQuery")
            .field("symbol", &self.symbol)
            .field("function", &self.function())
            .field("output_size", &self.output_size)
            .field("data_type", &self.data_type)
            .field("api_key", &"***")
            .finish()
    }
}
