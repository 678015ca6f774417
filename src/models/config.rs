use crate::constants::MIN_POINTS_EXCLUSIVE;
use crate::error::{Error, Result};
use crate::models::{OutputSize, Period, TickerQuery};
use crate::utils::sanitize_file_stem;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One `{period, points}` entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct RawTab {
    pub period: String,
    pub points: i64,
}

/// One friendly-name entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct RawTickerConfig {
    pub ticker: String,
    #[serde(default)]
    pub tabs: Vec<RawTab>,
}

/// Validated tab: the upstream query plus what the chart needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct TickerConfig {
    pub query: TickerQuery,
    pub period: Period,
    pub points: usize,
}

/// Parsed configuration: friendly name -> one entry per tab, in tab order.
///
/// Names are kept sorted so runs are reproducible.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tickers: BTreeMap<String, Vec<TickerConfig>>,
}

impl Config {
    /// Read and parse the config file at `path`
    pub fn load<P: AsRef<Path>>(path: P, api_key: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content, api_key)
    }

    /// Parse raw JSON config bytes. The credential is checked first so an
    /// unset key fails before anything else is looked at.
    pub fn parse(input: &[u8], api_key: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("api key is not set".to_string()));
        }

        let raw: BTreeMap<String, RawTickerConfig> = serde_json::from_slice(input)
            .map_err(|e| Error::Config(format!("invalid config JSON: {}", e)))?;

        // Two names sharing a stem would share every data/ and out/ file
        let mut stems: BTreeMap<String, String> = BTreeMap::new();
        let mut tickers = BTreeMap::new();
        for (name, raw_ticker) in raw {
            let stem = sanitize_file_stem(&name);
            if let Some(other) = stems.get(&stem) {
                return Err(Error::Config(format!(
                    "failed to parse '{}': artifact name '{}' collides with '{}'",
                    name, stem, other
                )));
            }
            stems.insert(stem, name.clone());

            let configs = parse_raw_ticker_config(&raw_ticker, api_key)
                .map_err(|e| Error::Config(format!("failed to parse '{}': {}", name, inner_message(&e))))?;
            tickers.insert(name, configs);
        }

        Ok(Self { tickers })
    }

    /// Total number of (name, tab) jobs
    pub fn job_count(&self) -> usize {
        self.tickers.values().map(Vec::len).sum()
    }

    /// Iterate `(name, tab index, tab)` in name then tab order
    pub fn jobs(&self) -> impl Iterator<Item = (&str, usize, &TickerConfig)> {
        self.tickers.iter().flat_map(|(name, tabs)| {
            tabs.iter()
                .enumerate()
                .map(move |(index, tab)| (name.as_str(), index, tab))
        })
    }
}

fn parse_raw_ticker_config(raw: &RawTickerConfig, api_key: &str) -> Result<Vec<TickerConfig>> {
    if raw.tabs.is_empty() {
        return Err(Error::Config("zero tabs in config".to_string()));
    }

    let mut result = Vec::with_capacity(raw.tabs.len());
    for (i, tab) in raw.tabs.iter().enumerate() {
        let period: Period = tab.period.parse().map_err(|_| {
            Error::Config(format!(
                "invalid period '{}' in config (index {})",
                tab.period, i
            ))
        })?;

        if tab.points <= MIN_POINTS_EXCLUSIVE {
            return Err(Error::Config(format!(
                "invalid num of points '{}' in config (index {}): must be greater than {}",
                tab.points, i, MIN_POINTS_EXCLUSIVE
            )));
        }
        let points = usize::try_from(tab.points).map_err(|_| {
            Error::Config(format!(
                "invalid num of points '{}' in config (index {})",
                tab.points, i
            ))
        })?;

        let query = TickerQuery::new(
            &raw.ticker,
            period,
            OutputSize::for_request(period, points),
            "csv",
            api_key,
        )?;

        result.push(TickerConfig {
            query,
            period,
            points,
        });
    }

    Ok(result)
}

/// Strip the `Configuration error:` prefix so wrapped messages read once
fn inner_message(err: &Error) -> String {
    match err {
        Error::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Config> {
        Config::parse(json.as_bytes(), "demo")
    }

    #[test]
    fn test_parse_single_ticker() {
        let config = parse(r#"{"Acme":{"ticker":"ACME","tabs":[{"period":"daily","points":5}]}}"#).unwrap();
        assert_eq!(config.job_count(), 1);

        let tab = &config.tickers["Acme"][0];
        assert_eq!(tab.period, Period::Daily);
        assert_eq!(tab.points, 5);
        assert_eq!(tab.query.symbol(), "ACME");
        assert_eq!(tab.query.output_size(), Some(OutputSize::Compact));
    }

    #[test]
    fn test_output_size_per_tab() {
        let config = parse(
            r#"{"Big Co": {"ticker": "BIG", "tabs": [
                {"period": "Daily", "points": 100},
                {"period": "daily", "points": 101},
                {"period": "WEEKLY", "points": 500},
                {"period": "monthly", "points": 12}
            ]}}"#,
        )
        .unwrap();

        let tabs = &config.tickers["Big Co"];
        assert_eq!(tabs.len(), 4);
        assert_eq!(tabs[0].query.output_size(), Some(OutputSize::Compact));
        assert_eq!(tabs[1].query.output_size(), Some(OutputSize::Full));
        assert_eq!(tabs[2].query.output_size(), None);
        assert_eq!(tabs[2].period, Period::Weekly);
        assert_eq!(tabs[3].query.output_size(), None);
    }

    #[test]
    fn test_points_threshold() {
        let rejected = parse(r#"{"A":{"ticker":"A","tabs":[{"period":"daily","points":3}]}}"#).unwrap_err();
        let msg = rejected.to_string();
        assert!(msg.contains("'A'"), "{}", msg);
        assert!(msg.contains("index 0"), "{}", msg);

        assert!(parse(r#"{"A":{"ticker":"A","tabs":[{"period":"daily","points":4}]}}"#).is_ok());
        assert!(parse(r#"{"A":{"ticker":"A","tabs":[{"period":"daily","points":-10}]}}"#).is_err());
    }

    #[test]
    fn test_invalid_period_names_tab_index() {
        let err = parse(
            r#"{"Acme":{"ticker":"ACME","tabs":[
                {"period":"daily","points":5},
                {"period":"yearly","points":5}
            ]}}"#,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, Error::Config(_)));
        assert!(msg.contains("failed to parse 'Acme'"), "{}", msg);
        assert!(msg.contains("'yearly'"), "{}", msg);
        assert!(msg.contains("index 1"), "{}", msg);
    }

    #[test]
    fn test_zero_tabs_rejected() {
        let err = parse(r#"{"Acme":{"ticker":"ACME","tabs":[]}}"#).unwrap_err();
        assert!(err.to_string().contains("zero tabs"));

        let err = parse(r#"{"Acme":{"ticker":"ACME"}}"#).unwrap_err();
        assert!(err.to_string().contains("zero tabs"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::parse(br#"{"A":{"ticker":"A","tabs":[{"period":"daily","points":5}]}}"#, "").unwrap_err();
        assert!(err.to_string().contains("api key is not set"));

        // Checked before the JSON is even looked at
        let err = Config::parse(b"not json", "").unwrap_err();
        assert!(err.to_string().contains("api key is not set"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse("{not json"), Err(Error::Config(_))));
        assert!(matches!(
            parse(r#"{"A":{"ticker":"A","tabs":[{"period":"daily","points":"five"}]}}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_jobs_are_ordered_by_name_then_tab() {
        let config = parse(
            r#"{
                "Zeta": {"ticker": "Z", "tabs": [{"period": "daily", "points": 5}]},
                "Alpha": {"ticker": "A", "tabs": [
                    {"period": "weekly", "points": 5},
                    {"period": "monthly", "points": 6}
                ]}
            }"#,
        )
        .unwrap();

        let jobs: Vec<(String, usize, Period)> = config
            .jobs()
            .map(|(name, index, tab)| (name.to_string(), index, tab.period))
            .collect();

        assert_eq!(
            jobs,
            vec![
                ("Alpha".to_string(), 0, Period::Weekly),
                ("Alpha".to_string(), 1, Period::Monthly),
                ("Zeta".to_string(), 0, Period::Daily),
            ]
        );
    }

    #[test]
    fn test_colliding_artifact_names_rejected() {
        let err = parse(
            r#"{
                "A.B": {"ticker": "AAA", "tabs": [{"period": "daily", "points": 4}]},
                "A B": {"ticker": "ZZZ", "tabs": [{"period": "daily", "points": 4}]}
            }"#,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, Error::Config(_)));
        // "A B" sorts before "A.B", so it claims the stem first
        assert!(msg.contains("failed to parse 'A.B'"), "{}", msg);
        assert!(msg.contains("artifact name 'A-B' collides with 'A B'"), "{}", msg);

        assert!(parse(
            r#"{
                "A.B": {"ticker": "AAA", "tabs": [{"period": "daily", "points": 4}]},
                "A-C": {"ticker": "ZZZ", "tabs": [{"period": "daily", "points": 4}]}
            }"#,
        )
        .is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/definitely/not/here/config.json", "demo").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("failed to read config file"));
    }
}
