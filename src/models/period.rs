use std::fmt;
use std::str::FromStr;

/// Aggregation period of a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// One row per trading day
    Daily,
    /// One row per week
    Weekly,
    /// One row per month
    Monthly,
}

impl Period {
    /// Alpha Vantage `function` parameter for this period
    pub fn to_function(&self) -> &'static str {
        match self {
            Period::Daily => "TIME_SERIES_DAILY",
            Period::Weekly => "TIME_SERIES_WEEKLY",
            Period::Monthly => "TIME_SERIES_MONTHLY",
        }
    }

    /// Title-cased label used in chart titles and index links
    pub fn label(&self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
        }
    }

    /// Whether the upstream API honours `outputsize` for this period
    pub fn supports_output_size(&self) -> bool {
        matches!(self, Period::Daily)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            _ => Err(format!(
                "Invalid period: '{}'. Valid options: daily, weekly, monthly",
                s
            )),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
