//! Shared constants
//!
//! Upstream endpoint, artifact locations, validation thresholds and the
//! column layout of the Alpha Vantage time series CSV.

/// Alpha Vantage query endpoint
pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Placeholder credential used when `--apikey` is not supplied
pub const PLACEHOLDER_API_KEY: &str = "-----";

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Directory for raw CSV responses
pub const DEFAULT_DATA_DIR: &str = "data";

/// Directory for rendered HTML pages
pub const DEFAULT_OUT_DIR: &str = "out";

/// File name of the generated index page inside the out directory
pub const INDEX_FILE_NAME: &str = "index.html";

/// A tab must request strictly more points than this
pub const MIN_POINTS_EXCLUSIVE: i64 = 3;

/// Largest daily point count served by the `compact` output size
pub const COMPACT_MAX_POINTS: usize = 100;

/// Fraction of the value spread added above and below the chart range
pub const RANGE_BUFFER_RATIO: f64 = 0.10;

/// Default number of jobs allowed in flight at once
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Default timeout for a single upstream request
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a single render job
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 10;

/// Process exit codes
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    /// At least one fetch/render job failed
    pub const JOB_FAILURES: i32 = 1;
    /// Nothing ran: bad config, missing credential, unusable directories
    pub const SETUP_FAILURE: i32 = 2;
}

/// Column indices for the time series CSV (0-indexed)
pub mod csv_column {
    pub const TIMESTAMP: usize = 0;
    pub const HIGH: usize = 2;
    pub const LOW: usize = 3;

    /// Minimum columns a row needs for the midpoint calculation
    pub const REQUIRED: usize = LOW + 1;
}
