mod config;
mod period;
mod query;
mod series;

pub use config::{Config, RawTab, RawTickerConfig, TickerConfig};
pub use period::Period;
pub use query::{DataType, OutputSize, TickerQuery};
pub use series::{ChartSeries, RenderJob, SeriesPoint, ValueRange};
