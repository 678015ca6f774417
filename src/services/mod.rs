pub mod alphavantage;
pub mod artifacts;
pub mod chart;
pub mod index_page;
pub mod orchestrator;
pub mod series_transformer;

pub use alphavantage::{AlphaVantageClient, CsvSource};
pub use artifacts::{artifact_file_name, ArtifactLayout};
pub use chart::{ChartRenderer, ChartSpec, EChartsRenderer};
pub use index_page::{render_index, IndexLink};
pub use orchestrator::{JobFailure, JobOrchestrator, JobStage, OrchestratorOptions, RenderedPage, RunReport};
pub use series_transformer::{transform, NumericPolicy};
