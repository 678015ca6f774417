use crate::constants::{exit_code, PLACEHOLDER_API_KEY};
use crate::error::Error;
use crate::models::Config;
use crate::services::{
    AlphaVantageClient, ArtifactLayout, EChartsRenderer, JobOrchestrator, NumericPolicy,
    OrchestratorOptions, RunReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Resolved settings for one generate run
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub config_path: PathBuf,
    pub api_key: String,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub base_url: String,
    pub max_in_flight: usize,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub numeric_policy: NumericPolicy,
}

/// Fetch, render and index everything in the config file. Returns the
/// process exit code.
pub fn run(args: GenerateArgs) -> i32 {
    if args.api_key == PLACEHOLDER_API_KEY {
        warn!("Using the placeholder API key; pass --apikey or set ALPHAVANTAGE_API_KEY");
    }

    let config = match Config::load(&args.config_path, &args.api_key) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to parse the config: {}", e);
            return exit_code::SETUP_FAILURE;
        }
    };

    println!(
        "📋 Loaded {} tickers ({} charts) from {}",
        config.tickers.len(),
        config.job_count(),
        args.config_path.display()
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to create runtime: {}", e);
            return exit_code::SETUP_FAILURE;
        }
    };

    match runtime.block_on(execute(&config, &args)) {
        Ok(report) => {
            print_summary(&report);
            if report.has_failures() {
                exit_code::JOB_FAILURES
            } else {
                exit_code::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("❌ Run aborted: {}", e);
            exit_code::SETUP_FAILURE
        }
    }
}

async fn execute(config: &Config, args: &GenerateArgs) -> Result<RunReport, Error> {
    let client = AlphaVantageClient::with_base_url(&args.base_url, args.fetch_timeout)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight jobs");
            let _ = shutdown_tx.send(true);
        }
    });

    let options = OrchestratorOptions {
        max_in_flight: args.max_in_flight,
        fetch_timeout: args.fetch_timeout,
        render_timeout: args.render_timeout,
        numeric_policy: args.numeric_policy,
    };

    JobOrchestrator::new(
        Arc::new(client),
        Arc::new(EChartsRenderer::new()),
        ArtifactLayout::new(&args.data_dir, &args.out_dir),
        options,
    )
    .with_shutdown(shutdown_rx)
    .run(config)
    .await
}

fn print_summary(report: &RunReport) {
    println!(
        "\n✨ {} charts: ✅{} ❌{} in {:.2}s",
        report.total_jobs,
        report.rendered.len(),
        report.failures.len(),
        report.elapsed.as_secs_f64()
    );
    for failure in &report.failures {
        eprintln!("   ❌ {}", failure);
    }
    println!("📄 Index: {}", report.index_path.display());
}
