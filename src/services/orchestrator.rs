//! Fetch -> render -> index pipeline
//!
//! Every (name, tab) pair is an independent job. All fetches finish before any
//! render starts, since renders read what fetches wrote. A failing job is
//! recorded in the [`RunReport`] and only its own downstream steps are skipped.

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_IN_FLIGHT, DEFAULT_RENDER_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::models::{Config, Period, RenderJob, TickerQuery};
use crate::services::alphavantage::CsvSource;
use crate::services::artifacts::{artifact_file_name, read_artifact, write_artifact, ArtifactLayout};
use crate::services::chart::{ChartRenderer, ChartSpec};
use crate::services::index_page::{render_index, IndexLink};
use crate::services::series_transformer::{transform, NumericPolicy};
use chrono::Utc;
use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

/// Tuning knobs for a run
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Maximum jobs running at once within a phase
    pub max_in_flight: usize,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub numeric_policy: NumericPolicy,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            numeric_policy: NumericPolicy::Strict,
        }
    }
}

/// Which half of a job failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Fetch,
    Render,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Fetch => write!(f, "fetch"),
            JobStage::Render => write!(f, "render"),
        }
    }
}

/// One (name, tab) unit of work
#[derive(Debug, Clone)]
struct Job {
    name: String,
    index: usize,
    query: TickerQuery,
    period: Period,
    points: usize,
}

impl Job {
    fn ticker(&self) -> &str {
        self.query.symbol()
    }
}

#[derive(Debug)]
pub struct JobFailure {
    pub name: String,
    pub index: usize,
    pub ticker: String,
    pub period: Period,
    pub stage: JobStage,
    pub error: Error,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) tab {} [{}] {} failed: {}",
            self.name, self.ticker, self.index, self.period, self.stage, self.error
        )
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub name: String,
    pub index: usize,
    pub period: Period,
    pub path: PathBuf,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunReport {
    pub total_jobs: usize,
    pub fetched: usize,
    pub rendered: Vec<RenderedPage>,
    pub failures: Vec<JobFailure>,
    pub index_path: PathBuf,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct JobOrchestrator {
    source: Arc<dyn CsvSource>,
    renderer: Arc<dyn ChartRenderer>,
    layout: ArtifactLayout,
    options: OrchestratorOptions,
    shutdown: watch::Receiver<bool>,
}

impl JobOrchestrator {
    pub fn new(
        source: Arc<dyn CsvSource>,
        renderer: Arc<dyn ChartRenderer>,
        layout: ArtifactLayout,
        options: OrchestratorOptions,
    ) -> Self {
        // Sender dropped straight away: a run without a shutdown signal is never cancelled
        let (_tx, shutdown) = watch::channel(false);
        Self {
            source,
            renderer,
            layout,
            options,
            shutdown,
        }
    }

    /// Cancel in-flight and pending jobs once `shutdown` turns true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run every job in `config`. Only directory creation and the index write
    /// can fail the run as a whole; job failures land in the report.
    pub async fn run(&self, config: &Config) -> Result<RunReport> {
        let start = Instant::now();
        let jobs: Vec<Job> = config
            .jobs()
            .map(|(name, index, tab)| Job {
                name: name.to_string(),
                index,
                query: tab.query.clone(),
                period: tab.period,
                points: tab.points,
            })
            .collect();
        let total_jobs = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut failures = Vec::new();

        info!(
            jobs = total_jobs,
            max_in_flight = self.options.max_in_flight.max(1),
            "Starting run"
        );

        self.layout.ensure_data_dir().await?;
        let fetched = self.fetch_phase(jobs, &semaphore, &mut failures).await;
        let fetched_count = fetched.len();

        self.layout.ensure_out_dir().await?;
        let rendered = self.render_phase(fetched, &semaphore, &mut failures).await;

        let index_path = self.write_index(&rendered).await?;

        let report = RunReport {
            total_jobs,
            fetched: fetched_count,
            rendered,
            failures,
            index_path,
            elapsed: start.elapsed(),
        };

        info!(
            jobs = report.total_jobs,
            fetched = report.fetched,
            rendered = report.rendered.len(),
            failed = report.failures.len(),
            duration_s = report.elapsed.as_secs_f64(),
            "Run finished"
        );

        Ok(report)
    }

    /// Fetch and persist every job; returns the jobs whose CSV is on disk
    async fn fetch_phase(
        &self,
        jobs: Vec<Job>,
        semaphore: &Arc<Semaphore>,
        failures: &mut Vec<JobFailure>,
    ) -> Vec<Job> {
        let tasks: Vec<_> = jobs
            .iter()
            .map(|job| {
                let source = Arc::clone(&self.source);
                let semaphore = Arc::clone(semaphore);
                let mut shutdown = self.shutdown.clone();
                let limit = self.options.fetch_timeout;
                let query = job.query.clone();
                let path = self.layout.csv_path(&job.name, job.index);

                tokio::spawn(async move {
                    guarded(&semaphore, limit, &mut shutdown, async move {
                        let body = source.fetch_csv(&query).await?;
                        write_artifact(&path, &body).await?;
                        Ok::<_, Error>(body.len())
                    })
                    .await
                })
            })
            .collect();

        let results = join_all(tasks).await;

        let mut fetched = Vec::with_capacity(jobs.len());
        for (job, joined) in jobs.into_iter().zip(results) {
            match flatten(joined) {
                Ok(bytes) => {
                    info!(name = %job.name, tab = job.index, ticker = job.ticker(), bytes, "Fetched");
                    fetched.push(job);
                }
                Err(e) => failures.push(record_failure(&job, JobStage::Fetch, e)),
            }
        }
        fetched
    }

    /// Transform and render every fetched job
    async fn render_phase(
        &self,
        jobs: Vec<Job>,
        semaphore: &Arc<Semaphore>,
        failures: &mut Vec<JobFailure>,
    ) -> Vec<RenderedPage> {
        let tasks: Vec<_> = jobs
            .iter()
            .map(|job| {
                let renderer = Arc::clone(&self.renderer);
                let semaphore = Arc::clone(semaphore);
                let mut shutdown = self.shutdown.clone();
                let limit = self.options.render_timeout;
                let policy = self.options.numeric_policy;
                let src = self.layout.csv_path(&job.name, job.index);
                let dst = self.layout.html_path(&job.name, job.index);
                let job = job.clone();

                tokio::spawn(async move {
                    guarded(&semaphore, limit, &mut shutdown, async move {
                        let raw = read_artifact(&src).await?;
                        let series = transform(&raw, job.points, policy)?;
                        let render_job = RenderJob {
                            name: job.name.clone(),
                            ticker: job.ticker().to_string(),
                            period: job.period,
                            points: job.points,
                            series,
                        };
                        let html = renderer.render(&ChartSpec::from_job(&render_job))?;
                        write_artifact(&dst, html.as_bytes()).await?;
                        Ok::<_, Error>(dst)
                    })
                    .await
                })
            })
            .collect();

        let results = join_all(tasks).await;

        let mut rendered = Vec::with_capacity(jobs.len());
        for (job, joined) in jobs.into_iter().zip(results) {
            match flatten(joined) {
                Ok(path) => {
                    println!("✅ Saved to {}", path.display());
                    rendered.push(RenderedPage {
                        name: job.name,
                        index: job.index,
                        period: job.period,
                        path,
                    });
                }
                Err(e) => failures.push(record_failure(&job, JobStage::Render, e)),
            }
        }
        rendered
    }

    async fn write_index(&self, rendered: &[RenderedPage]) -> Result<PathBuf> {
        let links: Vec<IndexLink> = rendered
            .iter()
            .map(|page| {
                IndexLink::new(
                    &artifact_file_name(&page.name, page.index, "html"),
                    &page.name,
                    page.period.label(),
                )
            })
            .collect();

        let path = self.layout.index_path();
        write_artifact(&path, render_index(&links, Utc::now()).as_bytes()).await?;
        println!("✅ Saved to {}", path.display());
        Ok(path)
    }
}

fn record_failure(job: &Job, stage: JobStage, error: Error) -> JobFailure {
    let failure = JobFailure {
        name: job.name.clone(),
        index: job.index,
        ticker: job.ticker().to_string(),
        period: job.period,
        stage,
        error,
    };
    error!(
        name = %failure.name,
        tab = failure.index,
        ticker = %failure.ticker,
        period = %failure.period,
        stage = %failure.stage,
        error = %failure.error,
        "Job failed"
    );
    failure
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Job task did not complete");
            Err(Error::Cancelled)
        }
    }
}

/// Run `fut` under a semaphore permit and a timeout, giving up early if the
/// shutdown signal fires.
async fn guarded<T, F>(
    semaphore: &Semaphore,
    limit: Duration,
    shutdown: &mut watch::Receiver<bool>,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if *shutdown.borrow() {
        return Err(Error::Cancelled);
    }

    let _permit = tokio::select! {
        permit = semaphore.acquire() => permit.map_err(|_| Error::Cancelled)?,
        _ = cancelled(shutdown) => return Err(Error::Cancelled),
    };

    tokio::select! {
        result = tokio::time::timeout(limit, fut) => {
            result.map_err(|_| Error::Timeout(limit))?
        }
        _ = cancelled(shutdown) => Err(Error::Cancelled),
    }
}

/// Resolves once shutdown is requested; never, if the sender is gone
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
