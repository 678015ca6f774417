use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands;
use crate::commands::generate::GenerateArgs;
use crate::constants::{
    ALPHAVANTAGE_BASE_URL, DEFAULT_CONFIG_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_RENDER_TIMEOUT_SECS, PLACEHOLDER_API_KEY,
};
use crate::services::NumericPolicy;
use crate::utils::{get_data_dir, get_out_dir};

#[derive(Parser, Debug)]
#[command(name = "ticker-tape")]
#[command(about = "Fetch Alpha Vantage price history and render static HTML charts", long_about = None)]
pub struct Cli {
    /// Path to json configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Private AlphaVantage API key
    #[arg(
        short = 'k',
        long = "apikey",
        env = "ALPHAVANTAGE_API_KEY",
        hide_env_values = true,
        default_value = PLACEHOLDER_API_KEY
    )]
    pub apikey: String,

    /// Directory for raw CSV responses [default: $TICKER_TAPE_DATA_DIR or data]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for rendered pages [default: $TICKER_TAPE_OUT_DIR or out]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Upstream query endpoint
    #[arg(long, default_value = ALPHAVANTAGE_BASE_URL)]
    pub base_url: String,

    /// Maximum number of jobs in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_in_flight: u64,

    /// Timeout for each upstream request, in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Timeout for each chart render, in seconds
    #[arg(long, default_value_t = DEFAULT_RENDER_TIMEOUT_SECS)]
    pub render_timeout_secs: u64,

    /// Treat unparseable prices as 0.0 instead of failing the chart
    #[arg(long)]
    pub lenient_numbers: bool,
}

impl Cli {
    pub fn into_generate_args(self) -> GenerateArgs {
        GenerateArgs {
            config_path: self.config,
            api_key: self.apikey,
            data_dir: self.data_dir.unwrap_or_else(get_data_dir),
            out_dir: self.out_dir.unwrap_or_else(get_out_dir),
            base_url: self.base_url,
            max_in_flight: usize::try_from(self.max_in_flight).unwrap_or(usize::MAX),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            render_timeout: Duration::from_secs(self.render_timeout_secs),
            numeric_policy: if self.lenient_numbers {
                NumericPolicy::Lenient
            } else {
                NumericPolicy::Strict
            },
        }
    }
}

/// Rewrite single-dash long flags (`-config x`, `-apikey=k`) to the
/// double-dash form clap expects. Short flags and values pass through.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let command = Cli::command();
    let longs: Vec<&str> = command.get_arguments().filter_map(|a| a.get_long()).collect();

    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let rewritten = if i == 0 {
                None
            } else {
                arg.to_str().and_then(|s| promote_long_flag(s, &longs))
            };
            rewritten.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

fn promote_long_flag(arg: &str, longs: &[&str]) -> Option<String> {
    if arg.starts_with("--") {
        return None;
    }
    let flag = arg.strip_prefix('-')?.split('=').next()?;
    (flag.len() > 1 && longs.contains(&flag)).then(|| format!("-{}", arg))
}

pub fn run() -> i32 {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    commands::generate::run(cli.into_generate_args())
}
