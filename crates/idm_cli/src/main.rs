use anyhow::Context;
use clap::Parser;
use idm_scrapers::cli::{handle_command, ScraperArgs};
use idm_scrapers::logging::init_logging;
use idm_scrapers::{ProbeFailurePolicy, ScraperConfig, ScraperManager};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// A duration such as `30`, `45s`, `2m` or `1m30s`. Bare numbers are seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let duration = match s.parse::<u64>() {
            Ok(seconds) => Duration::from_secs(seconds),
            Err(_) => humantime::parse_duration(s)
                .map_err(|e| format!("Invalid duration '{}': {}", s, e))?,
        };
        if duration.is_zero() {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(duration))
    }
}

#[derive(Parser, Debug)]
#[command(name = "idm", author, version, about = "Scrape news pages and PDF reports into article records", long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "IDM_STORAGE", default_value = "sqlite", global = true)]
    storage: String,
    /// SQLite database file
    #[arg(long, env = "IDM_DATABASE", default_value = "articles.db", global = true)]
    database: PathBuf,
    /// Directory for temporary PDF downloads
    #[arg(long, env = "IDM_SCRATCH_DIR", global = true)]
    scratch_dir: Option<PathBuf>,
    /// Request timeout (e.g. 30, 45s, 2m)
    #[arg(long, env = "IDM_TIMEOUT", default_value = "30s", global = true)]
    timeout: HumanDuration,
    /// User-Agent header sent with every request
    #[arg(long, env = "IDM_USER_AGENT", global = true)]
    user_agent: Option<String>,
    /// Fail instead of falling back to HTML when a URL cannot be probed
    #[arg(long, env = "IDM_FAIL_CLOSED", global = true)]
    fail_closed: bool,
    /// More output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(flatten)]
    args: ScraperArgs,
}

impl Cli {
    fn scraper_config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::default().with_timeout(self.timeout.0);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        if let Some(dir) = &self.scratch_dir {
            config = config.with_scratch_dir(dir.clone());
        }
        if self.fail_closed {
            config = config.with_probe_failures(ProbeFailurePolicy::FailClosed);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage = idm_storage::create_store(&cli.storage, Some(cli.database.as_path()))
        .await
        .with_context(|| format!("Failed to open {} storage", cli.storage))?;
    info!(storage = %cli.storage, "Storage backend initialized");

    let config = cli.scraper_config();
    let manager = ScraperManager::new(storage, config).context("Failed to build scraper")?;

    handle_command(cli.args, &manager).await?;
    Ok(())
}
