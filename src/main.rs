mod config;
mod error;
mod github;
mod report;
mod stalk;
#[cfg(test)]
mod test_utils;

use chrono::{DateTime, Utc};
use clap::Parser;
use config::{Config, FailurePolicy, Overrides};
use github::client::GitHubClient;
use stalk::orchestrator::{ForkStalker, StalkOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "forkstalk",
    version,
    about = "List fork branches with unmerged work that has no open pull request"
)]
struct Cli {
    #[arg(help = "Upstream repository as owner/name or a GitHub URL")]
    repo: String,

    #[arg(long, short, help = "Lookback window in days [default: 30]")]
    days: Option<i64>,

    #[arg(long, help = "Window start as RFC 3339, overrides --days")]
    since: Option<DateTime<Utc>>,

    #[arg(long, short = 'n', help = "Most recently pushed forks to inspect [default: 20]")]
    count: Option<usize>,

    #[arg(long, help = "Forks scanned at once [default: unbounded]")]
    fork_concurrency: Option<usize>,

    #[arg(long, help = "Branch tips fetched at once per fork [default: unbounded]")]
    branch_concurrency: Option<usize>,

    #[arg(long, help = "Log and skip forks or branches that fail to load")]
    skip_failed: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            since_days: self.days,
            fork_count: self.count,
            fork_concurrency: self.fork_concurrency,
            branch_concurrency: self.branch_concurrency,
            on_error: self.skip_failed.then_some(FailurePolicy::Skip),
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forkstalk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> error::Result<()> {
    let (owner, name) = config::parse_repo(&cli.repo)?;
    let config = Config::load(&cli.overrides())?;
    tracing::debug!(?config, "Configuration loaded");

    let since = match cli.since {
        Some(since) => since,
        None => config.window_start(Utc::now())?,
    };
    let client = GitHubClient::new(&config)?;
    let stalker = ForkStalker::new(StalkOptions::from_config(&config, since));

    let report = stalker.get_forks(&client, &owner, &name).await?;
    tracing::info!(upstream = %report.upstream, forks = report.len(), "Report ready");

    let stdout = std::io::stdout();
    report::write_report(&report, &mut stdout.lock())?;
    Ok(())
}
