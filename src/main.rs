mod config;
mod fixture;
mod pr;
mod summary;

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use pr::GitHost;
use summary::Summarizer;

/// PR Fixtures: CLI tool that exports merged GitHub Pull Requests as a
/// branch → file → hunk JSON fixture.
#[derive(Parser, Debug)]
#[command(name = "pr-fixtures", version, about)]
struct Cli {
    /// PR numbers to export. Falls back to --recent, then the config file,
    /// then a built-in list.
    pr_numbers: Vec<u64>,

    /// Export the N most recently merged PRs instead of a fixed list
    #[arg(long, value_name = "N")]
    recent: Option<usize>,

    /// Repository to read from (e.g., org/repo); defaults to the current one
    #[arg(long)]
    repo: Option<String>,

    /// Fixture output path (default: fixtures/branches.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name each hunk with a model-generated summary instead of its diff text
    #[arg(long)]
    summarize: bool,

    /// Copy each PR body into the branch description
    #[arg(long)]
    description: bool,

    /// Config file (default: .pr-fixtures.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a built-in mock PR for demo purposes (no gh needed)
    #[arg(long)]
    r#mock: bool,
}

/// Counts reported once the fixture is on disk.
#[derive(Debug, Clone, PartialEq)]
struct RunSummary {
    branches: usize,
    hunks: usize,
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _main_span = info_span!("pr_fixtures", mock = cli.r#mock, summarize = cli.summarize).entered();

    info!("loading configuration");
    let mut config = config::Config::load(cli.config.as_deref())?;

    let host: Box<dyn GitHost> = if cli.r#mock {
        info!("using mock PR data for demo");
        if config.pr_numbers.is_empty() {
            config.pr_numbers = vec![pr::mock::SAMPLE_PR];
        }
        Box::new(pr::mock::MockGitHost::sample())
    } else {
        Box::new(pr::GhCli::new(cli.repo.clone().or_else(|| config.repo.clone())))
    };

    let summary = run(&cli, &config, host.as_ref()).await?;
    println!(
        "{} {} branches ({} hunks) to {}",
        "Wrote".green().bold(),
        summary.branches,
        summary.hunks,
        summary.output.display()
    );

    Ok(())
}

/// Preflight checks, then the fetch → parse → summarize → write pipeline.
/// Both checks complete before the host is asked for any PR data.
async fn run(
    cli: &Cli,
    config: &config::Config,
    host: &dyn GitHost,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let summarizer: Box<dyn Summarizer> = if cli.summarize {
        Box::new(summary::OpenAiSummarizer::from_config(config)?)
    } else {
        Box::new(summary::DiffTextSummarizer)
    };
    host.ensure_available().await?;

    let numbers =
        pr::select_pr_numbers(host, &cli.pr_numbers, cli.recent, &config.pr_numbers).await?;
    debug!(?numbers, "selected pull requests");

    let options = fixture::Options {
        include_description: cli.description,
    };
    let branches = fixture::generate(host, summarizer.as_ref(), &numbers, options).await?;

    let output = cli.output.clone().unwrap_or_else(|| config.output_path());
    fixture::write(&branches, &output)?;

    let hunks: usize = branches
        .iter()
        .flat_map(|b| &b.files)
        .map(|f| f.hunks.len())
        .sum();
    info!(branches = branches.len(), hunks, "done");

    Ok(RunSummary {
        branches: branches.len(),
        hunks,
        output,
    })
}
