use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use jobfinder_adapters::load_fixture_jobs;
use jobfinder_core::Preferences;
use jobfinder_pipeline::{select, Pipeline, PipelineConfig, Presenter, RunOptions, StageCounts};
use jobfinder_storage::{SeenJobStore, SeenSet};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod presenter;

use presenter::ConsolePresenter;

#[derive(Debug, Parser)]
#[command(name = "jobfinder")]
#[command(about = "Aggregates engineering management jobs from job boards")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch from enabled sources, show new matches and remember them.
    Run {
        #[arg(long)]
        limit: Option<usize>,
        /// Show results without updating the seen-job store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the filters over a canonical JSON fixture. Never touches the store.
    Filter {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        /// Evaluate ages against this instant instead of the current time.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Report the seen-job store location and size.
    Seen,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobfinder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command.unwrap_or(Commands::Run {
        limit: None,
        dry_run: false,
    }) {
        Commands::Run { limit, dry_run } => {
            println!("Job Finder");
            println!("==========\n");
            let pipeline = Pipeline::from_config(&config)?;
            let summary = pipeline
                .run_once(&ConsolePresenter::new(limit), RunOptions { dry_run })
                .await?;
            report_empty(&summary.counts);
            tracing::info!(
                run_id = %summary.run_id,
                sources = summary.sources_attempted,
                failed = summary.sources_failed,
                displayed = summary.displayed,
                seen_total = summary.seen_total,
                persisted = summary.persisted,
                "run complete"
            );
        }
        Commands::Filter {
            fixture,
            limit,
            now,
        } => {
            let preferences = Preferences::load(&config.preferences_path).with_context(|| {
                format!("loading preferences from {}", config.preferences_path.display())
            })?;
            let jobs = load_fixture_jobs(&fixture)?;
            let selection = select(
                jobs,
                &preferences,
                &SeenSet::new(),
                now.unwrap_or_else(Utc::now),
            );
            ConsolePresenter::new(limit).present(&selection.jobs)?;
            report_empty(&selection.counts);
        }
        Commands::Seen => {
            let store = SeenJobStore::new(config.seen_store_path.clone());
            let seen = store.load().await;
            println!("{}: {} seen job ids", store.path().display(), seen.len());
        }
    }

    Ok(())
}

fn report_empty(counts: &StageCounts) {
    if counts.after_freshness == 0 {
        println!("No jobs matched your criteria");
    } else if counts.new_jobs == 0 {
        println!("No new jobs since last run");
    }
}
