//! Job selection pipeline: preference filters, freshness ranking and seen-job dedup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jobfinder_adapters::{
    adapter_for_source, AdapterContext, SearchQuery, SourceAdapter, SourceRegistry,
};
use jobfinder_core::{Job, Preferences};
use jobfinder_storage::{
    filter_new, mark_seen, FetcherConfig, HttpFetcher, SeenJobStore, SeenSet,
    DEFAULT_SEEN_STORE_PATH,
};
use tracing::Instrument;
use uuid::Uuid;

pub mod freshness;
pub mod location_filter;
pub mod role_filter;

pub use freshness::{add_freshness_metadata, filter_by_freshness, freshness_label, AnnotatedJob};

pub const CRATE_NAME: &str = "jobfinder-pipeline";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub preferences_path: PathBuf,
    pub seen_store_path: PathBuf,
    pub workspace_root: PathBuf,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub results_per_page: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preferences_path: PathBuf::from(".local/preferences.yaml"),
            seen_store_path: PathBuf::from(DEFAULT_SEEN_STORE_PATH),
            workspace_root: PathBuf::from("."),
            user_agent: "jobfinder-cli/0.1".to_string(),
            http_timeout_secs: 20,
            results_per_page: 50,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            preferences_path: std::env::var("JOBFINDER_PREFERENCES")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
            seen_store_path: std::env::var("JOBFINDER_SEEN_STORE")
                .map(PathBuf::from)
                .unwrap_or(defaults.seen_store_path),
            workspace_root: std::env::var("JOBFINDER_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            user_agent: std::env::var("JOBFINDER_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs: std::env::var("JOBFINDER_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            results_per_page: std::env::var("JOBFINDER_RESULTS_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.results_per_page),
        }
    }
}

/// How many jobs survived each stage of [`select`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub input: usize,
    pub after_role: usize,
    pub after_location: usize,
    pub after_freshness: usize,
    pub new_jobs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub jobs: Vec<AnnotatedJob>,
    pub counts: StageCounts,
}

/// Runs the fixed stage order over one batch. Pure: no I/O, no truncation.
pub fn select(
    jobs: Vec<Job>,
    prefs: &Preferences,
    seen: &SeenSet,
    now: DateTime<Utc>,
) -> Selection {
    let mut counts = StageCounts {
        input: jobs.len(),
        ..Default::default()
    };

    let jobs = role_filter::apply(jobs, prefs);
    counts.after_role = jobs.len();

    let jobs = location_filter::apply(jobs, prefs);
    counts.after_location = jobs.len();

    let mut jobs = freshness::drop_stale(jobs, &prefs.freshness, now);
    freshness::sort_by_freshness(&mut jobs, &prefs.freshness, now);
    counts.after_freshness = jobs.len();

    let annotated = add_freshness_metadata(jobs, now);
    let jobs = filter_new(annotated, seen);
    counts.new_jobs = jobs.len();

    Selection { jobs, counts }
}

/// Display collaborator. Returns how many leading jobs it actually showed.
pub trait Presenter {
    fn present(&self, jobs: &[AnnotatedJob]) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip persisting the seen set after display.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources_attempted: usize,
    pub sources_failed: usize,
    pub counts: StageCounts,
    pub displayed: usize,
    pub seen_total: usize,
    pub persisted: bool,
}

pub struct Pipeline {
    preferences: Preferences,
    store: SeenJobStore,
    http: HttpFetcher,
    adapters: Vec<Box<dyn SourceAdapter>>,
    results_per_page: u32,
}

impl Pipeline {
    pub fn new(
        config: &PipelineConfig,
        preferences: Preferences,
        adapters: Vec<Box<dyn SourceAdapter>>,
    ) -> Result<Self> {
        let http = HttpFetcher::new(FetcherConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            user_agent: Some(config.user_agent.clone()),
            ..Default::default()
        })?;
        Ok(Self {
            preferences,
            store: SeenJobStore::new(config.seen_store_path.clone()),
            http,
            adapters,
            results_per_page: config.results_per_page,
        })
    }

    /// Loads preferences and the enabled sources named in `sources.yaml`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let preferences = Preferences::load(&config.preferences_path).with_context(|| {
            format!(
                "loading preferences (copy config/preferences.example.yaml to {})",
                config.preferences_path.display()
            )
        })?;
        let registry = SourceRegistry::load(config.workspace_root.join("sources.yaml"))?;

        let mut adapters = Vec::new();
        for source in registry.enabled() {
            let adapter = adapter_for_source(&source.source_id)
                .with_context(|| format!("no adapter registered for {}", source.source_id))?;
            tracing::info!(source = %source.display_name, "source enabled");
            adapters.push(adapter);
        }
        Self::new(config, preferences, adapters)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn store(&self) -> &SeenJobStore {
        &self.store
    }

    /// One complete run. The seen set is persisted only after the presenter returns,
    /// and only the jobs it reports as shown are marked seen.
    pub async fn run_once(
        &self,
        presenter: &dyn Presenter,
        options: RunOptions,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id);
        self.run_inner(run_id, presenter, options)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        presenter: &dyn Presenter,
        options: RunOptions,
    ) -> Result<RunSummary> {
        let started_at = Utc::now();
        let seen = self.store.load().await;
        tracing::info!(seen = seen.len(), "loaded seen-job history");

        let ctx = AdapterContext {
            run_id,
            now: started_at,
        };
        let (jobs, sources_failed) = self.collect(&ctx).await;
        report_contract_violations(&jobs, started_at);

        let selection = select(jobs, &self.preferences, &seen, started_at);
        tracing::info!(
            fetched = selection.counts.input,
            after_role = selection.counts.after_role,
            after_location = selection.counts.after_location,
            after_freshness = selection.counts.after_freshness,
            new_jobs = selection.counts.new_jobs,
            "selection complete"
        );

        let displayed = presenter
            .present(&selection.jobs)?
            .min(selection.jobs.len());

        let updated = mark_seen(&selection.jobs[..displayed], &seen);
        let persisted = if options.dry_run {
            tracing::info!("dry run; seen-job store left untouched");
            false
        } else {
            self.store.persist(&updated).await?;
            true
        };

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            sources_attempted: self.adapters.len(),
            sources_failed,
            counts: selection.counts,
            displayed,
            seen_total: if persisted { updated.len() } else { seen.len() },
            persisted,
        })
    }

    /// Gathers jobs from every adapter. A failing source contributes nothing.
    async fn collect(&self, ctx: &AdapterContext) -> (Vec<Job>, usize) {
        let query = SearchQuery::from_preferences(&self.preferences, self.results_per_page);
        let mut jobs = Vec::new();
        let mut failed = 0usize;
        for adapter in &self.adapters {
            match adapter.fetch(&self.http, ctx, &query).await {
                Ok(batch) => {
                    tracing::info!(source = adapter.source_id(), jobs = batch.len(), "fetched jobs");
                    jobs.extend(batch);
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(source = adapter.source_id(), %err, "source failed; continuing without it");
                }
            }
        }
        (jobs, failed)
    }
}

fn report_contract_violations(jobs: &[Job], now: DateTime<Utc>) {
    for job in jobs {
        for violation in job.contract_violations(now) {
            tracing::warn!(%violation, source = %job.source, "adapter broke the job record contract");
        }
    }
}
