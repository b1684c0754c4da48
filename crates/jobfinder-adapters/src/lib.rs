//! Source adapter contracts, the adapter registry and per-source payload mappers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobfinder_core::{Job, Preferences};
use jobfinder_storage::{FetchError, HttpFetcher};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

mod adzuna;
mod remoteok;

pub use adzuna::AdzunaAdapter;
pub use remoteok::RemoteOkAdapter;

pub const CRATE_NAME: &str = "jobfinder-adapters";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterContext {
    pub run_id: Uuid,
    pub now: DateTime<Utc>,
}

/// Upstream search parameters. Adapters without a search API ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub what: String,
    pub what_exclude: Option<String>,
    pub location: Option<String>,
    pub max_days_old: Option<i64>,
    pub country: String,
    pub results_per_page: u32,
    pub page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            what: "engineering manager".to_string(),
            what_exclude: None,
            location: None,
            max_days_old: None,
            country: "us".to_string(),
            results_per_page: 50,
            page: 1,
        }
    }
}

impl SearchQuery {
    pub fn from_preferences(prefs: &Preferences, results_per_page: u32) -> Self {
        let defaults = Self::default();
        Self {
            what: prefs.search.what.clone().unwrap_or(defaults.what),
            what_exclude: prefs.search.what_exclude.clone(),
            location: prefs.location.query.clone(),
            max_days_old: prefs.freshness.max_days_old,
            results_per_page: results_per_page.max(1),
            ..defaults
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{source_name} credentials are not configured (set {hint})")]
    MissingCredentials {
        source_name: &'static str,
        hint: &'static str,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid {source_name} payload: {error}")]
    Payload {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
        query: &SearchQuery,
    ) -> Result<Vec<Job>, AdapterError>;

    /// Maps a raw response body to canonical jobs.
    fn parse(&self, payload: &[u8], now: DateTime<Utc>) -> Result<Vec<Job>, AdapterError>;
}

pub fn adapter_for_source(source_id: &str) -> Option<Box<dyn SourceAdapter>> {
    match source_id {
        "adzuna" => Some(Box::new(AdzunaAdapter::from_env())),
        "remoteok" => Some(Box::new(RemoteOkAdapter)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub display_name: String,
    pub enabled: bool,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceConfig {
                    source_id: "adzuna".to_string(),
                    display_name: "Adzuna".to_string(),
                    enabled: true,
                },
                SourceConfig {
                    source_id: "remoteok".to_string(),
                    display_name: "RemoteOK".to_string(),
                    enabled: false,
                },
            ],
        }
    }
}

impl SourceRegistry {
    /// Reads `sources.yaml`; a missing file yields the built-in registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no source registry; using built-in sources");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

/// Loads a JSON array of canonical jobs, for offline runs and tests.
pub fn load_fixture_jobs(path: impl AsRef<Path>) -> Result<Vec<Job>> {
    read_json_file(path)
}

fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn text_or_none(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Native ids arrive as strings or numbers depending on the source.
fn native_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => text_or_none(Some(s)),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Salary bounds where zero means "not reported".
fn positive_amount(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(err) => {
            tracing::debug!(raw, %err, "unparseable posted date");
            None
        }
    }
}
