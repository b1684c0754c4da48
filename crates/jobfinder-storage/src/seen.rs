//! Set of job ids already surfaced to the user, persisted as a JSON array.
//!
//! The set only ever grows. Nothing is evicted, so the snapshot file grows with
//! every run that shows new jobs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use jobfinder_core::Job;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const DEFAULT_SEEN_STORE_PATH: &str = ".local/seen-jobs.json";

pub type SeenSet = BTreeSet<String>;

#[derive(Debug, Clone)]
pub struct SeenJobStore {
    path: PathBuf,
}

impl SeenJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted snapshot. Missing, unreadable or corrupt state yields an empty set.
    pub async fn load(&self) -> SeenSet {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no seen-job history yet");
                return SeenSet::new();
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "seen-job store unreadable; starting with empty history");
                return SeenSet::new();
            }
        };

        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "seen-job store is corrupt; starting with empty history");
                SeenSet::new()
            }
        }
    }

    /// Replaces the snapshot with `seen` via a temp file and rename in the same directory.
    pub async fn persist(&self, seen: &SeenSet) -> anyhow::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("creating seen-store directory {}", parent.display()))?;

        let body = serde_json::to_vec_pretty(seen).context("serializing seen-job ids")?;
        let temp_path = parent.join(format!(".seen-jobs.{}.tmp", Uuid::new_v4()));

        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| format!("opening temp seen-store file {}", temp_path.display()))?;
        file.write_all(&body)
            .await
            .with_context(|| format!("writing temp seen-store file {}", temp_path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("syncing temp seen-store file {}", temp_path.display()))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err).with_context(|| {
                format!(
                    "atomically replacing seen-store {} -> {}",
                    temp_path.display(),
                    self.path.display()
                )
            });
        }

        tracing::debug!(path = %self.path.display(), ids = seen.len(), "persisted seen-job store");
        Ok(())
    }
}

/// Keeps jobs whose id is not in `seen`, preserving order.
pub fn filter_new<J>(jobs: Vec<J>, seen: &SeenSet) -> Vec<J>
where
    J: AsRef<Job>,
{
    jobs.into_iter()
        .filter(|job| !seen.contains(&job.as_ref().id))
        .collect()
}

/// Union of `seen` and the ids of `jobs`.
pub fn mark_seen<J>(jobs: &[J], seen: &SeenSet) -> SeenSet
where
    J: AsRef<Job>,
{
    let mut out = seen.clone();
    out.extend(jobs.iter().map(|job| job.as_ref().id.clone()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobfinder_core::LocationType;
    use tempfile::tempdir;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            title: format!("Engineering Manager {id}"),
            company: "Acme".into(),
            description: String::new(),
            location: "Remote".into(),
            location_type: LocationType::Remote,
            url: format!("https://jobs.example.com/{id}"),
            posted_date: Some(Utc::now()),
            source: "fixture".into(),
            salary: None,
            tags: Default::default(),
        }
    }

    #[tokio::test]
    async fn missing_store_loads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let store = SeenJobStore::new(dir.path().join("seen-jobs.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_store_loads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("seen-jobs.json");
        std::fs::write(&path, b"{ not json").expect("write");
        let store = SeenJobStore::new(&path);
        assert!(store.load().await.is_empty());

        std::fs::write(&path, br#"{"ids": ["a"]}"#).expect("write");
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn persist_rewrites_full_snapshot() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("seen-jobs.json");
        let store = SeenJobStore::new(&path);

        let first: SeenSet = ["adzuna-1".to_string(), "adzuna-2".to_string()].into();
        store.persist(&first).await.expect("persist first");
        assert_eq!(store.load().await, first);

        let second: SeenSet = ["remoteok-9".to_string()].into();
        store.persist(&second).await.expect("persist second");
        assert_eq!(store.load().await, second);

        let raw: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json array");
        assert_eq!(raw, vec!["remoteok-9".to_string()]);

        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn filter_new_drops_seen_ids_and_keeps_order() {
        let seen: SeenSet = ["b".to_string()].into();
        let out = filter_new(vec![job("c"), job("b"), job("a")], &seen);
        let ids: Vec<_> = out.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn mark_then_filter_yields_nothing() {
        let jobs = vec![job("x"), job("y")];
        let seen = mark_seen(&jobs, &SeenSet::new());
        assert_eq!(seen.len(), 2);
        assert!(filter_new(jobs, &seen).is_empty());
    }

    #[test]
    fn mark_seen_is_a_union() {
        let prior: SeenSet = ["old".to_string()].into();
        let updated = mark_seen(&[job("new"), job("old")], &prior);
        assert_eq!(updated.len(), 2);
        assert!(prior.contains("old") && prior.len() == 1);
    }
}
