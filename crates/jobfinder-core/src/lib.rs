//! Canonical job record and user preference types shared by every jobfinder crate.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod preferences;

pub use preferences::{
    FreshnessPreferences, KeywordPreferences, LocationPreferences, Preferences, SearchPreferences,
    DEFAULT_MAX_DAYS_OLD, DEFAULT_PREFERRED_DAYS_OLD,
};

pub const CRATE_NAME: &str = "jobfinder-core";

/// How far into the future (seconds) a posted date may sit before adapters discard it.
pub const CLOCK_SKEW_TOLERANCE_SECS: i64 = 300;

fn clock_skew_tolerance() -> Duration {
    Duration::seconds(CLOCK_SKEW_TOLERANCE_SECS)
}

/// Where the work happens. Adapters classify every job into exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    Remote,
    Hybrid,
    InPerson,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Remote => "remote",
            LocationType::Hybrid => "hybrid",
            LocationType::InPerson => "in-person",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown location type `{0}` (expected remote, hybrid or in-person)")]
pub struct UnknownLocationType(pub String);

impl FromStr for LocationType {
    type Err = UnknownLocationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(LocationType::Remote),
            "hybrid" => Ok(LocationType::Hybrid),
            "in-person" | "in_person" | "onsite" | "on-site" => Ok(LocationType::InPerson),
            _ => Err(UnknownLocationType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub is_predicted: bool,
}

/// Canonical job record. Adapters produce these and nothing downstream mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub location_type: LocationType,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub posted_date: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobContractError {
    #[error("job from source `{source_name}` has an empty id")]
    MissingId { source_name: String },
    #[error("job `{id}` has an empty title")]
    MissingTitle { id: String },
    #[error("job `{id}` is posted {posted} which is in the future")]
    PostedInFuture { id: String, posted: DateTime<Utc> },
}

impl Job {
    /// Id for sources that expose their own stable identifier.
    pub fn source_native_id(source: &str, native_id: &str) -> String {
        format!("{}-{}", source.trim().to_ascii_lowercase(), native_id.trim())
    }

    /// Deterministic id derived from posting content, for sources without native ids.
    pub fn content_id(title: &str, company: &str, source: &str) -> String {
        let key = format!("{title}-{company}-{source}");
        Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).to_string()
    }

    /// Input-contract breaches. The pipeline reports these but never repairs the record.
    pub fn contract_violations(&self, now: DateTime<Utc>) -> Vec<JobContractError> {
        let mut out = Vec::new();
        if self.id.trim().is_empty() {
            out.push(JobContractError::MissingId {
                source_name: self.source.clone(),
            });
        }
        if self.title.trim().is_empty() {
            out.push(JobContractError::MissingTitle {
                id: self.id.clone(),
            });
        }
        if let Some(posted) = self.posted_date {
            if posted > now + clock_skew_tolerance() {
                out.push(JobContractError::PostedInFuture {
                    id: self.id.clone(),
                    posted,
                });
            }
        }
        out
    }
}

impl AsRef<Job> for Job {
    fn as_ref(&self) -> &Job {
        self
    }
}

/// Collects tags into a set, dropping blanks and duplicates.
pub fn tag_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Drops posted dates further in the future than the clock skew tolerance.
pub fn sanitize_posted_date(
    posted: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match posted {
        Some(date) if date > now + clock_skew_tolerance() => {
            tracing::warn!(%date, %now, "discarding posted date beyond clock skew tolerance");
            None
        }
        other => other,
    }
}

/// Whole days elapsed between `posted` and `now`, truncated toward zero.
///
/// Both the age ceiling and the freshness label count days with this function.
pub fn days_old(now: DateTime<Utc>, posted: DateTime<Utc>) -> i64 {
    (now - posted).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single().unwrap()
    }

    fn sample_job() -> Job {
        Job {
            id: "adzuna-42".into(),
            title: "Engineering Manager".into(),
            company: "Acme".into(),
            description: String::new(),
            location: "Seattle, WA".into(),
            location_type: LocationType::Hybrid,
            url: "https://example.com/42".into(),
            posted_date: Some(now() - Duration::days(3)),
            source: "Adzuna".into(),
            salary: None,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn content_id_is_stable_and_distinguishes_sources() {
        let a = Job::content_id("Engineering Manager", "Acme", "remoteok");
        let b = Job::content_id("Engineering Manager", "Acme", "remoteok");
        let c = Job::content_id("Engineering Manager", "Acme", "adzuna");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn source_native_id_prefixes_source() {
        assert_eq!(Job::source_native_id("Adzuna", "4455"), "adzuna-4455");
    }

    #[test]
    fn location_type_parses_leniently_and_serializes_kebab_case() {
        assert_eq!("In-Person".parse::<LocationType>().unwrap(), LocationType::InPerson);
        assert_eq!("onsite".parse::<LocationType>().unwrap(), LocationType::InPerson);
        assert_eq!(" remote ".parse::<LocationType>().unwrap(), LocationType::Remote);
        assert!("office".parse::<LocationType>().is_err());
        assert_eq!(
            serde_json::to_string(&LocationType::InPerson).unwrap(),
            "\"in-person\""
        );
    }

    #[test]
    fn tag_set_removes_duplicates_and_blanks() {
        let tags = tag_set(["rust", "management", "rust", "  ", "Remote"]);
        assert_eq!(tags.len(), 3);
        assert!(tags.contains("rust"));
    }

    #[test]
    fn sanitize_posted_date_tolerates_small_skew_only() {
        let slightly_ahead = now() + Duration::minutes(2);
        let far_ahead = now() + Duration::days(2);
        assert_eq!(sanitize_posted_date(Some(slightly_ahead), now()), Some(slightly_ahead));
        assert_eq!(sanitize_posted_date(Some(far_ahead), now()), None);
        assert_eq!(sanitize_posted_date(None, now()), None);
    }

    #[test]
    fn days_old_truncates_partial_days() {
        assert_eq!(days_old(now(), now() - Duration::hours(23)), 0);
        assert_eq!(days_old(now(), now() - Duration::hours(25)), 1);
        assert_eq!(days_old(now(), now() - Duration::days(30)), 30);
    }

    #[test]
    fn contract_violations_flag_missing_fields() {
        let mut job = sample_job();
        assert!(job.contract_violations(now()).is_empty());
        job.id.clear();
        job.title = "  ".into();
        job.posted_date = Some(now() + Duration::days(1));
        let violations = job.contract_violations(now());
        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[0], JobContractError::MissingId { .. }));
    }

    #[test]
    fn job_round_trips_camel_case_json() {
        let json = r#"{
            "id": "remoteok-1",
            "title": "Head of Engineering",
            "locationType": "remote",
            "postedDate": null,
            "source": "RemoteOK",
            "tags": ["rust", "rust", "leadership"]
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.location_type, LocationType::Remote);
        assert!(job.posted_date.is_none());
        assert_eq!(job.tags.len(), 2);
        assert_eq!(job.company, "");
    }
}
