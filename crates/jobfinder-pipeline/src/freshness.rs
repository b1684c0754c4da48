//! Age ceiling, freshness tiering and display labels.
//!
//! All age arithmetic goes through [`jobfinder_core::days_old`] so the label a job
//! carries always agrees with whether it passed the ceiling.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use jobfinder_core::{days_old, FreshnessPreferences, Job};
use serde::{Deserialize, Serialize};

/// A job ready for display, with its age and human-readable freshness label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedJob {
    #[serde(flatten)]
    pub job: Job,
    pub days_old: Option<i64>,
    pub freshness_label: String,
}

impl AsRef<Job> for AnnotatedJob {
    fn as_ref(&self) -> &Job {
        &self.job
    }
}

/// Drops jobs older than the ceiling and orders the rest, preferred tier first.
pub fn filter_by_freshness(
    jobs: Vec<Job>,
    prefs: &FreshnessPreferences,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let mut kept = drop_stale(jobs, prefs, now);
    sort_by_freshness(&mut kept, prefs, now);
    kept
}

/// Removes jobs older than `maxDaysOld`. Undated jobs are never dropped.
pub fn drop_stale(jobs: Vec<Job>, prefs: &FreshnessPreferences, now: DateTime<Utc>) -> Vec<Job> {
    let max_days_old = prefs.max_days_old();
    jobs.into_iter()
        .filter(|job| match job.posted_date {
            Some(posted) => days_old(now, posted) <= max_days_old,
            None => true,
        })
        .collect()
}

/// Stable sort: preferred tier before the rest, newest first inside each tier.
///
/// Undated jobs are never in the preferred tier and sort as the oldest possible
/// posting, so they end up at the bottom.
pub fn sort_by_freshness(jobs: &mut [Job], prefs: &FreshnessPreferences, now: DateTime<Utc>) {
    let preferred_days_old = prefs.preferred_days_old();
    jobs.sort_by(|a, b| compare(a, b, preferred_days_old, now));
}

fn compare(a: &Job, b: &Job, preferred_days_old: i64, now: DateTime<Utc>) -> Ordering {
    let a_preferred = is_preferred(a, preferred_days_old, now);
    let b_preferred = is_preferred(b, preferred_days_old, now);
    // Default for DateTime<Utc> is the Unix epoch.
    let a_date = a.posted_date.unwrap_or_default();
    let b_date = b.posted_date.unwrap_or_default();
    b_preferred
        .cmp(&a_preferred)
        .then_with(|| b_date.cmp(&a_date))
}

fn is_preferred(job: &Job, preferred_days_old: i64, now: DateTime<Utc>) -> bool {
    job.posted_date
        .is_some_and(|posted| days_old(now, posted) <= preferred_days_old)
}

pub fn add_freshness_metadata(jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<AnnotatedJob> {
    jobs.into_iter()
        .map(|job| {
            let age = job.posted_date.map(|posted| days_old(now, posted));
            AnnotatedJob {
                freshness_label: freshness_label(age),
                days_old: age,
                job,
            }
        })
        .collect()
}

pub fn freshness_label(days_old: Option<i64>) -> String {
    match days_old {
        None => "Unknown".to_string(),
        Some(d) if d <= 0 => "Today".to_string(),
        Some(1) => "Yesterday".to_string(),
        Some(d) if d < 7 => format!("{d} days ago"),
        Some(d) if d < 14 => "1-2 weeks ago".to_string(),
        Some(d) if d < 30 => "2-4 weeks ago".to_string(),
        Some(_) => "Over a month ago".to_string(),
    }
}
