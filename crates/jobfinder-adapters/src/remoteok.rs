//! RemoteOK public JSON feed. Docs: https://remoteok.com/api

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobfinder_core::{sanitize_posted_date, tag_set, Job, LocationType, Salary};
use jobfinder_storage::HttpFetcher;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::{
    native_id, parse_timestamp, positive_amount, text_or_none, AdapterContext, AdapterError,
    SearchQuery, SourceAdapter,
};

const REMOTEOK_API_URL: &str = "https://remoteok.com/api";
const SOURCE_NAME: &str = "RemoteOK";

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteOkAdapter;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Posting {
    id: JsonValue,
    date: Option<String>,
    company: Option<String>,
    position: Option<String>,
    tags: Vec<String>,
    description: Option<String>,
    location: Option<String>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    url: Option<String>,
}

#[async_trait]
impl SourceAdapter for RemoteOkAdapter {
    fn source_id(&self) -> &'static str {
        "remoteok"
    }

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
        _query: &SearchQuery,
    ) -> Result<Vec<Job>, AdapterError> {
        tracing::info!(run_id = %ctx.run_id, "fetching jobs from RemoteOK");
        let body = http.get(self.source_id(), REMOTEOK_API_URL, &[]).await?;
        self.parse(&body, ctx.now)
    }

    fn parse(&self, payload: &[u8], now: DateTime<Utc>) -> Result<Vec<Job>, AdapterError> {
        let entries: Vec<JsonValue> =
            serde_json::from_slice(payload).map_err(|error| AdapterError::Payload {
                source_name: SOURCE_NAME,
                error,
            })?;

        // The first element of the feed is legal metadata, not a posting.
        let mut jobs = Vec::with_capacity(entries.len().saturating_sub(1));
        for entry in entries.into_iter().skip(1) {
            match serde_json::from_value::<Posting>(entry) {
                Ok(posting) => jobs.push(to_job(posting, now)),
                Err(err) => tracing::warn!(%err, "skipping malformed RemoteOK posting"),
            }
        }
        Ok(jobs)
    }
}

fn to_job(posting: Posting, now: DateTime<Utc>) -> Job {
    let title =
        text_or_none(posting.position.as_deref()).unwrap_or_else(|| "Unknown Position".into());
    let company =
        text_or_none(posting.company.as_deref()).unwrap_or_else(|| "Unknown Company".into());
    let location_type = classify_location(posting.location.as_deref());
    let location = text_or_none(posting.location.as_deref()).unwrap_or_else(|| "Remote".into());
    let native = native_id(&posting.id);

    let id = match &native {
        Some(native) => Job::source_native_id("remoteok", native),
        None => Job::content_id(&title, &company, SOURCE_NAME),
    };
    let url = text_or_none(posting.url.as_deref()).unwrap_or_else(|| match &native {
        Some(native) => format!("https://remoteok.com/remote-jobs/{native}"),
        None => "https://remoteok.com".to_string(),
    });

    let salary_min = positive_amount(posting.salary_min);
    let salary_max = positive_amount(posting.salary_max);
    let salary = (salary_min.is_some() || salary_max.is_some()).then(|| Salary {
        min: salary_min,
        max: salary_max,
        currency: "USD".to_string(),
        is_predicted: false,
    });

    Job {
        id,
        title,
        company,
        description: posting.description.unwrap_or_default(),
        location,
        location_type,
        url,
        posted_date: sanitize_posted_date(parse_timestamp(posting.date.as_deref()), now),
        source: SOURCE_NAME.to_string(),
        salary,
        tags: tag_set(&posting.tags),
    }
}

/// RemoteOK lists remote work. A hybrid mention counts only when the location
/// does not also say remote or anywhere.
fn classify_location(location: Option<&str>) -> LocationType {
    let Some(text) = location else {
        return LocationType::Remote;
    };
    let text = text.to_lowercase();
    if text.contains("remote") || text.contains("anywhere") {
        LocationType::Remote
    } else if text.contains("hybrid") {
        LocationType::Hybrid
    } else {
        LocationType::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn skips_the_legal_header_entry() {
        let payload = br#"[{"legal": "terms"}, {"id": 5, "position": "EM"}]"#;
        let jobs = RemoteOkAdapter.parse(payload, now()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "remoteok-5");
        assert_eq!(jobs[0].location, "Remote");
        assert_eq!(jobs[0].url, "https://remoteok.com/remote-jobs/5");
    }

    #[test]
    fn empty_feed_is_an_empty_batch() {
        assert!(RemoteOkAdapter.parse(b"[]", now()).unwrap().is_empty());
    }

    #[test]
    fn malformed_postings_are_skipped() {
        let payload = br#"[{"legal": "terms"}, {"id": 1, "tags": "not-a-list"}, {"id": 2, "position": "EM"}]"#;
        let jobs = RemoteOkAdapter.parse(payload, now()).unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["remoteok-2"]);
    }

    #[test]
    fn location_defaults_to_remote_unless_hybrid() {
        assert_eq!(classify_location(None), LocationType::Remote);
        assert_eq!(classify_location(Some("Berlin")), LocationType::Remote);
        assert_eq!(classify_location(Some("Hybrid - NYC")), LocationType::Hybrid);
    }

    #[test]
    fn remote_or_anywhere_outranks_a_hybrid_mention() {
        let payload = br#"[
            {"legal": "terms"},
            {"id": 9, "position": "EM", "location": "Remote (Hybrid optional)"},
            {"id": 10, "position": "EM", "location": "Anywhere, hybrid ok"}
        ]"#;
        let jobs = RemoteOkAdapter.parse(payload, now()).unwrap();
        let types: Vec<_> = jobs.iter().map(|j| j.location_type).collect();
        assert_eq!(types, vec![LocationType::Remote, LocationType::Remote]);
    }
}
