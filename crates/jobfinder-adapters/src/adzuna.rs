//! Adzuna search API. Docs: https://developer.adzuna.com/

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

const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const SOURCE_NAME: &str = "Adzuna";

#[derive(Debug, Clone, Default)]
pub struct AdzunaAdapter {
    app_id: Option<String>,
    app_key: Option<String>,
}

impl AdzunaAdapter {
    pub fn new(app_id: Option<String>, app_key: Option<String>) -> Self {
        Self { app_id, app_key }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("ADZUNA_APP_ID").ok(),
            std::env::var("ADZUNA_APP_KEY").ok(),
        )
    }

    fn credentials(&self) -> Result<(String, String), AdapterError> {
        match (
            text_or_none(self.app_id.as_deref()),
            text_or_none(self.app_key.as_deref()),
        ) {
            (Some(id), Some(key)) => Ok((id, key)),
            _ => Err(AdapterError::MissingCredentials {
                source_name: SOURCE_NAME,
                hint: "ADZUNA_APP_ID and ADZUNA_APP_KEY",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Posting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Posting {
    id: JsonValue,
    title: Option<String>,
    company: Option<Company>,
    location: Option<Location>,
    description: Option<String>,
    redirect_url: Option<String>,
    created: Option<String>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_is_predicted: JsonValue,
    category: Option<Category>,
    contract_type: Option<String>,
    contract_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Company {
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Location {
    display_name: Option<String>,
    area: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Category {
    label: Option<String>,
    tag: Option<String>,
}

#[async_trait]
impl SourceAdapter for AdzunaAdapter {
    fn source_id(&self) -> &'static str {
        "adzuna"
    }

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
        query: &SearchQuery,
    ) -> Result<Vec<Job>, AdapterError> {
        let (app_id, app_key) = self.credentials()?;
        let url = format!("{ADZUNA_BASE_URL}/{}/search/{}", query.country, query.page);

        let mut params = vec![
            ("app_id", app_id),
            ("app_key", app_key),
            ("results_per_page", query.results_per_page.to_string()),
            ("content-type", "application/json".to_string()),
        ];
        if !query.what.trim().is_empty() {
            params.push(("what", query.what.clone()));
        }
        if let Some(exclude) = &query.what_exclude {
            params.push(("what_exclude", exclude.clone()));
        }
        if let Some(location) = &query.location {
            params.push(("where", location.clone()));
        }
        if let Some(days) = query.max_days_old {
            params.push(("max_days_old", days.to_string()));
        }

        tracing::info!(run_id = %ctx.run_id, country = %query.country, "fetching jobs from Adzuna");
        let body = http.get(self.source_id(), &url, &params).await?;
        self.parse(&body, ctx.now)
    }

    fn parse(&self, payload: &[u8], now: DateTime<Utc>) -> Result<Vec<Job>, AdapterError> {
        let response: SearchResponse =
            serde_json::from_slice(payload).map_err(|error| AdapterError::Payload {
                source_name: SOURCE_NAME,
                error,
            })?;
        Ok(response
            .results
            .into_iter()
            .map(|posting| to_job(posting, now))
            .collect())
    }
}

fn to_job(posting: Posting, now: DateTime<Utc>) -> Job {
    let title = text_or_none(posting.title.as_deref()).unwrap_or_else(|| "Unknown Position".into());
    let company = posting
        .company
        .as_ref()
        .and_then(|c| text_or_none(c.display_name.as_deref()))
        .unwrap_or_else(|| "Unknown Company".into());
    let description = posting.description.clone().unwrap_or_default();
    let location = format_location(posting.location.as_ref());
    let location_type = classify_location(&title, &description, &location);

    let id = match native_id(&posting.id) {
        Some(native) => Job::source_native_id("adzuna", &native),
        None => Job::content_id(&title, &company, SOURCE_NAME),
    };

    let salary_min = positive_amount(posting.salary_min);
    let salary_max = positive_amount(posting.salary_max);
    let salary = (salary_min.is_some() || salary_max.is_some()).then(|| Salary {
        min: salary_min,
        max: salary_max,
        // Adzuna reports local currency; the US endpoint is the only one queried.
        currency: "USD".to_string(),
        is_predicted: is_truthy(&posting.salary_is_predicted),
    });

    let mut tags = Vec::new();
    if let Some(category) = &posting.category {
        tags.extend(category.label.clone());
        tags.extend(category.tag.clone());
    }
    tags.extend(posting.contract_type.clone());
    tags.extend(posting.contract_time.clone());

    Job {
        id,
        title,
        company,
        description,
        location,
        location_type,
        url: posting.redirect_url.clone().unwrap_or_default(),
        posted_date: sanitize_posted_date(parse_timestamp(posting.created.as_deref()), now),
        source: SOURCE_NAME.to_string(),
        salary,
        tags: tag_set(tags),
    }
}

fn format_location(location: Option<&Location>) -> String {
    let Some(location) = location else {
        return "Unknown".to_string();
    };
    if let Some(name) = text_or_none(location.display_name.as_deref()) {
        return name;
    }
    if location.area.is_empty() {
        "Unknown".to_string()
    } else {
        location.area.join(", ")
    }
}

fn classify_location(title: &str, description: &str, location: &str) -> LocationType {
    let title = title.to_lowercase();
    let description = description.to_lowercase();
    let location = location.to_lowercase();

    if title.contains("remote")
        || description.contains("remote")
        || description.contains("work from home")
        || location.contains("remote")
    {
        LocationType::Remote
    } else if title.contains("hybrid") || description.contains("hybrid") {
        LocationType::Hybrid
    } else {
        LocationType::InPerson
    }
}

/// Adzuna encodes `salary_is_predicted` as "0"/"1"; accept booleans and numbers too.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
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
    fn classifies_location_by_indicators() {
        assert_eq!(
            classify_location("Remote EM", "", "Seattle"),
            LocationType::Remote
        );
        assert_eq!(
            classify_location("EM", "Work from home twice a week", "Seattle"),
            LocationType::Remote
        );
        assert_eq!(
            classify_location("EM", "Hybrid, 3 days onsite", "Seattle"),
            LocationType::Hybrid
        );
        assert_eq!(classify_location("EM", "", "Seattle"), LocationType::InPerson);
    }

    #[test]
    fn missing_results_key_is_an_empty_batch() {
        let jobs = AdzunaAdapter::default().parse(br#"{"count": 0}"#, now()).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn invalid_json_is_a_payload_error() {
        let err = AdzunaAdapter::default().parse(b"<html>", now()).unwrap_err();
        assert!(matches!(err, AdapterError::Payload { source_name: "Adzuna", .. }));
    }

    #[test]
    fn future_posted_dates_are_dropped() {
        let payload = br#"{"results": [{"id": 7, "title": "EM", "created": "2026-03-30T00:00:00Z"}]}"#;
        let jobs = AdzunaAdapter::default().parse(payload, now()).unwrap();
        assert_eq!(jobs[0].id, "adzuna-7");
        assert_eq!(jobs[0].posted_date, None);
    }

    #[test]
    fn missing_native_id_falls_back_to_content_id() {
        let payload = br#"{"results": [{"title": "EM", "company": {"display_name": "Acme"}}]}"#;
        let first = AdzunaAdapter::default().parse(payload, now()).unwrap();
        let second = AdzunaAdapter::default().parse(payload, now()).unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].id, Job::content_id("EM", "Acme", "Adzuna"));
    }

    #[tokio::test]
    async fn fetch_without_credentials_fails_before_any_request() {
        let http = HttpFetcher::new(Default::default()).unwrap();
        let ctx = AdapterContext {
            run_id: uuid::Uuid::new_v4(),
            now: now(),
        };
        let err = AdzunaAdapter::new(Some("id".into()), None)
            .fetch(&http, &ctx, &SearchQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingCredentials { .. }));
    }
}
