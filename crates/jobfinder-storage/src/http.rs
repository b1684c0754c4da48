//! Outbound GETs for source adapters: one shared client, capped retries on transient failures.

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Extra attempts after the first one fails transiently.
    pub max_retries: u32,
    pub retry_base: Duration,
    pub retry_cap: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: None,
            max_retries: 2,
            retry_base: Duration::from_millis(500),
            retry_cap: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered {status}")]
    Status { status: u16, url: String },
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
    retry_cap: Duration,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true);
        if let Some(agent) = config.user_agent {
            builder = builder.user_agent(agent);
        }
        Ok(Self {
            client: builder.build().context("building http client")?,
            max_retries: config.max_retries,
            retry_base: config.retry_base,
            retry_cap: config.retry_cap,
        })
    }

    /// GETs `url` with `query` appended and returns the body of a 2xx response.
    pub async fn get(
        &self,
        source_id: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, FetchError> {
        let span = tracing::info_span!("http_get", source_id, url);
        async {
            let mut attempt = 0;
            loop {
                let error = match self.client.get(url).query(query).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        return Ok(resp.bytes().await?.to_vec());
                    }
                    Ok(resp) => FetchError::Status {
                        status: resp.status().as_u16(),
                        url: resp.url().to_string(),
                    },
                    Err(err) => FetchError::Request(err),
                };
                if attempt >= self.max_retries || !is_transient(&error) {
                    return Err(error);
                }
                let delay = self.retry_delay(attempt);
                tracing::warn!(attempt, %error, ?delay, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
        .instrument(span)
        .await
    }

    /// Doubles from `retry_base` on each attempt, never above `retry_cap`.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base.saturating_mul(factor).min(self.retry_cap)
    }
}

fn is_transient(error: &FetchError) -> bool {
    match error {
        FetchError::Status { status, .. } => StatusCode::from_u16(*status)
            .is_ok_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS),
        FetchError::Request(err) => err.is_timeout() || err.is_connect(),
    }
}
