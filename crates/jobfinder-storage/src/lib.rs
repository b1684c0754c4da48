//! Durable seen-job state and the HTTP fetch utilities used by source adapters.

mod http;
mod seen;

pub use http::{FetchError, FetcherConfig, HttpFetcher};
pub use seen::{filter_new, mark_seen, SeenJobStore, SeenSet, DEFAULT_SEEN_STORE_PATH};

pub const CRATE_NAME: &str = "jobfinder-storage";
