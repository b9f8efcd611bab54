//! Fetch module for concurrent URL retrieval
//!
//! This module contains the core batch logic, including:
//! - The `Fetcher` capability and its HTTP implementation
//! - Deadline and cancellation propagation via `FetchContext`
//! - Immutable per-URL results and the ordered `ResultSet`
//! - The bounded-concurrency `Orchestrator`

mod context;
mod fetcher;
mod orchestrator;
mod request;
mod result;

pub use context::FetchContext;
pub use fetcher::{build_http_client, validate_url, Fetcher, HttpFetcher};
pub use orchestrator::Orchestrator;
pub use request::FetchRequest;
pub use result::{FetchResult, ResultSet};

pub use tokio_util::sync::CancellationToken;

use crate::config::{HttpSettings, RunConfig};
use crate::SumiError;

/// Fetches `urls` over HTTP with a freshly built client
///
/// Convenience entry point for callers that don't need to reuse the
/// orchestrator or supply their own fetcher.
///
/// # Arguments
///
/// * `urls` - The URLs to fetch, in the order results should be returned
/// * `settings` - HTTP client settings
/// * `config` - Deadline and concurrency options for the batch
///
/// # Returns
///
/// * `Ok(ResultSet)` - One result per URL, in input order
/// * `Err(SumiError)` - The client could not be built or `config` is invalid
pub async fn fetch_all(
    urls: &[String],
    settings: &HttpSettings,
    config: &RunConfig,
) -> Result<ResultSet, SumiError> {
    let orchestrator = Orchestrator::new(HttpFetcher::from_settings(settings)?);
    Ok(orchestrator.run(urls, config).await?)
}
