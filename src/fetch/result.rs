//! Per-URL fetch outcomes and the ordered set returned by a batch

use crate::{FetchError, FetchErrorKind};
use chrono::{DateTime, Utc};
use std::ops::Index;
use std::time::Duration;

/// Outcome of one fetch attempt
///
/// Created the moment the attempt terminates and never modified afterwards.
#[derive(Debug)]
pub struct FetchResult {
    /// The URL exactly as the caller supplied it
    url: String,

    /// Response body (empty on failure)
    content: String,

    /// Why the fetch failed, if it did
    error: Option<FetchError>,

    /// Wall-clock time spent on the attempt
    duration: Duration,

    /// When the attempt completed
    timestamp: DateTime<Utc>,
}

impl FetchResult {
    /// Creates a successful result
    pub fn success(url: impl Into<String>, content: String, duration: Duration) -> Self {
        Self {
            url: url.into(),
            content,
            error: None,
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed result with empty content
    pub fn failure(url: impl Into<String>, error: FetchError, duration: Duration) -> Self {
        Self {
            url: url.into(),
            content: String::new(),
            error: Some(error),
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Creates a result from a fetcher's return value
    pub fn from_outcome(
        url: impl Into<String>,
        outcome: Result<String, FetchError>,
        duration: Duration,
    ) -> Self {
        match outcome {
            Ok(content) => Self::success(url, content, duration),
            Err(error) => Self::failure(url, error, duration),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Kind of the failure, if any
    pub fn error_kind(&self) -> Option<FetchErrorKind> {
        self.error.as_ref().map(FetchError::kind)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns true if the fetch produced content without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of one batch, in the same order as the input URLs
#[derive(Debug, Default)]
pub struct ResultSet {
    results: Vec<FetchResult>,
    elapsed: Duration,
}

impl ResultSet {
    /// Wraps already-ordered results together with the batch wall time
    pub fn new(results: Vec<FetchResult>, elapsed: Duration) -> Self {
        Self { results, elapsed }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FetchResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FetchResult> {
        self.results.iter()
    }

    /// Results that succeeded, in input order
    pub fn successes(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    /// Results that failed, in input order
    pub fn failures(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Wall-clock time of the whole batch
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn into_results(self) -> Vec<FetchResult> {
        self.results
    }
}

impl Index<usize> for ResultSet {
    type Output = FetchResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl IntoIterator for ResultSet {
    type Item = FetchResult;
    type IntoIter = std::vec::IntoIter<FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a FetchResult;
    type IntoIter = std::slice::Iter<'a, FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
