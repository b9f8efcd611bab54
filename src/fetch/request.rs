//! Per-URL fetch requests and their effective deadlines

use crate::fetch::FetchContext;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One scheduled fetch within a batch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Position of the URL in the caller's input
    index: usize,

    /// The URL exactly as supplied
    url: String,

    /// When the whole batch must be finished
    global_deadline: Instant,

    /// Optional bound on this fetch alone
    per_request_timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(
        index: usize,
        url: String,
        global_deadline: Instant,
        per_request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            index,
            url,
            global_deadline,
            per_request_timeout,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn global_deadline(&self) -> Instant {
        self.global_deadline
    }

    /// Earliest of the global deadline and `started_at + per_request_timeout`
    pub fn effective_deadline(&self, started_at: Instant) -> Instant {
        self.per_request_timeout
            .and_then(|timeout| started_at.checked_add(timeout))
            .map(|local| local.min(self.global_deadline))
            .unwrap_or(self.global_deadline)
    }

    /// Context used while waiting for a worker slot
    pub fn admission_context(&self, cancel: CancellationToken) -> FetchContext {
        FetchContext::new(cancel, Some(self.global_deadline))
    }

    /// Context handed to the fetcher once the request starts
    pub fn context(&self, started_at: Instant, cancel: CancellationToken) -> FetchContext {
        FetchContext::new(cancel, Some(self.effective_deadline(started_at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_deadline_without_timeout() {
        let global = Instant::now() + Duration::from_secs(10);
        let request = FetchRequest::new(0, "https://example.com".to_string(), global, None);

        assert_eq!(request.effective_deadline(Instant::now()), global);
    }

    #[test]
    fn test_effective_deadline_earliest_wins() {
        let now = Instant::now();
        let global = now + Duration::from_secs(10);

        let short = FetchRequest::new(
            1,
            "https://example.com".to_string(),
            global,
            Some(Duration::from_secs(2)),
        );
        assert_eq!(short.effective_deadline(now), now + Duration::from_secs(2));

        let long = FetchRequest::new(
            2,
            "https://example.com".to_string(),
            global,
            Some(Duration::from_secs(60)),
        );
        assert_eq!(long.effective_deadline(now), global);
    }

    #[test]
    fn test_contexts_carry_deadlines() {
        let now = Instant::now();
        let global = now + Duration::from_secs(10);
        let request = FetchRequest::new(
            3,
            String::new(),
            global,
            Some(Duration::from_secs(1)),
        );

        let admission = request.admission_context(CancellationToken::new());
        assert_eq!(admission.deadline(), Some(request.global_deadline()));

        let running = request.context(now, CancellationToken::new());
        assert_eq!(running.deadline(), Some(now + Duration::from_secs(1)));
        assert_eq!(request.index(), 3);
        assert_eq!(request.url(), "");
    }
}
