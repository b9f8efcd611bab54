//! Cancellation and deadline signal threaded through every fetch

use crate::FetchError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation token plus an optional deadline
///
/// A [`Fetcher`](crate::fetch::Fetcher) receives one of these per call and
/// should run its network work through [`FetchContext::within`], so that a
/// lapsed deadline or a cancelled batch drops the in-flight operation instead
/// of waiting for the next checkpoint.
#[derive(Debug, Clone)]
pub struct FetchContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl FetchContext {
    /// Creates a context from an existing token and deadline
    pub fn new(cancel: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    /// A context that is never cancelled and never expires
    pub fn background() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        let deadline = Instant::now().checked_add(timeout);
        Self::new(CancellationToken::new(), deadline)
    }

    /// The token observed by this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The instant after which this context reports `Timeout`
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns true once the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Fails with `Timeout` or `Canceled` if the context is already done
    ///
    /// An expired deadline takes precedence over cancellation.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_expired() {
            Err(FetchError::Timeout)
        } else if self.is_cancelled() {
            Err(FetchError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Runs `operation` until it finishes or the context is done
    ///
    /// When the deadline or the token fires first, `operation` is dropped
    /// mid-flight, which releases whatever it holds (connections, permits).
    pub async fn within<F, T>(&self, operation: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        self.check()?;

        let expiry = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            _ = expiry => Err(FetchError::Timeout),
            _ = self.cancel.cancelled() => Err(FetchError::Canceled),
            outcome = operation => outcome,
        }
    }
}
