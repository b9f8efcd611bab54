//! Batch orchestrator - bounded concurrent fetching of a fixed URL list
//!
//! This module runs one fetch per input URL and assembles the outcomes:
//! - A counting semaphore caps the number of fetches in flight
//! - Each task reports `(index, result)` over a channel to a single collector
//! - The global deadline bounds both waiting for a slot and the fetch itself
//! - Stragglers past the deadline plus a grace period are aborted and
//!   finalized as timed out, so a batch always returns a complete set

use crate::config::RunConfig;
use crate::fetch::{FetchRequest, FetchResult, Fetcher, ResultSet};
use crate::{ConfigError, FetchError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Far-future cap used when a configured duration would overflow `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Runs batches of fetches through a shared [`Fetcher`]
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_fetch::config::{HttpSettings, RunConfig};
/// use sumi_fetch::fetch::{HttpFetcher, Orchestrator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::from_settings(&HttpSettings::default())?;
/// let orchestrator = Orchestrator::new(fetcher);
///
/// let urls = vec!["https://example.com".to_string(), "".to_string()];
/// let config = RunConfig::new(Duration::from_secs(10), 4);
/// let results = orchestrator.run(&urls, &config).await?;
///
/// assert_eq!(results.len(), urls.len());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<F: ?Sized> {
    fetcher: Arc<F>,
}

impl<F: Fetcher + 'static> Orchestrator<F> {
    /// Creates an orchestrator that owns `fetcher`
    pub fn new(fetcher: F) -> Self {
        Self::from_arc(Arc::new(fetcher))
    }
}

impl<F: Fetcher + ?Sized + 'static> Orchestrator<F> {
    /// Creates an orchestrator sharing an existing fetcher
    pub fn from_arc(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches every URL and returns one result per URL, in input order
    ///
    /// Fails only when `config` is malformed, before any fetch begins.
    pub async fn run(&self, urls: &[String], config: &RunConfig) -> Result<ResultSet, ConfigError> {
        self.run_with_cancel(urls, config, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but stops early when `cancel` fires
    ///
    /// Fetches that already finished keep their outcome. Fetches waiting for
    /// a slot or still in flight resolve as `Canceled` (or `Timeout` if the
    /// global deadline has also passed).
    pub async fn run_with_cancel(
        &self,
        urls: &[String],
        config: &RunConfig,
        cancel: CancellationToken,
    ) -> Result<ResultSet, ConfigError> {
        config.validate()?;

        let batch_start = Instant::now();
        if urls.is_empty() {
            tracing::debug!("Empty URL list, nothing to fetch");
            return Ok(ResultSet::new(Vec::new(), Duration::ZERO));
        }

        let deadline = saturating_add(batch_start, config.global_deadline);
        let hard_stop = saturating_add(deadline, config.grace_period);

        let permits = config.max_concurrency.min(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));

        tracing::info!(
            "Starting batch: {} URLs, max concurrency {}, deadline {:?}, per-request timeout {:?}",
            urls.len(),
            permits,
            config.global_deadline,
            config.per_request_timeout
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, FetchResult)>();
        let mut tasks = JoinSet::new();

        for (index, url) in urls.iter().enumerate() {
            let request = FetchRequest::new(
                index,
                url.clone(),
                deadline,
                config.per_request_timeout,
            );
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.child_token();
            let tx = tx.clone();

            tasks.spawn(async move {
                let result = execute(fetcher.as_ref(), &semaphore, &request, cancel).await;
                // The collector only goes away after finalizing this slot itself
                let _ = tx.send((request.index(), result));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<FetchResult>> = urls.iter().map(|_| None).collect();
        let mut pending = urls.len();
        let mut cancel_seen = false;
        let mut stopped_early = false;

        let stop = sleep_until(hard_stop);
        tokio::pin!(stop);

        while pending > 0 {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((index, result)) => {
                        if store_result(&mut slots, index, result) {
                            pending -= 1;
                        }
                    }
                    None => break,
                },
                _ = cancel.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    tracing::info!("Batch cancelled with {} fetches outstanding", pending);
                    let cancel_stop = saturating_add(Instant::now(), config.grace_period);
                    if cancel_stop < hard_stop {
                        stop.as_mut().reset(cancel_stop);
                    }
                }
                _ = &mut stop => {
                    tracing::warn!(
                        "Grace period elapsed with {} fetches outstanding, finalizing them",
                        pending
                    );
                    stopped_early = true;
                    break;
                }
            }
        }

        // Outcomes delivered right at the stop boundary still count
        let late = drain_ready(&mut rx, &mut slots);
        if late > 0 {
            tracing::debug!("Collected {} results queued at the stop boundary", late);
        }

        // Drops permits and connections still held by stragglers
        tasks.abort_all();

        let elapsed = batch_start.elapsed();
        let results: Vec<FetchResult> = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| {
                    let error = unreported_error(stopped_early, &cancel, deadline);
                    FetchResult::failure(url.as_str(), error, elapsed)
                })
            })
            .collect();

        let set = ResultSet::new(results, elapsed);
        tracing::info!(
            "Batch finished in {:?}: {} succeeded, {} failed",
            elapsed,
            set.success_count(),
            set.failure_count()
        );

        Ok(set)
    }
}

/// Runs one request: wait for a slot, fetch, and build its result
async fn execute<F: Fetcher + ?Sized>(
    fetcher: &F,
    semaphore: &Semaphore,
    request: &FetchRequest,
    cancel: CancellationToken,
) -> FetchResult {
    let admission = request.admission_context(cancel.clone());
    let acquire = async {
        semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Canceled)
    };

    let permit = match admission.within(acquire).await {
        Ok(permit) => permit,
        Err(error) => {
            tracing::debug!(
                "Fetch #{} for '{}' never started: {}",
                request.index(),
                request.url(),
                error
            );
            return FetchResult::failure(request.url(), error, Duration::ZERO);
        }
    };

    let started_at = Instant::now();
    let ctx = request.context(started_at, cancel);
    let outcome = match ctx.check() {
        Ok(()) => fetcher.fetch(&ctx, request.url()).await,
        Err(error) => Err(error),
    };
    let duration = started_at.elapsed();
    drop(permit);

    FetchResult::from_outcome(request.url(), outcome, duration)
}

/// Records a delivered result, returning true if its slot was empty
fn store_result(slots: &mut [Option<FetchResult>], index: usize, result: FetchResult) -> bool {
    log_result(index, &result);
    slots[index].replace(result).is_none()
}

/// Stores every result already queued on the channel without waiting
fn drain_ready(
    rx: &mut mpsc::UnboundedReceiver<(usize, FetchResult)>,
    slots: &mut [Option<FetchResult>],
) -> usize {
    let mut stored = 0;
    while let Ok((index, result)) = rx.try_recv() {
        if store_result(slots, index, result) {
            stored += 1;
        }
    }
    stored
}

/// Error recorded for a slot whose task never reported back
fn unreported_error(
    stopped_early: bool,
    cancel: &CancellationToken,
    deadline: Instant,
) -> FetchError {
    if cancel.is_cancelled() && Instant::now() < deadline {
        FetchError::Canceled
    } else if stopped_early {
        FetchError::Timeout
    } else {
        FetchError::transport("fetch task ended without reporting a result")
    }
}

fn log_result(index: usize, result: &FetchResult) {
    match result.error() {
        None => tracing::debug!(
            "Fetched #{} {} ({} bytes in {:?})",
            index,
            result.url(),
            result.content().len(),
            result.duration()
        ),
        Some(error) => tracing::debug!(
            "Fetch #{} '{}' failed after {:?}: {}",
            index,
            result.url(),
            result.duration(),
            error
        ),
    }
}

fn saturating_add(instant: Instant, duration: Duration) -> Instant {
    instant
        .checked_add(duration)
        .unwrap_or_else(|| instant + FAR_FUTURE)
}
