//! Statistics over a finished batch
//!
//! This module provides functionality for summarizing a [`ResultSet`] and
//! displaying it on the console.

use crate::fetch::ResultSet;
use crate::FetchErrorKind;
use std::collections::BTreeMap;
use std::time::Duration;

/// Batch statistics summary
#[derive(Debug, Clone, Default)]
pub struct BatchStatistics {
    /// Number of URLs in the batch
    pub total: usize,

    /// Fetches that returned content
    pub succeeded: usize,

    /// Fetches that failed for any reason
    pub failed: usize,

    /// Failure counts per error kind
    pub failures_by_kind: BTreeMap<FetchErrorKind, usize>,

    /// Sum of content lengths over successful fetches (bytes)
    pub total_bytes: usize,

    /// Mean duration over all fetches that started
    pub mean_duration: Duration,

    /// Slowest fetch and its duration
    pub slowest: Option<(String, Duration)>,

    /// Wall-clock time of the whole batch
    pub elapsed: Duration,
}

impl BatchStatistics {
    /// Computes statistics for a result set
    pub fn from_results(results: &ResultSet) -> Self {
        let mut stats = Self {
            total: results.len(),
            elapsed: results.elapsed(),
            ..Self::default()
        };

        let mut started = 0u32;
        let mut summed = Duration::ZERO;

        for result in results {
            match result.error_kind() {
                None => {
                    stats.succeeded += 1;
                    stats.total_bytes += result.content().len();
                }
                Some(kind) => {
                    stats.failed += 1;
                    *stats.failures_by_kind.entry(kind).or_insert(0) += 1;
                }
            }

            // Fetches that never got a worker slot report zero duration
            if !result.duration().is_zero() {
                started += 1;
                summed += result.duration();
            }

            let is_slowest = stats
                .slowest
                .as_ref()
                .map_or(true, |(_, slowest)| result.duration() > *slowest);
            if is_slowest {
                stats.slowest = Some((result.url().to_string(), result.duration()));
            }
        }

        if started > 0 {
            stats.mean_duration = summed / started;
        }

        stats
    }

    /// Percentage of URLs fetched successfully
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

/// Prints one line per result to stdout, in input order
pub fn print_results(results: &ResultSet) {
    for (index, result) in results.iter().enumerate() {
        match result.error() {
            None => println!(
                "[{}] ok    {} ({} bytes, {:?})",
                index,
                result.url(),
                result.content().len(),
                result.duration()
            ),
            Some(error) => println!(
                "[{}] fail  '{}': {} ({:?})",
                index,
                result.url(),
                error,
                result.duration()
            ),
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Fetch Statistics ===\n");

    println!("Overview:");
    println!("  URLs: {}", stats.total);
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed);
    println!("  Content fetched: {} bytes", stats.total_bytes);
    println!("  Batch time: {:?}", stats.elapsed);
    println!("  Mean fetch time: {:?}", stats.mean_duration);
    if let Some((url, duration)) = &stats.slowest {
        println!("  Slowest: {} ({:?})", url, duration);
    }
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failures by Kind:");
        let mut counts: Vec<_> = stats.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs fetched)",
        stats.success_rate(),
        stats.succeeded,
        stats.total
    );
}
