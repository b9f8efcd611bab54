use crate::config::validation::validate_run_config;
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Grace period the orchestrator waits past the global deadline for
/// in-flight fetches to report before force-finalizing them
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Options for a single orchestrator batch
///
/// There is no default global deadline; callers always choose one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Upper bound on the wall-clock time of the whole batch
    pub global_deadline: Duration,

    /// Upper bound on simultaneous in-flight fetches (must be >= 1)
    pub max_concurrency: usize,

    /// Optional cap on an individual fetch, counted from when it starts
    pub per_request_timeout: Option<Duration>,

    /// How long to wait past the deadline for in-flight fetches to report
    pub grace_period: Duration,
}

impl RunConfig {
    /// Creates a run configuration with no per-request timeout
    pub fn new(global_deadline: Duration, max_concurrency: usize) -> Self {
        Self {
            global_deadline,
            max_concurrency,
            per_request_timeout: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Sets the per-request timeout
    pub fn with_per_request_timeout(mut self, timeout: Duration) -> Self {
        self.per_request_timeout = Some(timeout);
        self
    }

    /// Sets the grace period
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Checks the options before a batch starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_run_config(self)
    }
}

/// Main configuration file structure for Sumi-Fetch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
}

impl Config {
    /// Builds the orchestrator options described by the `[fetch]` section
    pub fn run_config(&self) -> RunConfig {
        let mut run = RunConfig::new(
            Duration::from_millis(self.fetch.global_deadline_ms),
            self.fetch.max_concurrency as usize,
        );
        if let Some(timeout_ms) = self.fetch.per_request_timeout_ms {
            run = run.with_per_request_timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(grace_ms) = self.fetch.grace_period_ms {
            run = run.with_grace_period(Duration::from_millis(grace_ms));
        }
        run
    }
}

/// Batch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// Wall-clock bound on the whole batch (milliseconds)
    #[serde(rename = "global-deadline-ms")]
    pub global_deadline_ms: u64,

    /// Maximum number of concurrent fetches
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// Optional bound on each individual fetch (milliseconds)
    #[serde(rename = "per-request-timeout-ms", default)]
    pub per_request_timeout_ms: Option<u64>,

    /// Optional override of the post-deadline grace period (milliseconds)
    #[serde(rename = "grace-period-ms", default)]
    pub grace_period_ms: Option<u64>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for establishing a connection (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_user_agent() -> String {
    format!("sumi-fetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_redirects() -> usize {
    10
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Where to write the markdown report, if anywhere
    #[serde(rename = "report-path", default)]
    pub report_path: Option<String>,
}

/// URLs to fetch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}
