use crate::config::types::{Config, FetchSettings, HttpSettings, OutputConfig, RunConfig};
use crate::ConfigError;
use std::time::Duration;

/// Upper bound accepted for `max-concurrency` in configuration files
const MAX_CONFIGURED_CONCURRENCY: u32 = 1000;

/// Upper bound accepted for `max-redirects`
const MAX_REDIRECTS: usize = 50;

/// Validates the entire configuration file
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_settings(&config.fetch)?;
    validate_http_settings(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the options of a single batch
///
/// This runs before any fetch is scheduled so that a malformed
/// configuration fails fast.
pub fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be >= 1, got {}",
            config.max_concurrency
        )));
    }

    if config.global_deadline.is_zero() {
        return Err(ConfigError::Validation(
            "global_deadline must be greater than zero".to_string(),
        ));
    }

    if config.per_request_timeout == Some(Duration::ZERO) {
        return Err(ConfigError::Validation(
            "per_request_timeout must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the `[fetch]` section
fn validate_fetch_settings(settings: &FetchSettings) -> Result<(), ConfigError> {
    if settings.max_concurrency < 1 || settings.max_concurrency > MAX_CONFIGURED_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and {}, got {}",
            MAX_CONFIGURED_CONCURRENCY, settings.max_concurrency
        )));
    }

    if settings.global_deadline_ms < 1 {
        return Err(ConfigError::Validation(
            "global-deadline-ms must be >= 1".to_string(),
        ));
    }

    if settings.per_request_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "per-request-timeout-ms must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the `[http]` section
fn validate_http_settings(settings: &HttpSettings) -> Result<(), ConfigError> {
    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if settings.max_redirects > MAX_REDIRECTS {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= {}, got {}",
            MAX_REDIRECTS, settings.max_redirects
        )));
    }

    Ok(())
}

/// Validates the `[output]` section
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.report_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "report-path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
