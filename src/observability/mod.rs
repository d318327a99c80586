//! Logging for the pagination engine and subscriber setup for the binary.

use crate::errors::{format_retry_after, RateLimitInfo, StargazerError, StargazerResult};
use clap::ValueEnum;
use std::path::Path;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing hooks for stargazer operations.
pub struct TracingHooks;

impl TracingHooks {
    /// Logs the start of a page request.
    pub fn on_page_request(url: &str, page: u32) {
        debug!(url = %url, page = page, "Requesting stargazers page");
    }

    /// Logs a received response.
    pub fn on_response(url: &str, status: u16, duration: Duration) {
        debug!(
            url = %url,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "GitHub API request completed"
        );
    }

    /// Logs a request that never produced a response.
    pub fn on_request_error(url: &str, error: &StargazerError) {
        error!(url = %url, error = %error, "GitHub API request failed");
    }

    /// Logs a decoded page.
    pub fn on_page_fetched(url: &str, page: u32, records: usize, has_next: bool) {
        info!(
            url = %url,
            page = page,
            records = records,
            has_next = has_next,
            "Fetched stargazers page"
        );
    }

    /// Logs the page count announced by the first response.
    pub fn on_expected_pages(url: &str, total: u32) {
        debug!(url = %url, total_pages = total, "Pagination announced last page");
    }

    /// Logs a tolerated failure that ends the run with partial results.
    pub fn on_pagination_stopped(url: &str, error: &StargazerError, kept: usize) {
        warn!(
            url = %url,
            error = %error,
            records_kept = kept,
            "Pagination stopped early; returning partial results"
        );
    }

    /// Logs rate limit exceeded.
    pub fn on_rate_limit_exceeded(url: &str, info: &RateLimitInfo) {
        warn!(
            url = %url,
            limit = info.limit,
            remaining = info.remaining,
            reset_at = %format_retry_after(&info.reset_at),
            resource = info.resource.as_deref().unwrap_or("core"),
            "Rate limit exceeded"
        );
    }

    /// Logs a rate limit rejection whose reset header was unusable.
    pub fn on_rate_limit_without_reset(url: &str, status: u16) {
        warn!(
            url = %url,
            status = status,
            "Rate limit response without a readable X-RateLimit-Reset header"
        );
    }

    /// Logs a 404.
    pub fn on_not_found(url: &str) {
        warn!(url = %url, "Stargazers endpoint not found");
    }

    /// Logs the release of a run's HTTP client.
    pub fn on_client_released(base_url: &str) {
        debug!(base_url = %base_url, "HTTP client released");
    }

    /// Logs a written export file.
    pub fn on_export_written(path: &Path, rows: usize) {
        info!(path = %path.display(), rows = rows, "Export written");
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors.
    #[default]
    Pretty,
    /// Single-line format.
    Compact,
    /// JSON format (for structured logging).
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` does not say otherwise.
    pub level: LevelFilter,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Sets the default level.
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Installs the global subscriber, writing to stderr.
    ///
    /// Fails if a subscriber is already installed.
    pub fn init(self) -> StargazerResult<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy();

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Pretty => registry
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
        };

        result.map_err(|e| StargazerError::configuration(format!("Failed to initialize logging: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_level(LevelFilter::DEBUG)
            .with_format(LogFormat::Json);

        assert_eq!(config.level, LevelFilter::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
    }
}
