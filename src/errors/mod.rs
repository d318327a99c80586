//! Error types for the stargazer exporter.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stargazer operations.
pub type StargazerResult<T> = Result<T, StargazerError>;

/// Rate limit information extracted from response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the window (if reported).
    pub limit: Option<u32>,
    /// Remaining requests in the current window (if reported).
    pub remaining: Option<u32>,
    /// Time when the rate limit resets.
    pub reset_at: DateTime<Utc>,
    /// Resource category.
    pub resource: Option<String>,
}

/// Everything that can go wrong while enumerating or exporting stargazers.
#[derive(Error, Debug)]
pub enum StargazerError {
    /// The `owner/repo` argument was malformed. No request was made.
    #[error("Argument should be of form username/repository.")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
    },

    /// Network-level failure (connect, timeout, DNS, TLS, broken body).
    #[error("An error occurred while requesting {url}: {cause}")]
    Transport {
        /// Target URL of the failed request.
        url: String,
        /// Description of the underlying failure.
        cause: String,
    },

    /// The API's request quota is exhausted.
    #[error("API rate limit exceeded. Kindly retry by {}", format_retry_after(.retry_after))]
    RateLimitExceeded {
        /// When the caller may retry.
        retry_after: DateTime<Utc>,
        /// Rate limit headers of the rejected response.
        info: RateLimitInfo,
    },

    /// Repository does not exist or its stargazers endpoint is unreachable.
    #[error("Resource not found: {url}")]
    ResourceNotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// Any other non-2xx response.
    #[error("{status_code} HTTP.")]
    HttpStatus {
        /// HTTP status code.
        status_code: u16,
        /// The URL that failed.
        url: String,
        /// The API's `message` field, when the body had one.
        message: Option<String>,
    },

    /// A 2xx body that was not a list of stargazer events.
    #[error("Failed to deserialize response from {url}: {message}")]
    Deserialization {
        /// The URL whose body failed to decode.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// A `next` link pointed back at a page this run already fetched.
    #[error("Pagination loop detected at {url}")]
    PaginationLoop {
        /// The repeated URL.
        url: String,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The run was cancelled from outside.
    #[error("Pagination cancelled")]
    Cancelled,

    /// Failure writing the export file.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StargazerError {
    /// Creates an invalid identifier error.
    pub fn invalid_identifier(input: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            input: input.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, cause: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::ResourceNotFound { url: url.into() }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(info: RateLimitInfo) -> Self {
        Self::RateLimitExceeded {
            retry_after: info.reset_at,
            info,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns the HTTP status code, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimitExceeded { .. } => Some(403),
            Self::ResourceNotFound { .. } => Some(404),
            Self::HttpStatus { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns when the caller may retry, for rate limit errors.
    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns true if this error must reach the caller of a pagination run
    /// instead of degrading into a partial result.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::RateLimitExceeded { .. }
                | Self::ResourceNotFound { .. }
                | Self::Configuration(_)
        )
    }
}

/// Renders a reset time the way `ctime(3)` does, pinned to UTC.
pub fn format_retry_after(at: &DateTime<Utc>) -> String {
    at.format("%a %b %e %H:%M:%S %Y UTC").to_string()
}

/// Checks if an error is a rate limit error.
pub fn is_rate_limit_error(error: &StargazerError) -> bool {
    matches!(error, StargazerError::RateLimitExceeded { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info_at(epoch: i64) -> RateLimitInfo {
        RateLimitInfo {
            limit: Some(60),
            remaining: Some(0),
            reset_at: Utc.timestamp_opt(epoch, 0).unwrap(),
            resource: Some("core".to_string()),
        }
    }

    #[test]
    fn test_rate_limit_display() {
        let error = StargazerError::rate_limit(info_at(1_700_000_000));
        assert_eq!(
            error.to_string(),
            "API rate limit exceeded. Kindly retry by Tue Nov 14 22:13:20 2023 UTC"
        );
        assert_eq!(error.retry_after(), Utc.timestamp_opt(1_700_000_000, 0).single());
        assert!(is_rate_limit_error(&error));
    }

    #[test]
    fn test_error_display_is_single_line() {
        let errors = vec![
            StargazerError::invalid_identifier("foo"),
            StargazerError::transport("https://api.github.com/x", "connection refused"),
            StargazerError::not_found("https://api.github.com/repos/a/b/stargazers"),
            StargazerError::HttpStatus {
                status_code: 500,
                url: "https://api.github.com/x".to_string(),
                message: None,
            },
        ];

        for error in errors {
            assert!(!error.to_string().contains('\n'), "{}", error);
        }
    }

    #[test]
    fn test_http_status_display() {
        let error = StargazerError::HttpStatus {
            status_code: 502,
            url: "https://api.github.com/x".to_string(),
            message: Some("Bad Gateway".to_string()),
        };
        assert_eq!(error.to_string(), "502 HTTP.");
        assert_eq!(error.status_code(), Some(502));
    }

    #[test]
    fn test_is_fatal() {
        assert!(StargazerError::invalid_identifier("x").is_fatal());
        assert!(StargazerError::not_found("u").is_fatal());
        assert!(StargazerError::rate_limit(info_at(0)).is_fatal());

        assert!(!StargazerError::transport("u", "timeout").is_fatal());
        assert!(!StargazerError::Cancelled.is_fatal());
        assert!(!StargazerError::HttpStatus {
            status_code: 500,
            url: "u".to_string(),
            message: None,
        }
        .is_fatal());
    }
}
