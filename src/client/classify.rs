//! Classification of non-2xx stargazer responses.

use crate::errors::{RateLimitInfo, StargazerError};
use crate::observability::TracingHooks;
use chrono::DateTime;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;

/// Text GitHub puts in the `message` field of a primary rate limit rejection.
pub const RATE_LIMIT_MESSAGE: &str = "API rate limit exceeded";

/// GitHub error response format.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turns a failed response into the matching [`StargazerError`].
///
/// - 403 whose message mentions [`RATE_LIMIT_MESSAGE`], or 403/429 with
///   `X-RateLimit-Remaining: 0`, becomes `RateLimitExceeded` provided
///   `X-RateLimit-Reset` is readable;
/// - 404 becomes `ResourceNotFound`;
/// - everything else becomes `HttpStatus`.
pub fn classify_error_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    url: &str,
) -> StargazerError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message);

    if status == StatusCode::NOT_FOUND {
        TracingHooks::on_not_found(url);
        return StargazerError::not_found(url);
    }

    if is_rate_limited(status, headers, message.as_deref()) {
        match extract_rate_limit(headers) {
            Some(info) => {
                TracingHooks::on_rate_limit_exceeded(url, &info);
                return StargazerError::rate_limit(info);
            }
            None => TracingHooks::on_rate_limit_without_reset(url, status.as_u16()),
        }
    }

    StargazerError::HttpStatus {
        status_code: status.as_u16(),
        url: url.to_string(),
        message,
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap, message: Option<&str>) -> bool {
    let quota_exhausted = header_value::<u32>(headers, "x-ratelimit-remaining") == Some(0);

    match status {
        StatusCode::FORBIDDEN => {
            message.is_some_and(|m| m.contains(RATE_LIMIT_MESSAGE)) || quota_exhausted
        }
        StatusCode::TOO_MANY_REQUESTS => quota_exhausted,
        _ => false,
    }
}

/// Reads the `X-RateLimit-*` headers. `None` unless the reset time parses.
pub fn extract_rate_limit(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let reset_timestamp: i64 = header_value(headers, "x-ratelimit-reset")?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo {
        limit: header_value(headers, "x-ratelimit-limit"),
        remaining: header_value(headers, "x-ratelimit-remaining"),
        reset_at,
        resource: headers
            .get("x-ratelimit-resource")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    })
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
