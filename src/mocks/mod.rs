//! Scripted page fetcher for testing pagination without a network.
//!
//! Scripted responses go through the same decoding and error
//! classification as [`StargazerClient`](crate::client::StargazerClient).

use crate::client::{classify_error_response, decode_page, PageFetcher};
use crate::errors::{StargazerError, StargazerResult};
use crate::pagination::Page;
use crate::types::StargazerEvent;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Headers.
    pub headers: HashMap<String, String>,
    /// Delay before responding.
    pub delay: Option<std::time::Duration>,
}

impl MockResponse {
    /// Creates a response with the given status and raw body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
            delay: None,
        }
    }

    /// Creates a successful response with the given body.
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::new(200, serde_json::to_string(body).unwrap_or_default())
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(message: &str) -> Self {
        Self::new(
            404,
            serde_json::json!({
                "message": message,
                "documentation_url": "https://docs.github.com/rest"
            })
            .to_string(),
        )
    }

    /// Creates a 403 Forbidden response that is not a rate limit.
    pub fn forbidden(message: &str) -> Self {
        Self::new(
            403,
            serde_json::json!({
                "message": message,
                "documentation_url": "https://docs.github.com/rest"
            })
            .to_string(),
        )
        .with_rate_limit(60, 59, 0)
    }

    /// Creates an unauthenticated rate limit exceeded response.
    pub fn rate_limited(reset_timestamp: i64) -> Self {
        Self::new(
            403,
            serde_json::json!({
                "message": "API rate limit exceeded for 203.0.113.7. (But here's the good news: Authenticated requests get a higher rate limit.)",
                "documentation_url": "https://docs.github.com/rest/overview/resources-in-the-rest-api#rate-limiting"
            })
            .to_string(),
        )
        .with_rate_limit(60, 0, reset_timestamp)
        .with_header("x-ratelimit-resource", "core")
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(message: &str) -> Self {
        Self::new(500, serde_json::json!({ "message": message }).to_string())
    }

    /// Adds a delay to the response.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Adds a header to the response.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a `Link` header.
    pub fn with_link(self, value: &str) -> Self {
        self.with_header("link", value)
    }

    /// Adds rate limit headers.
    pub fn with_rate_limit(mut self, limit: u32, remaining: u32, reset_timestamp: i64) -> Self {
        self.headers
            .insert("x-ratelimit-limit".to_string(), limit.to_string());
        self.headers
            .insert("x-ratelimit-remaining".to_string(), remaining.to_string());
        self.headers
            .insert("x-ratelimit-reset".to_string(), reset_timestamp.to_string());
        self
    }

    fn header_map(&self) -> HeaderMap {
        self.headers
            .iter()
            .filter_map(|(k, v)| {
                Some((
                    HeaderName::from_bytes(k.as_bytes()).ok()?,
                    HeaderValue::from_str(v).ok()?,
                ))
            })
            .collect()
    }

    fn into_page(self, url: &str) -> StargazerResult<Page<StargazerEvent>> {
        let headers = self.header_map();
        match StatusCode::from_u16(self.status) {
            Ok(status) if status.is_success() => decode_page(url, &headers, self.body.as_bytes()),
            Ok(status) => Err(classify_error_response(status, &headers, self.body.as_bytes(), url)),
            Err(_) => Err(StargazerError::transport(
                url,
                format!("invalid status code {}", self.status),
            )),
        }
    }
}

/// One scripted reply.
#[derive(Debug, Clone)]
enum MockReply {
    Response(MockResponse),
    TransportFailure(String),
}

/// Behavior once the script is exhausted.
#[derive(Debug, Clone, Copy, Default)]
pub enum DefaultBehavior {
    /// Answer 404.
    #[default]
    NotFound,
    /// Fail as if the connection was refused.
    TransportFailure,
    /// Panic.
    Panic,
}

/// Page fetcher that replays a script, in order, one reply per call.
#[derive(Debug, Clone, Default)]
pub struct MockPageFetcher {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<String>>>,
    default_behavior: DefaultBehavior,
}

impl MockPageFetcher {
    /// Creates a fetcher with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the behavior once the script is exhausted.
    pub fn with_default_behavior(mut self, behavior: DefaultBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Appends a response to the script.
    pub fn push(&self, response: MockResponse) {
        lock(&self.script).push_back(MockReply::Response(response));
    }

    /// Appends a network-level failure to the script.
    pub fn push_transport_failure(&self, cause: &str) {
        lock(&self.script).push_back(MockReply::TransportFailure(cause.to_string()));
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_page(&self, url: &str) -> StargazerResult<Page<StargazerEvent>> {
        lock(&self.requests).push(url.to_string());

        let reply = lock(&self.script).pop_front();
        match reply {
            Some(MockReply::Response(response)) => {
                if let Some(delay) = response.delay {
                    tokio::time::sleep(delay).await;
                }
                response.into_page(url)
            }
            Some(MockReply::TransportFailure(cause)) => Err(StargazerError::transport(url, cause)),
            None => match self.default_behavior {
                DefaultBehavior::NotFound => MockResponse::not_found("Not Found").into_page(url),
                DefaultBehavior::TransportFailure => {
                    Err(StargazerError::transport(url, "Connection refused"))
                }
                DefaultBehavior::Panic => panic!("No mock response for GET {}", url),
            },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
