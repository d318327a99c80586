//! HTTP page fetcher for the stargazers endpoint.

pub mod classify;

use crate::config::StargazerConfig;
use crate::errors::{StargazerError, StargazerResult};
use crate::observability::TracingHooks;
use crate::pagination::{Page, PaginationLinks};
use crate::types::StargazerEvent;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Instant;

pub use classify::{classify_error_response, extract_rate_limit, RATE_LIMIT_MESSAGE};

/// Fetches one page of stargazer events.
///
/// Implementations make a single attempt per call; retry policy belongs to
/// whoever drives them.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Requests `url` and returns its events plus pagination links.
    async fn fetch_page(&self, url: &str) -> StargazerResult<Page<StargazerEvent>>;
}

/// Stargazers API client.
///
/// Holds one pooled HTTP connection set. Meant to live for exactly one
/// pagination run; dropping it closes the pool.
pub struct StargazerClient {
    /// HTTP client.
    http: Client,
    /// Configuration.
    config: StargazerConfig,
}

impl StargazerClient {
    /// Creates a new client.
    pub fn new(config: StargazerConfig) -> StargazerResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).map_err(|e| {
                StargazerError::configuration(format!("Invalid Accept header: {}", e))
            })?,
        );
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                StargazerError::configuration(format!("Invalid User-Agent header: {}", e))
            })?,
        );

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .pool_idle_timeout(config.pool.idle_timeout)
            .build()
            .map_err(|e| {
                StargazerError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { http, config })
    }

    /// Gets the configuration.
    pub fn config(&self) -> &StargazerConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for StargazerClient {
    async fn fetch_page(&self, url: &str) -> StargazerResult<Page<StargazerEvent>> {
        let started = Instant::now();

        let response = self.http.get(url).send().await.map_err(|e| {
            let error = StargazerError::transport(url, describe_transport_error(&e));
            TracingHooks::on_request_error(url, &error);
            error
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        TracingHooks::on_response(url, status.as_u16(), started.elapsed());

        let body = response
            .bytes()
            .await
            .map_err(|e| StargazerError::transport(url, describe_transport_error(&e)))?;

        if !status.is_success() {
            return Err(classify_error_response(status, &headers, &body, url));
        }

        decode_page(url, &headers, &body)
    }
}

impl Drop for StargazerClient {
    fn drop(&mut self) {
        TracingHooks::on_client_released(&self.config.base_url);
    }
}

/// Decodes a successful stargazers body and its `Link` header.
///
/// Relative `next` links are resolved against the requested URL.
pub(crate) fn decode_page(
    url: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> StargazerResult<Page<StargazerEvent>> {
    let events: Vec<StargazerEvent> =
        serde_json::from_slice(body).map_err(|e| StargazerError::Deserialization {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let mut links = PaginationLinks::from_headers(headers);
    links.next = links.next.map(|next| resolve_link(url, next));

    Ok(Page::new(events, links))
}

fn resolve_link(base: &str, link: String) -> String {
    match url::Url::parse(base).and_then(|b| b.join(&link)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => link,
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Request timed out: {}", error)
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        format!("Request failed: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::LINK;

    #[test]
    fn test_client_builds_with_defaults() {
        let client = StargazerClient::new(StargazerConfig::default()).unwrap();
        assert_eq!(client.config().base_url, "https://api.github.com");
    }

    #[test]
    fn test_client_rejects_unusable_header_values() {
        let config = StargazerConfig {
            user_agent: "bad\nagent".to_string(),
            ..StargazerConfig::default()
        };
        assert!(matches!(
            StargazerClient::new(config),
            Err(StargazerError::Configuration(_))
        ));
    }

    #[test]
    fn test_decode_page_with_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/repositories/1/stargazers?per_page=100&page=2>; rel="next""#,
            ),
        );
        let body = br#"[{"starred_at":"2011-01-21T19:20:24Z","user":{"id":1,"login":"octocat","url":"https://api.github.com/users/octocat"}}]"#;

        let page = decode_page("https://api.github.com/repos/o/r/stargazers", &headers, body).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(
            page.next_url(),
            Some("https://api.github.com/repositories/1/stargazers?per_page=100&page=2")
        );
    }

    #[test]
    fn test_decode_page_resolves_relative_next() {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_static(r#"</stargazers?page=3>; rel="next""#));

        let page = decode_page("http://127.0.0.1:9000/repos/o/r/stargazers?page=2", &headers, b"[]")
            .unwrap();

        assert_eq!(page.next_url(), Some("http://127.0.0.1:9000/stargazers?page=3"));
    }

    #[test]
    fn test_decode_page_rejects_non_list_body() {
        let result = decode_page("https://x.test/", &HeaderMap::new(), br#"{"message":"hi"}"#);
        assert!(matches!(result, Err(StargazerError::Deserialization { .. })));
    }
}
