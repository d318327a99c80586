//! Link-header pagination for the stargazers endpoint.
//!
//! Pages are fetched strictly one after another: the URL of page N+1 is only
//! known once page N has arrived, because the API hands it out in the `Link`
//! response header. A run is a two-state machine ([`PaginationState`]):
//! `Fetching { url }` until the response carries no `next` relation or a
//! tolerated failure ends it early, then `Done`.
//!
//! Failures split in two groups:
//! - rate limit exhaustion and 404 abort the run and reach the caller;
//! - transport failures, cancellation, other HTTP statuses and undecodable
//!   pages end the run with whatever was collected so far, recorded in
//!   [`PaginationOutcome::interruption`].
//!
//! A `next` link naming a page already fetched in the same run ends it the
//! same way, with [`StargazerError::PaginationLoop`].

use crate::client::PageFetcher;
use crate::errors::{StargazerError, StargazerResult};
use crate::observability::TracingHooks;
use crate::types::{StargazerEvent, StargazerRecord};
use reqwest::header::HeaderMap;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Pagination links parsed from Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    /// URL for the next page.
    pub next: Option<String>,
    /// URL for the previous page.
    pub prev: Option<String>,
    /// URL for the first page.
    pub first: Option<String>,
    /// URL for the last page.
    pub last: Option<String>,
}

impl PaginationLinks {
    /// Parses pagination links from the Link header (RFC 8288).
    pub fn from_header(header_value: &str) -> Self {
        let mut links = Self::default();

        for part in header_value.split(',') {
            let mut url = None;
            let mut rels: Vec<String> = Vec::new();

            for segment in part.split(';') {
                let segment = segment.trim();
                if segment.starts_with('<') && segment.ends_with('>') {
                    url = Some(segment[1..segment.len() - 1].to_string());
                } else if let Some(value) = segment.strip_prefix("rel=") {
                    rels.extend(
                        value
                            .trim_matches('"')
                            .split_whitespace()
                            .map(|r| r.to_ascii_lowercase()),
                    );
                }
            }

            let Some(url) = url else { continue };
            for rel in rels {
                match rel.as_str() {
                    "next" => links.next = Some(url.clone()),
                    "prev" => links.prev = Some(url.clone()),
                    "first" => links.first = Some(url.clone()),
                    "last" => links.last = Some(url.clone()),
                    _ => {}
                }
            }
        }

        links
    }

    /// Parses pagination links from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(Self::from_header)
            .unwrap_or_default()
    }

    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Gets the total page count from the last link.
    ///
    /// Informational only; page URLs are never derived from it.
    pub fn total_pages(&self) -> Option<u32> {
        self.last.as_deref().and_then(extract_page_number)
    }
}

/// A single page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Pagination links.
    pub links: PaginationLinks,
}

impl<T> Page<T> {
    /// Creates a new page.
    pub fn new(items: Vec<T>, links: PaginationLinks) -> Self {
        Self { items, links }
    }

    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.links.has_next()
    }

    /// Returns the URL for the next page.
    pub fn next_url(&self) -> Option<&str> {
        self.links.next.as_deref()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the page and returns the items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// State of a pagination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// A page is (about to be) requested from `url`.
    Fetching {
        /// URL of the page to request.
        url: String,
    },
    /// No further requests will be made.
    Done,
}

impl PaginationState {
    /// Returns true once the run has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// What a finished run produced.
#[derive(Debug, Default)]
pub struct PaginationOutcome {
    /// Records from every fetched page, in page order.
    pub records: Vec<StargazerRecord>,
    /// Number of pages successfully fetched.
    pub pages_fetched: u32,
    /// The tolerated failure that ended the run early, if any.
    pub interruption: Option<StargazerError>,
    visited: HashSet<String>,
}

impl PaginationOutcome {
    /// Returns true if the run reached the last page.
    pub fn is_complete(&self) -> bool {
        self.interruption.is_none()
    }

    /// Applies the result of fetching `url` and returns the next state.
    ///
    /// Fatal errors are handed back as `Err`, leaving `self` untouched.
    pub fn apply(
        &mut self,
        url: &str,
        result: StargazerResult<Page<StargazerEvent>>,
    ) -> StargazerResult<PaginationState> {
        match result {
            Ok(page) => {
                self.visited.insert(url.to_string());
                self.pages_fetched += 1;
                if self.pages_fetched == 1 {
                    if let Some(total) = page.links.total_pages() {
                        TracingHooks::on_expected_pages(url, total);
                    }
                }
                TracingHooks::on_page_fetched(url, self.pages_fetched, page.len(), page.has_next());

                let next = page.links.next.clone();
                self.records
                    .extend(page.into_items().into_iter().map(StargazerRecord::from));

                Ok(match next {
                    Some(next) if self.visited.contains(&next) => {
                        self.stop(url, StargazerError::PaginationLoop { url: next })
                    }
                    Some(next) => PaginationState::Fetching { url: next },
                    None => PaginationState::Done,
                })
            }
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => Ok(self.stop(url, error)),
        }
    }

    fn stop(&mut self, url: &str, error: StargazerError) -> PaginationState {
        TracingHooks::on_pagination_stopped(url, &error, self.records.len());
        self.interruption = Some(error);
        PaginationState::Done
    }
}

/// Drives a [`PageFetcher`] from the first page to the last.
pub struct PaginationDriver<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    cancel: Option<CancellationToken>,
}

impl<'a, F: PageFetcher + ?Sized> PaginationDriver<'a, F> {
    /// Creates a driver over a fetcher.
    pub fn new(fetcher: &'a F) -> Self {
        Self {
            fetcher,
            cancel: None,
        }
    }

    /// Stops the run (keeping partial results) when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fetches every page starting at `first_url`.
    pub async fn run(&self, first_url: impl Into<String>) -> StargazerResult<PaginationOutcome> {
        let mut outcome = PaginationOutcome::default();
        let mut state = PaginationState::Fetching {
            url: first_url.into(),
        };

        while let PaginationState::Fetching { url } = state {
            TracingHooks::on_page_request(&url, outcome.pages_fetched + 1);
            let result = self.fetch(&url).await;
            state = outcome.apply(&url, result)?;
        }

        Ok(outcome)
    }

    /// Fetches every page and returns only the records.
    pub async fn collect_all(&self, first_url: impl Into<String>) -> StargazerResult<Vec<StargazerRecord>> {
        Ok(self.run(first_url).await?.records)
    }

    async fn fetch(&self, url: &str) -> StargazerResult<Page<StargazerEvent>> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(StargazerError::Cancelled),
                result = self.fetcher.fetch_page(url) => result,
            },
            None => self.fetcher.fetch_page(url).await,
        }
    }
}

/// Extracts page number from a URL.
pub fn extract_page_number(url: &str) -> Option<u32> {
    url::Url::parse(url).ok().and_then(|u| {
        u.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    })
}
