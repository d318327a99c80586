//! Stargazer listing.

use crate::client::{PageFetcher, StargazerClient};
use crate::config::StargazerConfig;
use crate::errors::StargazerResult;
use crate::pagination::{PaginationDriver, PaginationOutcome};
use crate::types::{RepositoryIdentifier, StargazerRecord};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Service for listing the stargazers of a repository.
///
/// Every call opens its own [`StargazerClient`] and closes it before
/// returning, whichever way the run ends.
#[derive(Debug, Clone, Default)]
pub struct StargazersService {
    config: StargazerConfig,
    cancel: Option<CancellationToken>,
}

impl StargazersService {
    /// Creates a new stargazers service.
    pub fn new(config: StargazerConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Ends runs early (keeping partial results) when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Gets the configuration.
    pub fn config(&self) -> &StargazerConfig {
        &self.config
    }

    /// Lists every stargazer of `repository`.
    #[instrument(skip_all, fields(repository = %repository))]
    pub async fn list(&self, repository: &RepositoryIdentifier) -> StargazerResult<PaginationOutcome> {
        let client = StargazerClient::new(self.config.clone())?;
        let outcome = self.list_with(&client, repository).await;
        drop(client);
        outcome
    }

    /// Lists every stargazer of `repository` and returns only the records.
    pub async fn list_records(
        &self,
        repository: &RepositoryIdentifier,
    ) -> StargazerResult<Vec<StargazerRecord>> {
        Ok(self.list(repository).await?.records)
    }

    /// Runs the pagination against any fetcher.
    pub async fn list_with<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        repository: &RepositoryIdentifier,
    ) -> StargazerResult<PaginationOutcome> {
        let mut driver = PaginationDriver::new(fetcher);
        if let Some(token) = &self.cancel {
            driver = driver.with_cancellation(token.clone());
        }

        driver.run(self.config.stargazers_url(repository)).await
    }
}
