//! Configuration types for the stargazers client.

use crate::errors::{StargazerError, StargazerResult};
use crate::types::RepositoryIdentifier;
use std::time::Duration;

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Media type that makes the API embed `starred_at` next to each user.
pub const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

/// Largest page size the API accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = concat!("github-stargazers/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "GITHUB_STARGAZERS_API_URL";

/// Environment variable overriding the User-Agent.
pub const ENV_USER_AGENT: &str = "GITHUB_STARGAZERS_USER_AGENT";

/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GITHUB_STARGAZERS_TIMEOUT_SECS";

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host.
    pub max_idle_per_host: usize,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 4,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Stargazers client configuration.
#[derive(Debug, Clone)]
pub struct StargazerConfig {
    /// API base URL.
    pub base_url: String,
    /// Page size requested from the API.
    pub per_page: u32,
    /// `Accept` header sent with every page request.
    pub accept: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Connection pool configuration.
    pub pool: PoolConfig,
}

impl Default for StargazerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: MAX_PER_PAGE,
            accept: STAR_MEDIA_TYPE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool: PoolConfig::default(),
        }
    }
}

impl StargazerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> StargazerConfigBuilder {
        StargazerConfigBuilder::new()
    }

    /// Builds a configuration from defaults overlaid with the
    /// `GITHUB_STARGAZERS_*` environment variables.
    pub fn from_env() -> StargazerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> StargazerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(url) = lookup(ENV_API_URL) {
            builder = builder.base_url(url);
        }
        if let Some(ua) = lookup(ENV_USER_AGENT) {
            builder = builder.user_agent(ua);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                StargazerError::configuration(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_TIMEOUT_SECS, secs
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StargazerResult<()> {
        if self.base_url.is_empty() {
            return Err(StargazerError::configuration("Base URL cannot be empty"));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                return Err(StargazerError::configuration(
                    "Base URL must start with http:// or https://",
                ))
            }
        }

        if self.user_agent.is_empty() {
            return Err(StargazerError::configuration("User-Agent is required by GitHub API"));
        }

        if self.per_page == 0 {
            return Err(StargazerError::configuration("per_page must be at least 1"));
        }

        Ok(())
    }

    /// URL of the first stargazers page for a repository.
    pub fn stargazers_url(&self, repository: &RepositoryIdentifier) -> String {
        format!(
            "{}/repos/{}/{}/stargazers?per_page={}",
            self.base_url.trim_end_matches('/'),
            repository.owner(),
            repository.name(),
            self.per_page
        )
    }
}

/// Builder for StargazerConfig.
#[derive(Debug, Default)]
pub struct StargazerConfigBuilder {
    base_url: Option<String>,
    per_page: Option<u32>,
    accept: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool: Option<PoolConfig>,
}

impl StargazerConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the page size.
    pub fn per_page(mut self, per_page: u32) -> Self {
        // GitHub API limits to 100
        self.per_page = Some(per_page.min(MAX_PER_PAGE));
        self
    }

    /// Sets the `Accept` media type.
    pub fn accept(mut self, media_type: impl Into<String>) -> Self {
        self.accept = Some(media_type.into());
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the connection pool configuration.
    pub fn pool(mut self, config: PoolConfig) -> Self {
        self.pool = Some(config);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> StargazerResult<StargazerConfig> {
        let config = StargazerConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            per_page: self.per_page.unwrap_or(MAX_PER_PAGE),
            accept: self.accept.unwrap_or_else(|| STAR_MEDIA_TYPE.to_string()),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            pool: self.pool.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
