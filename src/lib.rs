//! # GitHub Stargazers
//!
//! Lists every stargazer of a GitHub repository through the paginated REST
//! API and exports them to CSV:
//! - Link-header pagination driven as an explicit state machine
//! - Rate limit exhaustion surfaced with its reset time
//! - Partial results kept when the network fails mid-run
//! - One pooled HTTP client per run, released on every exit path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use github_stargazers::{ExportWriter, RepositoryIdentifier, StargazerConfig, StargazersService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = RepositoryIdentifier::parse("octocat/hello-world")?;
//!     let service = StargazersService::new(StargazerConfig::default());
//!
//!     let outcome = service.list(&repository).await?;
//!     let path = ExportWriter::default().write(&repository, &outcome.records)?;
//!     println!("{} generated successfully", path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// HTTP page fetching and error classification
pub mod client;

// Pagination handling
pub mod pagination;

// API Services
pub mod services;

// CSV output
pub mod export;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use client::{PageFetcher, StargazerClient};
pub use config::{StargazerConfig, StargazerConfigBuilder};
pub use errors::{RateLimitInfo, StargazerError, StargazerResult};
pub use export::ExportWriter;
pub use pagination::{Page, PaginationDriver, PaginationLinks, PaginationOutcome, PaginationState};
pub use services::StargazersService;
pub use types::*;
