//! Command-line entry point: export the stargazers of one repository.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use github_stargazers::observability::{LogFormat, LoggingConfig};
use github_stargazers::{
    ExportWriter, RepositoryIdentifier, StargazerConfig, StargazerError, StargazerResult,
    StargazersService,
};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "github-stargazers")]
#[command(version)]
#[command(about = "Retrieve the stargazers of a GitHub repository into a CSV file")]
#[command(after_long_help = r#"EXAMPLES
    Export the stargazers of octocat/hello-world into the current directory:
        $ github-stargazers --repo octocat/hello-world

ENVIRONMENT VARIABLES
    GITHUB_STARGAZERS_API_URL       API base URL (default: https://api.github.com)
    GITHUB_STARGAZERS_USER_AGENT    User-Agent header
    GITHUB_STARGAZERS_TIMEOUT_SECS  Per-request timeout in seconds
    RUST_LOG                        Log filter, overrides --verbose
"#)]
struct Cli {
    /// Repository of interest, as owner/repo
    #[arg(long)]
    repo: String,

    /// Directory the CSV file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// User-Agent header sent to the API
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

/// What a successful run produced.
enum Report {
    Generated(PathBuf),
    Empty(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    if let Err(e) = LoggingConfig::default()
        .with_level(level)
        .with_format(cli.log_format)
        .init()
    {
        eprintln!("{}", e);
    }

    let cancel = CancellationToken::new();
    setup_shutdown_handler(cancel.clone());

    match run(&cli, cancel).await {
        Ok(Report::Generated(path)) => {
            println!("{} generated successfully", path.display());
            ExitCode::SUCCESS
        }
        Ok(Report::Empty(name)) => {
            println!("Could not generate stargazers for {}", name);
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("{}", user_message(&error));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, cancel: CancellationToken) -> StargazerResult<Report> {
    let repository = RepositoryIdentifier::parse(&cli.repo)?;
    let config = build_config(cli)?;

    let outcome = StargazersService::new(config)
        .with_cancellation(cancel)
        .list(&repository)
        .await?;

    if let Some(interruption) = &outcome.interruption {
        tracing::warn!(
            error = %interruption,
            records = outcome.records.len(),
            "Exporting partial results"
        );
    }

    if outcome.records.is_empty() {
        return Ok(Report::Empty(repository.name().to_string()));
    }

    let path = ExportWriter::new(&cli.output_dir).write(&repository, &outcome.records)?;
    Ok(Report::Generated(path))
}

fn build_config(cli: &Cli) -> StargazerResult<StargazerConfig> {
    let mut config = StargazerConfig::from_env()?;

    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(ua) = &cli.user_agent {
        config.user_agent = ua.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

/// One line for the user. Errors the user can act on are shown as-is.
fn user_message(error: &StargazerError) -> String {
    match error {
        StargazerError::InvalidIdentifier { .. }
        | StargazerError::RateLimitExceeded { .. }
        | StargazerError::ResourceNotFound { .. } => error.to_string(),
        _ => format!("Error generating file: {}", error),
    }
}

/// Cancels the run on Ctrl+C; whatever was fetched so far is still exported.
fn setup_shutdown_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested, finishing with the stargazers fetched so far");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_parses_repo() {
        let cli = Cli::try_parse_from(["github-stargazers", "--repo", "octocat/hello-world"]).unwrap();
        assert_eq!(cli.repo, "octocat/hello-world");
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_cli_requires_repo() {
        assert!(Cli::try_parse_from(["github-stargazers"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "github-stargazers",
            "--repo",
            "a/b",
            "--api-url",
            "http://127.0.0.1:1",
            "--timeout",
            "3",
        ])
        .unwrap();

        let config = build_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:1");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            user_message(&StargazerError::invalid_identifier("foo")),
            "Argument should be of form username/repository."
        );
        assert_eq!(
            user_message(&StargazerError::transport("http://x", "boom")),
            "Error generating file: An error occurred while requesting http://x: boom"
        );
        assert_eq!(
            user_message(&StargazerError::configuration("Base URL must use http or https")),
            "Error generating file: Invalid configuration: Base URL must use http or https"
        );
    }

    #[tokio::test]
    async fn test_not_found_prints_single_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let cli = Cli::try_parse_from([
            "github-stargazers",
            "--repo",
            "octocat/missing",
            "--api-url",
            &server.uri(),
        ])
        .unwrap();

        let error = match run(&cli, CancellationToken::new()).await {
            Err(error) => error,
            Ok(_) => panic!("expected a not found error"),
        };

        let message = user_message(&error);
        assert_eq!(
            message,
            format!(
                "Resource not found: {}/repos/octocat/missing/stargazers?per_page=100",
                server.uri()
            )
        );
        assert_eq!(message.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_repo_fails_before_any_request() {
        let cli = Cli::try_parse_from(["github-stargazers", "--repo", "foo/"]).unwrap();
        let result = run(&cli, CancellationToken::new()).await;
        assert!(matches!(result, Err(StargazerError::InvalidIdentifier { .. })));
    }
}
