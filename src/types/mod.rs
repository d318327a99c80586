//! Core data types for the stargazers endpoint.

use crate::errors::{StargazerError, StargazerResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentifier {
    owner: String,
    name: String,
}

impl RepositoryIdentifier {
    /// Parses `owner/name`.
    ///
    /// Fails unless the input has exactly one `/` with non-empty text on
    /// both sides. No network access happens here.
    pub fn parse(input: &str) -> StargazerResult<Self> {
        let mut parts = input.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(StargazerError::invalid_identifier(input)),
        }
    }

    /// Repository owner (user or organization login).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositoryIdentifier {
    type Err = StargazerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The user embedded in a star event.
///
/// Only the fields the export needs are decoded; the API sends many more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StargazerUser {
    /// User ID.
    pub id: u64,
    /// Username (login).
    pub login: String,
    /// API URL of the user.
    pub url: String,
}

/// One element of a stargazers page, as returned with the
/// `application/vnd.github.v3.star+json` media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StargazerEvent {
    /// When the star was given.
    pub starred_at: DateTime<Utc>,
    /// Who gave it.
    pub user: StargazerUser,
}

/// A star event projected onto the exported columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StargazerRecord {
    /// User ID.
    pub user_id: u64,
    /// Username.
    pub login: String,
    /// API URL of the user.
    pub profile_url: String,
    /// When the star was given.
    pub starred_at: DateTime<Utc>,
}

impl StargazerRecord {
    /// `starred_at` in the form the API uses (`2011-01-21T19:20:24Z`).
    ///
    /// Fractional seconds are kept; a non-UTC offset is rendered as the same
    /// instant in UTC with a `Z` suffix.
    pub fn starred_at_rfc3339(&self) -> String {
        self.starred_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl From<StargazerEvent> for StargazerRecord {
    fn from(event: StargazerEvent) -> Self {
        Self {
            user_id: event.user.id,
            login: event.user.login,
            profile_url: event.user.url,
            starred_at: event.starred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("foo" ; "no separator")]
    #[test_case("foo/" ; "empty name")]
    #[test_case("/bar" ; "empty owner")]
    #[test_case("/" ; "separator only")]
    #[test_case("//" ; "two separators")]
    #[test_case("" ; "empty input")]
    #[test_case("a/b/c" ; "nested path")]
    fn test_invalid_identifier_is_rejected(input: &str) {
        let err = RepositoryIdentifier::parse(input).unwrap_err();
        assert!(matches!(err, StargazerError::InvalidIdentifier { input: ref rejected } if rejected == input));
        assert_eq!(err.to_string(), "Argument should be of form username/repository.");
    }

    #[test]
    fn test_valid_identifier() {
        let id: RepositoryIdentifier = "octocat/hello-world".parse().unwrap();
        assert_eq!(id.owner(), "octocat");
        assert_eq!(id.name(), "hello-world");
        assert_eq!(id.to_string(), "octocat/hello-world");
    }

    #[test]
    fn test_event_deserialization_and_projection() {
        let raw = r#"{
            "starred_at": "2011-01-21T19:20:24Z",
            "user": {
                "login": "schacon",
                "id": 70,
                "node_id": "MDQ6VXNlcjcw",
                "url": "https://api.github.com/users/schacon",
                "type": "User",
                "site_admin": false
            }
        }"#;

        let event: StargazerEvent = serde_json::from_str(raw).unwrap();
        let record = StargazerRecord::from(event);

        assert_eq!(record.user_id, 70);
        assert_eq!(record.login, "schacon");
        assert_eq!(record.profile_url, "https://api.github.com/users/schacon");
        assert_eq!(record.starred_at_rfc3339(), "2011-01-21T19:20:24Z");
    }

    #[test_case("2011-01-21T19:20:24.250Z", "2011-01-21T19:20:24.250Z" ; "fractional seconds kept")]
    #[test_case("2011-01-21T21:20:24+02:00", "2011-01-21T19:20:24Z" ; "offset normalized to utc")]
    fn test_starred_at_rendering(raw: &str, expected: &str) {
        let event: StargazerEvent = serde_json::from_value(serde_json::json!({
            "starred_at": raw,
            "user": {"login": "schacon", "id": 70, "url": "https://api.github.com/users/schacon"}
        }))
        .unwrap();

        assert_eq!(StargazerRecord::from(event).starred_at_rfc3339(), expected);
    }

    #[test]
    fn test_event_without_starred_at_is_rejected() {
        // What the API returns when the star media type is not requested.
        let raw = r#"{"login": "schacon", "id": 70, "url": "https://api.github.com/users/schacon"}"#;
        assert!(serde_json::from_str::<StargazerEvent>(raw).is_err());
    }
}
