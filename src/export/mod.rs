//! CSV export of stargazer records.

use crate::errors::{StargazerError, StargazerResult};
use crate::observability::TracingHooks;
use crate::types::{RepositoryIdentifier, StargazerRecord};
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header row of every export.
pub const COLUMNS: [&str; 4] = ["id", "login", "url", "starred_at"];

/// Writes records as CSV: the [`COLUMNS`] header, then one row per record
/// in the given order.
pub fn write_csv<W: Write>(mut writer: W, records: &[StargazerRecord]) -> io::Result<()> {
    write_row(&mut writer, &COLUMNS)?;

    for record in records {
        let id = record.user_id.to_string();
        let starred_at = record.starred_at_rfc3339();
        write_row(
            &mut writer,
            &[
                id.as_str(),
                record.login.as_str(),
                record.profile_url.as_str(),
                starred_at.as_str(),
            ],
        )?;
    }

    writer.flush()
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// `stargazers-{owner}-{name}-{YYYYmmddHHMMSS}.csv`
pub fn export_filename(repository: &RepositoryIdentifier, at: DateTime<Local>) -> String {
    format!(
        "stargazers-{}-{}-{}.csv",
        repository.owner(),
        repository.name(),
        at.format("%Y%m%d%H%M%S")
    )
}

/// Writes export files into a directory.
#[derive(Debug, Clone)]
pub struct ExportWriter {
    output_dir: PathBuf,
}

impl Default for ExportWriter {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ExportWriter {
    /// Creates a writer targeting `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Gets the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `records` to a freshly named file and returns its path.
    pub fn write(
        &self,
        repository: &RepositoryIdentifier,
        records: &[StargazerRecord],
    ) -> StargazerResult<PathBuf> {
        self.write_at(repository, records, Local::now())
    }

    /// Like [`write`](Self::write) with an explicit timestamp for the name.
    pub fn write_at(
        &self,
        repository: &RepositoryIdentifier,
        records: &[StargazerRecord],
        at: DateTime<Local>,
    ) -> StargazerResult<PathBuf> {
        let path = self.output_dir.join(export_filename(repository, at));
        let io_error = |source| StargazerError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_error)?;
        write_csv(BufWriter::new(file), records).map_err(io_error)?;

        TracingHooks::on_export_written(&path, records.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(id: u64, login: &str) -> StargazerRecord {
        StargazerRecord {
            user_id: id,
            login: login.to_string(),
            profile_url: format!("https://api.github.com/users/{}", login),
            starred_at: Utc.with_ymd_and_hms(2011, 1, 21, 19, 20, 24).unwrap(),
        }
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record(70, "schacon"), record(1, "octocat")]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,login,url,starred_at\r\n\
             70,schacon,https://api.github.com/users/schacon,2011-01-21T19:20:24Z\r\n\
             1,octocat,https://api.github.com/users/octocat,2011-01-21T19:20:24Z\r\n"
        );
    }

    #[test]
    fn test_write_csv_header_only_for_no_records() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,login,url,starred_at\r\n");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_export_filename() {
        let repository = RepositoryIdentifier::parse("octocat/hello-world").unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

        assert_eq!(
            export_filename(&repository, at),
            "stargazers-octocat-hello-world-20240305070809.csv"
        );
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let repository = RepositoryIdentifier::parse("octocat/hello-world").unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

        let path = ExportWriter::new(dir.path())
            .write_at(&repository, &[record(1, "octocat")], at)
            .unwrap();

        assert_eq!(path, dir.path().join("stargazers-octocat-hello-world-20240305070809.csv"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("id,login,url,starred_at"));
    }

    #[test]
    fn test_write_to_missing_directory_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let repository = RepositoryIdentifier::parse("a/b").unwrap();

        let error = ExportWriter::new(&missing).write(&repository, &[]).unwrap_err();

        assert!(matches!(error, StargazerError::Io { ref path, .. } if path.starts_with(&missing)));
    }
}
