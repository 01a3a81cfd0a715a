//! Notmuch index client
//!
//! This module wraps the `notmuch` command line interface behind the
//! [`Index`] trait so the sync engine can be exercised against any index
//! implementation. The real client shells out to the binary for searching
//! (`notmuch show --format=json`), refreshing (`notmuch new`), and database
//! path discovery (`notmuch config get database.path`).

use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// The notmuch binary could not be spawned at all
    #[error("failed to invoke `{command}`: {source}")]
    Invoke {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The notmuch binary ran but reported failure
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The notmuch binary produced output we could not interpret
    #[error("unexpected notmuch output: {0}")]
    Malformed(String),
}

/// A message produced by a query, with just enough metadata to move and
/// report it. Handles are transient; they are consumed within the rule
/// iteration that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMatch {
    pub id: String,
    /// Path of the message file on disk
    pub filename: PathBuf,
    /// Tags currently attached to the message in the index
    pub tags: Vec<String>,
    pub subject: String,
    pub sender: String,
    pub date_relative: String,
}

impl MessageMatch {
    /// One-line description used in move reports
    pub fn summary(&self) -> String {
        format!("[{}] {}: {}", self.date_relative, self.sender, self.subject)
    }
}

/// Query and refresh operations against a mail index
pub trait Index {
    /// Run a query and return all matching messages (finite, one-shot)
    fn search(&self, query: &str) -> Result<Vec<MessageMatch>, IndexError>;

    /// Re-index the mail store so moved files are picked up
    fn refresh(&self) -> Result<(), IndexError>;
}

/// Index client backed by the `notmuch` binary
pub struct NotmuchClient {
    program: String,
}

impl NotmuchClient {
    pub fn new() -> Self {
        Self {
            program: "notmuch".to_string(),
        }
    }

    /// Use a different binary name or path, e.g. from a test harness
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Report the notmuch version string, e.g. "notmuch 0.38.3"
    pub fn version(&self) -> Result<String, IndexError> {
        let output = self.run(&["--version"])?;
        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }

    /// Ask notmuch for the root of the mail store.
    ///
    /// Used as the fallback when the configuration does not pin a maildir
    /// location.
    pub fn database_path(&self) -> Result<PathBuf, IndexError> {
        let output = self.run(&["config", "get", "database.path"])?;
        let path = String::from_utf8_lossy(&output).trim().to_string();

        if path.is_empty() {
            return Err(IndexError::Malformed(
                "notmuch reported an empty database.path".to_string(),
            ));
        }

        Ok(PathBuf::from(path))
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, IndexError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("running: {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| IndexError::Invoke {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(IndexError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for NotmuchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for NotmuchClient {
    fn search(&self, query: &str) -> Result<Vec<MessageMatch>, IndexError> {
        // `notmuch show` is the one surface that reports filename and tags
        // per matching message in a single call.
        let stdout = self.run(&[
            "show",
            "--format=json",
            "--body=false",
            "--entire-thread=false",
            "--",
            query,
        ])?;

        parse_show_output(&stdout)
    }

    fn refresh(&self) -> Result<(), IndexError> {
        self.run(&["new"]).map(|_| ())
    }
}

/// Parse the thread forest printed by `notmuch show --format=json`.
///
/// The output nests messages as `[message, [replies...]]` pairs inside
/// per-thread arrays; messages are the only objects carrying both a
/// `filename` and a `tags` key.
fn parse_show_output(stdout: &[u8]) -> Result<Vec<MessageMatch>, IndexError> {
    if stdout.iter().all(|b| b.is_ascii_whitespace()) {
        // No matches: notmuch prints nothing rather than an empty array
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_slice(stdout)
        .map_err(|err| IndexError::Malformed(format!("invalid JSON from notmuch show: {err}")))?;

    let mut matches = Vec::new();
    collect_messages(&value, &mut matches)?;
    Ok(matches)
}

fn collect_messages(value: &Value, out: &mut Vec<MessageMatch>) -> Result<(), IndexError> {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_messages(item, out)?;
            }
        }
        Value::Object(map) if map.contains_key("filename") && map.contains_key("tags") => {
            // Only messages that actually matched the query; with
            // --entire-thread=false notmuch emits nulls for the rest.
            if map.get("match").and_then(Value::as_bool) == Some(false) {
                return Ok(());
            }
            out.push(parse_message(map)?);
        }
        _ => {}
    }
    Ok(())
}

fn parse_message(map: &serde_json::Map<String, Value>) -> Result<MessageMatch, IndexError> {
    // notmuch < 0.29 reports a single filename string, newer versions an
    // array of all copies of the message.
    let filename = match map.get("filename") {
        Some(Value::String(path)) => PathBuf::from(path),
        Some(Value::Array(paths)) => paths
            .first()
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| {
                IndexError::Malformed("message with empty filename list".to_string())
            })?,
        _ => {
            return Err(IndexError::Malformed(
                "message without a usable filename".to_string(),
            ))
        }
    };

    let tags = map
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let headers = map.get("headers").and_then(Value::as_object);
    let header = |name: &str| -> String {
        headers
            .and_then(|h| h.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(MessageMatch {
        id: map
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        filename,
        tags,
        subject: header("Subject"),
        sender: header("From"),
        date_relative: map
            .get("date_relative")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
