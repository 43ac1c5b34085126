// Host trait
//
// The narrow interface every collector talks to. Implementations decide
// whether a command really runs (`LiveHost`), comes from a recorded
// directory (`ReplayHost`), or runs and is written to disk (`CaptureHost`).

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HostError;

/// Source of commands, files, and time for a single collector run.
///
/// Failures are returned as `Err`; the caller decides the fallback
/// (usually `unwrap_or_default()`) at the call site.
pub trait Host {
    /// Current instant, always carrying an explicit UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Run `argv` (no shell) and return its stdout.
    fn run(&self, argv: &[&str]) -> Result<String, HostError>;

    /// Read a file, trimmed. `None` when the file does not exist or
    /// cannot be read.
    fn read(&self, path: &str) -> Option<String>;

    /// Check whether `path` exists.
    fn exists(&self, path: &str) -> bool;

    /// Run `argv` and split stdout into lines.
    fn run_multiline(&self, argv: &[&str]) -> Result<Vec<String>, HostError> {
        Ok(self.run(argv)?.lines().map(str::to_owned).collect())
    }

    /// Run `argv` and parse stdout as JSON.
    fn run_json(&self, argv: &[&str]) -> Result<Value, HostError> {
        let text = self.run(argv)?;
        serde_json::from_str(&text).map_err(|source| HostError::Json {
            origin: argv.join(" "),
            source,
        })
    }

    /// Read a file and parse it as JSON.
    fn read_json(&self, path: &str) -> Result<Value, HostError> {
        let text = self.read(path).ok_or_else(|| HostError::NotFound {
            path: path.to_owned(),
        })?;
        serde_json::from_str(&text).map_err(|source| HostError::Json {
            origin: path.to_owned(),
            source,
        })
    }
}

impl dyn Host + '_ {
    /// Run `argv` and deserialize stdout into `T`.
    pub fn run_json_as<T: DeserializeOwned>(&self, argv: &[&str]) -> Result<T, HostError> {
        let value = self.run_json(argv)?;
        serde_json::from_value(value).map_err(|source| HostError::Json {
            origin: argv.join(" "),
            source,
        })
    }

    /// Read a file and deserialize it into `T`.
    pub fn read_json_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, HostError> {
        let value = self.read_json(path)?;
        serde_json::from_value(value).map_err(|source| HostError::Json {
            origin: path.to_owned(),
            source,
        })
    }
}

/// Human-readable rendering of an argv for logs and errors.
pub(crate) fn command_line(argv: &[&str]) -> String {
    argv.join(" ")
}
