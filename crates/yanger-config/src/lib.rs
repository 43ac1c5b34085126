//! Runtime settings for yanger.
//!
//! Defaults, then an optional TOML file, then `YANGER_*` environment
//! variables (`__` separates nested keys, e.g. `YANGER_TIMEOUTS__COMMAND=10`).
//! A missing file is fine; a malformed one is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use yanger_host::Timeouts;

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/yanger/yanger.toml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub paths: PathSettings,
}

/// Wait budgets, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutSettings {
    /// Budget for each external tool.
    #[serde(default = "default_command_timeout")]
    pub command: u64,

    /// Budget for trivial filesystem probes.
    #[serde(default = "default_probe_timeout")]
    pub probe: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            command: default_command_timeout(),
            probe: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogSettings {
    /// Default filter when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_level")]
    pub level: String,

    /// Send logs to `/dev/log` when available.
    #[serde(default = "default_syslog")]
    pub syslog: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            syslog: default_syslog(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathSettings {
    /// Directory holding the status helpers (`ospf-status`, ...).
    #[serde(default = "default_libexec")]
    pub libexec: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            libexec: default_libexec(),
        }
    }
}

fn default_command_timeout() -> u64 {
    5
}
fn default_probe_timeout() -> u64 {
    1
}
fn default_level() -> String {
    "warn".into()
}
fn default_syslog() -> bool {
    true
}
fn default_libexec() -> PathBuf {
    PathBuf::from("/usr/libexec/statd")
}

impl Settings {
    /// Wait budgets for the live host.
    pub fn host_timeouts(&self) -> Timeouts {
        Timeouts {
            command: Duration::from_secs(self.timeouts.command),
            probe: Duration::from_secs(self.timeouts.probe),
        }
    }

    /// Render these settings as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.timeouts.command == 0 {
            return Err(ConfigError::Validation {
                field: "timeouts.command".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.timeouts.probe == 0 {
            return Err(ConfigError::Validation {
                field: "timeouts.probe".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(self)
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load settings from `path` (or [`DEFAULT_CONFIG_PATH`]) plus environment.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("YANGER_").split("__"));

    let settings: Settings = figment.extract()?;
    settings.validate()
}

/// Load settings, falling back to defaults on any error.
pub fn load_or_default(path: Option<&Path>) -> Settings {
    load(path).unwrap_or_default()
}
