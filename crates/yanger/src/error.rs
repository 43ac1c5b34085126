//! CLI error types with miette diagnostics.
//!
//! Every failure ends the run with exit code 1; clap usage errors keep
//! clap's own code.

use miette::Diagnostic;
use thiserror::Error;

use yanger_config::ConfigError;
use yanger_core::{CoreError, Model};
use yanger_host::HostError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("unsupported model: {name}")]
    #[diagnostic(code(yanger::unknown_model), help("Supported models: {available}"))]
    UnknownModel { name: String, available: String },

    #[error("recorded-input directory {path} does not exist")]
    #[diagnostic(
        code(yanger::test_dir),
        help("Expected <dir>/run/<slug> command captures and <dir>/rootfs/<path> files.")
    )]
    TestDir { path: String },

    #[error(transparent)]
    #[diagnostic(code(yanger::collect))]
    Core(CoreError),

    #[error(transparent)]
    #[diagnostic(code(yanger::host))]
    Host(#[from] HostError),

    #[error(transparent)]
    #[diagnostic(
        code(yanger::config),
        help("Check the settings file (--config) and YANGER_* environment variables.")
    )]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render JSON: {0}")]
    #[diagnostic(code(yanger::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        exit_code::GENERAL
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownModel { name } => Self::UnknownModel {
                name,
                available: Model::names().join(", "),
            },
            CoreError::Host(err) => Self::Host(err),
            other => Self::Core(other),
        }
    }
}
