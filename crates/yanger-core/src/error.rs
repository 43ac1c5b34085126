// ── Core error ──

use thiserror::Error;

use yanger_host::HostError;

/// Failures that can end a collector run. Source failures inside a
/// collector are folded into defaults and never reach this type.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported model: {name}")]
    UnknownModel { name: String },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("failed to build JSON output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("internal error: {message}")]
    Internal { message: String },
}
