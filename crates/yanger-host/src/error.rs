use thiserror::Error;

/// Error type for every host operation.
///
/// Collectors treat most of these as "no data" and fall back to a default;
/// only [`Io`](Self::Io) is considered unexpected and worth an error log.
#[derive(Debug, Error)]
pub enum HostError {
    // ── Command execution ───────────────────────────────────────────
    /// `run()` was called with an empty argv.
    #[error("Empty command line")]
    EmptyCommand,

    /// The program could not be started (missing binary, permissions).
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited with a non-zero status.
    /// `status` is `-1` when the process was killed by a signal.
    #[error("`{command}` exited with status {status}")]
    Exit { command: String, status: i32 },

    /// The program did not finish within its budget and was killed.
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// The async runtime backing the live host could not be created.
    #[error("Cannot start command runtime: {0}")]
    Runtime(#[source] std::io::Error),

    // ── Replay ──────────────────────────────────────────────────────
    /// No capture exists under `<base>/run/` for this command.
    #[error("No recording for `{slug}`")]
    MissingRecording { slug: String },

    // ── Files ───────────────────────────────────────────────────────
    /// File does not exist.
    #[error("{path}: no such file")]
    NotFound { path: String },

    /// Unexpected I/O failure while reading or writing a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Output of a command or file content is not valid JSON.
    #[error("Invalid JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HostError {
    /// Returns `true` for outcomes that simply mean "the source has no data"
    /// (tool missing, non-zero exit, timeout, no recording, file absent).
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::Runtime(_))
    }

    /// Returns `true` if the command ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_errors_are_not_io() {
        let exit = HostError::Exit {
            command: "ip link".into(),
            status: 1,
        };
        assert!(exit.is_expected());
        assert!(!exit.is_timeout());

        let io = HostError::Io {
            path: "/proc/uptime".into(),
            source: std::io::Error::other("boom"),
        };
        assert!(!io.is_expected());
    }

    #[test]
    fn timeout_message_carries_budget() {
        let err = HostError::Timeout {
            command: "vtysh -c show bfd peers json".into(),
            timeout_secs: 5,
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "`vtysh -c show bfd peers json` timed out after 5s"
        );
    }
}
