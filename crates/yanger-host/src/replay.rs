// Replay host
//
// Serves commands and files from a recorded directory:
//
//   <base>/run/<slug>      stdout of a command
//   <base>/rootfs/<path>   content of an absolute path
//
// The slug rule is frozen; recorded test trees depend on it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tracing::{debug, error};

use crate::error::HostError;
use crate::host::Host;

/// Map an argv to its recording filename: join with `_`, then `/`→`+`
/// and space→`-`.
pub fn slug(argv: &[&str]) -> String {
    argv.join("_").replace('/', "+").replace(' ', "-")
}

/// Location of `path` inside a recorded rootfs.
pub fn rootfs_path(base: &Path, path: &str) -> PathBuf {
    base.join("rootfs").join(path.trim_start_matches('/'))
}

/// Location of the capture for `argv` inside a recorded directory.
pub fn run_path(base: &Path, argv: &[&str]) -> PathBuf {
    base.join("run").join(slug(argv))
}

/// The fixed instant every replay run observes.
pub fn replay_now() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
        .fixed_offset()
}

/// Host that replays a recorded directory.
#[derive(Debug, Clone)]
pub struct ReplayHost {
    base: PathBuf,
}

impl ReplayHost {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The recorded directory this host reads from.
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl Host for ReplayHost {
    fn now(&self) -> DateTime<FixedOffset> {
        replay_now()
    }

    fn run(&self, argv: &[&str]) -> Result<String, HostError> {
        if argv.is_empty() {
            return Err(HostError::EmptyCommand);
        }
        let path = run_path(&self.base, argv);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let slug = slug(argv);
                debug!(%slug, "no recording");
                Err(HostError::MissingRecording { slug })
            }
            Err(source) => Err(HostError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn read(&self, path: &str) -> Option<String> {
        let local = rootfs_path(&self.base, path);
        match std::fs::read(&local) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).trim().to_owned()),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                error!(path, error = %err, "failed reading recorded file");
                None
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(rootfs_path(&self.base, path)).is_ok()
    }
}
