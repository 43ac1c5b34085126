// Capture host
//
// Wraps another host and records everything it returns into the layout
// `ReplayHost` reads, so a live run can be turned into a test fixture.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::error::HostError;
use crate::host::Host;
use crate::replay::{rootfs_path, run_path};

/// Host decorator that writes every successful answer to `base`.
pub struct CaptureHost<H> {
    inner: H,
    base: PathBuf,
}

impl<H: Host> CaptureHost<H> {
    pub fn new(inner: H, base: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            base: base.into(),
        }
    }

    /// The directory captures are written to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn store(target: &Path, content: &str) {
        let result = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(target, content));
        if let Err(err) = result {
            warn!(path = %target.display(), error = %err, "failed writing capture");
        }
    }
}

impl<H: Host> Host for CaptureHost<H> {
    fn now(&self) -> DateTime<FixedOffset> {
        self.inner.now()
    }

    fn run(&self, argv: &[&str]) -> Result<String, HostError> {
        let output = self.inner.run(argv)?;
        Self::store(&run_path(&self.base, argv), &output);
        Ok(output)
    }

    fn read(&self, path: &str) -> Option<String> {
        let content = self.inner.read(path)?;
        Self::store(&rootfs_path(&self.base, path), &content);
        Some(content)
    }

    fn exists(&self, path: &str) -> bool {
        let found = self.inner.exists(path);
        if found {
            let target = rootfs_path(&self.base, path);
            if std::path::Path::new(path).is_dir() {
                if let Err(err) = std::fs::create_dir_all(&target) {
                    warn!(path = %target.display(), error = %err, "failed creating capture dir");
                }
            } else if !target.exists() {
                Self::store(&target, "");
            }
        }
        found
    }
}
