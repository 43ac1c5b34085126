// Recorded-input fixtures built in a temp dir.

#![allow(clippy::unwrap_used)]

use std::fs;

use tempfile::TempDir;

use yanger_host::{ReplayHost, slug};

pub(crate) struct Recording {
    dir: TempDir,
}

impl Recording {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Record stdout of `argv`.
    pub(crate) fn run(self, argv: &[&str], stdout: &str) -> Self {
        let dir = self.dir.path().join("run");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(slug(argv)), stdout).unwrap();
        self
    }

    /// Record the content of file `path`.
    pub(crate) fn file(self, path: &str, content: &str) -> Self {
        let target = self.dir.path().join("rootfs").join(path.trim_start_matches('/'));
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
        self
    }

    pub(crate) fn host(&self) -> ReplayHost {
        ReplayHost::new(self.dir.path())
    }
}
