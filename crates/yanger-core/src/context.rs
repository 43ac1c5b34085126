// ── Collector context ──
//
// Everything a collector needs for one run. Passed explicitly; there is
// no process-global host.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use yanger_host::Host;

/// Default directory of the status helper programs.
pub const DEFAULT_LIBEXEC: &str = "/usr/libexec/statd";

pub struct Context<'h> {
    host: &'h dyn Host,
    libexec: PathBuf,
}

impl<'h> Context<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self {
            host,
            libexec: PathBuf::from(DEFAULT_LIBEXEC),
        }
    }

    /// Use `dir` for helper programs such as `ospf-status`.
    #[must_use]
    pub fn with_libexec(mut self, dir: impl Into<PathBuf>) -> Self {
        self.libexec = dir.into();
        self
    }

    pub fn host(&self) -> &'h dyn Host {
        self.host
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.host.now()
    }

    /// Absolute path of helper program `name`.
    pub fn helper(&self, name: &str) -> String {
        Path::new(&self.libexec).join(name).display().to_string()
    }

    /// Entries of directory `dir`, sorted. Empty when it cannot be listed.
    pub fn list_dir(&self, dir: &str) -> Vec<String> {
        let mut entries: Vec<String> = self
            .host
            .run_multiline(&["ls", dir])
            .unwrap_or_default()
            .into_iter()
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect();
        entries.sort();
        entries
    }

    /// Resolved target of symlink `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let target = self.host.run(&["readlink", "-f", path]).ok()?;
        let target = target.trim();
        (!target.is_empty()).then(|| target.to_owned())
    }

    /// Last path component of the target of symlink `path`.
    pub fn link_basename(&self, path: &str) -> Option<String> {
        let target = self.resolve(path)?;
        target.rsplit('/').next().map(str::to_owned)
    }
}
