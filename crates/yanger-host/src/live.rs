// Live host
//
// Executes commands on the running system. Every command gets a bounded
// wait: the child is spawned on a private current-thread tokio runtime and
// raced against `tokio::time::timeout`; on expiry the child is killed and
// the call reports `HostError::Timeout`.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::{debug, error, trace};

use crate::error::HostError;
use crate::host::{Host, command_line};

/// Programs that only probe the filesystem and get the short budget.
const PROBE_PROGRAMS: &[&str] = &["ls", "readlink", "realpath", "cat", "hostname"];

/// Per-command wait budgets.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Budget for regular external tools.
    pub command: Duration,
    /// Budget for trivial filesystem probes.
    pub probe: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(5),
            probe: Duration::from_secs(1),
        }
    }
}

impl Timeouts {
    fn budget_for(&self, program: &str) -> Duration {
        let name = program.rsplit('/').next().unwrap_or(program);
        if PROBE_PROGRAMS.contains(&name) {
            self.probe
        } else {
            self.command
        }
    }
}

/// Host backed by the real system.
pub struct LiveHost {
    runtime: Runtime,
    timeouts: Timeouts,
}

impl LiveHost {
    /// Create a live host with the given wait budgets.
    pub fn new(timeouts: Timeouts) -> Result<Self, HostError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .enable_io()
            .build()
            .map_err(HostError::Runtime)?;
        Ok(Self { runtime, timeouts })
    }

    /// The configured wait budgets.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    async fn execute(
        program: &str,
        args: &[&str],
        budget: Duration,
        command: String,
    ) -> Result<String, HostError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HostError::Spawn {
                command: command.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| HostError::Io {
                path: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(HostError::Timeout {
                    command,
                    timeout_secs: budget.as_secs().max(1),
                });
            }
        };

        if !output.status.success() {
            return Err(HostError::Exit {
                command,
                status: output.status.code().unwrap_or(-1),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Host for LiveHost {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }

    fn run(&self, argv: &[&str]) -> Result<String, HostError> {
        let (program, args) = argv.split_first().ok_or(HostError::EmptyCommand)?;
        let command = command_line(argv);
        let budget = self.timeouts.budget_for(program);
        trace!(%command, budget_ms = budget.as_millis(), "running");

        let result = self
            .runtime
            .block_on(Self::execute(program, args, budget, command.clone()));
        match result {
            Err(ref err) if err.is_expected() => debug!(%command, error = %err, "command failed"),
            Err(ref err) => error!(%command, error = %err, "command failed"),
            Ok(_) => {}
        }
        result
    }

    fn read(&self, path: &str) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).trim().to_owned()),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                error!(path, error = %err, "failed reading file");
                None
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        std::path::Path::new(path).try_exists().unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn probes_get_the_short_budget() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.budget_for("ls"), Duration::from_secs(1));
        assert_eq!(timeouts.budget_for("/usr/bin/readlink"), Duration::from_secs(1));
        assert_eq!(timeouts.budget_for("vtysh"), Duration::from_secs(5));
    }

    #[test]
    fn empty_argv_is_rejected() {
        let host = LiveHost::new(Timeouts::default()).unwrap();
        assert!(matches!(host.run(&[]), Err(HostError::EmptyCommand)));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let host = LiveHost::new(Timeouts::default()).unwrap();
        let err = host.run(&["/nonexistent/yanger-test-tool"]).unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
        assert!(err.is_expected());
    }

    #[test]
    fn read_of_absent_file_is_none() {
        let host = LiveHost::new(Timeouts::default()).unwrap();
        assert_eq!(host.read("/nonexistent/yanger/file"), None);
        assert!(!host.exists("/nonexistent/yanger/file"));
    }

    #[test]
    fn read_trims_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mtu");
        std::fs::write(&path, "1500\n").unwrap();

        let host = LiveHost::new(Timeouts::default()).unwrap();
        assert_eq!(host.read(path.to_str().unwrap()).as_deref(), Some("1500"));
    }
}
