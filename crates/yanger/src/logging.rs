//! Tracing setup.
//!
//! Logs never go to stdout. Live runs send them to syslog on `/dev/log`
//! as `<pri>yanger[pid]: message` with facility daemon; replay runs, and
//! hosts without a syslog socket, log to stderr.

use std::io::{self, Write};
use std::os::unix::net::UnixDatagram;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use yanger_config::LogSettings;

const SYSLOG_SOCKET: &str = "/dev/log";
const IDENT: &str = "yanger";
const FACILITY_DAEMON: u8 = 3;

/// RFC 3164 severity of a tracing level.
pub fn severity(level: Level) -> u8 {
    match level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

/// Default filter for a `-v` count, falling back to the configured level.
pub fn filter_for(verbosity: u8, configured: &str) -> &str {
    match verbosity {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// ── Syslog writer ────────────────────────────────────────────────────

/// Connected datagram socket to the local syslog daemon.
pub struct Syslog {
    socket: UnixDatagram,
    pid: u32,
}

impl Syslog {
    pub fn connect() -> Option<Self> {
        let socket = UnixDatagram::unbound().ok()?;
        socket.connect(SYSLOG_SOCKET).ok()?;
        Some(Self {
            socket,
            pid: std::process::id(),
        })
    }

    fn writer(&self, severity: u8) -> SyslogWriter<'_> {
        SyslogWriter {
            syslog: self,
            severity,
            buf: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for Syslog {
    type Writer = SyslogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(severity(Level::INFO))
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(severity(*meta.level()))
    }
}

/// Buffers one formatted event and sends it as a single datagram.
pub struct SyslogWriter<'a> {
    syslog: &'a Syslog,
    severity: u8,
    buf: Vec<u8>,
}

/// Syslog line for `message`.
pub fn frame(severity: u8, pid: u32, message: &str) -> String {
    let pri = FACILITY_DAEMON * 8 + severity;
    format!("<{pri}>{IDENT}[{pid}]: {}", message.trim_end())
}

impl Write for SyslogWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogWriter<'_> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = frame(self.severity, self.syslog.pid, &String::from_utf8_lossy(&self.buf));
        // Nowhere left to report a failing syslog.
        let _ = self.syslog.socket.send(line.as_bytes());
    }
}

// ── Init ─────────────────────────────────────────────────────────────

/// Install the global subscriber. `replay` forces stderr output.
pub fn init(verbosity: u8, settings: &LogSettings, replay: bool) {
    let default = filter_for(verbosity, &settings.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false);

    let syslog = (settings.syslog && !replay)
        .then(Syslog::connect)
        .flatten();
    match syslog {
        Some(syslog) => builder
            .without_time()
            .with_level(false)
            .with_writer(syslog)
            .init(),
        None => builder.with_writer(io::stderr).init(),
    }
}
