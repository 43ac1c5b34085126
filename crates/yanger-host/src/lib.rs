//! Host abstraction for the yanger operational-state collectors.
//!
//! Collectors never touch the system directly; they go through a
//! [`Host`], which can be:
//!
//! - **[`LiveHost`]**: runs external tools (no shell, stdin closed, stderr
//!   discarded) with a bounded wait per command, and reads real files.
//! - **[`ReplayHost`]**: answers from a recorded directory
//!   (`<base>/run/<slug>` and `<base>/rootfs/<path>`) and reports a fixed
//!   `now()`, which makes every collector a pure function of its inputs.
//! - **[`CaptureHost`]**: decorates another host and writes what it sees
//!   into the recorded layout, producing fixtures from a live system.

pub mod capture;
pub mod error;
pub mod host;
pub mod live;
pub mod replay;

pub use capture::CaptureHost;
pub use error::HostError;
pub use host::Host;
pub use live::{LiveHost, Timeouts};
pub use replay::{ReplayHost, replay_now, slug};
