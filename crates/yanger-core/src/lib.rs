//! Operational-state collectors for a Linux network device.
//!
//! Each collector reads live state through a [`yanger_host::Host`] and
//! returns a tree shaped after one YANG module (RFC 7951 JSON):
//!
//! - **[`Context`]** carries the host and helper locations for one run.
//! - **[`Model`]** names the supported modules; [`collect`] runs one.
//! - **[`collectors`]** holds the per-module code, **[`iw`]** the
//!   structured view of `iw` used by the wireless parts.
//! - **[`common`]** and **[`yang`]** are the parsing and encoding helpers
//!   shared by all collectors (dates, counters, presence leaves, names).

pub mod collectors;
pub mod common;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod iw;
pub mod yang;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::Context;
pub use dispatch::{Model, collect};
pub use error::CoreError;
