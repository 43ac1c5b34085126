//! Command-line front end of yanger.
//!
//! - **`yanger <model>`** runs one collector and prints its JSON.
//! - **`yanger-iw <query>`** prints the structured view of `iw`.
//!
//! Both read settings through `yanger-config`, pick a live, replay
//! (`-t`) or capturing (`--capture`) host, and log to syslog or stderr.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
