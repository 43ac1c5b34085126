//! Small helpers shared by the collectors.

pub mod names;
pub mod number;
pub mod time;
pub mod tree;
