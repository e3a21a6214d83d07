//! Mechanical rig synthesis CLI library
//!
//! Command implementations behind the `mechrig` binary, exposed for tests.

pub mod commands;
pub mod input;
