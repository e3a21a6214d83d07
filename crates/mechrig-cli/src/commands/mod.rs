//! Command implementations

pub mod controls;
pub mod inspect;
pub mod json_output;
pub mod reporting;
pub mod synthesize;
pub mod validate;
