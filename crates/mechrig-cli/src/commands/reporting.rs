//! Colored diagnostics for human-readable output.

use colored::Colorize;
use mechrig_core::{RigError, RigWarning};

fn at(entity: Option<&str>) -> String {
    entity.map(|e| format!(" at {}", e)).unwrap_or_default()
}

pub fn print_error(err: &RigError) {
    eprintln!(
        "  {} [{}]{}: {}",
        "x".red(),
        err.code().red(),
        at(err.entity()).dimmed(),
        err.message()
    );
}

pub fn print_warnings(warnings: &[RigWarning]) {
    for warning in warnings {
        eprintln!(
            "  {} [{}]{}: {}",
            "!".yellow(),
            warning.code.code().yellow(),
            at(warning.entity.as_deref()).dimmed(),
            warning.message
        );
    }
}

/// Prints a JSON value to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
