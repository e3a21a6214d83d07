//! Controls command implementation
//!
//! Applies a control-rig configuration to a skeleton document.

use anyhow::{Context, Result};
use colored::Colorize;
use mechrig_core::{ControlRig, RigEngine, RigResult, SynthesisSettings};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    error_codes, input_error_to_json, warnings_to_json, ControlsOutput, ControlsResult, JsonError,
};
use super::reporting::{print_error, print_json, print_warnings};
use crate::input::{load_conventions, load_rig_config, load_skeleton, write_document, InputError};

/// Arguments of the controls command.
#[derive(Debug, Clone, Default)]
pub struct ControlsArgs<'a> {
    pub skeleton: &'a str,
    pub rig: &'a str,
    pub config: Option<&'a str>,
    pub output: Option<&'a str>,
}

/// Run the controls command
///
/// # Returns
/// Exit code: 0 on success, 1 if the rig could not be applied
pub fn run(args: &ControlsArgs<'_>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(args)
    } else {
        run_human(args)
    }
}

fn execute(args: &ControlsArgs<'_>) -> Result<RigResult<ControlRig>, InputError> {
    let conventions = load_conventions(args.config.map(Path::new))?;
    let skeleton = load_skeleton(Path::new(args.skeleton))?;
    let rig = load_rig_config(Path::new(args.rig))?;
    let engine = RigEngine::new(&conventions, SynthesisSettings::default())?;
    Ok(engine.control_rig(&skeleton, &rig))
}

fn run_human(args: &ControlsArgs<'_>) -> Result<ExitCode> {
    eprintln!("{} {}", "Rigging:".cyan().bold(), args.skeleton);

    let outcome = execute(args)
        .with_context(|| format!("Failed to load inputs for: {}", args.skeleton))?;
    let rig = match outcome {
        Ok(rig) => rig,
        Err(err) => {
            print_error(&err);
            eprintln!("{}", "FAILED".red().bold());
            return Ok(ExitCode::from(1));
        }
    };
    print_warnings(&rig.warnings);

    write_document(args.output.map(Path::new), &rig.skeleton.to_json_pretty()?)
        .with_context(|| format!("Failed to write skeleton: {}", args.output.unwrap_or("-")))?;

    for task in &rig.tasks {
        eprintln!(
            "  {} {} (chain {}) -> {}",
            "+".green(),
            task.owner,
            task.chain_length,
            task.control
        );
    }
    for owner in &rig.updated {
        eprintln!("  {} {}", "~".cyan(), owner);
    }
    for owner in &rig.removed {
        eprintln!("  {} {}", "-".red(), owner);
    }
    eprintln!(
        "{} {} created, {} updated, {} removed",
        "SUCCESS".green().bold(),
        rig.tasks.len(),
        rig.updated.len(),
        rig.removed.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(args: &ControlsArgs<'_>) -> Result<ExitCode> {
    let outcome = match execute(args) {
        Ok(outcome) => outcome,
        Err(err) => {
            print_json(&failure(input_error_to_json(&err, args.skeleton)))?;
            return Ok(ExitCode::from(1));
        }
    };
    let rig = match outcome {
        Ok(rig) => rig,
        Err(err) => {
            print_json(&failure(JsonError::from(&err)))?;
            return Ok(ExitCode::from(1));
        }
    };

    let fingerprint = rig.skeleton.fingerprint()?;
    let document = match args.output {
        Some(path) => {
            let json = rig.skeleton.to_json_pretty()?;
            if let Err(err) = write_document(Some(Path::new(path)), &json) {
                let error =
                    JsonError::new(error_codes::FILE_WRITE, err.to_string()).with_file(path);
                print_json(&failure(error))?;
                return Ok(ExitCode::from(1));
            }
            None
        }
        None => Some(rig.skeleton),
    };

    let output = ControlsOutput {
        success: true,
        errors: Vec::new(),
        warnings: warnings_to_json(&rig.warnings),
        result: Some(ControlsResult {
            fingerprint,
            created: rig.tasks,
            updated: rig.updated,
            removed: rig.removed,
            output: args.output.map(str::to_string),
            document,
        }),
    };
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

fn failure(error: JsonError) -> ControlsOutput {
    ControlsOutput {
        success: false,
        errors: vec![error],
        warnings: Vec::new(),
        result: None,
    }
}
