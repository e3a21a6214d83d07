//! Validate command implementation
//!
//! Checks a scene selection without synthesizing anything.

use anyhow::{Context, Result};
use colored::Colorize;
use mechrig_core::{RigEngine, SynthesisSettings, ValidationReport};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{input_error_to_json, warnings_to_json, JsonError, ValidateOutput};
use super::reporting::{print_error, print_json, print_warnings};
use crate::input::{load_conventions, load_scene, InputError};

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if the selection can be rigged, 1 otherwise
pub fn run(scene_path: &str, config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(scene_path, config_path)
    } else {
        run_human(scene_path, config_path)
    }
}

fn validate(scene_path: &str, config_path: Option<&str>) -> Result<ValidationReport, InputError> {
    let conventions = load_conventions(config_path.map(Path::new))?;
    let input = load_scene(Path::new(scene_path))?;
    let engine = RigEngine::new(&conventions, SynthesisSettings::default())?;
    Ok(engine.validate(&input.scene, &input.selection, input.reflection_origin))
}

fn run_human(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), scene_path);

    let report = validate(scene_path, config_path)
        .with_context(|| format!("Failed to load scene: {}", scene_path))?;

    print_warnings(&report.warnings);
    for err in &report.errors {
        print_error(err);
    }

    if report.is_ok() {
        println!("{} {} warning(s)", "SUCCESS".green().bold(), report.warnings.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} {} error(s)", "FAILED".red().bold(), report.errors.len());
        Ok(ExitCode::from(1))
    }
}

fn run_json(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    let output = match validate(scene_path, config_path) {
        Ok(report) => ValidateOutput {
            success: report.is_ok(),
            errors: report.errors.iter().map(JsonError::from).collect(),
            warnings: warnings_to_json(&report.warnings),
        },
        Err(err) => ValidateOutput {
            success: false,
            errors: vec![input_error_to_json(&err, scene_path)],
            warnings: Vec::new(),
        },
    };
    print_json(&output)?;
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_reports_missing_origin() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(
            &path,
            r#"{
                "nodes": [
                    {"name": "Body", "group": "Body"},
                    {"name": "Arm", "group": "Arm_Mirrored", "parent": "Body"}
                ],
                "selection": ["Body", "Arm"]
            }"#,
        )
        .unwrap();

        let report = validate(path.to_str().unwrap(), None).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code(), "R006");
    }

    #[test]
    fn test_validate_bad_conventions() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = tmp.path().join("scene.json");
        let config = tmp.path().join("conventions.json");
        fs::write(&scene, r#"{"nodes": [{"name": "Body", "group": "Body"}], "selection": ["Body"]}"#)
            .unwrap();
        fs::write(&config, r#"{"pivot_pattern": "("}"#).unwrap();

        let err = validate(scene.to_str().unwrap(), config.to_str()).unwrap_err();
        match err {
            InputError::Rig(rig) => assert_eq!(rig.code(), "R008"),
            other => panic!("expected rig error, got {other:?}"),
        }
    }
}
