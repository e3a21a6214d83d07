//! Synthesize command implementation
//!
//! Builds (or updates) a skeleton document from a scene selection.
//! Human-readable status goes to stderr so the document can be piped.

use anyhow::{Context, Result};
use colored::Colorize;
use mechrig_core::{GeometryPlan, RigEngine, RigResult, Synthesis, SynthesisSettings};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    error_codes, input_error_to_json, warnings_to_json, GeometryPlanJson, JsonError,
    SynthesizeOutput, SynthesizeResult,
};
use super::reporting::{print_error, print_json, print_warnings};
use crate::input::{load_conventions, load_scene, load_skeleton, write_document, InputError};

/// Arguments of the synthesize command.
#[derive(Debug, Clone, Default)]
pub struct SynthesizeArgs<'a> {
    pub scene: &'a str,
    pub config: Option<&'a str>,
    pub existing: Option<&'a str>,
    pub output: Option<&'a str>,
    pub scale: Option<f64>,
    pub name: Option<&'a str>,
    /// Also plan geometry duplication and binding.
    pub plan: bool,
}

/// Run the synthesize command
///
/// # Returns
/// Exit code: 0 on success, 1 if synthesis failed
pub fn run(args: &SynthesizeArgs<'_>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(args)
    } else {
        run_human(args)
    }
}

/// Outcome of a run that got past loading.
type Outcome = RigResult<(Synthesis, Option<GeometryPlan>)>;

fn settings(args: &SynthesizeArgs<'_>) -> SynthesisSettings {
    let mut settings = SynthesisSettings::default();
    if let Some(scale) = args.scale {
        settings = settings.with_scale_factor(scale);
    }
    if let Some(name) = args.name {
        settings = settings.with_skeleton_name(name);
    }
    settings
}

fn execute(args: &SynthesizeArgs<'_>) -> Result<Outcome, InputError> {
    let conventions = load_conventions(args.config.map(Path::new))?;
    let input = load_scene(Path::new(args.scene))?;
    let existing = args.existing.map(|p| load_skeleton(Path::new(p))).transpose()?;
    let engine = RigEngine::new(&conventions, settings(args))?;

    let origin = input.reflection_origin;
    Ok(engine
        .synthesize(&input.scene, &input.selection, origin, existing.as_ref())
        .and_then(|synthesis| {
            let plan = if args.plan {
                Some(engine.plan_geometry(&input.scene, &input.selection, origin)?)
            } else {
                None
            };
            Ok((synthesis, plan))
        }))
}

fn run_human(args: &SynthesizeArgs<'_>) -> Result<ExitCode> {
    eprintln!("{} {}", "Synthesizing:".cyan().bold(), args.scene);

    let outcome =
        execute(args).with_context(|| format!("Failed to load inputs for: {}", args.scene))?;
    let (synthesis, plan) = match outcome {
        Ok(done) => done,
        Err(err) => {
            print_error(&err);
            eprintln!("{}", "FAILED".red().bold());
            return Ok(ExitCode::from(1));
        }
    };
    print_warnings(&synthesis.warnings);

    let skeleton = &synthesis.skeleton;
    write_document(args.output.map(Path::new), &skeleton.to_json_pretty()?)
        .with_context(|| format!("Failed to write skeleton: {}", args.output.unwrap_or("-")))?;

    eprintln!(
        "{} {} ({} bones, {} created, {} updated)",
        "SUCCESS".green().bold(),
        skeleton.name,
        skeleton.bones.len(),
        synthesis.created.len(),
        synthesis.updated.len()
    );
    eprintln!("{} {}", "Fingerprint:".dimmed(), skeleton.fingerprint()?);

    if let Some(plan) = plan {
        eprintln!("{}", "Geometry plan:".cyan().bold());
        for entry in &plan.duplication {
            eprintln!("  {} -> {} ({})", entry.source, entry.copy_name, entry.bone);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_json(args: &SynthesizeArgs<'_>) -> Result<ExitCode> {
    let outcome = match execute(args) {
        Ok(outcome) => outcome,
        Err(err) => {
            print_json(&failure(input_error_to_json(&err, args.scene)))?;
            return Ok(ExitCode::from(1));
        }
    };
    let (synthesis, plan) = match outcome {
        Ok(done) => done,
        Err(err) => {
            print_json(&failure(JsonError::from(&err)))?;
            return Ok(ExitCode::from(1));
        }
    };

    let fingerprint = synthesis.skeleton.fingerprint()?;
    let document = match args.output {
        Some(path) => {
            let json = synthesis.skeleton.to_json_pretty()?;
            if let Err(err) = write_document(Some(Path::new(path)), &json) {
                let error =
                    JsonError::new(error_codes::FILE_WRITE, err.to_string()).with_file(path);
                print_json(&failure(error))?;
                return Ok(ExitCode::from(1));
            }
            None
        }
        None => Some(synthesis.skeleton.clone()),
    };

    let output = SynthesizeOutput {
        success: true,
        errors: Vec::new(),
        warnings: warnings_to_json(&synthesis.warnings),
        result: Some(SynthesizeResult {
            skeleton: synthesis.skeleton.name.clone(),
            fingerprint,
            bones: synthesis.skeleton.bones.len(),
            created: synthesis.created,
            updated: synthesis.updated,
            output: args.output.map(str::to_string),
            document,
            plan: plan.map(|plan| GeometryPlanJson {
                duplication: plan.duplication,
                bindings: plan.bindings,
            }),
        }),
    };
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

fn failure(error: JsonError) -> SynthesizeOutput {
    SynthesizeOutput {
        success: false,
        errors: vec![error],
        warnings: Vec::new(),
        result: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechrig_core::Skeleton;
    use pretty_assertions::assert_eq;
    use std::fs;

    const SCENE: &str = r#"{
        "nodes": [
            {"name": "Origin"},
            {"name": "Body", "group": "Body"},
            {"name": "Arm", "group": "Arm_Mirrored", "parent": "Body",
             "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 1,0,0,1],
             "mirror_target": "Origin"}
        ],
        "selection": ["Body", "Arm"],
        "reflection_origin": "Origin"
    }"#;

    #[test]
    fn test_synthesize_writes_document() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = tmp.path().join("scene.json");
        let output = tmp.path().join("rig.json");
        fs::write(&scene, SCENE).unwrap();

        let args = SynthesizeArgs {
            scene: scene.to_str().unwrap(),
            output: output.to_str(),
            name: Some("Crane"),
            ..Default::default()
        };
        run(&args, false).unwrap();

        let skeleton = Skeleton::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(skeleton.name, "Crane");
        let names: Vec<&str> = skeleton.bones.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Body", "Arm_L", "Arm_R"]);
    }

    #[test]
    fn test_synthesize_with_existing_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = tmp.path().join("scene.json");
        fs::write(&scene, SCENE).unwrap();
        let first_path = tmp.path().join("first.json");

        let first = SynthesizeArgs {
            scene: scene.to_str().unwrap(),
            output: first_path.to_str(),
            ..Default::default()
        };
        let first_run = execute(&first).unwrap().unwrap().0;
        write_document(Some(&first_path), &first_run.skeleton.to_json_pretty().unwrap()).unwrap();

        let second = SynthesizeArgs {
            existing: first_path.to_str(),
            ..first.clone()
        };
        let second_run = execute(&second).unwrap().unwrap().0;
        assert!(second_run.created.is_empty());
        assert_eq!(second_run.skeleton.bones.len(), 3);
    }

    #[test]
    fn test_synthesize_plan() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = tmp.path().join("scene.json");
        fs::write(&scene, SCENE).unwrap();

        let args = SynthesizeArgs {
            scene: scene.to_str().unwrap(),
            plan: true,
            ..Default::default()
        };
        let (_, plan) = execute(&args).unwrap().unwrap();
        let copies: Vec<String> = plan
            .unwrap()
            .duplication
            .into_iter()
            .map(|e| e.copy_name)
            .collect();
        assert_eq!(copies, vec!["Body_rigged", "Arm_rigged", "Arm_R_rigged"]);
    }

    #[test]
    fn test_synthesize_rejects_bad_scale() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = tmp.path().join("scene.json");
        fs::write(&scene, SCENE).unwrap();

        let args = SynthesizeArgs {
            scene: scene.to_str().unwrap(),
            scale: Some(-1.0),
            ..Default::default()
        };
        match execute(&args) {
            Err(InputError::Rig(err)) => assert_eq!(err.code(), "R007"),
            Err(other) => panic!("expected rig error, got {other:?}"),
            Ok(_) => panic!("expected failure"),
        }
    }
}
