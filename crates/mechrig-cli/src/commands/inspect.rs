//! Inspect command implementation
//!
//! Prints the bone forest the analyzer builds for a scene selection.

use anyhow::{Context, Result};
use colored::Colorize;
use mechrig_core::{
    Analysis, BoneId, BoneTree, RigEngine, RigResult, Scene, SceneGraph, Side, SynthesisSettings,
};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    input_error_to_json, warnings_to_json, InspectBone, InspectOutput, JsonError,
};
use super::reporting::{print_error, print_json, print_warnings};
use crate::input::{load_conventions, load_scene, InputError};

/// Run the inspect command
pub fn run(scene_path: &str, config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(scene_path, config_path)
    } else {
        run_human(scene_path, config_path)
    }
}

fn execute(
    scene_path: &str,
    config_path: Option<&str>,
) -> Result<(Scene, RigResult<Analysis>), InputError> {
    let conventions = load_conventions(config_path.map(Path::new))?;
    let input = load_scene(Path::new(scene_path))?;
    let engine = RigEngine::new(&conventions, SynthesisSettings::default())?;
    let analysis = engine.analyze(&input.scene, &input.selection);
    Ok((input.scene, analysis))
}

fn side_label(side: Side) -> colored::ColoredString {
    match side {
        Side::None => "center".normal(),
        Side::Left => "left".blue(),
        Side::Right => "right".red(),
    }
}

fn print_bone(scene: &Scene, tree: &BoneTree, id: BoneId, depth: usize) {
    let bone = tree.get(id);
    let pivot = if bone.pivot_overridden { " pivot" } else { "" };
    println!(
        "{}{} [{}] {} {}{}",
        "  ".repeat(depth),
        bone.name.bold(),
        side_label(bone.side),
        bone.group.dimmed(),
        format!("<{}>", scene.node_name(bone.representative)).dimmed(),
        pivot.yellow()
    );
    for &child in &bone.children {
        print_bone(scene, tree, child, depth + 1);
    }
}

fn run_human(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    println!("{} {}", "Inspecting:".cyan().bold(), scene_path);

    let (scene, analysis) = execute(scene_path, config_path)
        .with_context(|| format!("Failed to load scene: {}", scene_path))?;
    let analysis = match analysis {
        Ok(analysis) => analysis,
        Err(err) => {
            print_error(&err);
            println!("{}", "FAILED".red().bold());
            return Ok(ExitCode::from(1));
        }
    };

    for &root in analysis.tree.roots() {
        print_bone(&scene, &analysis.tree, root, 1);
    }
    print_warnings(&analysis.warnings);
    println!("{} {} bone(s)", "Bones:".dimmed(), analysis.tree.len());
    Ok(ExitCode::SUCCESS)
}

fn describe(scene: &Scene, tree: &BoneTree) -> Vec<InspectBone> {
    tree.depth_first()
        .into_iter()
        .map(|id| {
            let bone = tree.get(id);
            InspectBone {
                name: bone.name.clone(),
                group: bone.group.clone(),
                side: bone.side,
                parent: bone.parent.map(|p| tree.get(p).name.clone()),
                representative: scene.node_name(bone.representative).to_string(),
                members: bone
                    .members
                    .iter()
                    .map(|&m| scene.node_name(m).to_string())
                    .collect(),
                pivot_overridden: bone.pivot_overridden,
            }
        })
        .collect()
}

fn run_json(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    let output = match execute(scene_path, config_path) {
        Ok((scene, Ok(analysis))) => InspectOutput {
            success: true,
            errors: Vec::new(),
            warnings: warnings_to_json(&analysis.warnings),
            bones: describe(&scene, &analysis.tree),
        },
        Ok((_, Err(err))) => InspectOutput {
            success: false,
            errors: vec![JsonError::from(&err)],
            warnings: Vec::new(),
            bones: Vec::new(),
        },
        Err(err) => InspectOutput {
            success: false,
            errors: vec![input_error_to_json(&err, scene_path)],
            warnings: Vec::new(),
            bones: Vec::new(),
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
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_describe_forest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(
            &path,
            r#"{
                "nodes": [
                    {"name": "Origin"},
                    {"name": "Chassis", "group": "Chassis"},
                    {"name": "Wheel", "group": "Wheel_Mirrored", "parent": "Chassis"},
                    {"name": "Hub", "group": "Wheel_Mirrored", "parent": "Wheel"}
                ],
                "selection": ["Chassis", "Wheel", "Hub"],
                "reflection_origin": "Origin"
            }"#,
        )
        .unwrap();

        let (scene, analysis) = execute(path.to_str().unwrap(), None).unwrap();
        let bones = describe(&scene, &analysis.unwrap().tree);
        let summary: Vec<(&str, Option<&str>, usize)> = bones
            .iter()
            .map(|b| (b.name.as_str(), b.parent.as_deref(), b.members.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Chassis", None, 1),
                ("Wheel_L", Some("Chassis"), 2),
                ("Wheel_R", Some("Chassis"), 2),
            ]
        );
        assert_eq!(bones[1].representative, "Wheel");
    }

    #[test]
    fn test_inspect_empty_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(&path, r#"{"nodes": [{"name": "Body", "group": "Body"}], "selection": []}"#)
            .unwrap();

        let (_, analysis) = execute(path.to_str().unwrap(), None).unwrap();
        assert_eq!(analysis.unwrap_err().code(), "R001");
    }
}
