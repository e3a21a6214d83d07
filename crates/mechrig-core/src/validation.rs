//! Non-mutating validation of a selection.
//!
//! Runs the hierarchy checks, the mirroring prerequisites, and piston
//! pairing without building any skeleton.

use std::collections::BTreeSet;

use tracing::{instrument, warn};

use crate::config::{CompiledConventions, SynthesisSettings};
use crate::error::{ErrorCode, RigError, RigWarning, ValidationReport, WarningCode};
use crate::hierarchy::{analyze, BoneTree, Side};
use crate::linkage::detect_pairs;
use crate::mirror::ReflectionOrigin;
use crate::scene::{NodeId, SceneGraph};

/// Validates a selection for synthesis.
///
/// Errors are those synthesis would fail with; warnings are recorded for
/// incomplete or duplicate piston members, mirrored parts lacking a mirror
/// modifier on the reflection origin, and unreachable nodes.
#[instrument(skip_all, fields(selected = selection.len()))]
pub fn validate_selection<S: SceneGraph>(
    scene: &S,
    selection: &[NodeId],
    reflection_origin: Option<NodeId>,
    conventions: &CompiledConventions,
    settings: &SynthesisSettings,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    if let Err(err) = settings.validate() {
        report.add_error(err);
    }

    let analysis = match analyze(scene, selection, conventions) {
        Ok(analysis) => analysis,
        Err(err) => {
            report.add_error(err);
            return report;
        }
    };
    report.extend_warnings(analysis.warnings);

    if analysis.tree.has_mirrored() {
        match reflection_origin {
            None => report.add_error(RigError::validation(
                ErrorCode::MissingReflectionOrigin,
                "mirrored part groups require a reflection origin",
            )),
            Some(id) => {
                let name = scene.node_name(id);
                match ReflectionOrigin::new(name, scene.world_transform(id), settings.epsilon) {
                    Ok(origin) => {
                        report.extend_warnings(check_mirror_modifiers(scene, &analysis.tree, &origin))
                    }
                    Err(err) => report.add_error(err),
                }
            }
        }
    }

    let (_, piston_warnings) = detect_pairs(&analysis.tree, conventions);
    report.extend_warnings(piston_warnings);
    report
}

/// Left-side parts must carry a mirror modifier targeting the origin, or
/// the geometry collaborator has nothing to reflect.
fn check_mirror_modifiers<S: SceneGraph>(
    scene: &S,
    tree: &BoneTree,
    origin: &ReflectionOrigin,
) -> Vec<RigWarning> {
    let nodes: BTreeSet<NodeId> = tree
        .iter()
        .filter(|(_, bone)| bone.side == Side::Left)
        .flat_map(|(_, bone)| bone.members.iter().copied())
        .collect();

    nodes
        .into_iter()
        .filter(|&node| scene.mirror_target(node) != Some(origin.name()))
        .map(|node| {
            let name = scene.node_name(node);
            let warning = RigWarning::with_entity(
                WarningCode::MirrorModifierMissing,
                format!("no mirror modifier targets '{}'", origin.name()),
                name,
            );
            warn!(code = %warning.code, node = name, "{}", warning.message);
            warning
        })
        .collect()
}
