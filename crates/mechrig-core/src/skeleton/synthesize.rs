//! Skeleton synthesis.
//!
//! Stages, in order:
//! 1. place every bone from its representative's transform (reflected for
//!    right-side bones);
//! 2. override piston members with look-at tails;
//! 3. infer rotation limits;
//! 4. create or reposition bones in an edit phase;
//! 5. wire limit and track-to constraints in a pose-setup phase.
//!
//! The existing skeleton, if any, is never mutated; the result is a new
//! skeleton value.

use glam::DVec3;
use tracing::{debug, info, instrument};

use super::{
    Axis, Bone, Constraint, RotationLimit, Skeleton, Upsert, LIMIT_ROTATION_CONSTRAINT,
    TRACK_TO_CONSTRAINT,
};
use crate::config::{CompiledConventions, SynthesisSettings};
use crate::error::{ErrorCode, RigError, RigResult, RigWarning};
use crate::hierarchy::{BoneId, BoneNode, BoneTree, Side};
use crate::linkage::{self, PistonPairs};
use crate::mirror::ReflectionOrigin;
use crate::scene::SceneGraph;

/// Placement of one bone before it is written to the skeleton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub head: DVec3,
    pub tail: DVec3,
    pub roll_axis: DVec3,
    /// Unit out-of-plane axis of the source part (reflected for right bones).
    pub out_of_plane: DVec3,
}

/// Inputs of a synthesis run besides the scene.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub tree: &'a BoneTree,
    pub reflection_origin: Option<&'a ReflectionOrigin>,
    /// Skeleton to update in place of creating a new one.
    pub existing: Option<&'a Skeleton>,
}

/// Result of a synthesis run.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub skeleton: Skeleton,
    /// Bones that did not exist before.
    pub created: Vec<String>,
    /// Existing bones that were moved or re-limited.
    pub updated: Vec<String>,
    pub warnings: Vec<RigWarning>,
}

/// Synthesizes a skeleton from a bone tree.
#[instrument(skip_all, fields(bones = request.tree.len()))]
pub fn synthesize<S: SceneGraph>(
    scene: &S,
    request: SynthesisRequest<'_>,
    conventions: &CompiledConventions,
    settings: &SynthesisSettings,
) -> RigResult<Synthesis> {
    settings.validate()?;
    let tree = request.tree;

    if request.reflection_origin.is_none() {
        if let Some((_, node)) = tree.iter().find(|(_, n)| n.side != Side::None) {
            return Err(RigError::validation_at(
                ErrorCode::MissingReflectionOrigin,
                "mirrored bones require a reflection origin",
                node.name.clone(),
            ));
        }
    }

    let mut placements = tree
        .iter()
        .map(|(_, node)| place(scene, node, request.reflection_origin, settings))
        .collect::<RigResult<Vec<_>>>()?;

    let (pairs, warnings) = linkage::detect_pairs(tree, conventions);
    for look in linkage::solve_look_at(&pairs, &placements, settings.epsilon) {
        let placement = &mut placements[look.bone.0];
        placement.tail = look.tail;
        placement.roll_axis = look.roll_axis;
    }

    let bones: Vec<Bone> = tree
        .depth_first()
        .into_iter()
        .map(|id| {
            let node = tree.get(id);
            let placement = &placements[id.0];
            let mut bone = Bone::new(&node.name, placement.head, placement.tail, placement.roll_axis);
            bone.parent = node.parent.map(|p| tree.get(p).name.clone());
            bone.side = node.side;
            bone.piston = pairs.link(tree, id);
            bone.limit = infer_limit(scene, node, &bone, placement, &pairs, id, conventions);
            bone
        })
        .collect();

    let mut skeleton = match request.existing {
        Some(existing) => existing.clone(),
        None => Skeleton::new(&settings.skeleton_name),
    };

    let mut created = Vec::new();
    let mut updated = Vec::new();
    {
        let mut edit = skeleton.edit();
        for bone in &bones {
            match edit.upsert(bone.clone()) {
                Upsert::Created => created.push(bone.name.clone()),
                Upsert::Updated => updated.push(bone.name.clone()),
                Upsert::Unchanged => {}
            }
        }
    }

    {
        let mut pose = skeleton.pose_setup();
        for bone in &bones {
            let pose_bone = pose.pose_bone_mut(&bone.name)?;
            match bone.limit {
                Some(limit) => {
                    pose_bone.set_constraint(Constraint::LimitRotation(limit));
                }
                None => {
                    pose_bone.remove_constraint(LIMIT_ROTATION_CONSTRAINT);
                }
            }
            match bone.piston.as_ref().and_then(|p| p.counterpart.as_deref()) {
                Some(counterpart) => {
                    let hinge_axis = bone
                        .limit
                        .and_then(|l| l.free_axes().first().copied())
                        .unwrap_or(Axis::Z);
                    for constraint in linkage::runtime_constraints(counterpart, hinge_axis) {
                        pose_bone.set_constraint(constraint);
                    }
                }
                None => {
                    pose_bone.remove_constraint(TRACK_TO_CONSTRAINT);
                }
            }
        }
    }

    info!(
        created = created.len(),
        updated = updated.len(),
        pistons = pairs.len(),
        "skeleton synthesized"
    );
    Ok(Synthesis {
        skeleton,
        created,
        updated,
        warnings,
    })
}

/// Places a bone from its representative node.
fn place<S: SceneGraph>(
    scene: &S,
    node: &BoneNode,
    origin: Option<&ReflectionOrigin>,
    settings: &SynthesisSettings,
) -> RigResult<Placement> {
    let rep = node.representative;
    let matrix = scene.world_transform(rep);
    let x = matrix.x_axis.truncate();
    let z = matrix.z_axis.truncate();

    let degenerate = !matrix.is_finite()
        || x.length() < settings.epsilon
        || z.length() < settings.epsilon
        || x.cross(z).length() < settings.epsilon * x.length() * z.length();
    if degenerate {
        return Err(RigError::geometry_at(
            ErrorCode::DegenerateTransform,
            format!(
                "transform of '{}' has a degenerate axis; cannot place the bone",
                scene.node_name(rep)
            ),
            node.name.clone(),
        ));
    }

    let mut head = matrix.w_axis.truncate();
    let mut out_of_plane = z.normalize();
    let mut roll_axis = x.normalize();
    if let (Side::Right, Some(origin)) = (node.side, origin) {
        head = origin.reflect_point(head);
        out_of_plane = origin.reflect_direction(out_of_plane);
        roll_axis = origin.reflect_direction(roll_axis);
    }

    let length = settings.bone_length(scene.dimensions(rep).length());
    debug!(bone = %node.name, length, "bone placed");
    Ok(Placement {
        head,
        tail: head + out_of_plane * length,
        roll_axis,
        out_of_plane,
    })
}

/// Hinge-named bones and complete piston members rotate only about the
/// local axis that carries the part's out-of-plane axis.
fn infer_limit<S: SceneGraph>(
    scene: &S,
    node: &BoneNode,
    bone: &Bone,
    placement: &Placement,
    pairs: &PistonPairs,
    id: BoneId,
    conventions: &CompiledConventions,
) -> Option<RotationLimit> {
    let is_hinge = conventions.is_hinge(&node.name)
        || conventions.is_hinge(scene.node_name(node.representative));
    let is_linked = pairs.counterpart(id).is_some();
    if !is_hinge && !is_linked {
        return None;
    }
    Some(RotationLimit::hinge(bone.dominant_axis(placement.out_of_plane)))
}
