//! Geometry duplication plan and skin assignment.

use glam::DMat4;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::TaggedGeometry;
use crate::config::CompiledConventions;
use crate::error::{ErrorCode, RigError, RigResult};
use crate::hierarchy::{BoneTree, Side};
use crate::mirror::ReflectionOrigin;
use crate::scene::SceneGraph;
use crate::skeleton::Skeleton;

/// One object copy the geometry collaborator must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationEntry {
    /// Scene node being copied.
    pub source: String,
    /// Name of the copy.
    pub copy_name: String,
    /// Bone the copy follows.
    pub bone: String,
    pub side: Side,
    /// World matrix of the copy.
    pub world_matrix: DMat4,
    /// Remove the mirror modifier targeting the reflection origin.
    pub strip_mirror_modifier: bool,
    /// Reverse face winding after the reflected transform is applied.
    pub flip_winding: bool,
}

impl DuplicationEntry {
    /// Tag the collaborator attaches to the finished copy.
    pub fn tag(&self) -> TaggedGeometry {
        TaggedGeometry {
            object: self.copy_name.clone(),
            bone: self.bone.clone(),
            side: self.side,
        }
    }
}

/// Plans the object copies for every bone of the tree.
///
/// Each bone copies its own selected members, so a group reused under
/// another parent follows its own `.NNN` bone. Left and center copies keep
/// their transform; a left copy loses its mirror modifier. Right copies
/// exist only for nodes whose mirror modifier targets the reflection origin
/// and are placed at the reflected world matrix with flipped winding.
#[instrument(skip_all, fields(bones = tree.len()))]
pub fn plan_duplication<S: SceneGraph>(
    scene: &S,
    tree: &BoneTree,
    origin: Option<&ReflectionOrigin>,
    conventions: &CompiledConventions,
) -> Vec<DuplicationEntry> {
    let mut plan = Vec::new();

    for id in tree.depth_first() {
        let bone = tree.get(id);
        for &node in &bone.members {
            let name = scene.node_name(node);
            let mirrored = match (origin, scene.mirror_target(node)) {
                (Some(origin), Some(target)) => target == origin.name(),
                _ => false,
            };
            let world = scene.world_transform(node);

            let entry = match (bone.side, origin) {
                (Side::Right, Some(origin)) if mirrored => DuplicationEntry {
                    source: name.to_string(),
                    copy_name: format!("{}{}_rigged", name, conventions.raw().right_suffix),
                    bone: bone.name.clone(),
                    side: Side::Right,
                    world_matrix: origin.reflect_matrix(world),
                    strip_mirror_modifier: true,
                    flip_winding: true,
                },
                (Side::Right, _) => continue,
                (side, _) => DuplicationEntry {
                    source: name.to_string(),
                    copy_name: format!("{}_rigged", name),
                    bone: bone.name.clone(),
                    side,
                    world_matrix: world,
                    strip_mirror_modifier: side == Side::Left && mirrored,
                    flip_winding: false,
                },
            };
            debug!(source = %entry.source, copy = %entry.copy_name, bone = %entry.bone, "copy planned");
            plan.push(entry);
        }
    }
    plan
}

/// How a vertex group weight is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightMode {
    #[default]
    Replace,
    Add,
}

/// Rigid skinning of one object to one bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinAssignment {
    pub object: String,
    /// Vertex group name, equal to the bone name.
    pub vertex_group: String,
    pub weight: f64,
    pub mode: WeightMode,
}

/// Turns tagged geometry into full-weight vertex groups.
///
/// Every tag must name an existing bone of the skeleton.
pub fn assign_skin(tagged: &[TaggedGeometry], skeleton: &Skeleton) -> RigResult<Vec<SkinAssignment>> {
    tagged
        .iter()
        .map(|geometry| {
            if !skeleton.contains(&geometry.bone) {
                return Err(RigError::validation_at(
                    ErrorCode::UnknownBone,
                    format!("geometry '{}' is tagged with an unknown bone", geometry.object),
                    &geometry.bone,
                ));
            }
            Ok(SkinAssignment {
                object: geometry.object.clone(),
                vertex_group: geometry.bone.clone(),
                weight: 1.0,
                mode: WeightMode::Replace,
            })
        })
        .collect()
}
