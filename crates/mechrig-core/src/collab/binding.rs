//! Non-destructive binding plan.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DuplicationEntry;
use crate::hierarchy::{BoneTree, Side};
use crate::scene::SceneGraph;

/// What a copy is parented to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum BindTarget {
    /// Parented directly to a bone.
    Bone(String),
    /// Follows another copy, which is itself bound.
    Object(String),
}

/// Parenting of one duplicated object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub object: String,
    pub target: BindTarget,
}

/// Decides the parent of every planned copy.
///
/// A bone's representative binds to the bone. Any other part whose scene
/// parent belongs to the same group keeps following that parent's copy, so
/// sub-parts retain their local hierarchy. Everything else binds to its bone.
pub fn plan_binding<S: SceneGraph>(
    scene: &S,
    tree: &BoneTree,
    plan: &[DuplicationEntry],
) -> Vec<Binding> {
    let copies: HashMap<(&str, Side), &str> = plan
        .iter()
        .map(|e| ((e.source.as_str(), e.side), e.copy_name.as_str()))
        .collect();

    plan.iter()
        .map(|entry| {
            let bone_target = BindTarget::Bone(entry.bone.clone());
            let Some(node) = scene.find(&entry.source) else {
                return Binding {
                    object: entry.copy_name.clone(),
                    target: bone_target,
                };
            };

            let is_representative = tree
                .find(&entry.bone)
                .map(|id| tree.get(id).representative == node)
                .unwrap_or(false);

            let parent_copy = scene
                .parent(node)
                .filter(|&parent| scene.part_group(parent) == scene.part_group(node))
                .and_then(|parent| copies.get(&(scene.node_name(parent), entry.side)));

            let target = match parent_copy {
                Some(copy) if !is_representative => BindTarget::Object(copy.to_string()),
                _ => bone_target,
            };
            Binding {
                object: entry.copy_name.clone(),
                target,
            }
        })
        .collect()
}
