//! Edit and pose-setup phases.
//!
//! Topology changes (creating, moving, removing bones) happen in an
//! [`EditPhase`]; constraints, drivers, properties, and display settings
//! are written in a [`PoseSetupPhase`]. Data needed across a phase change
//! is copied into a [`BoneSnapshot`] first.

use std::collections::HashMap;

use tracing::debug;

use super::{walk_chain, Bone, Driver, PoseBone, Skeleton};
use crate::error::{ErrorCode, RigError, RigResult};
use crate::rig::{BoneCollection, CollectionPreset};

/// Outcome of [`EditPhase::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    Unchanged,
}

/// Exclusive access to a skeleton's bone topology.
///
/// Pose entries are reconciled with the bone list when the phase ends.
pub struct EditPhase<'s> {
    skeleton: &'s mut Skeleton,
}

impl<'s> EditPhase<'s> {
    pub(super) fn new(skeleton: &'s mut Skeleton) -> Self {
        Self { skeleton }
    }

    /// Looks up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.skeleton.bone(name)
    }

    /// Creates the bone or repositions the existing bone of the same name.
    pub fn upsert(&mut self, bone: Bone) -> Upsert {
        match self.skeleton.bones.iter_mut().find(|b| b.name == bone.name) {
            Some(existing) if *existing == bone => Upsert::Unchanged,
            Some(existing) => {
                debug!(bone = %bone.name, "bone updated");
                *existing = bone;
                Upsert::Updated
            }
            None => {
                debug!(bone = %bone.name, "bone created");
                self.skeleton.bones.push(bone);
                Upsert::Created
            }
        }
    }

    /// Removes a bone if present. Its children are reattached to its parent.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(index) = self.skeleton.bones.iter().position(|b| b.name == name) else {
            return false;
        };
        let removed = self.skeleton.bones.remove(index);
        for bone in &mut self.skeleton.bones {
            if bone.parent.as_deref() == Some(name) {
                bone.parent = removed.parent.clone();
            }
        }
        debug!(bone = name, "bone removed");
        true
    }
}

impl Drop for EditPhase<'_> {
    fn drop(&mut self) {
        let skeleton = &mut *self.skeleton;
        let names: Vec<String> = skeleton.bones.iter().map(|b| b.name.clone()).collect();

        skeleton.pose.retain(|name, _| names.contains(name));
        for name in &names {
            skeleton.pose.entry(name.clone()).or_default();
        }
        skeleton.drivers.retain(|d| names.contains(&d.owner));
        for collection in &mut skeleton.collections {
            collection.bones.retain(|b| names.contains(b));
        }
    }
}

/// Exclusive access to a skeleton's pose wiring.
pub struct PoseSetupPhase<'s> {
    skeleton: &'s mut Skeleton,
}

impl<'s> PoseSetupPhase<'s> {
    pub(super) fn new(skeleton: &'s mut Skeleton) -> Self {
        Self { skeleton }
    }

    /// Looks up a rest-pose bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.skeleton.bone(name)
    }

    /// Pose data of a bone.
    pub fn pose_bone(&self, name: &str) -> Option<&PoseBone> {
        self.skeleton.pose.get(name)
    }

    /// Pose data of a bone, mutably.
    pub fn pose_bone_mut(&mut self, name: &str) -> RigResult<&mut PoseBone> {
        if !self.skeleton.contains(name) {
            return Err(RigError::validation_at(
                ErrorCode::UnknownBone,
                "bone does not exist in the skeleton",
                name,
            ));
        }
        Ok(self.skeleton.pose.entry(name.to_string()).or_default())
    }

    /// Adds a driver, replacing one that drives the same property.
    pub fn set_driver(&mut self, driver: Driver) {
        let drivers = &mut self.skeleton.drivers;
        match drivers
            .iter_mut()
            .find(|d| d.drives(&driver.owner, &driver.constraint, &driver.data_path))
        {
            Some(existing) => *existing = driver,
            None => drivers.push(driver),
        }
    }

    /// Removes the drivers on a constraint of a bone. Returns how many were removed.
    pub fn remove_drivers(&mut self, owner: &str, constraint: &str) -> usize {
        let before = self.skeleton.drivers.len();
        self.skeleton
            .drivers
            .retain(|d| !(d.owner == owner && d.constraint == constraint));
        before - self.skeleton.drivers.len()
    }

    /// Returns the preset collection, creating it if needed.
    pub fn collection(&mut self, preset: CollectionPreset) -> &mut BoneCollection {
        let name = preset.default_name();
        let collections = &mut self.skeleton.collections;
        let index = match collections.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                collections.push(preset.to_collection());
                collections.len() - 1
            }
        };
        &mut collections[index]
    }

    /// Moves a bone into a preset collection, removing it from any other.
    pub fn assign_collection(&mut self, bone: &str, preset: CollectionPreset) {
        let name = preset.default_name();
        for collection in &mut self.skeleton.collections {
            if collection.name != name {
                collection.unassign(bone);
            }
        }
        self.collection(preset).assign(bone);
    }
}

/// Rest-pose bones copied out of a skeleton.
#[derive(Debug, Clone, Default)]
pub struct BoneSnapshot {
    bones: HashMap<String, Bone>,
}

impl BoneSnapshot {
    pub(super) fn capture(skeleton: &Skeleton) -> Self {
        Self {
            bones: skeleton
                .bones
                .iter()
                .map(|b| (b.name.clone(), b.clone()))
                .collect(),
        }
    }

    /// Looks up a bone by name.
    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.bones.get(name)
    }

    /// The owner bone followed by up to `count - 1` ancestors.
    pub fn chain(&self, owner: &str, count: usize) -> Vec<&Bone> {
        walk_chain(|name| self.bones.get(name), owner, count)
    }
}
