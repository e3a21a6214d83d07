//! Concrete skeleton: bones, pose data, and drivers.
//!
//! Bone topology can only be changed through an [`EditPhase`] and pose
//! wiring only through a [`PoseSetupPhase`]; both borrow the skeleton
//! mutably, so the two can never be interleaved.

mod constraint;
mod limits;
mod phase;
mod synthesize;


use std::collections::{BTreeMap, HashSet};

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::hash::canonical_hash;
use crate::hierarchy::Side;
use crate::linkage::PistonLink;
use crate::rig::{BoneCollection, BoneColor, CustomShape};

pub use constraint::{
    Constraint, CustomProperty, Driver, DriverKind, DriverVariable, IkConstraint, TrackTo,
    VariableKind, IK_CONSTRAINT, LIMIT_ROTATION_CONSTRAINT, TRACK_TO_CONSTRAINT,
};
pub use limits::{Axis, AxisLimit, IkAxes, IkAxisState, RotationLimit};
pub use phase::{BoneSnapshot, EditPhase, PoseSetupPhase, Upsert};
pub use synthesize::{synthesize, Placement, Synthesis, SynthesisRequest};

fn default_true() -> bool {
    true
}

/// Role of a bone in the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneKind {
    /// Synthesized from a part group; deforms geometry.
    #[default]
    Deform,
    /// User-facing IK handle.
    Control,
    /// Hidden IK target parented to a control.
    Solver,
    /// IK pole target.
    Pole,
}

/// A bone in rest position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bone {
    pub name: String,
    pub head: DVec3,
    pub tail: DVec3,
    /// World direction the bone's local Z axis is rolled toward.
    pub roll_axis: DVec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<RotationLimit>,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub kind: BoneKind,
    /// Whether the bone skins geometry.
    #[serde(default = "default_true")]
    pub deform: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piston: Option<PistonLink>,
}

impl Bone {
    /// Creates a deforming bone.
    pub fn new(name: impl Into<String>, head: DVec3, tail: DVec3, roll_axis: DVec3) -> Self {
        Self {
            name: name.into(),
            head,
            tail,
            roll_axis,
            parent: None,
            limit: None,
            side: Side::None,
            kind: BoneKind::Deform,
            deform: true,
            piston: None,
        }
    }

    /// Sets the parent bone.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the rotation limit.
    pub fn with_limit(mut self, limit: RotationLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Marks the bone as a non-deforming helper of the given kind.
    pub fn helper(mut self, kind: BoneKind) -> Self {
        self.kind = kind;
        self.deform = false;
        self
    }

    /// Distance from head to tail.
    pub fn length(&self) -> f64 {
        self.head.distance(self.tail)
    }

    /// Unit vector from head to tail, or zero for a degenerate bone.
    pub fn direction(&self) -> DVec3 {
        (self.tail - self.head).normalize_or_zero()
    }

    /// Local frame of the bone as world-space columns (X, Y, Z).
    ///
    /// Y points along the bone and Z toward the roll axis.
    pub fn frame(&self) -> DMat3 {
        let y = self.direction();
        let y = if y == DVec3::ZERO { DVec3::Y } else { y };
        let z = (self.roll_axis - y * self.roll_axis.dot(y))
            .try_normalize()
            .unwrap_or_else(|| y.any_orthonormal_vector());
        let x = y.cross(z);
        DMat3::from_cols(x, y, z)
    }

    /// The local axis closest to a world direction.
    pub fn dominant_axis(&self, world: DVec3) -> Axis {
        let frame = self.frame();
        let mut best = Axis::Y;
        let mut best_dot = -1.0;
        for axis in Axis::ALL {
            let dot = frame.col(axis.index()).dot(world).abs();
            if dot > best_dot + 1e-12 {
                best = axis;
                best_dot = dot;
            }
        }
        best
    }
}

/// Pose-mode data of a bone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseBone {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "IkAxes::is_free")]
    pub ik_axes: IkAxes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, CustomProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<BoneColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<CustomShape>,
}

impl PoseBone {
    /// Returns the constraint with the given name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name() == name)
    }

    /// Adds a constraint, replacing one of the same name.
    ///
    /// Returns true if the constraint list changed.
    pub fn set_constraint(&mut self, constraint: Constraint) -> bool {
        match self.constraints.iter_mut().find(|c| c.name() == constraint.name()) {
            Some(existing) if *existing == constraint => false,
            Some(existing) => {
                *existing = constraint;
                true
            }
            None => {
                self.constraints.push(constraint);
                true
            }
        }
    }

    /// Removes the constraint with the given name, if present.
    pub fn remove_constraint(&mut self, name: &str) -> bool {
        let before = self.constraints.len();
        self.constraints.retain(|c| c.name() != name);
        self.constraints.len() != before
    }

    /// Returns the IK constraint, if any.
    pub fn ik(&self) -> Option<&IkConstraint> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Ik(ik) => Some(ik),
            _ => None,
        })
    }

    /// Returns the IK constraint mutably, if any.
    pub fn ik_mut(&mut self) -> Option<&mut IkConstraint> {
        self.constraints.iter_mut().find_map(|c| match c {
            Constraint::Ik(ik) => Some(ik),
            _ => None,
        })
    }
}

/// An armature: bones in rest position plus their pose wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Skeleton {
    pub name: String,
    /// Bones in creation order.
    pub bones: Vec<Bone>,
    #[serde(default)]
    pub pose: BTreeMap<String, PoseBone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drivers: Vec<Driver>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<BoneCollection>,
}

impl Skeleton {
    /// Creates an empty skeleton.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
            pose: BTreeMap::new(),
            drivers: Vec::new(),
            collections: Vec::new(),
        }
    }

    /// Parses a skeleton from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the skeleton to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// BLAKE3 hash of the skeleton's canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        canonical_hash(self)
    }

    /// Looks up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Returns true if a bone with the name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.bone(name).is_some()
    }

    /// Pose data of a bone.
    pub fn pose_bone(&self, name: &str) -> Option<&PoseBone> {
        self.pose.get(name)
    }

    /// Bones of a given kind.
    pub fn bones_of_kind(&self, kind: BoneKind) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(move |b| b.kind == kind)
    }

    /// Names of the direct children of a bone.
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|b| b.parent.as_deref() == Some(name))
            .map(|b| b.name.as_str())
            .collect()
    }

    /// The owner bone followed by up to `count - 1` ancestors.
    pub fn chain(&self, owner: &str, count: usize) -> Vec<&Bone> {
        walk_chain(|name| self.bone(name), owner, count)
    }

    /// Number of links available to an IK chain on the owner, including it.
    pub fn available_links(&self, owner: &str) -> usize {
        self.chain(owner, self.bones.len()).len()
    }

    /// Collection a bone belongs to, if any.
    pub fn collection_of(&self, bone: &str) -> Option<&BoneCollection> {
        self.collections.iter().find(|c| c.contains(bone))
    }

    /// Value of a custom property on a pose bone.
    pub fn property(&self, bone: &str, property: &str) -> Option<f64> {
        self.pose
            .get(bone)
            .and_then(|p| p.properties.get(property))
            .map(|p| p.value)
    }

    /// Begins a topology edit.
    pub fn edit(&mut self) -> EditPhase<'_> {
        EditPhase::new(self)
    }

    /// Begins constraint and property wiring.
    pub fn pose_setup(&mut self) -> PoseSetupPhase<'_> {
        PoseSetupPhase::new(self)
    }

    /// Copies the rest-pose bones into plain values.
    pub fn snapshot(&self) -> BoneSnapshot {
        BoneSnapshot::capture(self)
    }
}

/// Follows parent links from `owner`, stopping after `count` bones or at a cycle.
pub(crate) fn walk_chain<'a, F>(lookup: F, owner: &str, count: usize) -> Vec<&'a Bone>
where
    F: Fn(&str) -> Option<&'a Bone>,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = lookup(owner);
    while let Some(bone) = current {
        if chain.len() >= count || !seen.insert(bone.name.as_str()) {
            break;
        }
        chain.push(bone);
        current = bone.parent.as_deref().and_then(&lookup);
    }
    chain
}
