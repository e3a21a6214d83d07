//! Piston linkage.
//!
//! Bones whose base name matches the piston pattern are paired by
//! `(id, side)`. In a complete pair each member's tail lands exactly on the
//! other's head, and at runtime each member tracks its counterpart while
//! rotating about a single axis.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CompiledConventions;
use crate::error::{RigWarning, WarningCode};
use crate::hierarchy::{BoneId, BoneTree, Side};
use crate::skeleton::{Axis, Constraint, Placement, RotationLimit, TrackTo};


/// End of a piston.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PistonRole {
    Cyl,
    Rod,
}

impl PistonRole {
    /// Parses a role from its name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Cyl" => Some(PistonRole::Cyl),
            "Rod" => Some(PistonRole::Rod),
            _ => None,
        }
    }

    /// Returns the role as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PistonRole::Cyl => "Cyl",
            PistonRole::Rod => "Rod",
        }
    }

    /// The opposite end.
    pub fn opposite(&self) -> Self {
        match self {
            PistonRole::Cyl => PistonRole::Rod,
            PistonRole::Rod => PistonRole::Cyl,
        }
    }
}

/// Piston membership recorded on a bone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PistonLink {
    pub id: String,
    pub role: PistonRole,
    /// Bone at the other end; absent for an incomplete pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart: Option<String>,
}

/// Identity of a piston pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PistonKey {
    pub id: String,
    pub side: Side,
}

/// The two ends of a piston, as far as they were found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PistonPair {
    pub cyl: Option<BoneId>,
    pub rod: Option<BoneId>,
}

impl PistonPair {
    /// Member with the given role.
    pub fn member(&self, role: PistonRole) -> Option<BoneId> {
        match role {
            PistonRole::Cyl => self.cyl,
            PistonRole::Rod => self.rod,
        }
    }

    fn slot(&mut self, role: PistonRole) -> &mut Option<BoneId> {
        match role {
            PistonRole::Cyl => &mut self.cyl,
            PistonRole::Rod => &mut self.rod,
        }
    }

    /// Both ends, if the pair is complete.
    pub fn complete(&self) -> Option<(BoneId, BoneId)> {
        Some((self.cyl?, self.rod?))
    }
}

/// Piston pairs found in a bone tree.
#[derive(Debug, Clone, Default)]
pub struct PistonPairs {
    pairs: BTreeMap<PistonKey, PistonPair>,
    members: HashMap<BoneId, (PistonKey, PistonRole)>,
}

impl PistonPairs {
    /// All pairs, ordered by id then side.
    pub fn iter(&self) -> impl Iterator<Item = (&PistonKey, &PistonPair)> {
        self.pairs.iter()
    }

    /// Number of pairs (complete or not).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no piston members were found.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair for a key.
    pub fn get(&self, key: &PistonKey) -> Option<&PistonPair> {
        self.pairs.get(key)
    }

    /// Counterpart of a bone in a complete pair.
    pub fn counterpart(&self, bone: BoneId) -> Option<BoneId> {
        let (key, role) = self.members.get(&bone)?;
        let pair = self.pairs.get(key)?;
        pair.complete()?;
        pair.member(role.opposite())
    }

    /// Piston link to record on a member bone.
    pub fn link(&self, tree: &BoneTree, bone: BoneId) -> Option<PistonLink> {
        let (key, role) = self.members.get(&bone)?;
        Some(PistonLink {
            id: key.id.clone(),
            role: *role,
            counterpart: self.counterpart(bone).map(|c| tree.get(c).name.clone()),
        })
    }
}

/// Detects piston pairs by name.
///
/// The first bone to claim a `(id, side, role)` slot keeps it; later claims
/// and pairs missing an end are reported as warnings.
pub fn detect_pairs(
    tree: &BoneTree,
    conventions: &CompiledConventions,
) -> (PistonPairs, Vec<RigWarning>) {
    let mut pairs = PistonPairs::default();
    let mut warnings = Vec::new();

    for (id, node) in tree.iter() {
        let Some((piston_id, role)) = conventions.piston_member(&node.base_name) else {
            continue;
        };
        let key = PistonKey {
            id: piston_id,
            side: node.side,
        };
        let slot = pairs.pairs.entry(key.clone()).or_default().slot(role);
        if let Some(existing) = *slot {
            warnings.push(RigWarning::with_entity(
                WarningCode::DuplicatePistonMember,
                format!(
                    "piston '{}' already has a {} member '{}'",
                    key.id,
                    role.as_str(),
                    tree.get(existing).name
                ),
                node.name.clone(),
            ));
            continue;
        }
        *slot = Some(id);
        pairs.members.insert(id, (key, role));
    }

    for (key, pair) in &pairs.pairs {
        if pair.complete().is_some() {
            continue;
        }
        let (present, missing) = match (pair.cyl, pair.rod) {
            (Some(cyl), None) => (cyl, PistonRole::Rod),
            (None, Some(rod)) => (rod, PistonRole::Cyl),
            _ => continue,
        };
        warnings.push(RigWarning::with_entity(
            WarningCode::IncompletePistonPair,
            format!(
                "piston '{}' has no {} member; default placement is used",
                key.id,
                missing.as_str()
            ),
            tree.get(present).name.clone(),
        ));
    }

    for warning in &warnings {
        warn!(code = %warning.code, entity = ?warning.entity, "{}", warning.message);
    }
    (pairs, warnings)
}

/// Tail and roll override for a piston member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAt {
    pub bone: BoneId,
    pub tail: DVec3,
    pub roll_axis: DVec3,
}

/// Aims each member of every complete pair at its counterpart's head.
///
/// `placements` is indexed by bone id. Members whose heads coincide keep
/// their default placement.
pub fn solve_look_at(pairs: &PistonPairs, placements: &[Placement], epsilon: f64) -> Vec<LookAt> {
    let mut out = Vec::new();
    for (key, pair) in pairs.iter() {
        let Some((cyl, rod)) = pair.complete() else {
            continue;
        };
        for (me, other) in [(cyl, rod), (rod, cyl)] {
            let mine = &placements[me.0];
            let target = placements[other.0].head;
            let distance = mine.head.distance(target);
            if distance < epsilon {
                debug!(piston = %key.id, "piston heads coincide; keeping default placement");
                continue;
            }
            let direction = (target - mine.head) / distance;
            out.push(LookAt {
                bone: me,
                tail: target,
                roll_axis: roll_toward(direction, mine.out_of_plane, mine.roll_axis),
            });
        }
    }
    out
}

/// Roll axis perpendicular to `direction`, as close to `preferred` as possible.
fn roll_toward(direction: DVec3, preferred: DVec3, fallback: DVec3) -> DVec3 {
    [preferred, fallback]
        .into_iter()
        .find_map(|axis| (axis - direction * axis.dot(direction)).try_normalize())
        .unwrap_or_else(|| direction.any_orthonormal_vector())
}

/// Rotation limit of a piston member: rotation only about the hinge axis.
pub fn piston_limit(hinge_axis: Axis) -> RotationLimit {
    RotationLimit::hinge(hinge_axis)
}

/// Runtime constraints wired on a member of a complete pair.
pub fn runtime_constraints(counterpart: &str, hinge_axis: Axis) -> [Constraint; 2] {
    [
        Constraint::TrackTo(TrackTo::new(counterpart)),
        Constraint::LimitRotation(piston_limit(hinge_axis)),
    ]
}
