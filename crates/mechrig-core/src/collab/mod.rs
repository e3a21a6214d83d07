//! Contracts with the host-side collaborators.
//!
//! Mesh duplication, binding, and export are performed by the host. The
//! engine hands each collaborator a pure plan and consumes only what comes
//! back: geometry tagged with the name of its owning bone.

mod binding;
mod duplication;
mod export;


use serde::{Deserialize, Serialize};

use crate::hierarchy::Side;
use crate::skeleton::Skeleton;

pub use binding::{plan_binding, BindTarget, Binding};
pub use duplication::{assign_skin, plan_duplication, DuplicationEntry, SkinAssignment, WeightMode};
pub use export::{AxisDirection, ExportSettings};

/// Geometry produced by the host, tagged with its owning bone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedGeometry {
    /// Name of the duplicated object.
    pub object: String,
    /// Bone the geometry follows.
    pub bone: String,
    #[serde(default)]
    pub side: Side,
}

/// Duplicates and evaluates geometry according to a plan.
pub trait GeometryCollaborator {
    type Error: std::error::Error;

    /// Performs the duplication, including mirrored copies and winding flips.
    fn duplicate(&mut self, plan: &[DuplicationEntry]) -> Result<Vec<TaggedGeometry>, Self::Error>;
}

/// Parents geometry to bones without baking.
pub trait BindingCollaborator {
    type Error: std::error::Error;

    /// Applies skin assignments and parenting.
    fn bind(
        &mut self,
        skeleton: &Skeleton,
        skin: &[SkinAssignment],
        bindings: &[Binding],
    ) -> Result<(), Self::Error>;
}

/// Flattens a finished rig into an engine-ready export.
pub trait ExportCollaborator {
    type Error: std::error::Error;

    /// Bakes and exports the rig.
    fn export(&mut self, skeleton: &Skeleton, settings: &ExportSettings) -> Result<(), Self::Error>;
}
