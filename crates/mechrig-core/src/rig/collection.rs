//! Bone collections for organizing the rig in the viewport.

use serde::{Deserialize, Serialize};

use crate::hierarchy::Side;

fn default_true() -> bool {
    true
}

/// Named group of bones with shared visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneCollection {
    /// Name of the collection (e.g., "Left", "Mechanism").
    pub name: String,
    /// Member bone names, in assignment order.
    #[serde(default)]
    pub bones: Vec<String>,
    /// Whether this collection is visible by default.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Whether bones in this collection are selectable.
    #[serde(default = "default_true")]
    pub selectable: bool,
}

impl BoneCollection {
    /// Creates a new, empty, visible collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
            visible: true,
            selectable: true,
        }
    }

    /// Returns true if the bone is a member.
    pub fn contains(&self, bone: &str) -> bool {
        self.bones.iter().any(|b| b == bone)
    }

    /// Adds a bone if it is not already a member.
    pub fn assign(&mut self, bone: &str) -> bool {
        if self.contains(bone) {
            return false;
        }
        self.bones.push(bone.to_string());
        true
    }

    /// Removes a bone if present.
    pub fn unassign(&mut self, bone: &str) -> bool {
        let before = self.bones.len();
        self.bones.retain(|b| b != bone);
        self.bones.len() != before
    }
}

/// Standard collections the control-rig pass fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPreset {
    /// Left-side bones and their controls.
    Left,
    /// Right-side bones and their controls.
    Right,
    /// Unmirrored bones and their controls.
    Center,
    /// Piston members.
    Mechanics,
    /// IK solver targets; not for direct animation.
    Mechanism,
}

impl CollectionPreset {
    /// Preset for a display side.
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Left => CollectionPreset::Left,
            Side::Right => CollectionPreset::Right,
            Side::None => CollectionPreset::Center,
        }
    }

    /// Returns the default name for this preset.
    pub fn default_name(&self) -> &'static str {
        match self {
            CollectionPreset::Left => "Left",
            CollectionPreset::Right => "Right",
            CollectionPreset::Center => "Center",
            CollectionPreset::Mechanics => "Mechanics",
            CollectionPreset::Mechanism => "Mechanism",
        }
    }

    /// Mechanism bones are hidden and cannot be selected.
    pub fn is_hidden(&self) -> bool {
        matches!(self, CollectionPreset::Mechanism)
    }

    /// Creates a bone collection from this preset.
    pub fn to_collection(&self) -> BoneCollection {
        BoneCollection {
            name: self.default_name().to_string(),
            bones: Vec::new(),
            visible: !self.is_hidden(),
            selectable: !self.is_hidden(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_is_idempotent() {
        let mut c = BoneCollection::new("Left");
        assert!(c.assign("Arm_L"));
        assert!(!c.assign("Arm_L"));
        assert_eq!(c.bones, vec!["Arm_L".to_string()]);
        assert!(c.unassign("Arm_L"));
        assert!(!c.unassign("Arm_L"));
    }

    #[test]
    fn test_presets() {
        assert_eq!(CollectionPreset::for_side(Side::Right).default_name(), "Right");
        let mechanism = CollectionPreset::Mechanism.to_collection();
        assert!(!mechanism.visible);
        assert!(!mechanism.selectable);
        assert!(CollectionPreset::Mechanics.to_collection().visible);
    }
}
