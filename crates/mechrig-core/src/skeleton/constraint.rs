//! Pose constraints, custom properties, and drivers.
//!
//! These records describe wiring that the host evaluates at runtime; the
//! engine only builds them.

use serde::{Deserialize, Serialize};

use super::limits::{Axis, RotationLimit};

/// Track-to constraint aiming the bone's Y axis at another bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackTo {
    pub target: String,
    pub track_axis: Axis,
    pub up_axis: Axis,
}

impl TrackTo {
    /// Tracks `target` along Y with Z up.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            track_axis: Axis::Y,
            up_axis: Axis::Z,
        }
    }
}

/// IK solver constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IkConstraint {
    /// Bone the chain reaches toward.
    pub target: String,
    /// Bone that orients the chain's bend plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pole: Option<String>,
    /// Pole angle in radians.
    #[serde(default)]
    pub pole_angle: f64,
    /// Number of bones affected, including the owner.
    pub chain_count: u8,
    /// Static influence; overridden by the FK/IK driver when present.
    pub influence: f64,
}

/// A constraint on a pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    LimitRotation(RotationLimit),
    TrackTo(TrackTo),
    Ik(IkConstraint),
}

impl Constraint {
    /// Constraint name; at most one constraint of each name per bone.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::LimitRotation(_) => "Limit Rotation",
            Constraint::TrackTo(_) => "Track To",
            Constraint::Ik(_) => "IK",
        }
    }
}

/// Name of the IK constraint.
pub const IK_CONSTRAINT: &str = "IK";

/// Name of the rotation limit constraint.
pub const LIMIT_ROTATION_CONSTRAINT: &str = "Limit Rotation";

/// Name of the track-to constraint.
pub const TRACK_TO_CONSTRAINT: &str = "Track To";

/// Scalar custom property with a UI range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomProperty {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl CustomProperty {
    /// Creates a property; the value is clamped into the range.
    pub fn new(value: f64, min: f64, max: f64) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    /// Sets the value, clamped into the range.
    pub fn set(&mut self, value: f64) {
        self.value = value.clamp(self.min, self.max);
    }
}

/// Driver expression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverKind {
    #[default]
    Average,
}

/// Driver variable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableKind {
    #[default]
    SingleProp,
}

/// Variable reading a custom property of a pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverVariable {
    pub name: String,
    #[serde(default)]
    pub kind: VariableKind,
    pub bone: String,
    pub property: String,
}

impl DriverVariable {
    /// Host data path of the property this variable reads.
    pub fn data_path(&self) -> String {
        format!("pose.bones[\"{}\"][\"{}\"]", self.bone, self.property)
    }
}

/// Driver on a constraint property of a pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Driver {
    /// Bone carrying the driven constraint.
    pub owner: String,
    /// Name of the driven constraint.
    pub constraint: String,
    /// Driven property of the constraint.
    pub data_path: String,
    #[serde(default)]
    pub kind: DriverKind,
    pub variables: Vec<DriverVariable>,
}

impl Driver {
    /// Driver making an IK constraint's influence follow the FK/IK property.
    pub fn ik_blend(owner: &str, control: &str, property: &str) -> Self {
        Self {
            owner: owner.to_string(),
            constraint: IK_CONSTRAINT.to_string(),
            data_path: "influence".to_string(),
            kind: DriverKind::Average,
            variables: vec![DriverVariable {
                name: "var".to_string(),
                kind: VariableKind::SingleProp,
                bone: control.to_string(),
                property: property.to_string(),
            }],
        }
    }

    /// Returns true if this driver drives the same property.
    pub fn drives(&self, owner: &str, constraint: &str, data_path: &str) -> bool {
        self.owner == owner && self.constraint == constraint && self.data_path == data_path
    }

    /// Evaluates the driver given a property lookup.
    ///
    /// Returns `None` if any variable cannot be resolved.
    pub fn evaluate<F>(&self, lookup: F) -> Option<f64>
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        if self.variables.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for var in &self.variables {
            sum += lookup(&var.bone, &var.property)?;
        }
        match self.kind {
            DriverKind::Average => Some(sum / self.variables.len() as f64),
        }
    }
}
