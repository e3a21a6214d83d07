//! Export settings handed to the export collaborator.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RigError, RigResult};
use crate::skeleton::Axis;

/// Signed world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisDirection {
    #[serde(rename = "X")]
    PosX,
    #[serde(rename = "Y")]
    PosY,
    #[serde(rename = "Z")]
    PosZ,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl AxisDirection {
    /// Unsigned axis.
    pub fn axis(&self) -> Axis {
        match self {
            AxisDirection::PosX | AxisDirection::NegX => Axis::X,
            AxisDirection::PosY | AxisDirection::NegY => Axis::Y,
            AxisDirection::PosZ | AxisDirection::NegZ => Axis::Z,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisDirection::PosX => "X",
            AxisDirection::PosY => "Y",
            AxisDirection::PosZ => "Z",
            AxisDirection::NegX => "-X",
            AxisDirection::NegY => "-Y",
            AxisDirection::NegZ => "-Z",
        }
    }
}

fn default_forward() -> AxisDirection {
    AxisDirection::NegZ
}

fn default_up() -> AxisDirection {
    AxisDirection::PosY
}

fn default_global_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Axis conversion, scale, and bake options of an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSettings {
    #[serde(default = "default_forward")]
    pub forward_axis: AxisDirection,
    #[serde(default = "default_up")]
    pub up_axis: AxisDirection,
    #[serde(default = "default_global_scale")]
    pub global_scale: f64,
    /// Bake constraint-driven motion into keyframes.
    #[serde(default = "default_true")]
    pub bake_animation: bool,
    #[serde(default)]
    pub add_leaf_bones: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            forward_axis: default_forward(),
            up_axis: default_up(),
            global_scale: default_global_scale(),
            bake_animation: true,
            add_leaf_bones: false,
        }
    }
}

impl ExportSettings {
    /// Sets the axis conversion.
    pub fn with_axes(mut self, forward: AxisDirection, up: AxisDirection) -> Self {
        self.forward_axis = forward;
        self.up_axis = up;
        self
    }

    /// Checks the settings before they reach the collaborator.
    pub fn validate(&self) -> RigResult<()> {
        if self.forward_axis.axis() == self.up_axis.axis() {
            return Err(RigError::validation_at(
                ErrorCode::InvalidSetting,
                format!(
                    "forward axis {} and up axis {} are parallel",
                    self.forward_axis.as_str(),
                    self.up_axis.as_str()
                ),
                "up_axis",
            ));
        }
        if !(self.global_scale.is_finite() && self.global_scale > 0.0) {
            return Err(RigError::validation_at(
                ErrorCode::InvalidSetting,
                "global scale must be positive",
                "global_scale",
            ));
        }
        Ok(())
    }
}
