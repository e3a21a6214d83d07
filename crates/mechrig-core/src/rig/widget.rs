//! Custom shape widgets for pose bones.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Widget shape drawn in place of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetShape {
    /// Default bone display.
    None,
    #[default]
    Circle,
    Box,
    Sphere,
}

impl WidgetShape {
    /// Name of the widget object in the host scene, if any.
    pub fn widget_name(&self) -> Option<&'static str> {
        match self {
            WidgetShape::None => None,
            WidgetShape::Circle => Some("WGT_Bone_CIRCLE"),
            WidgetShape::Box => Some("WGT_Bone_BOX"),
            WidgetShape::Sphere => Some("WGT_Bone_SPHERE"),
        }
    }
}

/// Custom shape assignment of a pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomShape {
    pub widget: String,
    pub scale: DVec3,
    pub translation: DVec3,
}

impl CustomShape {
    /// Shape sized to a bone: uniform scale by `length * scale`, centered half a bone along Y.
    ///
    /// Returns `None` for [`WidgetShape::None`].
    pub fn for_bone(shape: WidgetShape, length: f64, scale: f64) -> Option<Self> {
        let widget = shape.widget_name()?;
        Some(Self {
            widget: widget.to_string(),
            scale: DVec3::splat(length * scale),
            translation: DVec3::new(0.0, length * 0.5, 0.0),
        })
    }
}
