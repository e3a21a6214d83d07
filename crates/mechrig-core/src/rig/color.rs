//! Bone colors.

use serde::{Deserialize, Serialize};

use super::collection::CollectionPreset;

/// RGB color value for bone coloring (0.0-1.0 range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl BoneColor {
    /// Creates a new bone color from RGB values.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Standard red color for left-side bones.
    pub fn left_red() -> Self {
        Self::new(1.0, 0.3, 0.3)
    }

    /// Standard blue color for right-side bones.
    pub fn right_blue() -> Self {
        Self::new(0.2, 0.4, 1.0)
    }

    /// Standard yellow color for center bones.
    pub fn center_yellow() -> Self {
        Self::new(1.0, 0.9, 0.2)
    }

    /// Standard orange color for piston bones.
    pub fn mechanics_orange() -> Self {
        Self::new(1.0, 0.55, 0.1)
    }

    /// Standard grey for hidden mechanism bones.
    pub fn mechanism_grey() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Returns the color as an array [R, G, B].
    pub fn as_array(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

/// Colors per collection preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneColorScheme {
    pub left: BoneColor,
    pub right: BoneColor,
    pub center: BoneColor,
    pub mechanics: BoneColor,
    pub mechanism: BoneColor,
}

impl Default for BoneColorScheme {
    fn default() -> Self {
        Self {
            left: BoneColor::left_red(),
            right: BoneColor::right_blue(),
            center: BoneColor::center_yellow(),
            mechanics: BoneColor::mechanics_orange(),
            mechanism: BoneColor::mechanism_grey(),
        }
    }
}

impl BoneColorScheme {
    /// Returns the color for bones of a collection preset.
    pub fn color_for(&self, preset: CollectionPreset) -> BoneColor {
        match preset {
            CollectionPreset::Left => self.left,
            CollectionPreset::Right => self.right,
            CollectionPreset::Center => self.center,
            CollectionPreset::Mechanics => self.mechanics,
            CollectionPreset::Mechanism => self.mechanism,
        }
    }
}
