//! Per-bone control-rig configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::color::BoneColorScheme;
use super::widget::WidgetShape;
use crate::error::{ErrorCode, RigError, RigResult};
use crate::skeleton::{BoneKind, Skeleton};

fn default_chain_length() -> u8 {
    2
}

/// Settings for one deform bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneConfig {
    /// Whether the bone gets an IK apparatus.
    #[serde(default)]
    pub use_ik: bool,
    /// Number of bones the IK solver affects, including this one.
    #[serde(default = "default_chain_length")]
    pub chain_length: u8,
    /// Widget drawn for the bone.
    #[serde(default)]
    pub control_shape: WidgetShape,
}

impl Default for BoneConfig {
    fn default() -> Self {
        Self {
            use_ik: false,
            chain_length: default_chain_length(),
            control_shape: WidgetShape::default(),
        }
    }
}

impl BoneConfig {
    /// IK request with the given chain length.
    pub fn ik(chain_length: u8) -> Self {
        Self {
            use_ik: true,
            chain_length,
            ..Self::default()
        }
    }

    /// Sets the widget shape.
    pub fn with_shape(mut self, shape: WidgetShape) -> Self {
        self.control_shape = shape;
        self
    }
}

/// Control-rig configuration: per-bone settings keyed by bone name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    #[serde(default)]
    pub bones: BTreeMap<String, BoneConfig>,
    #[serde(default)]
    pub colors: BoneColorScheme,
}

impl RigConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the configuration of one bone.
    pub fn with_bone(mut self, name: impl Into<String>, config: BoneConfig) -> Self {
        self.bones.insert(name.into(), config);
        self
    }

    /// Configuration of a bone; bones without an entry use the defaults.
    pub fn bone(&self, name: &str) -> BoneConfig {
        self.bones.get(name).copied().unwrap_or_default()
    }

    /// Bones with an IK request, by name.
    pub fn ik_requests(&self) -> impl Iterator<Item = (&str, u8)> {
        self.bones
            .iter()
            .filter(|(_, c)| c.use_ik)
            .map(|(name, c)| (name.as_str(), c.chain_length))
    }

    /// Checks every entry against the skeleton.
    pub fn validate(&self, skeleton: &Skeleton) -> RigResult<()> {
        for (name, config) in &self.bones {
            match skeleton.bone(name) {
                Some(bone) if bone.kind == BoneKind::Deform => {}
                Some(_) => {
                    return Err(RigError::validation_at(
                        ErrorCode::UnknownBone,
                        "only deform bones can be configured",
                        name,
                    ));
                }
                None => {
                    return Err(RigError::validation_at(
                        ErrorCode::UnknownBone,
                        "configured bone does not exist in the skeleton",
                        name,
                    ));
                }
            }
            if config.use_ik && config.chain_length == 0 {
                return Err(RigError::validation_at(
                    ErrorCode::InvalidChainLength,
                    "IK chain length must be at least 1",
                    name,
                ));
            }
        }
        Ok(())
    }
}
