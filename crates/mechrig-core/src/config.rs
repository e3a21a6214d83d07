//! Naming conventions and synthesis settings.
//!
//! Conventions are authored as plain strings (so they round-trip through
//! JSON) and compiled once into [`CompiledConventions`] before any stage
//! runs.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RigError, RigResult};
use crate::hierarchy::Side;
use crate::linkage::PistonRole;

fn default_mirror_marker() -> String {
    "_Mirrored".to_string()
}

fn default_left_suffix() -> String {
    "_L".to_string()
}

fn default_right_suffix() -> String {
    "_R".to_string()
}

fn default_hinge_prefix() -> String {
    "Hinge_".to_string()
}

fn default_pivot_pattern() -> String {
    r"^(Pivot|Hinge)_".to_string()
}

fn default_piston_pattern() -> String {
    r"^Piston_(?P<id>[A-Za-z0-9]+)_(?P<role>Cyl|Rod)$".to_string()
}

fn default_control_suffix() -> String {
    "_IK".to_string()
}

fn default_solver_suffix() -> String {
    "_IK_Solver".to_string()
}

fn default_pole_suffix() -> String {
    "_IK_Pole".to_string()
}

fn default_blend_property() -> String {
    "IK_FK".to_string()
}

/// Naming and grouping conventions recognized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConventions {
    /// Marker in a part-group name that requests a mirrored L/R pair.
    #[serde(default = "default_mirror_marker")]
    pub mirror_marker: String,
    /// Suffix appended to left-side bone names.
    #[serde(default = "default_left_suffix")]
    pub left_suffix: String,
    /// Suffix appended to right-side bone names.
    #[serde(default = "default_right_suffix")]
    pub right_suffix: String,
    /// Prefix that marks a bone (or its source part) as a single-axis hinge.
    #[serde(default = "default_hinge_prefix")]
    pub hinge_prefix: String,
    /// Pattern for inner parts that dictate the pivot of their bone.
    #[serde(default = "default_pivot_pattern")]
    pub pivot_pattern: String,
    /// Pattern for piston members; must capture `id` and `role` (`Cyl`/`Rod`).
    #[serde(default = "default_piston_pattern")]
    pub piston_pattern: String,
    /// Suffix of the user-facing IK control bone.
    #[serde(default = "default_control_suffix")]
    pub control_suffix: String,
    /// Suffix of the hidden IK solver target bone.
    #[serde(default = "default_solver_suffix")]
    pub solver_suffix: String,
    /// Suffix of the IK pole bone.
    #[serde(default = "default_pole_suffix")]
    pub pole_suffix: String,
    /// Name of the FK/IK blend property on control bones.
    #[serde(default = "default_blend_property")]
    pub blend_property: String,
}

impl Default for RigConventions {
    fn default() -> Self {
        Self {
            mirror_marker: default_mirror_marker(),
            left_suffix: default_left_suffix(),
            right_suffix: default_right_suffix(),
            hinge_prefix: default_hinge_prefix(),
            pivot_pattern: default_pivot_pattern(),
            piston_pattern: default_piston_pattern(),
            control_suffix: default_control_suffix(),
            solver_suffix: default_solver_suffix(),
            pole_suffix: default_pole_suffix(),
            blend_property: default_blend_property(),
        }
    }
}

impl RigConventions {
    /// Parses conventions from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the mirror marker.
    pub fn with_mirror_marker(mut self, marker: impl Into<String>) -> Self {
        self.mirror_marker = marker.into();
        self
    }

    /// Sets the hinge prefix.
    pub fn with_hinge_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hinge_prefix = prefix.into();
        self
    }

    /// Sets the pivot-override pattern.
    pub fn with_pivot_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pivot_pattern = pattern.into();
        self
    }

    /// Sets the piston pattern.
    pub fn with_piston_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.piston_pattern = pattern.into();
        self
    }

    /// Compiles the patterns and checks that every marker is usable.
    pub fn compile(&self) -> RigResult<CompiledConventions> {
        for (field, value) in [
            ("mirror_marker", &self.mirror_marker),
            ("left_suffix", &self.left_suffix),
            ("right_suffix", &self.right_suffix),
            ("control_suffix", &self.control_suffix),
            ("solver_suffix", &self.solver_suffix),
            ("pole_suffix", &self.pole_suffix),
            ("blend_property", &self.blend_property),
        ] {
            if value.is_empty() {
                return Err(RigError::validation_at(
                    ErrorCode::InvalidPattern,
                    "convention must not be empty",
                    field,
                ));
            }
        }

        let pivot = compile_pattern("pivot_pattern", &self.pivot_pattern)?;
        let piston = compile_pattern("piston_pattern", &self.piston_pattern)?;

        let names: Vec<&str> = piston.capture_names().flatten().collect();
        if !names.contains(&"id") || !names.contains(&"role") {
            return Err(RigError::validation_at(
                ErrorCode::InvalidPattern,
                "piston pattern must define the named groups 'id' and 'role'",
                "piston_pattern",
            ));
        }

        Ok(CompiledConventions {
            raw: self.clone(),
            pivot,
            piston,
        })
    }
}

fn compile_pattern(field: &str, pattern: &str) -> RigResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        RigError::validation_at(
            ErrorCode::InvalidPattern,
            format!("invalid pattern '{}': {}", pattern, e),
            field,
        )
    })
}

/// Conventions with their patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledConventions {
    raw: RigConventions,
    pivot: Regex,
    piston: Regex,
}

impl CompiledConventions {
    /// Returns the source conventions.
    pub fn raw(&self) -> &RigConventions {
        &self.raw
    }

    /// Returns true if the part group requests a mirrored pair.
    pub fn is_mirrored(&self, group: &str) -> bool {
        group.contains(&self.raw.mirror_marker)
    }

    /// Returns the group name with the mirror marker removed.
    pub fn base_name(&self, group: &str) -> String {
        group.replace(&self.raw.mirror_marker, "")
    }

    /// Returns the bone name emitted for a base name on the given side.
    pub fn sided_name(&self, base: &str, side: Side) -> String {
        match side {
            Side::None => base.to_string(),
            Side::Left => format!("{}{}", base, self.raw.left_suffix),
            Side::Right => format!("{}{}", base, self.raw.right_suffix),
        }
    }

    /// Returns true if the name carries the hinge prefix.
    pub fn is_hinge(&self, name: &str) -> bool {
        name.starts_with(&self.raw.hinge_prefix)
    }

    /// Returns true if the node name requests a pivot override.
    pub fn is_pivot(&self, name: &str) -> bool {
        self.pivot.is_match(name)
    }

    /// Parses a piston member name into its pair id and role.
    pub fn piston_member(&self, name: &str) -> Option<(String, PistonRole)> {
        let caps = self.piston.captures(name)?;
        let id = caps.name("id")?.as_str().to_string();
        let role = PistonRole::parse(caps.name("role")?.as_str())?;
        Some((id, role))
    }

    /// Infers the display side of a bone from its name.
    ///
    /// Numbered duplicates such as `Arm_L.001` keep the side of their base name.
    pub fn display_side(&self, name: &str) -> Side {
        let stem = strip_numeric_suffix(name);
        if stem.ends_with(&self.raw.left_suffix) || stem.contains(".L") {
            Side::Left
        } else if stem.ends_with(&self.raw.right_suffix) || stem.contains(".R") {
            Side::Right
        } else {
            Side::None
        }
    }

    /// Name of the control bone for an owner.
    pub fn control_name(&self, owner: &str) -> String {
        format!("{}{}", owner, self.raw.control_suffix)
    }

    /// Name of the solver bone for an owner.
    pub fn solver_name(&self, owner: &str) -> String {
        format!("{}{}", owner, self.raw.solver_suffix)
    }

    /// Name of the pole bone for an owner.
    pub fn pole_name(&self, owner: &str) -> String {
        format!("{}{}", owner, self.raw.pole_suffix)
    }

    /// Name of the FK/IK blend property.
    pub fn blend_property(&self) -> &str {
        &self.raw.blend_property
    }
}

/// Strips a trailing `.NNN` duplicate counter.
pub(crate) fn strip_numeric_suffix(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, digits))
            if !stem.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            stem
        }
        _ => name,
    }
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_min_length() -> f64 {
    0.2
}

fn default_length_ratio() -> f64 {
    0.5
}

fn default_epsilon() -> f64 {
    1e-6
}

fn default_skeleton_name() -> String {
    "MechRig".to_string()
}

/// Numeric settings for skeleton synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisSettings {
    /// Global multiplier applied to every bone length.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Lower bound on a bone's length before scaling.
    #[serde(default = "default_min_length")]
    pub min_length: f64,
    /// Fraction of a part's bounding extent used as the bone length.
    #[serde(default = "default_length_ratio")]
    pub length_ratio: f64,
    /// Distance below which two points are treated as coincident.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Name given to a newly created skeleton.
    #[serde(default = "default_skeleton_name")]
    pub skeleton_name: String,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            min_length: default_min_length(),
            length_ratio: default_length_ratio(),
            epsilon: default_epsilon(),
            skeleton_name: default_skeleton_name(),
        }
    }
}

impl SynthesisSettings {
    /// Sets the global scale factor.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Sets the skeleton name.
    pub fn with_skeleton_name(mut self, name: impl Into<String>) -> Self {
        self.skeleton_name = name.into();
        self
    }

    /// Bone length for a part with the given bounding extent.
    pub fn bone_length(&self, extent: f64) -> f64 {
        (self.length_ratio * extent).max(self.min_length) * self.scale_factor
    }

    /// Checks that every numeric setting is usable.
    pub fn validate(&self) -> RigResult<()> {
        for (field, value) in [
            ("scale_factor", self.scale_factor),
            ("min_length", self.min_length),
            ("length_ratio", self.length_ratio),
            ("epsilon", self.epsilon),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RigError::validation_at(
                    ErrorCode::InvalidSetting,
                    format!("{} must be a positive number, got {}", field, value),
                    field,
                ));
            }
        }
        if self.skeleton_name.is_empty() {
            return Err(RigError::validation_at(
                ErrorCode::InvalidSetting,
                "skeleton name must not be empty",
                "skeleton_name",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conventions() -> CompiledConventions {
        RigConventions::default().compile().unwrap()
    }

    #[test]
    fn test_mirror_marker() {
        let c = conventions();
        assert!(c.is_mirrored("Arm_Mirrored"));
        assert!(!c.is_mirrored("Body"));
        assert_eq!(c.base_name("Arm_Mirrored"), "Arm");
        assert_eq!(c.sided_name("Arm", Side::Right), "Arm_R");
        assert_eq!(c.sided_name("Body", Side::None), "Body");
    }

    #[test]
    fn test_piston_member() {
        let c = conventions();
        assert_eq!(
            c.piston_member("Piston_A1_Cyl"),
            Some(("A1".to_string(), PistonRole::Cyl))
        );
        assert_eq!(
            c.piston_member("Piston_A1_Rod"),
            Some(("A1".to_string(), PistonRole::Rod))
        );
        assert_eq!(c.piston_member("Piston_A1_Shaft"), None);
        assert_eq!(c.piston_member("Arm"), None);
    }

    #[test]
    fn test_pivot_and_hinge() {
        let c = conventions();
        assert!(c.is_pivot("Pivot_Elbow"));
        assert!(c.is_pivot("Hinge_Knee"));
        assert!(!c.is_pivot("ElbowPivot"));
        assert!(c.is_hinge("Hinge_Elbow"));
        assert!(!c.is_hinge("Elbow"));
    }

    #[test]
    fn test_display_side() {
        let c = conventions();
        assert_eq!(c.display_side("Arm_L"), Side::Left);
        assert_eq!(c.display_side("Arm_R.001"), Side::Right);
        assert_eq!(c.display_side("hand.L"), Side::Left);
        assert_eq!(c.display_side("Body"), Side::None);
        assert_eq!(c.display_side("Body.001"), Side::None);
    }

    #[test]
    fn test_strip_numeric_suffix() {
        assert_eq!(strip_numeric_suffix("Arm.001"), "Arm");
        assert_eq!(strip_numeric_suffix("Arm.L"), "Arm.L");
        assert_eq!(strip_numeric_suffix(".001"), ".001");
    }

    #[test]
    fn test_invalid_piston_pattern() {
        let err = RigConventions::default()
            .with_piston_pattern("^Piston_(.+)$")
            .compile()
            .unwrap_err();
        assert_eq!(err.code(), "R008");

        let err = RigConventions::default()
            .with_pivot_pattern("(")
            .compile()
            .unwrap_err();
        assert_eq!(err.entity(), Some("pivot_pattern"));
    }

    #[test]
    fn test_conventions_from_json_defaults() {
        let c = RigConventions::from_json(r#"{"hinge_prefix": "Joint_"}"#).unwrap();
        assert_eq!(c.hinge_prefix, "Joint_");
        assert_eq!(c.mirror_marker, "_Mirrored");
        assert!(RigConventions::from_json(r#"{"unknown": 1}"#).is_err());
    }

    #[test]
    fn test_bone_length() {
        let settings = SynthesisSettings::default();
        assert!((settings.bone_length(2.0) - 1.0).abs() < 1e-12);
        assert!((settings.bone_length(0.1) - 0.2).abs() < 1e-12);

        let scaled = SynthesisSettings::default().with_scale_factor(2.0);
        assert!((scaled.bone_length(0.1) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_settings_validation() {
        assert!(SynthesisSettings::default().validate().is_ok());
        let err = SynthesisSettings::default()
            .with_scale_factor(0.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.entity(), Some("scale_factor"));
    }
}
