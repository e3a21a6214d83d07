//! Rotation limits and IK axis locks.

use serde::{Deserialize, Serialize};

/// A local bone axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the axis as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    /// Column index of the axis in a rotation matrix.
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Limit on rotation about one axis, in radians.
///
/// `locked` enables the limit; an enabled limit with `min == max` pins the
/// axis to that angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisLimit {
    pub locked: bool,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

impl AxisLimit {
    /// No limit on this axis.
    pub fn free() -> Self {
        Self::default()
    }

    /// Axis pinned at zero rotation.
    pub fn pinned() -> Self {
        Self {
            locked: true,
            min: 0.0,
            max: 0.0,
        }
    }

    /// Axis limited to a range.
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            locked: true,
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Returns true if the limit allows only a single angle.
    pub fn is_collapsed(&self, epsilon: f64) -> bool {
        self.locked && (self.max - self.min).abs() < epsilon
    }
}

/// Per-axis rotation limit evaluated in the bone's local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationLimit {
    pub x: AxisLimit,
    pub y: AxisLimit,
    pub z: AxisLimit,
}

impl RotationLimit {
    /// Single-axis hinge: every axis except `free_axis` is pinned.
    pub fn hinge(free_axis: Axis) -> Self {
        let mut limit = Self {
            x: AxisLimit::pinned(),
            y: AxisLimit::pinned(),
            z: AxisLimit::pinned(),
        };
        *limit.axis_mut(free_axis) = AxisLimit::free();
        limit
    }

    /// Returns the limit for one axis.
    pub fn axis(&self, axis: Axis) -> &AxisLimit {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Returns the limit for one axis, mutably.
    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisLimit {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Axes without an enabled limit.
    pub fn free_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|a| !self.axis(*a).locked)
            .collect()
    }
}

/// How the IK solver treats one axis of a chain bone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IkAxisState {
    #[default]
    Free,
    /// The solver may not rotate about this axis.
    Locked,
    /// The solver keeps rotation about this axis within a range.
    Limited { min: f64, max: f64 },
}

impl IkAxisState {
    fn from_limit(limit: &AxisLimit, epsilon: f64) -> Self {
        if !limit.locked {
            IkAxisState::Free
        } else if limit.is_collapsed(epsilon) {
            IkAxisState::Locked
        } else {
            IkAxisState::Limited {
                min: limit.min,
                max: limit.max,
            }
        }
    }
}

/// IK axis locks of a pose bone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IkAxes {
    #[serde(default)]
    pub x: IkAxisState,
    #[serde(default)]
    pub y: IkAxisState,
    #[serde(default)]
    pub z: IkAxisState,
}

impl IkAxes {
    /// Derives IK locks from a rotation limit.
    pub fn from_limit(limit: &RotationLimit, epsilon: f64) -> Self {
        Self {
            x: IkAxisState::from_limit(&limit.x, epsilon),
            y: IkAxisState::from_limit(&limit.y, epsilon),
            z: IkAxisState::from_limit(&limit.z, epsilon),
        }
    }

    /// Returns the state of one axis.
    pub fn axis(&self, axis: Axis) -> IkAxisState {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns true if no axis is locked or limited.
    pub fn is_free(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hinge_limit() {
        let limit = RotationLimit::hinge(Axis::Y);
        assert!(limit.x.locked);
        assert!(!limit.y.locked);
        assert!(limit.z.locked);
        assert_eq!(limit.free_axes(), vec![Axis::Y]);
    }

    #[test]
    fn test_ik_axes_from_limit() {
        let mut limit = RotationLimit::hinge(Axis::Z);
        limit.x = AxisLimit::range(-0.5, 1.0);

        let axes = IkAxes::from_limit(&limit, 1e-6);
        assert_eq!(axes.x, IkAxisState::Limited { min: -0.5, max: 1.0 });
        assert_eq!(axes.y, IkAxisState::Locked);
        assert_eq!(axes.z, IkAxisState::Free);
        assert!(!axes.is_free());
    }

    #[test]
    fn test_range_orders_bounds() {
        let limit = AxisLimit::range(1.0, -1.0);
        assert_eq!(limit.min, -1.0);
        assert_eq!(limit.max, 1.0);
        assert!(!limit.is_collapsed(1e-6));
        assert!(AxisLimit::pinned().is_collapsed(1e-6));
        assert!(!AxisLimit::free().is_collapsed(1e-6));
    }

    #[test]
    fn test_ik_axis_serde() {
        let json = serde_json::to_string(&IkAxisState::Limited { min: 0.0, max: 1.0 }).unwrap();
        assert_eq!(json, r#"{"state":"limited","min":0.0,"max":1.0}"#);
    }
}
