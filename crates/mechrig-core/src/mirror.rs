//! Reflection through a mirror plane.
//!
//! The plane is the local YZ plane of a reflection origin node: a vector
//! is expressed in the origin's frame, its local X component is negated,
//! and it is re-expressed in world space. Points and directions are
//! reflected separately; a direction ignores the origin's translation.

use glam::{DMat3, DMat4, DVec3};

use crate::error::{ErrorCode, RigError, RigResult};

const FLIP_X: DVec3 = DVec3::new(-1.0, 1.0, 1.0);

/// Scene node defining the mirror plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionOrigin {
    name: String,
    matrix: DMat4,
    inverse: DMat4,
    linear: DMat3,
    linear_inverse: DMat3,
}

impl ReflectionOrigin {
    /// Creates a reflection origin from the node's world transform.
    ///
    /// Fails with a geometry error if the transform cannot be inverted.
    pub fn new(name: impl Into<String>, matrix: DMat4, epsilon: f64) -> RigResult<Self> {
        let name = name.into();
        let linear = DMat3::from_mat4(matrix);
        let det = linear.determinant();
        if !matrix.is_finite() || det.abs() < epsilon {
            return Err(RigError::geometry_at(
                ErrorCode::DegenerateReflectionOrigin,
                format!("reflection origin transform is singular (determinant {})", det),
                name,
            ));
        }
        Ok(Self {
            name,
            matrix,
            inverse: matrix.inverse(),
            linear,
            linear_inverse: linear.inverse(),
        })
    }

    /// Reflection origin at the world origin (mirror plane is world YZ).
    pub fn world(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matrix: DMat4::IDENTITY,
            inverse: DMat4::IDENTITY,
            linear: DMat3::IDENTITY,
            linear_inverse: DMat3::IDENTITY,
        }
    }

    /// Name of the origin node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World transform of the origin node.
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Reflects a world-space point.
    pub fn reflect_point(&self, point: DVec3) -> DVec3 {
        let local = self.inverse.transform_point3(point);
        self.matrix.transform_point3(local * FLIP_X)
    }

    /// Reflects a world-space direction and returns it normalized.
    ///
    /// A zero vector stays zero.
    pub fn reflect_direction(&self, direction: DVec3) -> DVec3 {
        let local = self.linear_inverse * direction;
        (self.linear * (local * FLIP_X)).normalize_or_zero()
    }

    /// The full reflection as an affine matrix.
    pub fn reflection_matrix(&self) -> DMat4 {
        self.matrix * DMat4::from_scale(FLIP_X) * self.inverse
    }

    /// Reflects a world transform. The result has a negative determinant.
    pub fn reflect_matrix(&self, world: DMat4) -> DMat4 {
        self.reflection_matrix() * world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    fn rotated_origin() -> ReflectionOrigin {
        let matrix = DMat4::from_rotation_translation(
            DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
            DVec3::new(1.0, 0.0, 0.0),
        );
        ReflectionOrigin::new("Origin", matrix, 1e-9).unwrap()
    }

    #[test]
    fn test_reflect_point_world() {
        let origin = ReflectionOrigin::world("Origin");
        let p = origin.reflect_point(DVec3::new(2.0, 3.0, 4.0));
        assert!(p.abs_diff_eq(DVec3::new(-2.0, 3.0, 4.0), 1e-12));
    }

    #[test]
    fn test_reflect_point_rotated_origin() {
        // Local X of the origin is world Y, so reflection negates world Y about y=0.
        let origin = rotated_origin();
        let p = origin.reflect_point(DVec3::new(1.0, 2.0, 5.0));
        assert!(p.abs_diff_eq(DVec3::new(1.0, -2.0, 5.0), 1e-9));
    }

    #[test]
    fn test_direction_ignores_translation() {
        let matrix = DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0));
        let origin = ReflectionOrigin::new("Origin", matrix, 1e-9).unwrap();
        let d = origin.reflect_direction(DVec3::new(1.0, 1.0, 0.0));
        assert!(d.abs_diff_eq(DVec3::new(-1.0, 1.0, 0.0).normalize(), 1e-12));

        // Point reflection through the same origin does depend on the translation.
        let p = origin.reflect_point(DVec3::new(11.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(DVec3::new(9.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_reflection_is_involution() {
        let origin = rotated_origin();
        let p = DVec3::new(0.3, -1.7, 2.2);
        let back = origin.reflect_point(origin.reflect_point(p));
        assert!(back.abs_diff_eq(p, 1e-9));

        let d = DVec3::new(0.2, 0.9, -0.4).normalize();
        let back = origin.reflect_direction(origin.reflect_direction(d));
        assert!(back.abs_diff_eq(d, 1e-9));
    }

    #[test]
    fn test_reflect_matrix_flips_handedness() {
        let origin = rotated_origin();
        let world = DMat4::from_translation(DVec3::new(0.0, 2.0, 0.0));
        let mirrored = origin.reflect_matrix(world);
        assert!(mirrored.determinant() < 0.0);
        assert!(mirrored
            .w_axis
            .truncate()
            .abs_diff_eq(origin.reflect_point(DVec3::new(0.0, 2.0, 0.0)), 1e-9));
    }

    #[test]
    fn test_singular_origin() {
        let err = ReflectionOrigin::new("Flat", DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0)), 1e-9)
            .unwrap_err();
        assert_eq!(err.code(), "G002");
        assert_eq!(err.entity(), Some("Flat"));
    }
}
