//! Pole-vector placement for a two-bone IK chain.

use glam::DVec3;

/// Where a pole bone goes and why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolePlacement {
    pub position: DVec3,
    /// Unit direction from the joint toward the pole.
    pub direction: DVec3,
    /// True if the chain was straight and the fallback axis was used.
    pub collinear: bool,
}

/// Places the pole for the chain `top -> joint -> end`.
///
/// The joint is projected onto the line `top -> end`; the pole lies along
/// the bend direction (projection to joint), at half the chain's length
/// from the joint. A straight chain bends toward `fallback_axis`, made
/// perpendicular to the chain.
pub fn place_pole(
    top: DVec3,
    joint: DVec3,
    end: DVec3,
    fallback_axis: DVec3,
    epsilon: f64,
) -> PolePlacement {
    let line = end - top;
    let projection = if line.length_squared() < epsilon * epsilon {
        top
    } else {
        top + line * ((joint - top).dot(line) / line.length_squared())
    };

    let bend = joint - projection;
    let (direction, collinear) = if bend.length() < epsilon {
        (perpendicular(end - top, end - joint, fallback_axis), true)
    } else {
        (bend.normalize(), false)
    };

    let distance = 0.5 * (joint.distance(top) + end.distance(joint));
    PolePlacement {
        position: joint + direction * distance,
        direction,
        collinear,
    }
}

/// Unit vector perpendicular to the chain, as close to `preferred` as possible.
fn perpendicular(line: DVec3, segment: DVec3, preferred: DVec3) -> DVec3 {
    let chain = line
        .try_normalize()
        .or_else(|| segment.try_normalize())
        .unwrap_or(DVec3::Y);
    (preferred - chain * preferred.dot(chain))
        .try_normalize()
        .unwrap_or_else(|| chain.any_orthonormal_vector())
}
