//! Closest-point and intersection helpers used by constrained dragging.

use glam::{DVec3, Quat, Vec3};

use crate::bounds::Plane;
use crate::constants::{SEGMENT_SOLVER_EPSILON, SMALL_NUMBER};

/// Closest points between two segments, computed in double precision.
///
/// Constrained drags intersect a laser segment with an axis segment that can
/// be several kilometers long, far from the world origin, where single
/// precision loses the sub-unit accuracy a drag needs.
///
/// # Arguments
///
/// * `a1`, `b1` - Endpoints of the first segment.
/// * `a2`, `b2` - Endpoints of the second segment.
///
/// # Returns
///
/// `(p1, p2)` with `p1` on the first segment and `p2` on the second.
/// Near-parallel or zero-length input collapses to the start of the first
/// segment and its projection onto the second, never NaN.
pub fn segment_dist_to_segment_double(a1: DVec3, b1: DVec3, a2: DVec3, b2: DVec3) -> (DVec3, DVec3) {
    let eps = SEGMENT_SOLVER_EPSILON;

    let s1 = b1 - a1;
    let s2 = b2 - a2;
    let s3 = a1 - a2;

    let dot11 = s1.dot(s1);
    let dot22 = s2.dot(s2);
    let dot12 = s1.dot(s2);
    let dot13 = s1.dot(s3);
    let dot23 = s2.dot(s3);

    let d = dot11 * dot22 - dot12 * dot12;
    let mut d1 = d;
    let mut d2 = d;
    let mut n1;
    let mut n2;

    if d < eps {
        // Almost parallel: pin the first segment to its start
        n1 = 0.0;
        d1 = 1.0;
        n2 = dot23;
        d2 = dot22;
    } else {
        n1 = dot12 * dot23 - dot22 * dot13;
        n2 = dot11 * dot23 - dot12 * dot13;

        if n1 < 0.0 {
            n1 = 0.0;
            n2 = dot23;
            d2 = dot22;
        } else if n1 > d1 {
            n1 = d1;
            n2 = dot23 + dot12;
            d2 = dot22;
        }
    }

    if n2 < 0.0 {
        n2 = 0.0;
        if -dot13 < 0.0 {
            n1 = 0.0;
        } else if -dot13 > dot11 {
            n1 = d1;
        } else {
            n1 = -dot13;
            d1 = dot11;
        }
    } else if n2 > d2 {
        n2 = d2;
        if -dot13 + dot12 < 0.0 {
            n1 = 0.0;
        } else if -dot13 + dot12 > dot11 {
            n1 = d1;
        } else {
            n1 = -dot13 + dot12;
            d1 = dot11;
        }
    }

    let t1 = if n1.abs() < eps { 0.0 } else { n1 / d1 };
    let t2 = if n2.abs() < eps { 0.0 } else { n2 / d2 };

    (a1 + s1 * t1, a2 + s2 * t2)
}

/// Intersects the segment `start..end` with `plane`.
///
/// Returns `None` when the segment is parallel to the plane or does not
/// reach it.
pub fn segment_plane_intersection(start: Vec3, end: Vec3, plane: &Plane) -> Option<Vec3> {
    let dir = end - start;
    let denom = dir.dot(plane.normal);
    if denom.abs() <= SMALL_NUMBER {
        return None;
    }

    let t = -plane.distance_to_point(start) / denom;
    if (0.0..=1.0).contains(&t) {
        Some(start + dir * t)
    } else {
        None
    }
}

/// Closest point to `point` on the segment `start..end`.
pub fn closest_point_on_segment(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= SMALL_NUMBER {
        return start;
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    start + segment * t
}

/// Closest point to `point` on the infinite line through `line_start` and `line_end`.
pub fn closest_point_on_line(line_start: Vec3, line_end: Vec3, point: Vec3) -> Vec3 {
    let direction = line_end - line_start;
    let length_squared = direction.length_squared();
    if length_squared <= SMALL_NUMBER {
        return line_start;
    }
    line_start + direction * ((point - line_start).dot(direction) / length_squared)
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Zero-length input yields the identity.
pub fn find_between_vectors(from: Vec3, to: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Angle in radians between `rotation` and the identity.
pub fn angular_distance_from_identity(rotation: Quat) -> f32 {
    rotation.angle_between(Quat::IDENTITY)
}
