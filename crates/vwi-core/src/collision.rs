//! Ray picking primitives for gizmo handles and grabber spheres
//!
//! Every test returns the ray parameter `t` of the nearest hit, so callers
//! can compare hits of different handle shapes along the same laser.

use glam::Vec3;

/// Ray-cylinder intersection test.
///
/// Tests a ray against a finite cylinder defined by its axis endpoints and
/// radius. The ray and the axis offset are projected into the plane
/// perpendicular to the axis, the resulting quadratic `at² + bt + c = 0` is
/// solved, and the nearest hit is then checked against the finite length.
///
/// # Arguments
///
/// * `ray_origin` - The starting point of the ray.
/// * `ray_dir` - The direction of the ray (should be normalized).
/// * `cylinder_start` - The starting point of the cylinder axis.
/// * `cylinder_end` - The ending point of the cylinder axis.
/// * `radius` - The radius of the cylinder.
///
/// # Returns
///
/// * `Some(t)` - The ray parameter at the closest intersection point.
/// * `None` - If the ray misses or the axis is degenerate.
pub fn ray_cylinder_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    cylinder_start: Vec3,
    cylinder_end: Vec3,
    radius: f32,
) -> Option<f32> {
    let cylinder_length = (cylinder_end - cylinder_start).length();
    if cylinder_length <= f32::EPSILON {
        return None;
    }
    let cylinder_axis = (cylinder_end - cylinder_start) / cylinder_length;

    let d = ray_dir - cylinder_axis * ray_dir.dot(cylinder_axis);
    let offset = ray_origin - cylinder_start;
    let o = offset - cylinder_axis * offset.dot(cylinder_axis);

    let a = d.dot(d);
    // Ray runs along the axis
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * d.dot(o);
    let c = o.dot(o) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t < 0.0 {
        return None;
    }

    let hit_point = ray_origin + ray_dir * t;
    let projection = (hit_point - cylinder_start).dot(cylinder_axis);
    if projection < 0.0 || projection > cylinder_length {
        return None;
    }

    Some(t)
}

/// Ray-ring intersection test.
///
/// A ring is a circle of `ring_radius` around `ring_center` in the plane
/// with normal `ring_normal`, widened by `thickness` on both sides.
///
/// # Returns
///
/// * `Some(t)` - The ray parameter at the plane hit inside the annulus.
/// * `None` - If the ray is parallel to the plane, behind it, or off the band.
pub fn ray_ring_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    ring_center: Vec3,
    ring_normal: Vec3,
    ring_radius: f32,
    thickness: f32,
) -> Option<f32> {
    let denom = ray_dir.dot(ring_normal);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = (ring_center - ray_origin).dot(ring_normal) / denom;
    if t < 0.0 {
        return None;
    }

    let hit_point = ray_origin + ray_dir * t;
    let distance_from_ring = ((hit_point - ring_center).length() - ring_radius).abs();

    (distance_from_ring <= thickness).then_some(t)
}

/// Ray-sphere intersection test.
///
/// Used for the uniform scale handle and for picking with a grabber sphere
/// laser fallback. A ray starting inside the sphere hits at `t = 0`.
pub fn ray_sphere_intersection(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = ray_origin - center;
    let c = offset.dot(offset) - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let a = ray_dir.dot(ray_dir);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * ray_dir.dot(offset);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_cylinder() {
        let result = ray_cylinder_intersection(
            Vec3::new(0.5, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::X,
            0.1,
        );
        let t = result.unwrap();
        assert!((t - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_ray_outside_cylinder_bounds() {
        let result = ray_cylinder_intersection(
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::X,
            0.1,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_along_cylinder_axis_misses() {
        let result = ray_cylinder_intersection(Vec3::new(-1.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, Vec3::X, 0.1);
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_hits_ring_band() {
        let hit = ray_ring_intersection(
            Vec3::new(1.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::Z,
            1.0,
            0.05,
        );
        assert_eq!(hit, Some(5.0));

        let center = ray_ring_intersection(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::Z,
            1.0,
            0.05,
        );
        assert!(center.is_none());
    }

    #[test]
    fn test_ray_sphere_front_and_inside() {
        let t = ray_sphere_intersection(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert_eq!(ray_sphere_intersection(Vec3::ZERO, Vec3::X, Vec3::ZERO, 1.0), Some(0.0));
        assert!(ray_sphere_intersection(Vec3::new(5.0, 0.0, 0.0), Vec3::X, Vec3::ZERO, 1.0).is_none());
    }
}
