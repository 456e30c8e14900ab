//! Grid snapping for location, rotation and scale.
//!
//! Location snapping is relative to a grid base, so a drag that starts off
//! the absolute world grid keeps its original offset while snapping in grid
//! size increments.

use glam::{EulerRot, Quat, Vec3};

use crate::transform::Transform;

/// Rounds `value` to the nearest multiple of `grid`. A zero grid is a no-op.
pub fn grid_snap(value: f32, grid: f32) -> f32 {
    if grid == 0.0 {
        value
    } else {
        ((value + 0.5 * grid) / grid).floor() * grid
    }
}

/// Snaps every component of `value` to `grid`.
pub fn grid_snap_vec3(value: Vec3, grid: f32) -> Vec3 {
    Vec3::new(grid_snap(value.x, grid), grid_snap(value.y, grid), grid_snap(value.z, grid))
}

/// Snaps `point` to a grid of `grid` spacing whose origin sits at `base`.
pub fn snap_point_to_grid(point: Vec3, base: Vec3, grid: f32) -> Vec3 {
    grid_snap_vec3(point - base, grid) + base
}

/// Snaps the yaw, pitch and roll of `rotation` to multiples of `grid_degrees`.
pub fn snap_rotation(rotation: Quat, grid_degrees: f32) -> Quat {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::ZYX);
    let snap = |angle: f32| grid_snap(angle.to_degrees(), grid_degrees).to_radians();
    Quat::from_euler(EulerRot::ZYX, snap(yaw), snap(pitch), snap(roll))
}

/// Snaps each scale component to multiples of `grid`.
pub fn snap_scale(scale: Vec3, grid: f32) -> Vec3 {
    grid_snap_vec3(scale, grid)
}

/// Which parts of a transform snapping should touch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformSnap {
    /// Location grid size, if location snapping is on
    pub location_grid: Option<f32>,
    /// Rotation grid in degrees, if rotation snapping is on
    pub rotation_grid_degrees: Option<f32>,
    /// Scale grid, if scale snapping is on
    pub scale_grid: Option<f32>,
}

impl TransformSnap {
    /// Snaps `transform` in place. Location snaps relative to `base`.
    pub fn apply(&self, transform: &mut Transform, base: Vec3) {
        if let Some(grid) = self.location_grid {
            transform.translation = snap_point_to_grid(transform.translation, base, grid);
        }
        if let Some(degrees) = self.rotation_grid_degrees {
            transform.rotation = snap_rotation(transform.rotation, degrees);
        }
        if let Some(grid) = self.scale_grid {
            transform.scale = snap_scale(transform.scale, grid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_snap_rounds_to_nearest() {
        assert_eq!(grid_snap(10.0, 5.0), 10.0);
        assert_eq!(grid_snap(12.4, 5.0), 10.0);
        assert_eq!(grid_snap(12.5, 5.0), 15.0);
        assert_eq!(grid_snap(-7.4, 5.0), -5.0);
        assert_eq!(grid_snap(3.3, 0.0), 3.3);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let base = Vec3::new(1.5, -2.25, 0.75);
        for p in [Vec3::new(13.1, -7.9, 2.2), Vec3::new(-99.0, 0.4, 51.7)] {
            let once = snap_point_to_grid(p, base, 5.0);
            let twice = snap_point_to_grid(once, base, 5.0);
            assert!(once.abs_diff_eq(twice, 1e-4));
        }
    }

    #[test]
    fn test_snap_relative_to_base() {
        let snapped = snap_point_to_grid(Vec3::new(13.0, 3.0, 3.0), Vec3::splat(3.0), 5.0);
        assert_eq!(snapped, Vec3::new(13.0, 3.0, 3.0));
    }

    #[test]
    fn test_snap_rotation_yaw() {
        let rotation = Quat::from_rotation_z(37.0_f32.to_radians());
        let snapped = snap_rotation(rotation, 15.0);
        let (yaw, pitch, roll) = snapped.to_euler(EulerRot::ZYX);
        assert_relative_eq!(yaw.to_degrees(), 30.0, epsilon = 1e-3);
        assert_relative_eq!(pitch, 0.0, epsilon = 1e-5);
        assert_relative_eq!(roll, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_snap_only_touches_enabled_parts() {
        let mut t = Transform::new(Quat::from_rotation_z(0.1), Vec3::new(7.0, 0.0, 0.0), Vec3::splat(1.1));
        let snap = TransformSnap {
            location_grid: Some(5.0),
            rotation_grid_degrees: None,
            scale_grid: Some(0.25),
        };
        snap.apply(&mut t, Vec3::ZERO);
        assert_eq!(t.translation, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(t.rotation, Quat::from_rotation_z(0.1));
        assert_relative_eq!(t.scale.x, 1.0);
    }
}
