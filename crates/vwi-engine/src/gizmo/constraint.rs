//! Constrained drag deltas for axis and plane handles.
//!
//! With a live laser, an axis handle projects the laser onto the axis with the
//! double-precision segment solver and a plane handle intersects the laser
//! with the plane. The offset between the grab point and the constrained point
//! on the first update is subtracted afterwards, so the object keeps its grab
//! offset instead of jumping to the laser. Without a laser (inertia) the raw
//! delta is corrected by the offset recorded during the last live update and
//! then masked to the constrained axes.

use glam::Vec3;
use vwi_core::Transform;
use vwi_core::bounds::Plane;
use vwi_core::geometry::{segment_dist_to_segment_double, segment_plane_intersection};

use super::{HandleDirection, HandlePlacement};

/// Inputs of one constrained delta computation.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintRequest {
    /// Grabbed handle placement, if any
    pub placement: Option<HandlePlacement>,
    /// First update of the drag
    pub is_first_drag_update: bool,
    /// Whether the laser values are live
    pub is_laser_pointer_valid: bool,
    /// Laser start in world space
    pub laser_pointer_start: Vec3,
    /// Unit laser direction in world space
    pub laser_pointer_direction: Vec3,
    /// Laser length in world units
    pub laser_pointer_max_length: f32,
    /// World-space dragged-to point minus the impact at drag start
    pub drag_delta_from_start: Vec3,
    /// Gizmo transform at drag start
    pub gizmo_start: Transform,
    /// Constrain to the plane facing the handle axis instead of the axis itself
    pub constrain_to_plane: bool,
}

/// Offsets carried between updates of one drag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstraintOffsets {
    /// Gizmo-space constrained point of the first update
    pub first_drag_update_offset_along_axis: Vec3,
    /// Gizmo-space correction from the raw delta to the constrained delta
    pub drag_delta_from_start_offset: Vec3,
}

/// Result of a constrained delta computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedDelta {
    /// World-space delta from the gizmo start location
    pub delta_from_start: Vec3,
    /// Point on the laser closest to the constraint, relative to the gizmo
    /// start location, in world orientation
    pub closest_point_on_laser: Vec3,
}

fn axis_vector(index: usize, direction: HandleDirection) -> Vec3 {
    let mut axis = Vec3::ZERO;
    axis[index] = if direction == HandleDirection::Negative { -1.0 } else { 1.0 };
    axis
}

/// Computes the constrained world-space delta from the drag start.
pub fn compute_constrained_drag_delta_from_start(
    request: &ConstraintRequest,
    offsets: &mut ConstraintOffsets,
) -> ConstrainedDelta {
    let gizmo_start = request.gizmo_start;
    let raw_gizmo_space_delta = gizmo_start.inverse_transform_vector_no_scale(request.drag_delta_from_start);

    let facing = request.placement.and_then(|placement| {
        let (count, facing) = placement.center_handle_count_and_facing_axis();
        match facing {
            Some(index) if count == 2 => Some((index, placement.axes[index])),
            _ => None,
        }
    });

    let direct = match facing {
        Some((index, direction)) if request.is_laser_pointer_valid => Some(axis_vector(index, direction)),
        _ => None,
    };

    let (gizmo_space_constrained, closest_point_on_laser) = match direct {
        Some(axis) => {
            let start = gizmo_start.inverse_transform_position(request.laser_pointer_start);
            let direction = gizmo_start.inverse_transform_vector_no_scale(request.laser_pointer_direction);
            let max_length = request.laser_pointer_max_length;
            let end = start + direction * max_length;

            let (mut constrained, closest) = if request.constrain_to_plane {
                let plane = Plane::from_point_normal(Vec3::ZERO, axis);
                let point = segment_plane_intersection(start, end, &plane).unwrap_or(Vec3::ZERO);
                (point, gizmo_start.transform_vector(point))
            } else {
                let axis_start = axis * -max_length * 2.0;
                let axis_end = axis * max_length * 2.0;
                let (on_laser, on_axis) = segment_dist_to_segment_double(
                    start.as_dvec3(),
                    end.as_dvec3(),
                    axis_start.as_dvec3(),
                    axis_end.as_dvec3(),
                );
                (
                    on_axis.as_vec3(),
                    gizmo_start.transform_vector(on_laser.as_vec3()),
                )
            };

            if request.is_first_drag_update {
                offsets.first_drag_update_offset_along_axis = constrained;
            }
            constrained -= offsets.first_drag_update_offset_along_axis;
            offsets.drag_delta_from_start_offset = constrained - raw_gizmo_space_delta;

            (constrained, closest)
        }
        None => {
            let mut constrained = raw_gizmo_space_delta;
            if let Some(placement) = request.placement {
                constrained += offsets.drag_delta_from_start_offset;
                for (index, direction) in placement.axes.iter().enumerate() {
                    let keep = if request.constrain_to_plane {
                        *direction == HandleDirection::Center
                    } else {
                        *direction != HandleDirection::Center
                    };
                    if !keep {
                        constrained[index] = 0.0;
                    }
                }
            }
            (constrained, request.drag_delta_from_start)
        }
    };

    ConstrainedDelta {
        delta_from_start: gizmo_start.transform_vector_no_scale(gizmo_space_constrained),
        closest_point_on_laser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    fn x_axis_request(laser_x: f32) -> ConstraintRequest {
        ConstraintRequest {
            placement: Some(HandlePlacement::from_signs(1, 0, 0)),
            is_first_drag_update: false,
            is_laser_pointer_valid: true,
            laser_pointer_start: Vec3::new(laser_x, -100.0, 30.0),
            laser_pointer_direction: Vec3::Y,
            laser_pointer_max_length: 1000.0,
            drag_delta_from_start: Vec3::new(laser_x - 20.0, 5.0, 7.0),
            gizmo_start: Transform::IDENTITY,
            constrain_to_plane: false,
        }
    }

    #[test]
    fn test_axis_constraint_keeps_grab_offset() {
        let mut offsets = ConstraintOffsets::default();
        let mut first = x_axis_request(20.0);
        first.is_first_drag_update = true;
        let result = compute_constrained_drag_delta_from_start(&first, &mut offsets);
        assert_relative_eq!(result.delta_from_start.length(), 0.0, epsilon = 1e-4);
        assert_relative_eq!(offsets.first_drag_update_offset_along_axis.x, 20.0, epsilon = 1e-3);

        let result = compute_constrained_drag_delta_from_start(&x_axis_request(33.0), &mut offsets);
        assert_relative_eq!(result.delta_from_start.x, 13.0, epsilon = 1e-3);
        assert_relative_eq!(result.delta_from_start.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(result.delta_from_start.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_inertia_stays_on_axis() {
        let mut offsets = ConstraintOffsets::default();
        let mut first = x_axis_request(20.0);
        first.is_first_drag_update = true;
        compute_constrained_drag_delta_from_start(&first, &mut offsets);
        compute_constrained_drag_delta_from_start(&x_axis_request(30.0), &mut offsets);

        let mut inertia = x_axis_request(0.0);
        inertia.is_laser_pointer_valid = false;
        inertia.drag_delta_from_start = Vec3::new(14.0, 9.0, 11.0);
        let result = compute_constrained_drag_delta_from_start(&inertia, &mut offsets);
        assert_relative_eq!(result.delta_from_start.x, 14.0, epsilon = 1e-3);
        assert_relative_eq!(result.delta_from_start.y, 0.0);
        assert_relative_eq!(result.delta_from_start.z, 0.0);
    }

    #[test]
    fn test_plane_constraint_in_rotated_gizmo() {
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let request = ConstraintRequest {
            placement: Some(HandlePlacement::from_signs(0, 0, 1)),
            is_first_drag_update: true,
            is_laser_pointer_valid: true,
            laser_pointer_start: Vec3::new(5.0, 8.0, 50.0),
            laser_pointer_direction: Vec3::NEG_Z,
            laser_pointer_max_length: 1000.0,
            drag_delta_from_start: Vec3::ZERO,
            gizmo_start: Transform::from_rotation(rotation),
            constrain_to_plane: true,
        };
        let mut offsets = ConstraintOffsets::default();
        compute_constrained_drag_delta_from_start(&request, &mut offsets);

        let mut moved = request;
        moved.is_first_drag_update = false;
        moved.laser_pointer_start = Vec3::new(9.0, 2.0, 50.0);
        let result = compute_constrained_drag_delta_from_start(&moved, &mut offsets);
        assert_relative_eq!(result.delta_from_start.x, 4.0, epsilon = 1e-3);
        assert_relative_eq!(result.delta_from_start.y, -6.0, epsilon = 1e-3);
        assert_relative_eq!(result.delta_from_start.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_free_drag_passes_delta_through() {
        let request = ConstraintRequest {
            placement: None,
            is_first_drag_update: false,
            is_laser_pointer_valid: true,
            laser_pointer_start: Vec3::ZERO,
            laser_pointer_direction: Vec3::X,
            laser_pointer_max_length: 100.0,
            drag_delta_from_start: Vec3::new(1.0, 2.0, 3.0),
            gizmo_start: Transform::from_translation(Vec3::splat(40.0)),
            constrain_to_plane: false,
        };
        let result = compute_constrained_drag_delta_from_start(&request, &mut ConstraintOffsets::default());
        assert_relative_eq!(result.delta_from_start.z, 3.0, epsilon = 1e-5);
        assert_eq!(result.closest_point_on_laser, Vec3::new(1.0, 2.0, 3.0));
    }
}
