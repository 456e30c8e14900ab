//! Per-handle drag behavior.
//!
//! Each handle kind maps to one [`DragOperation`]. An operation receives the
//! constrained drag and returns the unsnapped gizmo transform it wants plus
//! flags telling the engine which parts changed.

use glam::{Quat, Vec3};
use vwi_core::constants::{KINDA_SMALL_NUMBER, MIN_DRAG_SCALE};
use vwi_core::{BoundingBox, Transform};

use super::{HandleDirection, HandlePlacement};

/// Drag state handed to an operation each update.
#[derive(Debug, Clone, Copy)]
pub struct DraggingTransformableData {
    /// Gizmo transform at drag start
    pub gizmo_start: Transform,
    /// Gizmo-local bounds at drag start
    pub start_local_bounds: BoundingBox,
    /// Grabbed handle placement
    pub placement: Option<HandlePlacement>,
    /// Desired gizmo location (start location plus constrained delta)
    pub pass_dragged_to: Vec3,
    /// World-space constrained delta from the drag start
    pub constrained_drag_delta_from_start: Vec3,
    /// Gizmo-space grab point recorded on the first update
    pub first_drag_update_offset_along_axis: Vec3,
}

/// What an operation produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutput {
    /// Gizmo transform before snapping
    pub unsnapped_target: Transform,
    /// Location changed
    pub translated: bool,
    /// Rotation changed
    pub rotated: bool,
    /// Scale changed
    pub scaled: bool,
    /// Anything changed
    pub moved: bool,
    /// Whether the move should impart velocity on simulated objects
    pub apply_velocities: bool,
    /// Whether snapping may adjust the result
    pub allow_snap: bool,
}

/// Operation bound to a gizmo handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOperation {
    /// Move along the handle axis
    TranslateAlongAxis,
    /// Move within the plane facing the handle axis
    TranslateOnPlane,
    /// Rotate about the handle axis
    Rotate,
    /// Scale uniformly about the pivot
    UniformScale,
    /// Stretch the bounds, keeping the opposite side fixed
    Stretch,
}

impl DragOperation {
    /// Whether the constraint should intersect the laser with a plane.
    pub fn plane_constraint(self) -> bool {
        matches!(self, Self::TranslateOnPlane | Self::Rotate)
    }

    /// Runs the operation.
    pub fn execute(self, data: &DraggingTransformableData) -> DragOutput {
        match self {
            Self::TranslateAlongAxis | Self::TranslateOnPlane => {
                let mut target = data.gizmo_start;
                target.set_location(data.pass_dragged_to);
                DragOutput {
                    unsnapped_target: target,
                    translated: true,
                    rotated: false,
                    scaled: false,
                    moved: true,
                    apply_velocities: true,
                    allow_snap: true,
                }
            }
            Self::Rotate => rotate(data),
            Self::UniformScale => uniform_scale(data),
            Self::Stretch => stretch(data),
        }
    }
}

fn transform_only_output(unsnapped_target: Transform, rotated: bool, scaled: bool) -> DragOutput {
    DragOutput {
        unsnapped_target,
        translated: false,
        rotated,
        scaled,
        moved: true,
        apply_velocities: false,
        allow_snap: true,
    }
}

/// Angle between where the ring was grabbed and where the laser now meets
/// the ring plane, measured about the ring axis.
fn rotate(data: &DraggingTransformableData) -> DragOutput {
    let axis = data
        .placement
        .and_then(|p| p.center_handle_count_and_facing_axis().1)
        .map(|index| {
            let mut axis = Vec3::ZERO;
            axis[index] = 1.0;
            axis
        })
        .unwrap_or(Vec3::Z);

    let grabbed = data.first_drag_update_offset_along_axis;
    let current = grabbed
        + data
            .gizmo_start
            .inverse_transform_vector_no_scale(data.constrained_drag_delta_from_start);

    let from = grabbed - axis * grabbed.dot(axis);
    let to = current - axis * current.dot(axis);
    let angle = if from.length_squared() <= KINDA_SMALL_NUMBER || to.length_squared() <= KINDA_SMALL_NUMBER {
        0.0
    } else {
        axis.dot(from.cross(to)).atan2(from.dot(to))
    };

    let mut target = data.gizmo_start;
    target.set_rotation((data.gizmo_start.rotation * Quat::from_axis_angle(axis, angle)).normalize());
    transform_only_output(target, true, false)
}

/// Dragging upward along the gizmo Z axis grows the selection.
fn uniform_scale(data: &DraggingTransformableData) -> DragOutput {
    let gizmo_space_delta = data
        .gizmo_start
        .inverse_transform_vector_no_scale(data.constrained_drag_delta_from_start);
    let reference = data.start_local_bounds.size().max_element().max(1.0);
    let factor = (1.0 + gizmo_space_delta.z / reference * 2.0).max(MIN_DRAG_SCALE);

    let mut target = data.gizmo_start;
    target.set_scale(data.gizmo_start.scale * factor);
    transform_only_output(target, false, true)
}

/// Scales each off-center axis so the grabbed side follows the drag while
/// the opposite side stays in place.
fn stretch(data: &DraggingTransformableData) -> DragOutput {
    let Some(placement) = data.placement else {
        return transform_only_output(data.gizmo_start, false, false);
    };
    let bounds = data.start_local_bounds;
    let size = bounds.size();
    let gizmo_space_delta = data
        .gizmo_start
        .inverse_transform_vector_no_scale(data.constrained_drag_delta_from_start);

    let mut factor = Vec3::ONE;
    let mut pivot = Vec3::ZERO;
    for (index, direction) in placement.axes.iter().enumerate() {
        if *direction == HandleDirection::Center || size[index] <= KINDA_SMALL_NUMBER {
            continue;
        }
        let sign = direction.sign();
        factor[index] = ((size[index] + sign * gizmo_space_delta[index]) / size[index]).max(MIN_DRAG_SCALE);
        pivot[index] = if sign > 0.0 { bounds.min[index] } else { bounds.max[index] };
    }

    let target = Transform::from_translation(-pivot)
        * Transform::from_scale(factor)
        * Transform::from_translation(pivot)
        * data.gizmo_start;
    transform_only_output(target, false, true)
}
