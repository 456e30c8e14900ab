//! Two-handed gesture decomposition.
//!
//! Per-frame hand deltas (not deltas from the drag start) are used because
//! the pivot moves with the hands every update.

use glam::{Quat, Vec3};
use vwi_core::constants::KINDA_SMALL_NUMBER;
use vwi_core::geometry::{angular_distance_from_identity, find_between_vectors};

/// Inputs for one frame of a two-handed drag.
#[derive(Debug, Clone, Copy)]
pub struct TwoHandInput {
    /// Where the primary hand dragged to this frame
    pub dragged_to: Vec3,
    /// Primary hand movement this frame
    pub drag_delta: Vec3,
    /// Where the other hand dragged to this frame
    pub other_dragged_to: Vec3,
    /// Other hand movement this frame
    pub other_drag_delta: Vec3,
    /// Weight the pivot toward the hand that moved more
    pub dynamic_pivot: bool,
    /// Current world scale factor
    pub world_scale_factor: f32,
}

/// Rotation, scale and translation implied by both hands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoHandGesture {
    /// Point to rotate and scale about, on last frame's hand line
    pub pivot: Vec3,
    /// Ratio of this frame's hand distance to last frame's
    pub scale: f32,
    /// Rotation of the hand line since last frame
    pub rotation: Quat,
    /// Motion common to both hands
    pub translation: Vec3,
    /// Change in hand distance, world-scale independent
    pub scale_delta: f32,
    /// Angle of `rotation` in radians
    pub rotation_radians: f32,
}

/// Decomposes one frame of two-handed movement.
pub fn decompose_two_hand_drag(input: &TwoHandInput) -> TwoHandGesture {
    let line_start = input.dragged_to;
    let line_start_distance = input.drag_delta.length();
    let last_line_start = line_start - input.drag_delta;

    let line_end = input.other_dragged_to;
    let line_end_distance = input.other_drag_delta.length();
    let last_line_end = line_end - input.other_drag_delta;

    let total_distance = line_start_distance + line_end_distance;
    let weight = if input.dynamic_pivot && total_distance.abs() > KINDA_SMALL_NUMBER {
        line_start_distance / total_distance
    } else {
        0.5
    };
    let pivot = last_line_start.lerp(last_line_end, weight);

    let last_line_length = (last_line_end - last_line_start).length();
    let line_length = (line_end - line_start).length();
    let scale = if last_line_length.abs() <= KINDA_SMALL_NUMBER {
        1.0
    } else {
        line_length / last_line_length
    };
    let world_scale_factor = if input.world_scale_factor.abs() <= KINDA_SMALL_NUMBER {
        1.0
    } else {
        input.world_scale_factor
    };

    let rotation = find_between_vectors(last_line_end - last_line_start, line_end - line_start);

    let average_delta = (input.drag_delta + input.other_drag_delta) * 0.5;
    let translation_weight = input
        .drag_delta
        .normalize_or_zero()
        .dot(input.other_drag_delta.normalize_or_zero())
        .max(0.0);

    TwoHandGesture {
        pivot,
        scale,
        rotation,
        translation: Vec3::ZERO.lerp(average_delta, translation_weight),
        scale_delta: (line_length - last_line_length) / world_scale_factor,
        rotation_radians: angular_distance_from_identity(rotation),
    }
}
