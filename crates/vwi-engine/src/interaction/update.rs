//! One drag update: turning hand motion into a gizmo target.

use glam::{Quat, Vec3};
use tracing::trace;
use vwi_core::Transform;
use vwi_core::config::SnapConfig;
use vwi_core::snap::{TransformSnap, snap_point_to_grid};

use super::WorldInteraction;
use crate::align::{AlignRequest, find_transform_gizmo_align_point};
use crate::gizmo::GizmoSpace;
use crate::gizmo::HandlePlacement;
use crate::gizmo::constraint::{
    ConstrainedDelta, ConstraintOffsets, ConstraintRequest, compute_constrained_drag_delta_from_start,
};
use crate::gizmo::drag_operation::{DragOperation, DraggingTransformableData};
use crate::interactor::{DraggingMode, GizmoDragState, InteractorId};
use crate::scene::SceneQuery;
use crate::two_hand::{TwoHandInput, decompose_two_hand_drag};

/// Rotation and scale snapping enabled by `snap`, limited to the parts a
/// drag actually changed. Location goes through alignment separately.
fn rotation_and_scale_snap(snap: &SnapConfig, rotated: bool, scaled: bool) -> TransformSnap {
    TransformSnap {
        location_grid: None,
        rotation_grid_degrees: (rotated && snap.rotation_enabled).then_some(snap.rotation_grid_degrees),
        scale_grid: (scaled && snap.scale_enabled).then_some(snap.scale_grid_size),
    }
}

/// Hand motion fed into one drag update.
#[derive(Debug, Clone, Copy)]
pub struct DragUpdate {
    /// Frame time in seconds
    pub dt: f32,
    /// Mode the update runs in (the last mode during inertia)
    pub mode: DraggingMode,
    /// Operation of the grabbed handle
    pub operation: Option<DragOperation>,
    /// Whether a second hand takes part
    pub with_two_hands: bool,
    /// Grabbed handle placement
    pub placement: Option<HandlePlacement>,
    /// Primary hand movement this frame
    pub drag_delta: Vec3,
    /// Second hand movement this frame
    pub other_hand_drag_delta: Vec3,
    /// Where the primary hand dragged to
    pub dragged_to: Vec3,
    /// Where the second hand dragged to
    pub other_hand_dragged_to: Vec3,
    /// Dragged-to point minus the impact at drag start
    pub drag_delta_from_start: Vec3,
    /// Laser start
    pub laser_pointer_start: Vec3,
    /// Unit laser direction
    pub laser_pointer_direction: Vec3,
    /// Laser length in world units
    pub laser_pointer_max_length: f32,
    /// False during inertia
    pub is_laser_pointer_valid: bool,
}

impl WorldInteraction {
    /// Whether location snapping may align to nearby actors.
    pub(crate) fn are_aligning_to_actors(&self) -> bool {
        self.config.snap.actor_align_enabled && self.config.gizmo.can_align_to_actors
    }

    /// Constrained delta from the drag start for the grabbed handle.
    pub fn compute_constrained_drag_delta_from_start(
        &self,
        request: &ConstraintRequest,
        offsets: &mut ConstraintOffsets,
    ) -> ConstrainedDelta {
        compute_constrained_drag_delta_from_start(request, offsets)
    }

    fn constrained_delta(&self, update: &DragUpdate, gizmo: &mut GizmoDragState, plane: bool) -> ConstrainedDelta {
        let request = ConstraintRequest {
            placement: update.placement,
            is_first_drag_update: gizmo.is_first_drag_update,
            is_laser_pointer_valid: update.is_laser_pointer_valid,
            laser_pointer_start: update.laser_pointer_start,
            laser_pointer_direction: update.laser_pointer_direction,
            laser_pointer_max_length: update.laser_pointer_max_length,
            drag_delta_from_start: update.drag_delta_from_start,
            gizmo_start: gizmo.start,
            constrain_to_plane: plane,
        };
        let mut offsets = ConstraintOffsets {
            first_drag_update_offset_along_axis: gizmo.first_drag_update_offset_along_axis,
            drag_delta_from_start_offset: gizmo.drag_delta_from_start_offset,
        };
        let constrained = self.compute_constrained_drag_delta_from_start(&request, &mut offsets);
        gizmo.first_drag_update_offset_along_axis = offsets.first_drag_update_offset_along_axis;
        gizmo.drag_delta_from_start_offset = offsets.drag_delta_from_start_offset;
        constrained
    }

    /// Moves the gizmo target for one update and applies it to the selection
    /// unless smoothing or interpolation will. Returns the unsnapped point
    /// the laser constrains to, used for hover feedback.
    pub(crate) fn update_dragging(
        &mut self,
        update: &DragUpdate,
        gizmo: &mut GizmoDragState,
        scene: &dyn SceneQuery,
    ) -> Vec3 {
        let mut moved = false;
        let mut apply_velocities = false;
        let mut unsnapped_dragged_to = Vec3::ZERO;

        let local_space_snapping =
            self.gizmo_space == GizmoSpace::Local && update.mode != DraggingMode::TransformablesAtLaserImpact;
        let snap_grid_base = if update.mode == DraggingMode::TransformablesAtLaserImpact || local_space_snapping {
            Vec3::ZERO
        } else {
            gizmo.start.location()
        };
        let snap = self.config.snap.clone();

        match (update.mode, update.operation) {
            (DraggingMode::TransformablesWithGizmo, Some(operation)) => {
                let constrained = self.constrained_delta(update, gizmo, operation.plane_constraint());
                unsnapped_dragged_to = gizmo.start.location() + constrained.closest_point_on_laser;
                let desired = gizmo.start.location() + constrained.delta_from_start;

                let output = operation.execute(&DraggingTransformableData {
                    gizmo_start: gizmo.start,
                    start_local_bounds: gizmo.start_local_bounds,
                    placement: update.placement,
                    pass_dragged_to: desired,
                    constrained_drag_delta_from_start: constrained.delta_from_start,
                    first_drag_update_offset_along_axis: gizmo.first_drag_update_offset_along_axis,
                });

                let mut target = output.unsnapped_target;
                if output.allow_snap {
                    if output.translated && (self.are_aligning_to_actors() || snap.grid_enabled) {
                        let start = gizmo.start;
                        let location = self.snap_location(
                            local_space_snapping,
                            output.unsnapped_target.location(),
                            &start,
                            snap_grid_base,
                            true,
                            constrained.delta_from_start,
                            scene,
                        );
                        target.set_location(location);
                    }
                    rotation_and_scale_snap(&snap, output.rotated, output.scaled).apply(&mut target, Vec3::ZERO);
                }

                gizmo.target = target;
                gizmo.unsnapped_target = output.unsnapped_target;
                moved = output.moved;
                apply_velocities = output.apply_velocities;
            }
            (DraggingMode::TransformablesAtLaserImpact, _) => {
                let constrained = self.constrained_delta(update, gizmo, false);
                unsnapped_dragged_to = gizmo.start.location() + constrained.closest_point_on_laser;
                let desired = gizmo.start.location() + constrained.delta_from_start;

                let start = gizmo.start;
                let snapped = self.snap_location(
                    local_space_snapping,
                    desired,
                    &start,
                    snap_grid_base,
                    true,
                    constrained.delta_from_start,
                    scene,
                );
                gizmo.target.set_location(snapped);
                gizmo.unsnapped_target.set_location(desired);
                moved = true;
                apply_velocities = true;
            }
            (DraggingMode::TransformablesFreely | DraggingMode::World, _) => {
                let mut pivot = None;
                let mut scale = 1.0;
                let mut rotation = Quat::IDENTITY;
                let mut translation;

                if update.with_two_hands {
                    let gesture = decompose_two_hand_drag(&TwoHandInput {
                        dragged_to: update.dragged_to,
                        drag_delta: update.drag_delta,
                        other_dragged_to: update.other_hand_dragged_to,
                        other_drag_delta: update.other_hand_drag_delta,
                        dynamic_pivot: self.config.world.scale_world_with_dynamic_pivot,
                        world_scale_factor: self.world_scale_factor(),
                    });
                    let mut gesture_pivot = gesture.pivot;
                    if update.mode == DraggingMode::World && self.config.world.scale_world_from_floor {
                        gesture_pivot.z = 0.0;
                    }
                    pivot = Some(gesture_pivot);
                    scale = gesture.scale;
                    rotation = gesture.rotation;
                    translation = gesture.translation;
                    gizmo.scale_since_drag_started += gesture.scale_delta;
                    gizmo.rotation_radians_since_drag_started += gesture.rotation_radians;
                } else {
                    translation = update.drag_delta;
                    gizmo.scale_since_drag_started = 0.0;
                    gizmo.rotation_radians_since_drag_started = 0.0;
                }

                if !self.config.world.allow_vertical_world_movement {
                    translation.z = 0.0;
                }

                if update.mode == DraggingMode::TransformablesFreely {
                    let pivot = pivot.unwrap_or(gizmo.unsnapped_target.location());
                    let new_transform = gizmo.unsnapped_target
                        * Transform::from_translation(-pivot)
                        * Transform::from_scale(Vec3::splat(scale))
                        * Transform::from_rotation(rotation)
                        * Transform::from_translation(pivot)
                        * Transform::from_translation(translation);

                    let mut snapped = new_transform;
                    if snap.grid_enabled || self.are_aligning_to_actors() {
                        let unsnapped = gizmo.unsnapped_target;
                        let location = self.snap_location(
                            local_space_snapping,
                            new_transform.location(),
                            &unsnapped,
                            snap_grid_base,
                            false,
                            new_transform.location() - unsnapped.location(),
                            scene,
                        );
                        snapped.set_location(location);
                    }
                    rotation_and_scale_snap(&snap, true, true).apply(&mut snapped, Vec3::ZERO);

                    gizmo.target = snapped;
                    gizmo.unsnapped_target = new_transform;
                    moved = true;
                    apply_velocities = true;
                } else if !self.skip_interactive_world_movement_this_frame {
                    self.drag_world(update, gizmo, pivot.unwrap_or(Vec3::ZERO), scale, rotation, translation);
                }
            }
            _ => {}
        }

        if moved {
            if self.simulating {
                let mut move_delta = gizmo.unsnapped_target.location() - gizmo.last.location();
                if apply_velocities {
                    gizmo.is_driving_velocity_of_simulated_transformables = true;
                } else {
                    move_delta = Vec3::ZERO;
                }
                if update.dt > 0.0 {
                    let velocity = move_delta * self.config.inertia.inertia_velocity_boost / update.dt;
                    for entry in self.transformables.iter_mut() {
                        if entry.transformable.is_physically_simulated() {
                            entry.transformable.set_linear_velocity(velocity);
                        }
                    }
                }
            }

            if !self.is_smooth_snapping_enabled() && !self.is_interpolating_from_snapshot {
                gizmo.last = gizmo.target;
                let sweep = apply_velocities
                    && self.config.inertia.sweep_physics_while_simulating
                    && gizmo.is_driving_velocity_of_simulated_transformables;
                self.transformables.apply_gizmo_transform(&gizmo.start, &gizmo.target, sweep);
            }
        }

        gizmo.is_first_drag_update = false;
        self.skip_interactive_world_movement_this_frame = false;
        unsnapped_dragged_to
    }

    /// Where the selection should go so its bounds rest on the surface under
    /// the interactor's laser, keeping the grab offset from drag start.
    pub fn find_placement_point_under_laser(&self, interactor: InteractorId, scene: &dyn SceneQuery) -> Option<Vec3> {
        let index = self.index_of(interactor).ok()?;
        self.placement_point_under_laser(index, scene)
    }

    pub(crate) fn placement_point_under_laser(&self, index: usize, scene: &dyn SceneQuery) -> Option<Vec3> {
        let (start, end) = self.laser_pointer(index)?;
        let ignored = self.transformables.ignored_actors();
        let hit = scene.raycast(start, end, &ignored)?;

        let gizmo_start = self.interactors[index].data.gizmo.start;
        let bounds = self.gizmo.local_bounds;
        let pull_direction = -gizmo_start.inverse_transform_vector_no_scale(hit.impact_normal);

        let extent = if bounds.is_valid() {
            bounds.extreme_point(pull_direction).dot(pull_direction)
        } else {
            0.0
        };
        let extra = if self.simulating && self.transformables.any_simulated() && bounds.is_valid() {
            bounds.size().abs().max_element() * self.config.inertia.placement_offset_scale_while_simulating
        } else {
            0.0
        };

        let pull_back = gizmo_start.transform_vector_no_scale(pull_direction * (extent + extra));
        Some(hit.impact_point - (pull_back + self.start_hit_to_transformables_center))
    }

    /// Snaps a desired gizmo location to nearby actors or the grid.
    ///
    /// Alignment wins over the grid. Both work in gizmo space when
    /// `local_space_snapping` is set; alignment only works in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn snap_location(
        &mut self,
        local_space_snapping: bool,
        desired: Vec3,
        gizmo_start: &Transform,
        snap_grid_base: Vec3,
        constrain_movement: bool,
        align_axes: Vec3,
        scene: &dyn SceneQuery,
    ) -> Vec3 {
        let gizmo_space_desired = gizmo_start.inverse_transform_position(desired);
        let mut snapped = desired;
        let mut aligned = false;

        if self.are_aligning_to_actors() && local_space_snapping {
            let mut desired_transform = *gizmo_start;
            desired_transform.set_location(desired);
            let request = AlignRequest {
                gizmo_start: *gizmo_start,
                desired: desired_transform,
                gizmo_local_bounds: self.gizmo.local_bounds,
                constrain_movement,
                constraint_axes: align_axes,
                force_snap_distance: self.config.snap.force_snap_distance,
                align_candidate_distance: self.config.snap.align_candidate_distance,
                candidates: &self.candidate_actors,
            };
            let (offset, guide) = find_transform_gizmo_align_point(&request, scene);
            if let Some(guide) = &guide {
                trace!(actor = %guide.aligned_actor, offset = ?offset, "aligned to actor");
            }
            self.last_alignment_guide = guide;
            if offset != Vec3::ZERO {
                aligned = true;
                snapped = gizmo_start.transform_position(gizmo_space_desired + offset);
            }
        }

        if self.config.snap.grid_enabled && !aligned {
            let grid = self.config.snap.grid_size;
            snapped = if local_space_snapping {
                gizmo_start.transform_position(snap_point_to_grid(gizmo_space_desired, snap_grid_base, grid))
            } else {
                snap_point_to_grid(snapped, snap_grid_base, grid)
            };
        }

        snapped
    }
}
