//! Starting, stopping and ticking drags.
//!
//! The per-interactor update runs in two passes. The first finds the
//! interactor transforming the selection and the one assisting it and lets
//! both slide their drag ray. The second advances every drag: laser or
//! grabber sphere drags of the selection, world drags, interactables, and
//! inertia for interactors that already let go.

use glam::Vec3;
use tracing::{debug, trace, warn};
use vwi_core::constants::KINDA_SMALL_NUMBER;
use vwi_core::geometry::{closest_point_on_line, closest_point_on_segment};

use super::smoothing::{apply_velocity_damping, is_nearly_zero};
use super::update::DragUpdate;
use super::{InteractionError, Interactable, StartDragParams, WorldInteraction};
use crate::events::InteractionEvent;
use crate::interactor::{DraggingMode, GizmoDragState, InteractorId, InteractorKind, LockedWorldDragMode};
use crate::scene::SceneQuery;
use crate::transaction::{MOVE_TRANSACTION_DESCRIPTION, TransactionEnd};

impl WorldInteraction {
    /// Starts dragging the selection with an interactor.
    ///
    /// With `should_use_laser_impact_drag` the selection follows the laser
    /// impact, even when a handle is given. Otherwise a handle drags through
    /// its operation and no handle moves the selection freely.
    pub fn start_dragging(&mut self, params: StartDragParams) -> Result<(), InteractionError> {
        let index = self.index_of(params.interactor)?;
        if self.transformables.is_empty() {
            return Err(InteractionError::NoTransformables);
        }
        if let Some(dragging) = self
            .interactors
            .iter()
            .find(|s| s.id != params.interactor && s.data.dragging_mode.is_transforming_transformables())
        {
            return Err(InteractionError::AlreadyDragging {
                interactor: params.interactor,
                dragging: dragging.id,
            });
        }

        let laser = self.laser_pointer(index);
        let sphere = if params.with_grabber_sphere {
            Some(
                self.grabber_sphere(index)
                    .ok_or(InteractionError::NoGrabberSphere(params.interactor))?,
            )
        } else {
            None
        };
        if sphere.is_none() && laser.is_none() {
            return Err(InteractionError::NoLaserPointer(params.interactor));
        }

        let handle = match params.handle {
            Some(id) => Some(
                self.gizmo
                    .handle(id)
                    .copied()
                    .ok_or(InteractionError::UnknownHandle(id))?,
            ),
            None => None,
        };

        if params.start_transaction && self.transaction.begin(MOVE_TRANSACTION_DESCRIPTION) {
            self.broadcast(InteractionEvent::TransactionBegan {
                description: MOVE_TRANSACTION_DESCRIPTION.to_string(),
            });
        }

        let mode = if params.should_use_laser_impact_drag {
            DraggingMode::TransformablesAtLaserImpact
        } else if handle.is_some() {
            DraggingMode::TransformablesWithGizmo
        } else {
            DraggingMode::TransformablesFreely
        };

        let gizmo_start = self.gizmo.gizmo_to_world;
        let gizmo_bounds = self.gizmo.local_bounds;

        let slot = &mut self.interactors[index];
        slot.source.on_start_dragging(params.hit_location, params.is_placing_new_objects);
        let strength = slot.source.drag_haptic_feedback_strength();
        slot.source.play_haptic_effect(strength);

        let data = &mut slot.data;
        data.dragging_mode = mode;
        data.last_dragging_mode = mode;
        data.is_dragging_with_grabber_sphere = sphere.is_some();
        data.drag_ray_length = match (sphere, laser) {
            (None, Some((start, _))) => (params.hit_location - start).length(),
            _ => 0.0,
        };
        data.drag_ray_length_velocity = 0.0;
        data.impact_location_at_drag_start = params.hit_location;
        data.interactor_rotation_at_drag_start = data.transform.rotation;
        data.grabber_sphere_location_at_drag_start = sphere.map(|s| s.center).unwrap_or(Vec3::ZERO);
        data.drag_translation_velocity = Vec3::ZERO;
        data.last_drag_to_location = params.hit_location;
        data.was_assisting_drag = false;
        data.dragged_handle = handle.map(|h| h.id);
        data.drag_operation = handle.map(|h| h.kind.drag_operation());
        data.last_drag_operation = data.drag_operation;
        data.optional_handle_placement = handle.and_then(|h| h.placement);
        data.gizmo = GizmoDragState::starting_at(gizmo_start, gizmo_bounds);

        if let Some(other) = self.other_index(index) {
            self.interactors[other].data.was_assisting_drag = false;
        }

        self.are_transformables_moving = true;
        self.dragged_since_last_selection = true;
        self.last_drag_gizmo_start_transform = gizmo_start;
        self.transformables.capture_start_transforms();
        self.start_hit_to_transformables_center = self.transformables.average_location() - params.hit_location;

        if params.is_placing_new_objects && params.allow_interpolation_when_placing {
            self.is_interpolating_from_snapshot = true;
            self.freeze_placement_while_interpolating = false;
            self.interpolation_start_time = self.time;
            self.interpolation_duration = self.config.smoothing.placement_interpolation_duration;
        } else {
            self.is_interpolating_from_snapshot = false;
            self.freeze_placement_while_interpolating = false;
        }

        debug!(interactor = %params.interactor, ?mode, handle = ?params.handle, "start dragging");
        self.broadcast(InteractionEvent::StartDragging {
            interactor: params.interactor,
        });
        self.refresh_transform_gizmo(false);
        Ok(())
    }

    /// Joins the other hand's drag of the selection or the world, grabbing
    /// at `hit_location` along this interactor's laser.
    pub fn start_assisting_drag(&mut self, interactor: InteractorId, hit_location: Vec3) -> Result<(), InteractionError> {
        let index = self.index_of(interactor)?;
        let other = self
            .other_index(index)
            .filter(|o| {
                let mode = self.interactors[*o].data.dragging_mode;
                mode.is_transforming_transformables() || mode == DraggingMode::World
            })
            .ok_or(InteractionError::NotDragging(interactor))?;
        let (start, _) = self
            .laser_pointer(index)
            .ok_or(InteractionError::NoLaserPointer(interactor))?;

        let data = &mut self.interactors[index].data;
        data.dragging_mode = DraggingMode::AssistingDrag;
        data.last_dragging_mode = DraggingMode::AssistingDrag;
        data.is_dragging_with_grabber_sphere = false;
        data.drag_ray_length = (hit_location - start).length();
        data.drag_ray_length_velocity = 0.0;
        data.impact_location_at_drag_start = hit_location;
        data.last_drag_to_location = hit_location;
        data.drag_translation_velocity = Vec3::ZERO;
        data.was_assisting_drag = false;

        debug!(%interactor, assisting = %self.interactors[other].id, "start assisting drag");
        Ok(())
    }

    /// Grabs the world. If the other hand already drags the world this hand
    /// assists it, which makes the drag two-handed.
    pub fn start_world_drag(&mut self, interactor: InteractorId) -> Result<(), InteractionError> {
        let index = self.index_of(interactor)?;
        let other_drags_world = self
            .other_index(index)
            .is_some_and(|o| self.interactors[o].data.dragging_mode == DraggingMode::World);
        let mode = if other_drags_world {
            DraggingMode::AssistingDrag
        } else {
            DraggingMode::World
        };

        let data = &mut self.interactors[index].data;
        let room_location = data.room_space_transform.location();
        data.dragging_mode = mode;
        data.last_dragging_mode = mode;
        data.is_dragging_with_grabber_sphere = false;
        data.impact_location_at_drag_start = room_location;
        data.last_drag_to_location = room_location;
        data.drag_translation_velocity = Vec3::ZERO;
        data.was_assisting_drag = false;
        data.gizmo.locked_world_drag_mode = LockedWorldDragMode::Unlocked;
        data.gizmo.scale_since_drag_started = 0.0;
        data.gizmo.rotation_radians_since_drag_started = 0.0;

        debug!(%interactor, ?mode, "start world drag");
        Ok(())
    }

    /// Hands an interactable to an interactor, which drags it until stopped.
    pub fn set_dragged_interactable(
        &mut self,
        interactor: InteractorId,
        interactable: Box<dyn Interactable>,
    ) -> Result<(), InteractionError> {
        let index = self.index_of(interactor)?;
        let data = &mut self.interactors[index].data;
        data.dragging_mode = DraggingMode::Interactable;
        data.last_dragging_mode = DraggingMode::Interactable;
        self.dragged_interactable = Some(interactable);
        Ok(())
    }

    /// Releases whatever the interactor drags. A no-op when it drags nothing.
    pub fn stop_dragging(&mut self, interactor: InteractorId) -> Result<(), InteractionError> {
        let index = self.index_of(interactor)?;
        self.stop_dragging_index(index);
        Ok(())
    }

    pub(crate) fn stop_dragging_index(&mut self, index: usize) {
        let mode = self.interactors[index].data.dragging_mode;
        if mode == DraggingMode::Nothing {
            return;
        }
        let id = self.interactors[index].id;
        debug!(interactor = %id, ?mode, "stop dragging");
        self.broadcast(InteractionEvent::StopDragging { interactor: id });

        let assisting_other = self
            .other_index(index)
            .filter(|o| self.interactors[*o].data.dragging_mode == DraggingMode::AssistingDrag);

        if let Some(other) = assisting_other {
            // The assisting hand takes the drag over.
            let from = self.interactors[index].data.clone();
            let to = &mut self.interactors[other].data;
            to.dragging_mode = from.dragging_mode;
            to.last_dragging_mode = from.dragging_mode;
            to.dragged_handle = from.dragged_handle;
            to.drag_operation = from.drag_operation;
            to.last_drag_operation = from.drag_operation;
            to.optional_handle_placement = from.optional_handle_placement;
            to.gizmo = GizmoDragState {
                locked_world_drag_mode: LockedWorldDragMode::Unlocked,
                scale_since_drag_started: 0.0,
                rotation_radians_since_drag_started: 0.0,
                ..from.gizmo
            };
            to.was_assisting_drag = false;
            self.interactors[index].data.was_assisting_drag = true;
            debug!(from = %id, to = %self.interactors[other].id, "drag handed over");
        } else if mode == DraggingMode::Interactable {
            if let Some(mut interactable) = self.dragged_interactable.take() {
                interactable.on_drag_release(id);
            }
        } else if mode.is_transforming_transformables() {
            let data = &mut self.interactors[index].data;
            data.last_drag_operation = data.drag_operation.take();

            let stop_epsilon = self.config.inertia.drag_translation_velocity_stop_epsilon;
            let has_velocity = !is_nearly_zero(data.drag_translation_velocity, stop_epsilon);
            let will_keep_moving = self.are_transformables_moving
                && (self.is_smooth_snapping_enabled() || has_velocity || self.is_interpolating_from_snapshot);
            if !will_keep_moving {
                self.finished_moving_transformables();
            }
        } else if mode == DraggingMode::AssistingDrag {
            self.interactors[index].data.was_assisting_drag = true;
        }

        let data = &mut self.interactors[index].data;
        data.dragging_mode = DraggingMode::Nothing;
        data.dragged_handle = None;
        self.refresh_transform_gizmo(false);
    }

    /// The other hand, when it recently assisted and still has velocity to
    /// contribute to this interactor's drag.
    pub(crate) fn other_interactor_inertia_contribute(&self, index: usize) -> Option<usize> {
        let other = self.other_index(index)?;
        let data = &self.interactors[other].data;
        let stop_epsilon = self.config.inertia.drag_translation_velocity_stop_epsilon;
        (data.dragging_mode == DraggingMode::Nothing
            && data.was_assisting_drag
            && !is_nearly_zero(data.drag_translation_velocity, stop_epsilon))
        .then_some(other)
    }

    /// Slide input lengthens or shortens the drag ray. Without input the ray
    /// keeps sliding with its own damped velocity.
    fn calculate_drag_ray(&mut self, index: usize, world_scale_factor: f32) {
        let min_velocity = self.config.inertia.min_velocity_for_inertia;
        let slot = &mut self.interactors[index];
        let is_absolute = slot.source.is_slide_absolute();
        let slide = slot
            .source
            .slide_delta()
            .map(|delta| delta * world_scale_factor)
            .filter(|slide| slide.abs() > KINDA_SMALL_NUMBER);

        let data = &mut slot.data;
        match slide {
            Some(slide) => {
                data.drag_ray_length += slide;
                data.drag_ray_length_velocity = 0.0;
                if is_absolute && slide.abs() >= min_velocity * world_scale_factor {
                    data.drag_ray_length_velocity = slide;
                }
                if data.drag_ray_length < 0.0 {
                    data.drag_ray_length = 0.0;
                    data.drag_ray_length_velocity = 0.0;
                }
                // Sliding away from the impact point turns placement into a free drag.
                if data.dragging_mode == DraggingMode::TransformablesAtLaserImpact {
                    data.dragging_mode = DraggingMode::TransformablesFreely;
                    data.last_dragging_mode = DraggingMode::TransformablesFreely;
                }
            }
            None => {
                if data.drag_ray_length_velocity.abs() > KINDA_SMALL_NUMBER {
                    data.drag_ray_length += data.drag_ray_length_velocity;
                    if data.drag_ray_length < 0.0 {
                        data.drag_ray_length = 0.0;
                        data.drag_ray_length_velocity = 0.0;
                    }
                }
                let mut velocity = Vec3::new(data.drag_ray_length_velocity, 0.0, 0.0);
                apply_velocity_damping(&mut velocity, true, world_scale_factor);
                data.drag_ray_length_velocity = velocity.x;
            }
        }
    }

    pub(super) fn interaction_tick(&mut self, dt: f32, scene: &dyn SceneQuery) {
        let world_scale_factor = self.world_scale_factor();

        let mut dragging_with = None;
        let mut assisting_with = None;
        for index in 0..self.interactors.len() {
            let data = &self.interactors[index].data;
            let can_slide = if data.dragging_mode.is_transforming_transformables() {
                dragging_with = Some(index);
                !data.is_dragging_with_grabber_sphere
            } else if data.dragging_mode == DraggingMode::AssistingDrag {
                assisting_with = Some(index);
                !data.is_dragging_with_grabber_sphere
            } else {
                false
            };
            if can_slide {
                self.calculate_drag_ray(index, world_scale_factor);
            }
        }

        let was_interpolation_needed = self.is_interpolating_from_snapshot;
        let mut inertia_from = None;
        for index in 0..self.interactors.len() {
            let mode = self.interactors[index].data.dragging_mode;
            if mode.is_transforming_transformables() || (mode == DraggingMode::World && self.allow_world_movement) {
                self.drag_tick(index, assisting_with, dt, scene);
            } else if mode == DraggingMode::Interactable {
                let slot = &self.interactors[index];
                match self.dragged_interactable.as_mut() {
                    Some(interactable) => interactable.execute_drag(slot.id, &slot.data),
                    None => self.interactors[index].data.dragging_mode = DraggingMode::Nothing,
                }
            } else if mode == DraggingMode::Nothing {
                if let Some(from) = self.inertia_tick(index, dt, dragging_with.is_some(), scene) {
                    inertia_from = Some(from);
                }
            }
        }

        // Handing a drag over may have moved it to another interactor.
        let dragging_with = self
            .interactors
            .iter()
            .position(|s| s.data.dragging_mode.is_transforming_transformables());
        self.update_transformables(dt, dragging_with, inertia_from, was_interpolation_needed);

        self.refresh_transform_gizmo(false);
        self.last_world_to_meters = self.world_to_meters();
    }

    /// One update of a live drag of the selection or the world.
    fn drag_tick(&mut self, index: usize, assisting_with: Option<usize>, dt: f32, scene: &dyn SceneQuery) {
        let world_scale_factor = self.world_scale_factor();
        let world_to_meters = self.world_to_meters();
        let mut other = assisting_with
            .filter(|o| *o != index && self.interactors[*o].data.dragging_mode == DraggingMode::AssistingDrag);
        let was_assisting = self.other_interactor_inertia_contribute(index);
        let data = self.interactors[index].data.clone();
        let id = self.interactors[index].id;

        let mut dragged_to = data.transform.location();
        let mut drag_delta = dragged_to - data.last_transform.location();
        let mut drag_delta_from_start = dragged_to - data.impact_location_at_drag_start;

        let mut other_dragged_to = Vec3::ZERO;
        let mut other_drag_delta = Vec3::ZERO;
        if let Some(o) = other {
            let other_data = &self.interactors[o].data;
            other_dragged_to = other_data.transform.location();
            other_drag_delta = other_dragged_to - other_data.last_transform.location();
        } else if let Some(w) = was_assisting {
            let other_data = &self.interactors[w].data;
            other_drag_delta = other_data.drag_translation_velocity;
            other_dragged_to = other_data.last_drag_to_location + other_drag_delta;
        }

        let mut laser_start = data.transform.location();
        let mut laser_direction = data.transform.forward();
        let mut laser_end = laser_start;

        if data.dragging_mode.is_transforming_transformables() {
            if data.is_dragging_with_grabber_sphere {
                let Some(sphere) = self.grabber_sphere(index) else {
                    warn!(interactor = %id, "grabber sphere lost while dragging");
                    self.stop_dragging_index(index);
                    return;
                };
                // Keep the grab point fixed relative to the hand.
                let grab_offset = data.impact_location_at_drag_start - data.grabber_sphere_location_at_drag_start;
                let unrotated = data.interactor_rotation_at_drag_start.inverse() * grab_offset;
                dragged_to = sphere.center + data.transform.rotation * unrotated;
                drag_delta = dragged_to - data.last_drag_to_location;
                drag_delta_from_start = dragged_to - data.impact_location_at_drag_start;

                let data = &mut self.interactors[index].data;
                data.drag_translation_velocity = drag_delta;
                data.last_drag_to_location = dragged_to;
                data.hover_location = Some(dragged_to);
            } else {
                let Some((start, end)) = self.laser_pointer(index) else {
                    warn!(interactor = %id, "laser lost while dragging");
                    self.stop_dragging_index(index);
                    return;
                };
                laser_start = start;
                laser_end = end;
                laser_direction = (end - start).normalize_or_zero();

                if data.dragging_mode == DraggingMode::TransformablesAtLaserImpact {
                    let hit = self
                        .placement_point_under_laser(index, scene)
                        .unwrap_or(laser_start + laser_direction * data.drag_ray_length);
                    if data.gizmo.is_first_drag_update
                        || !self.freeze_placement_while_interpolating
                        || !self.is_interpolating_from_snapshot
                    {
                        self.interactors[index].data.drag_ray_length = (laser_start - hit).length();
                        dragged_to = hit;

                        if !self.is_interpolating_from_snapshot {
                            let jump = if data.gizmo.is_first_drag_update {
                                Vec3::ZERO
                            } else {
                                dragged_to - data.last_drag_to_location
                            };
                            if jump.length() * world_scale_factor
                                >= self.config.smoothing.laser_impact_interpolation_threshold
                            {
                                trace!(interactor = %id, jump = jump.length(), "laser impact jumped, interpolating");
                                self.is_interpolating_from_snapshot = true;
                                self.freeze_placement_while_interpolating = true;
                                self.interpolation_start_time = self.time;
                                self.interpolation_duration = self.config.smoothing.laser_impact_interpolation_duration;
                                self.interactors[index].data.gizmo.interpolation_snapshot = data.gizmo.last;
                            }
                        }
                    } else {
                        dragged_to = data.last_drag_to_location;
                    }
                } else {
                    dragged_to = laser_start + laser_direction * data.drag_ray_length;
                }

                drag_delta = dragged_to - data.last_drag_to_location;
                drag_delta_from_start = dragged_to - data.impact_location_at_drag_start;

                let data = &mut self.interactors[index].data;
                data.drag_translation_velocity = drag_delta;
                data.last_drag_to_location = dragged_to;
                data.hover_location = Some(closest_point_on_line(laser_start, laser_end, dragged_to));
            }

            if let Some(o) = other {
                match self.laser_pointer(o) {
                    Some((start, end)) => {
                        let direction = (end - start).normalize_or_zero();
                        let other_data = &mut self.interactors[o].data;
                        other_dragged_to = start + direction * other_data.drag_ray_length;
                        other_drag_delta = other_dragged_to - other_data.last_drag_to_location;
                        other_data.drag_translation_velocity = other_drag_delta;
                        other_data.last_drag_to_location = other_dragged_to;
                        other_data.hover_location = Some(other_dragged_to);
                    }
                    None => {
                        warn!(interactor = %self.interactors[o].id, "assisting laser lost");
                        self.stop_dragging_index(o);
                        other = None;
                    }
                }
            }
        } else {
            // World drags work in room space. Divide out this frame's world
            // scale change so scaling does not read as hand motion.
            let room_delta = |data: &crate::interactor::InteractorData, last_world_to_meters: f32| {
                let unscaled = data.room_space_transform.location() / world_to_meters * last_world_to_meters;
                unscaled - data.last_room_space_transform.location()
            };

            drag_delta = room_delta(&data, self.last_world_to_meters);
            dragged_to = data.last_room_space_transform.location() + drag_delta;
            let this = &mut self.interactors[index].data;
            this.drag_translation_velocity = drag_delta;
            this.last_drag_to_location = dragged_to;

            if let Some(o) = other {
                let last_world_to_meters = self.last_world_to_meters;
                let other_data = &mut self.interactors[o].data;
                other_drag_delta = room_delta(&*other_data, last_world_to_meters);
                other_dragged_to = other_data.last_room_space_transform.location() + other_drag_delta;
                other_data.drag_translation_velocity = other_drag_delta;
                other_data.last_drag_to_location = other_dragged_to;
            }
        }

        // Hands that barely moved this frame leave no inertia behind.
        let min_velocity = self.config.inertia.min_velocity_for_inertia * world_scale_factor;
        let hand_delta = if self.interactors[index].source.kind() == InteractorKind::MouseCursor {
            drag_delta
        } else {
            data.room_space_transform.location() - data.last_room_space_transform.location()
        };
        if hand_delta.length() < min_velocity {
            self.interactors[index].data.drag_translation_velocity = Vec3::ZERO;
        }
        if let Some(o) = other {
            let other_data = &mut self.interactors[o].data;
            let other_hand_delta =
                other_data.room_space_transform.location() - other_data.last_room_space_transform.location();
            if other_hand_delta.length() < min_velocity {
                other_data.drag_translation_velocity = Vec3::ZERO;
            }
        }

        let with_two_hands = other.is_some() || was_assisting.is_some();
        let current = &self.interactors[index].data;
        let update = DragUpdate {
            dt,
            mode: current.dragging_mode,
            operation: current.drag_operation,
            with_two_hands,
            placement: current.optional_handle_placement,
            drag_delta,
            other_hand_drag_delta: other_drag_delta,
            dragged_to,
            other_hand_dragged_to: other_dragged_to,
            drag_delta_from_start,
            laser_pointer_start: laser_start,
            laser_pointer_direction: laser_direction,
            laser_pointer_max_length: self.laser_pointer_max_length(index),
            is_laser_pointer_valid: true,
        };
        let mut gizmo = current.gizmo;
        let old_room_location = self
            .room_transform_to_set
            .map(|(room, _)| room)
            .unwrap_or(self.room_transform)
            .location();

        let unsnapped_dragged_to = self.update_dragging(&update, &mut gizmo, scene);
        self.interactors[index].data.gizmo = gizmo;

        if update.mode == DraggingMode::TransformablesWithGizmo {
            self.interactors[index].data.hover_location =
                Some(closest_point_on_segment(unsnapped_dragged_to, laser_start, laser_end));
        }

        if let Some(w) = was_assisting {
            let sensitive = update.mode == DraggingMode::World;
            let other_data = &mut self.interactors[w].data;
            other_data.last_drag_to_location = other_dragged_to;
            apply_velocity_damping(&mut other_data.drag_translation_velocity, sensitive, world_scale_factor);
        }

        if update.mode == DraggingMode::World {
            self.play_world_grid_haptics(index, old_room_location, with_two_hands);
        }
    }

    /// Pulses when the room crosses a haptic grid line on any axis.
    fn play_world_grid_haptics(&mut self, index: usize, old_room_location: Vec3, with_two_hands: bool) {
        let Some((room, _)) = self.room_transform_to_set else {
            return;
        };
        let interval = self.config.world.haptic_translation_interval * self.world_scale_factor();
        if interval <= KINDA_SMALL_NUMBER {
            return;
        }
        let new_room_location = room.location();
        let crossed = (0..3).any(|axis| {
            (old_room_location[axis] / interval).trunc() != (new_room_location[axis] / interval).trunc()
        });
        if !crossed {
            return;
        }

        let strength = self.config.world.grid_haptic_feedback_strength;
        self.interactors[index].source.play_haptic_effect(strength);
        if with_two_hands {
            if let Some(other) = self.other_index(index) {
                self.interactors[other].source.play_haptic_effect(strength);
            }
        }
    }

    /// Inertia for an interactor that let go. Returns the interactor when it
    /// is still moving the selection.
    fn inertia_tick(&mut self, index: usize, dt: f32, other_is_dragging: bool, scene: &dyn SceneQuery) -> Option<usize> {
        let world_scale_factor = self.world_scale_factor();
        let stop_epsilon = self.config.inertia.drag_translation_velocity_stop_epsilon;
        let data = self.interactors[index].data.clone();

        let has_velocity = !is_nearly_zero(data.drag_translation_velocity, stop_epsilon);
        let interpolating = self.is_interpolating_from_snapshot && !other_is_dragging;
        if !((has_velocity || interpolating)
            && !data.was_assisting_drag
            && !data.gizmo.is_driving_velocity_of_simulated_transformables)
        {
            self.interactors[index].data.drag_translation_velocity = Vec3::ZERO;
            return None;
        }

        let last_mode = data.last_dragging_mode;
        let inertia_from = last_mode.is_transforming_transformables().then_some(index);

        let drag_delta = data.drag_translation_velocity;
        let dragged_to = data.last_drag_to_location + drag_delta;
        let drag_delta_from_start = dragged_to - data.impact_location_at_drag_start;

        let was_assisting = self.other_interactor_inertia_contribute(index);
        let (other_dragged_to, other_drag_delta) = match was_assisting {
            Some(w) => {
                let other_data = &self.interactors[w].data;
                let delta = other_data.drag_translation_velocity;
                (other_data.last_drag_to_location + delta, delta)
            }
            None => (Vec3::ZERO, Vec3::ZERO),
        };

        let update = DragUpdate {
            dt,
            mode: last_mode,
            operation: data.last_drag_operation,
            with_two_hands: was_assisting.is_some(),
            placement: data.optional_handle_placement,
            drag_delta,
            other_hand_drag_delta: other_drag_delta,
            dragged_to,
            other_hand_dragged_to: other_dragged_to,
            drag_delta_from_start,
            laser_pointer_start: Vec3::ZERO,
            laser_pointer_direction: Vec3::ZERO,
            laser_pointer_max_length: 0.0,
            is_laser_pointer_valid: false,
        };
        let mut gizmo = data.gizmo;
        self.update_dragging(&update, &mut gizmo, scene);

        let sensitive = last_mode == DraggingMode::World;
        let this = &mut self.interactors[index].data;
        this.gizmo = gizmo;
        this.last_drag_to_location = dragged_to;
        apply_velocity_damping(&mut this.drag_translation_velocity, sensitive, world_scale_factor);

        if let Some(w) = was_assisting {
            let other_data = &mut self.interactors[w].data;
            other_data.last_drag_to_location = other_dragged_to;
            apply_velocity_damping(&mut other_data.drag_translation_velocity, sensitive, world_scale_factor);
        }

        inertia_from
    }

    /// Ends the undo transaction opened for a drag, if any.
    pub(crate) fn end_move_transaction(&mut self) {
        match self.transaction.end() {
            TransactionEnd::Closed => self.broadcast(InteractionEvent::TransactionEnded),
            TransactionEnd::Nested => {}
            TransactionEnd::NotOpen => trace!("no transaction to end"),
        }
    }
}
