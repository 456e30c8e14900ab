//! World interaction
//!
//! [`WorldInteraction`] owns the interactors, the current selection of
//! transformables, the room transform and the gizmo. It is ticked once per
//! frame and is single-threaded.
//!
//! Per tick:
//! 1. commit a staged world-to-meters scale and a scheduled room transform
//! 2. poll every interactor once for this frame
//! 3. hover: pick gizmo handles, otherwise raycast the scene
//! 4. drag, assist and inertia updates per interactor
//! 5. smoothing and snapshot interpolation, then gizmo refresh

mod dragging;
mod refresh;
mod smoothing;
mod update;
mod world;

#[cfg(test)]
mod test_support;

use glam::Vec3;
use tracing::{debug, warn};
use uuid::Uuid;
use vwi_core::{InteractionConfig, Transform};

use crate::align::GuideData;
use crate::events::{EventBus, InteractionEvent, SubscriptionId};
use crate::gizmo::visuals::{GizmoVisualState, SnapGridState};
use crate::gizmo::{GizmoHandleId, GizmoSpace, pick_handle};
use crate::interactor::{InteractorData, InteractorId, InteractorSource, Sphere};
use crate::scene::SceneQuery;
use crate::transaction::TrackingTransaction;
use crate::transformable::{Transformable, TransformableSet};

pub use smoothing::apply_velocity_damping;
pub use update::DragUpdate;
pub use world::WorldScale;

/// Errors returned by entry points called with bad arguments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractionError {
    #[error("Unknown interactor: {0}")]
    UnknownInteractor(InteractorId),
    #[error("Unknown gizmo handle: {0:?}")]
    UnknownHandle(GizmoHandleId),
    #[error("{0} has no laser pointer")]
    NoLaserPointer(InteractorId),
    #[error("{0} has no grabber sphere")]
    NoGrabberSphere(InteractorId),
    #[error("{interactor} cannot start dragging while {dragging} is dragging")]
    AlreadyDragging {
        interactor: InteractorId,
        dragging: InteractorId,
    },
    #[error("{0} has no drag to join")]
    NotDragging(InteractorId),
    #[error("No transformables to drag")]
    NoTransformables,
}

/// A UI object dragged by an interactor instead of the selection.
pub trait Interactable {
    /// Called every tick while dragged.
    fn execute_drag(&mut self, interactor: InteractorId, data: &InteractorData);

    /// Called once when the interactor releases it.
    fn on_drag_release(&mut self, interactor: InteractorId);
}

/// Arguments of [`WorldInteraction::start_dragging`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartDragParams {
    /// Interactor that grabs
    pub interactor: InteractorId,
    /// Gizmo handle grabbed, if any
    pub handle: Option<GizmoHandleId>,
    /// World-space grab point
    pub hit_location: Vec3,
    /// Objects were just created and are being placed
    pub is_placing_new_objects: bool,
    /// Interpolate placed objects from their spawn point
    pub allow_interpolation_when_placing: bool,
    /// Place at the laser impact instead of dragging freely
    pub should_use_laser_impact_drag: bool,
    /// Open an undo transaction for the drag
    pub start_transaction: bool,
    /// Drag with the grabber sphere instead of the laser
    pub with_grabber_sphere: bool,
}

impl StartDragParams {
    /// Free drag with the laser, inside a transaction.
    pub fn new(interactor: InteractorId, hit_location: Vec3) -> Self {
        Self {
            interactor,
            handle: None,
            hit_location,
            is_placing_new_objects: false,
            allow_interpolation_when_placing: true,
            should_use_laser_impact_drag: false,
            start_transaction: true,
            with_grabber_sphere: false,
        }
    }

    /// Grab a gizmo handle.
    pub fn with_handle(mut self, handle: GizmoHandleId) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Place at the laser impact.
    pub fn at_laser_impact(mut self) -> Self {
        self.should_use_laser_impact_drag = true;
        self
    }

    /// Objects are new and being placed.
    pub fn placing_new_objects(mut self) -> Self {
        self.is_placing_new_objects = true;
        self
    }

    /// Drag with the grabber sphere.
    pub fn with_grabber_sphere(mut self) -> Self {
        self.with_grabber_sphere = true;
        self
    }
}

pub(crate) struct InteractorSlot {
    pub(crate) id: InteractorId,
    pub(crate) source: Box<dyn InteractorSource>,
    pub(crate) data: InteractorData,
    pub(crate) other: Option<InteractorId>,
    pub(crate) last_polled_frame: Option<u64>,
}

/// The manipulation engine.
pub struct WorldInteraction {
    config: InteractionConfig,
    interactors: Vec<InteractorSlot>,
    next_interactor_id: u32,
    transformables: TransformableSet,
    events: EventBus,
    transaction: TrackingTransaction,
    dragged_interactable: Option<Box<dyn Interactable>>,

    time: f64,
    tick_number: u64,

    room_transform: Transform,
    room_transform_to_set: Option<(Transform, u64)>,
    room_space_head_transform: Transform,
    world_scale: WorldScale,
    last_world_to_meters: f32,
    allow_world_movement: bool,
    skip_interactive_world_movement_this_frame: bool,

    are_transformables_moving: bool,
    is_interpolating_from_snapshot: bool,
    freeze_placement_while_interpolating: bool,
    interpolation_start_time: f64,
    interpolation_duration: f32,
    start_hit_to_transformables_center: Vec3,
    dragged_since_last_selection: bool,
    last_drag_gizmo_start_transform: Transform,

    gizmo: GizmoVisualState,
    gizmo_space: GizmoSpace,
    want_gizmo_visible: bool,
    gizmo_scale: f32,
    in_vr: bool,
    selection_changed_time: f64,
    snap_grid: SnapGridState,
    is_refreshing_gizmo: bool,

    candidate_actors: Vec<Uuid>,
    simulating: bool,
    last_alignment_guide: Option<GuideData>,
}

impl std::fmt::Debug for WorldInteraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldInteraction")
            .field("interactors", &self.interactors.len())
            .field("transformables", &self.transformables.len())
            .field("tick_number", &self.tick_number)
            .field("world_to_meters", &self.world_to_meters())
            .field("room_transform", &self.room_transform)
            .finish()
    }
}

impl WorldInteraction {
    /// Creates an engine with no interactors and nothing selected.
    pub fn new(config: InteractionConfig) -> Self {
        let world_scale = WorldScale::default();
        let last_world_to_meters = world_scale.committed();
        Self {
            config,
            interactors: Vec::new(),
            next_interactor_id: 0,
            transformables: TransformableSet::new(),
            events: EventBus::new(),
            transaction: TrackingTransaction::new(),
            dragged_interactable: None,
            time: 0.0,
            tick_number: 0,
            room_transform: Transform::IDENTITY,
            room_transform_to_set: None,
            room_space_head_transform: Transform::IDENTITY,
            world_scale,
            last_world_to_meters,
            allow_world_movement: true,
            skip_interactive_world_movement_this_frame: false,
            are_transformables_moving: false,
            is_interpolating_from_snapshot: false,
            freeze_placement_while_interpolating: false,
            interpolation_start_time: 0.0,
            interpolation_duration: 0.0,
            start_hit_to_transformables_center: Vec3::ZERO,
            dragged_since_last_selection: false,
            last_drag_gizmo_start_transform: Transform::IDENTITY,
            gizmo: GizmoVisualState::default(),
            gizmo_space: GizmoSpace::World,
            want_gizmo_visible: true,
            gizmo_scale: 1.0,
            in_vr: true,
            selection_changed_time: 0.0,
            snap_grid: SnapGridState::default(),
            is_refreshing_gizmo: false,
            candidate_actors: Vec::new(),
            simulating: false,
            last_alignment_guide: None,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect immediately.
    pub fn set_config(&mut self, config: InteractionConfig) {
        self.config = config;
        self.refresh_transform_gizmo(false);
    }

    /// Seconds accumulated from tick deltas
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed ticks
    pub fn tick_number(&self) -> u64 {
        self.tick_number
    }

    // ========== Interactors ==========

    /// Registers an interactor.
    pub fn add_interactor(&mut self, source: Box<dyn InteractorSource>) -> InteractorId {
        let id = InteractorId(self.next_interactor_id);
        self.next_interactor_id += 1;
        self.interactors.push(InteractorSlot {
            id,
            source,
            data: InteractorData::default(),
            other: None,
            last_polled_frame: None,
        });
        debug!(%id, "interactor added");
        id
    }

    /// Stops the interactor's drag, unpairs it and removes it.
    pub fn remove_interactor(&mut self, id: InteractorId) -> Result<(), InteractionError> {
        let index = self.index_of(id)?;
        self.stop_dragging_index(index);
        for slot in &mut self.interactors {
            if slot.other == Some(id) {
                slot.other = None;
            }
        }
        self.interactors.remove(index);
        debug!(%id, "interactor removed");
        Ok(())
    }

    /// Makes two interactors each other's second hand.
    pub fn pair_interactors(&mut self, a: InteractorId, b: InteractorId) -> Result<(), InteractionError> {
        let a_index = self.index_of(a)?;
        let b_index = self.index_of(b)?;
        self.interactors[a_index].other = Some(b);
        self.interactors[b_index].other = Some(a);
        Ok(())
    }

    /// Per-interactor state.
    pub fn interactor_data(&self, id: InteractorId) -> Option<&InteractorData> {
        self.interactors.iter().find(|s| s.id == id).map(|s| &s.data)
    }

    /// Ids of all interactors in registration order.
    pub fn interactor_ids(&self) -> Vec<InteractorId> {
        self.interactors.iter().map(|s| s.id).collect()
    }

    pub(crate) fn index_of(&self, id: InteractorId) -> Result<usize, InteractionError> {
        self.interactors
            .iter()
            .position(|s| s.id == id)
            .ok_or(InteractionError::UnknownInteractor(id))
    }

    pub(crate) fn other_index(&self, index: usize) -> Option<usize> {
        let other = self.interactors[index].other?;
        self.interactors.iter().position(|s| s.id == other)
    }

    pub(crate) fn laser_pointer_max_length(&self, index: usize) -> f32 {
        self.interactors[index].source.laser_pointer_max_length() * self.world_scale_factor()
    }

    pub(crate) fn laser_pointer(&self, index: usize) -> Option<(Vec3, Vec3)> {
        let slot = &self.interactors[index];
        if !slot.data.has_pose {
            return None;
        }
        slot.source
            .laser_pointer(&slot.data.transform, self.laser_pointer_max_length(index))
    }

    pub(crate) fn grabber_sphere(&self, index: usize) -> Option<Sphere> {
        let slot = &self.interactors[index];
        if !slot.data.has_pose {
            return None;
        }
        slot.source.grabber_sphere(&slot.data.transform)
    }

    // ========== Events ==========

    /// Registers an event listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&InteractionEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Removes an event listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ========== Selection ==========

    /// Replaces the selection and resets per-selection drag state.
    pub fn set_transformables(&mut self, transformables: Vec<Box<dyn Transformable>>) {
        if self
            .interactors
            .iter()
            .any(|s| s.data.dragging_mode.is_transforming_transformables())
        {
            warn!("selection changed while dragging");
        }

        self.dragged_since_last_selection = false;
        self.last_drag_gizmo_start_transform = Transform::IDENTITY;
        self.is_interpolating_from_snapshot = false;
        self.freeze_placement_while_interpolating = false;

        self.transformables.replace(transformables);
        for slot in &mut self.interactors {
            slot.data.last_dragging_mode = crate::interactor::DraggingMode::Nothing;
        }
        debug!(count = self.transformables.len(), "transformables set");
        self.refresh_transform_gizmo(true);
    }

    /// Deselects everything.
    pub fn clear_transformables(&mut self) {
        self.set_transformables(Vec::new());
    }

    /// The current selection
    pub fn transformables(&self) -> &TransformableSet {
        &self.transformables
    }

    /// Whether transformables are being dragged or are still settling.
    pub fn are_transformables_moving(&self) -> bool {
        self.are_transformables_moving
    }

    // ========== Alignment candidates ==========

    /// Actors alignment should consider instead of searching nearby.
    pub fn set_candidate_actors(&mut self, actors: Vec<Uuid>) {
        self.candidate_actors = actors;
    }

    /// Turns the selection into alignment candidates and deselects it, or
    /// clears the candidates.
    pub fn set_selection_as_candidates(&mut self, enabled: bool) {
        if enabled {
            self.candidate_actors = self.transformables.actor_ids();
            self.clear_transformables();
        } else {
            self.candidate_actors.clear();
        }
    }

    /// Whether explicit candidates are set
    pub fn has_candidates_selected(&self) -> bool {
        !self.candidate_actors.is_empty()
    }

    /// Guide of the last alignment search that found something
    pub fn last_alignment_guide(&self) -> Option<&GuideData> {
        self.last_alignment_guide.as_ref()
    }

    /// Simulation (physics running) mode.
    pub fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }

    // ========== Gizmo ==========

    /// Gizmo state for rendering
    pub fn gizmo(&self) -> &GizmoVisualState {
        &self.gizmo
    }

    /// Snap grid state for rendering
    pub fn snap_grid(&self) -> &SnapGridState {
        &self.snap_grid
    }

    /// Current gizmo coordinate space
    pub fn gizmo_space(&self) -> GizmoSpace {
        self.gizmo_space
    }

    /// Sets the gizmo coordinate space.
    pub fn set_gizmo_space(&mut self, space: GizmoSpace) {
        self.gizmo_space = space;
        self.refresh_transform_gizmo(false);
    }

    /// Switches between world and local space.
    pub fn cycle_gizmo_space(&mut self) {
        self.set_gizmo_space(self.gizmo_space.cycled());
    }

    /// Shows or hides the gizmo.
    pub fn set_transform_gizmo_visible(&mut self, visible: bool) {
        self.want_gizmo_visible = visible;
        self.refresh_transform_gizmo(false);
    }

    /// Sets the gizmo size multiplier.
    pub fn set_transform_gizmo_scale(&mut self, scale: f32) {
        self.gizmo_scale = scale;
        self.refresh_transform_gizmo(false);
    }

    /// Outside VR the gizmo uses the desktop scale.
    pub fn set_in_vr(&mut self, in_vr: bool) {
        self.in_vr = in_vr;
        self.refresh_transform_gizmo(false);
    }

    // ========== Tick ==========

    /// Advances the engine by one frame.
    pub fn tick(&mut self, dt: f32, scene: &dyn SceneQuery) {
        self.time += f64::from(dt);

        if let Some(committed) = self.world_scale.commit() {
            debug!(
                world_to_meters = committed,
                version = self.world_scale.version(),
                "world scale committed"
            );
        }
        if let Some((room, frame)) = self.room_transform_to_set {
            if frame <= self.tick_number {
                self.room_transform = room;
                self.room_transform_to_set = None;
            }
        }

        self.poll_input_if_needed(self.tick_number);
        self.hover_tick(scene);
        let hovered: Vec<GizmoHandleId> = self.interactors.iter().filter_map(|s| s.data.hovered_handle).collect();
        let duration = self.config.gizmo.handle_hover_animation_duration;
        self.gizmo.update_hover(&hovered, dt, duration);

        self.interaction_tick(dt, scene);
        self.tick_number += 1;
    }

    /// Polls every interactor that was not yet polled for `frame`.
    pub fn poll_input_if_needed(&mut self, frame: u64) {
        let world_to_meters = self.world_to_meters();
        let room_transform = self.room_transform;
        for slot in &mut self.interactors {
            if slot.last_polled_frame == Some(frame) {
                continue;
            }
            slot.last_polled_frame = Some(frame);

            let data = &mut slot.data;
            data.last_transform = data.transform;
            data.last_room_space_transform = data.room_space_transform;
            match slot.source.poll_room_space_pose() {
                Some(pose) => {
                    let mut room_space = pose;
                    room_space.translation *= world_to_meters;
                    data.room_space_transform = room_space;
                    data.transform = room_space * room_transform;
                    data.has_pose = true;
                }
                None => {
                    if data.has_pose {
                        debug!(id = %slot.id, "tracking lost");
                    }
                    data.has_pose = false;
                }
            }
        }
    }

    fn hover_tick(&mut self, scene: &dyn SceneQuery) {
        for index in 0..self.interactors.len() {
            self.interactors[index].data.reset_hover();
            let Some((start, end)) = self.laser_pointer(index) else {
                continue;
            };

            let handle_hit = if self.gizmo.visible {
                pick_handle(self.gizmo.visible_handles(), &self.gizmo.gizmo_to_world, start, end)
            } else {
                None
            };

            let data = &mut self.interactors[index].data;
            if let Some(hit) = handle_hit {
                data.hovered_handle = Some(hit.id);
                data.hover_location = Some(hit.location);
            } else if let Some(hit) = scene.raycast(start, end, &[]) {
                data.hovered_actor = Some(hit.actor);
                data.hover_location = Some(hit.impact_point);
            }
        }
    }

    pub(crate) fn broadcast(&mut self, event: InteractionEvent) {
        self.events.broadcast(event);
    }
}
