//! Interactors: motion controllers and mouse cursors that hover, grab and drag.
//!
//! The engine owns one [`InteractorData`] record per interactor and talks to
//! the device through an [`InteractorSource`].

use glam::{Quat, Vec3};
use uuid::Uuid;
use vwi_core::{BoundingBox, Transform};

use crate::gizmo::drag_operation::DragOperation;
use crate::gizmo::{GizmoHandleId, HandlePlacement};

/// Laser length in room-space units, before the world scale factor is applied.
pub const DEFAULT_LASER_POINTER_MAX_LENGTH: f32 = 10000.0;

/// Stable identifier handed out by [`crate::WorldInteraction::add_interactor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractorId(pub u32);

impl std::fmt::Display for InteractorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "interactor#{}", self.0)
    }
}

/// What kind of device drives an interactor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractorKind {
    /// A tracked hand controller
    #[default]
    MotionController,
    /// A desktop mouse cursor projected into the viewport
    MouseCursor,
}

/// World-space sphere, used for grabbing objects by touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

/// Device side of an interactor.
///
/// Only [`InteractorSource::poll_room_space_pose`] is required. The defaults
/// describe a plain hand with a forward-pointing laser and no grabber sphere.
pub trait InteractorSource {
    /// Device kind.
    fn kind(&self) -> InteractorKind {
        InteractorKind::MotionController
    }

    /// Current pose in tracking space, in meters. `None` while tracking is lost.
    fn poll_room_space_pose(&mut self) -> Option<Transform>;

    /// Laser length before world scaling.
    fn laser_pointer_max_length(&self) -> f32 {
        DEFAULT_LASER_POINTER_MAX_LENGTH
    }

    /// Laser segment for the given world pose, or `None` if the laser is unavailable.
    fn laser_pointer(&self, world_transform: &Transform, max_length: f32) -> Option<(Vec3, Vec3)> {
        let start = world_transform.location();
        Some((start, start + world_transform.forward() * max_length))
    }

    /// Grabber sphere for the given world pose, if the device has one.
    fn grabber_sphere(&self, _world_transform: &Transform) -> Option<Sphere> {
        None
    }

    /// Slide input (trackpad or stick) for this frame, used to lengthen or
    /// shorten the drag ray.
    fn slide_delta(&mut self) -> Option<f32> {
        None
    }

    /// Whether slide input is an absolute position (trackpad) rather than a rate.
    fn is_slide_absolute(&self) -> bool {
        false
    }

    /// Plays a haptic pulse of the given strength.
    fn play_haptic_effect(&mut self, _strength: f32) {}

    /// Strength of the pulse played when something is picked up.
    fn drag_haptic_feedback_strength(&self) -> f32 {
        1.0
    }

    /// Called when this interactor starts dragging transformables.
    fn on_start_dragging(&mut self, _hit_location: Vec3, _is_placing_new_objects: bool) {}
}

/// Drag state of a single interactor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraggingMode {
    /// Not dragging
    #[default]
    Nothing,
    /// Dragging transformables through a gizmo handle
    TransformablesWithGizmo,
    /// Dragging transformables without constraints
    TransformablesFreely,
    /// Placing transformables where the laser hits the scene
    TransformablesAtLaserImpact,
    /// Moving the room (world) around the user
    World,
    /// Second hand helping the other interactor's drag
    AssistingDrag,
    /// Dragging an interactable UI object
    Interactable,
}

impl DraggingMode {
    /// True for the three modes that move transformables.
    pub fn is_transforming_transformables(self) -> bool {
        matches!(
            self,
            Self::TransformablesWithGizmo | Self::TransformablesFreely | Self::TransformablesAtLaserImpact
        )
    }
}

/// Lock state of a two-handed world drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockedWorldDragMode {
    /// Translate, rotate and scale freely
    #[default]
    Unlocked,
    /// Locked into scaling only
    OnlyScaling,
    /// Locked into rotating only
    OnlyRotating,
}

/// Gizmo transforms and accumulators for one drag.
///
/// This is the part of an interactor's state an assisting hand inherits when
/// it takes over a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoDragState {
    /// Gizmo transform when the drag started
    pub start: Transform,
    /// Transform last applied (or being smoothed from)
    pub last: Transform,
    /// Snapped target
    pub target: Transform,
    /// Target before snapping
    pub unsnapped_target: Transform,
    /// Transform captured when a snapshot interpolation began
    pub interpolation_snapshot: Transform,
    /// Gizmo-local bounds at drag start
    pub start_local_bounds: BoundingBox,
    /// Gizmo-space offset between the laser and the handle on the first update
    pub first_drag_update_offset_along_axis: Vec3,
    /// Gizmo-space correction carried into inertia so motion stays continuous
    pub drag_delta_from_start_offset: Vec3,
    /// World drag lock
    pub locked_world_drag_mode: LockedWorldDragMode,
    /// Accumulated two-hand scale change, world-scale independent
    pub scale_since_drag_started: f32,
    /// Accumulated two-hand rotation in radians
    pub rotation_radians_since_drag_started: f32,
    /// True until the first update of this drag ran
    pub is_first_drag_update: bool,
    /// Whether the drag imparts velocity on simulated transformables
    pub is_driving_velocity_of_simulated_transformables: bool,
}

impl Default for GizmoDragState {
    fn default() -> Self {
        Self {
            start: Transform::IDENTITY,
            last: Transform::IDENTITY,
            target: Transform::IDENTITY,
            unsnapped_target: Transform::IDENTITY,
            interpolation_snapshot: Transform::IDENTITY,
            start_local_bounds: BoundingBox::empty(),
            first_drag_update_offset_along_axis: Vec3::ZERO,
            drag_delta_from_start_offset: Vec3::ZERO,
            locked_world_drag_mode: LockedWorldDragMode::Unlocked,
            scale_since_drag_started: 0.0,
            rotation_radians_since_drag_started: 0.0,
            is_first_drag_update: false,
            is_driving_velocity_of_simulated_transformables: false,
        }
    }
}

impl GizmoDragState {
    /// Fresh state for a drag starting with the gizmo at `start`.
    pub fn starting_at(start: Transform, start_local_bounds: BoundingBox) -> Self {
        Self {
            start,
            last: start,
            target: start,
            unsnapped_target: start,
            interpolation_snapshot: start,
            start_local_bounds,
            is_first_drag_update: true,
            ..Self::default()
        }
    }
}

/// Per-interactor state, updated every tick.
#[derive(Debug, Clone, Default)]
pub struct InteractorData {
    /// World pose this frame
    pub transform: Transform,
    /// World pose last frame
    pub last_transform: Transform,
    /// Room-space pose this frame, in world units
    pub room_space_transform: Transform,
    /// Room-space pose last frame
    pub last_room_space_transform: Transform,
    /// False while tracking is lost
    pub has_pose: bool,

    /// Current drag mode
    pub dragging_mode: DraggingMode,
    /// Mode of the last drag, used for inertia after release
    pub last_dragging_mode: DraggingMode,
    /// Whether the current drag uses the grabber sphere instead of the laser
    pub is_dragging_with_grabber_sphere: bool,
    /// Distance along the laser to the dragged point
    pub drag_ray_length: f32,
    /// Per-frame change of the drag ray length from sliding
    pub drag_ray_length_velocity: f32,
    /// Where the laser hit when the drag started
    pub impact_location_at_drag_start: Vec3,
    /// Interactor rotation when the drag started
    pub interactor_rotation_at_drag_start: Quat,
    /// Grabber sphere center when the drag started
    pub grabber_sphere_location_at_drag_start: Vec3,
    /// Per-frame drag velocity, reused as inertia after release
    pub drag_translation_velocity: Vec3,
    /// Dragged-to point of the last update
    pub last_drag_to_location: Vec3,
    /// Set after this interactor handed its drag over to the other hand
    pub was_assisting_drag: bool,

    /// Hover point on the laser or in the scene
    pub hover_location: Option<Vec3>,
    /// Actor under the laser
    pub hovered_actor: Option<Uuid>,
    /// Gizmo handle under the laser
    pub hovered_handle: Option<GizmoHandleId>,

    /// Handle grabbed for the current drag
    pub dragged_handle: Option<GizmoHandleId>,
    /// Operation bound to the grabbed handle
    pub drag_operation: Option<DragOperation>,
    /// Operation of the last drag, used during inertia
    pub last_drag_operation: Option<DragOperation>,
    /// Which side of each axis the grabbed handle sits on
    pub optional_handle_placement: Option<HandlePlacement>,

    /// Gizmo transforms and accumulators of the current drag
    pub gizmo: GizmoDragState,
}

impl InteractorData {
    /// Clears the hover results before a new hover pass.
    pub(crate) fn reset_hover(&mut self) {
        self.hover_location = None;
        self.hovered_actor = None;
        self.hovered_handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl InteractorSource for Fixed {
        fn poll_room_space_pose(&mut self) -> Option<Transform> {
            Some(Transform::IDENTITY)
        }
    }

    #[test]
    fn test_default_laser_points_forward() {
        let pose = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let (start, end) = Fixed.laser_pointer(&pose, 100.0).unwrap();
        assert_eq!(start, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(end, Vec3::new(101.0, 2.0, 3.0));
        assert!(Fixed.grabber_sphere(&pose).is_none());
    }

    #[test]
    fn test_transforming_modes() {
        assert!(DraggingMode::TransformablesFreely.is_transforming_transformables());
        assert!(DraggingMode::TransformablesAtLaserImpact.is_transforming_transformables());
        assert!(!DraggingMode::World.is_transforming_transformables());
        assert!(!DraggingMode::AssistingDrag.is_transforming_transformables());
    }

    #[test]
    fn test_drag_state_starts_at_gizmo() {
        let start = Transform::from_translation(Vec3::X * 5.0);
        let state = GizmoDragState::starting_at(start, BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
        assert_eq!(state.last, start);
        assert_eq!(state.unsnapped_target, start);
        assert!(state.is_first_drag_update);
        assert_eq!(state.locked_world_drag_mode, LockedWorldDragMode::Unlocked);
    }
}
