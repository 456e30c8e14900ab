//! Room transform and world scale.
//!
//! The room transform maps tracking space into the world. World drags never
//! write it directly; they schedule the result for the next tick. A world
//! scale change is staged the same way and committed at the start of the
//! next tick, so both take effect together.

use glam::{EulerRot, Quat, Vec3};
use tracing::{debug, warn};
use vwi_core::Transform;
use vwi_core::constants::{DEFAULT_WORLD_TO_METERS, SMALL_NUMBER};

use super::WorldInteraction;
use super::update::DragUpdate;
use crate::interactor::{GizmoDragState, LockedWorldDragMode};

/// World-to-meters scale with a staged pending value.
///
/// Reads return the committed value. Requests are staged until
/// [`WorldScale::commit`]; the last request before a commit wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldScale {
    committed: f32,
    pending: Option<f32>,
    version: u64,
}

impl Default for WorldScale {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_TO_METERS)
    }
}

impl WorldScale {
    /// A committed scale with nothing pending.
    pub fn new(world_to_meters: f32) -> Self {
        Self {
            committed: world_to_meters,
            pending: None,
            version: 0,
        }
    }

    /// Value in effect this tick
    pub fn committed(&self) -> f32 {
        self.committed
    }

    /// Value waiting for the next commit
    pub fn pending(&self) -> Option<f32> {
        self.pending
    }

    /// Number of commits so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stages a new value.
    pub fn request(&mut self, world_to_meters: f32) {
        self.pending = Some(world_to_meters);
    }

    /// Commits the staged value. Returns it when there was one.
    pub fn commit(&mut self) -> Option<f32> {
        let pending = self.pending.take()?;
        self.committed = pending;
        self.version += 1;
        Some(pending)
    }
}

/// Moves `room` so the world point under the room-space `pivot` stays put
/// when the world-to-meters scale changes from `old_world_to_meters` to
/// `new_world_to_meters`.
pub(crate) fn compensate_room_transform(
    room: &mut Transform,
    old_world_to_meters: f32,
    new_world_to_meters: f32,
    pivot: Vec3,
) {
    let world_pivot = room.transform_position(pivot);
    let new_pivot = pivot / old_world_to_meters * new_world_to_meters;
    let drift = room.transform_position(new_pivot) - world_pivot;
    room.translation -= drift;
}

impl WorldInteraction {
    /// World units per meter in effect this tick.
    pub fn world_to_meters(&self) -> f32 {
        self.world_scale.committed()
    }

    /// World-to-meters relative to the default of 100.
    pub fn world_scale_factor(&self) -> f32 {
        self.world_to_meters() / DEFAULT_WORLD_TO_METERS
    }

    /// Staged world scale
    pub fn world_scale(&self) -> &WorldScale {
        &self.world_scale
    }

    /// Bumped every time a staged scale is committed.
    pub fn world_scale_version(&self) -> u64 {
        self.world_scale.version()
    }

    /// Stages a new world-to-meters scale for the next tick.
    ///
    /// With `compensate_room` the room moves so the head stays where it is
    /// in the world after the scale change.
    pub fn set_world_to_meters_scale(&mut self, world_to_meters: f32, compensate_room: bool) {
        if !(world_to_meters > 0.0) {
            warn!(world_to_meters, "ignoring non-positive world scale");
            return;
        }

        if compensate_room {
            let mut room = self.room_transform;
            let pivot = self.room_space_head_transform.location();
            compensate_room_transform(&mut room, self.world_to_meters(), world_to_meters, pivot);
            self.set_room_transform_for_next_frame(room);
        }

        self.world_scale.request(world_to_meters);
        self.broadcast(crate::events::InteractionEvent::WorldScaleChanged { world_to_meters });
    }

    /// Room (tracking space) to world transform
    pub fn room_transform(&self) -> Transform {
        self.room_transform
    }

    /// Sets the room transform immediately.
    pub fn set_room_transform(&mut self, room: Transform) {
        self.room_transform = room;
    }

    /// Schedules the room transform for the next tick.
    pub fn set_room_transform_for_next_frame(&mut self, room: Transform) {
        self.room_transform_to_set = Some((room, self.tick_number + 1));
    }

    /// Room transform waiting for its tick, with that tick number
    pub fn scheduled_room_transform(&self) -> Option<(Transform, u64)> {
        self.room_transform_to_set
    }

    /// Head pose in room space, in world units. Used as the pivot when
    /// compensating for world scale changes.
    pub fn set_room_space_head_transform(&mut self, head: Transform) {
        self.room_space_head_transform = head;
    }

    /// Head pose in room space
    pub fn room_space_head_transform(&self) -> Transform {
        self.room_space_head_transform
    }

    /// Whether world drags move the room.
    pub fn allow_world_movement(&self) -> bool {
        self.allow_world_movement
    }

    /// Enables or disables world drags.
    pub fn set_allow_world_movement(&mut self, allow: bool) {
        self.allow_world_movement = allow;
    }

    /// Skips the room update of world drags for the current tick.
    pub fn skip_interactive_world_movement_this_frame(&mut self) {
        self.skip_interactive_world_movement_this_frame = true;
    }

    /// Two-handed world drags lock into scaling or rotating once either
    /// accumulates past its threshold, unless simultaneous scale and
    /// rotate is allowed.
    pub(super) fn drag_world(
        &mut self,
        update: &DragUpdate,
        gizmo: &mut GizmoDragState,
        pivot: Vec3,
        scale: f32,
        rotation: Quat,
        translation: Vec3,
    ) {
        let config = self.config.world.clone();
        let mut room = self.room_transform;

        if update.with_two_hands {
            if !config.allow_simultaneous_scale_and_rotate
                && gizmo.locked_world_drag_mode == LockedWorldDragMode::Unlocked
            {
                // Rotation is checked last and wins when both pass together.
                if gizmo.scale_since_drag_started.abs() >= config.world_scaling_drag_threshold {
                    gizmo.locked_world_drag_mode = LockedWorldDragMode::OnlyScaling;
                    debug!("world drag locked to scaling");
                }
                if gizmo.rotation_radians_since_drag_started.abs()
                    >= config.world_rotation_drag_threshold_degrees.to_radians()
                {
                    gizmo.locked_world_drag_mode = LockedWorldDragMode::OnlyRotating;
                    debug!("world drag locked to rotating");
                }
            }
        } else {
            gizmo.locked_world_drag_mode = LockedWorldDragMode::Unlocked;
            gizmo.scale_since_drag_started = 0.0;
            gizmo.rotation_radians_since_drag_started = 0.0;
        }

        let unlocked = gizmo.locked_world_drag_mode == LockedWorldDragMode::Unlocked;
        let simultaneous = config.allow_simultaneous_scale_and_rotate;
        let allow_translation = unlocked;
        let allow_scaling = update.with_two_hands
            && ((simultaneous && unlocked) || gizmo.locked_world_drag_mode == LockedWorldDragMode::OnlyScaling);
        let allow_rotation = update.with_two_hands
            && ((simultaneous && unlocked) || gizmo.locked_world_drag_mode == LockedWorldDragMode::OnlyRotating);

        if allow_scaling && scale.abs() > SMALL_NUMBER {
            let old_world_to_meters = self.world_to_meters();
            let new_world_to_meters = old_world_to_meters / scale.abs();
            let changed = (new_world_to_meters - old_world_to_meters).abs() > SMALL_NUMBER;
            let in_range = (config.scale_min..=config.scale_max).contains(&new_world_to_meters);
            if changed && in_range {
                self.set_world_to_meters_scale(new_world_to_meters, false);
                compensate_room_transform(&mut room, old_world_to_meters, new_world_to_meters, pivot);
            } else if changed {
                debug!(new_world_to_meters, "world scale outside limits");
            }
        }

        let rotation = if allow_rotation {
            if config.allow_world_rotation_pitch_and_roll {
                rotation
            } else {
                let (yaw, _, _) = rotation.to_euler(EulerRot::ZYX);
                Quat::from_rotation_z(yaw)
            }
        } else {
            Quat::IDENTITY
        };
        let translation = if allow_translation { translation } else { Vec3::ZERO };

        // Move the room opposite to the hands so the world follows them.
        let pivot_to_world = Transform::from_translation(pivot) * room;
        room = Transform::from_translation(translation).inverse()
            * room
            * pivot_to_world.inverse()
            * Transform::from_rotation(rotation).inverse()
            * pivot_to_world;
        self.set_room_transform_for_next_frame(room);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::events::InteractionEvent;
    use approx::assert_relative_eq;
    use vwi_core::InteractionConfig;

    #[test]
    fn test_world_scale_commits_next_tick() {
        let mut scale = WorldScale::default();
        scale.request(80.0);
        scale.request(50.0);
        assert_eq!(scale.committed(), 100.0);
        assert_eq!(scale.commit(), Some(50.0));
        assert_eq!(scale.committed(), 50.0);
        assert_eq!(scale.version(), 1);
        assert_eq!(scale.commit(), None);
    }

    #[test]
    fn test_compensation_keeps_pivot_fixed() {
        let mut room = Transform::from_translation(Vec3::new(10.0, -5.0, 0.0));
        let pivot = Vec3::new(30.0, 20.0, 160.0);
        let before = room.transform_position(pivot);
        compensate_room_transform(&mut room, 100.0, 50.0, pivot);
        let after = room.transform_position(pivot / 100.0 * 50.0);
        assert!(before.abs_diff_eq(after, 1e-3));
    }

    #[test]
    fn test_one_hand_world_drag_moves_room_opposite() {
        let mut rig = Rig::new(InteractionConfig::default());
        let (hand, pose) = rig.add_hand(pointing_down_at(0.0, 0.0));
        rig.tick();
        rig.engine.start_world_drag(hand).unwrap();

        set_pose(&pose, pointing_down_at(10.0, 0.0));
        rig.tick();
        rig.tick();
        let room = rig.engine.room_transform();
        assert_relative_eq!(room.location().x, -10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_two_hand_spread_halves_world_to_meters() {
        let mut rig = Rig::new(InteractionConfig::default());
        let (left, left_pose) = rig.add_hand(hand_at(10.0));
        let (right, right_pose) = rig.add_hand(hand_at(-10.0));
        rig.engine.pair_interactors(left, right).unwrap();
        let events = rig.record_events();
        rig.tick();

        rig.engine.start_world_drag(left).unwrap();
        rig.engine.start_world_drag(right).unwrap();
        assert_eq!(
            rig.engine.interactor_data(right).unwrap().dragging_mode,
            crate::interactor::DraggingMode::AssistingDrag
        );
        rig.tick();

        set_pose(&left_pose, hand_at(20.0));
        set_pose(&right_pose, hand_at(-20.0));
        rig.tick();
        assert_relative_eq!(rig.engine.world_to_meters(), 100.0);
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, InteractionEvent::WorldScaleChanged { .. })));

        rig.tick();
        assert_relative_eq!(rig.engine.world_to_meters(), 50.0, epsilon = 1e-3);
        assert_eq!(rig.engine.world_scale().version(), 1);

        // Holding still afterwards does not keep scaling.
        rig.tick();
        rig.tick();
        assert_relative_eq!(rig.engine.world_to_meters(), 50.0, epsilon = 1e-3);
    }

    fn hand_at_xy(x: f32, y: f32) -> Transform {
        Transform::from_translation(Vec3::new(x / 100.0, y / 100.0, 1.0))
    }

    #[test]
    fn test_rotation_lock_wins_when_both_thresholds_pass() {
        let mut config = InteractionConfig::default();
        config.world.allow_simultaneous_scale_and_rotate = false;
        let mut rig = Rig::new(config);
        let (left, left_pose) = rig.add_hand(hand_at_xy(10.0, 0.0));
        let (right, right_pose) = rig.add_hand(hand_at_xy(-10.0, 0.0));
        rig.engine.pair_interactors(left, right).unwrap();
        rig.tick();
        rig.engine.start_world_drag(left).unwrap();
        rig.engine.start_world_drag(right).unwrap();
        rig.tick();

        // Spreads by about 25 and turns by about 27 degrees in one frame.
        set_pose(&left_pose, hand_at_xy(20.0, 10.0));
        set_pose(&right_pose, hand_at_xy(-20.0, -10.0));
        rig.tick();
        assert_eq!(
            rig.engine.interactor_data(left).unwrap().gizmo.locked_world_drag_mode,
            LockedWorldDragMode::OnlyRotating
        );
    }

    #[test]
    fn test_world_scale_respects_limits() {
        let mut config = InteractionConfig::default();
        config.world.scale_min = 80.0;
        let mut rig = Rig::new(config);
        let (left, left_pose) = rig.add_hand(hand_at(10.0));
        let (right, right_pose) = rig.add_hand(hand_at(-10.0));
        rig.engine.pair_interactors(left, right).unwrap();
        rig.tick();
        rig.engine.start_world_drag(left).unwrap();
        rig.engine.start_world_drag(right).unwrap();
        rig.tick();

        set_pose(&left_pose, hand_at(20.0));
        set_pose(&right_pose, hand_at(-20.0));
        rig.tick();
        rig.tick();
        assert_relative_eq!(rig.engine.world_to_meters(), 100.0);
    }

    #[test]
    fn test_non_positive_world_scale_is_ignored() {
        let mut rig = Rig::new(InteractionConfig::default());
        rig.engine.set_world_to_meters_scale(0.0, true);
        rig.tick();
        assert_eq!(rig.engine.world_to_meters(), 100.0);
        assert!(rig.engine.scheduled_room_transform().is_none());
    }
}
