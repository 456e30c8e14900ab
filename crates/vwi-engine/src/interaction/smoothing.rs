//! Smooth snapping, snapshot interpolation, damping and the end of a move.

use glam::Vec3;
use tracing::debug;
use vwi_core::Transform;
use vwi_core::constants::{
    DAMPEN_MULTIPLIER, DAMPEN_MULTIPLIER_AT_HIGH_SPEEDS, DAMPEN_MULTIPLIER_AT_LOW_SPEEDS,
    INERTIAL_MOVEMENT_ZERO_EPSILON, KINDA_SMALL_NUMBER, MAX_SMOOTHING_DELTA_TIME, SMALL_NUMBER,
    SPEED_FOR_MINIMAL_DAMPING,
};

use super::WorldInteraction;
use crate::events::InteractionEvent;
use crate::interactor::DraggingMode;

/// True when every component is within `tolerance` of zero.
pub(crate) fn is_nearly_zero(v: Vec3, tolerance: f32) -> bool {
    v.abs().max_element() <= tolerance
}

/// Slows an inertial velocity by one frame's worth, zeroing it once it is
/// negligible. Velocity-sensitive damping lets fast motion coast longer.
pub fn apply_velocity_damping(velocity: &mut Vec3, velocity_sensitive: bool, world_scale_factor: f32) {
    if is_nearly_zero(*velocity, INERTIAL_MOVEMENT_ZERO_EPSILON) {
        *velocity = Vec3::ZERO;
        return;
    }

    if velocity_sensitive {
        let speed_for_minimal_damping = SPEED_FOR_MINIMAL_DAMPING * world_scale_factor;
        let speed_scalar = if speed_for_minimal_damping > SMALL_NUMBER {
            velocity.length().clamp(0.0, speed_for_minimal_damping) / speed_for_minimal_damping
        } else {
            1.0
        };
        let multiplier = speed_scalar * DAMPEN_MULTIPLIER_AT_HIGH_SPEEDS
            + (1.0 - speed_scalar) * DAMPEN_MULTIPLIER_AT_LOW_SPEEDS;
        *velocity *= multiplier;
    } else {
        *velocity *= DAMPEN_MULTIPLIER;
    }

    if is_nearly_zero(*velocity, INERTIAL_MOVEMENT_ZERO_EPSILON) {
        *velocity = Vec3::ZERO;
    }
}

impl WorldInteraction {
    /// Damps `velocity` at the current world scale.
    pub fn apply_velocity_damping(&self, velocity: &mut Vec3, velocity_sensitive: bool) {
        apply_velocity_damping(velocity, velocity_sensitive, self.world_scale_factor());
    }

    /// Smooth snapping runs when some snapping is on, smoothing is enabled
    /// and no simulated object is selected during simulation.
    pub fn is_smooth_snapping_enabled(&self) -> bool {
        let snap = &self.config.snap;
        let smoothing = &self.config.smoothing;
        let any_snapping = snap.grid_enabled || snap.rotation_enabled || snap.scale_enabled || snap.actor_align_enabled;
        (!self.simulating || !self.transformables.any_simulated())
            && any_snapping
            && smoothing.smooth_snap_enabled
            && smoothing.smooth_snap_speed.abs() > KINDA_SMALL_NUMBER
    }

    /// An interactor that let go while smoothing still trails its target.
    fn settling_interactor(&self) -> Option<usize> {
        self.interactors.iter().position(|slot| {
            slot.data.dragging_mode == DraggingMode::Nothing
                && slot.data.last_dragging_mode.is_transforming_transformables()
                && !slot.data.gizmo.last.equals(&slot.data.gizmo.target, KINDA_SMALL_NUMBER)
        })
    }

    /// Moves the selection toward the drag target with smoothing and
    /// snapshot interpolation, and ends the move once everything is at rest.
    pub(super) fn update_transformables(
        &mut self,
        dt: f32,
        dragging_with: Option<usize>,
        inertia_from: Option<usize>,
        was_interpolation_needed: bool,
    ) {
        let moving = self.are_transformables_moving;
        let smooth = self.is_smooth_snapping_enabled();

        if !(moving && (smooth || self.is_interpolating_from_snapshot)) {
            if moving && dragging_with.is_none() && inertia_from.is_none() {
                self.finished_moving_transformables();
            }
            return;
        }

        let elastic = smooth
            && self.config.smoothing.elastic_snap_enabled
            && dragging_with.is_some()
            && !self.are_aligning_to_actors();

        let mut progress = 1.0;
        let mut finished_interpolating = false;
        if self.is_interpolating_from_snapshot {
            let duration = f64::from(self.interpolation_duration.max(SMALL_NUMBER));
            progress = (((self.time - self.interpolation_start_time) / duration) as f32).clamp(0.0, 1.0);
            if progress >= 1.0 - KINDA_SMALL_NUMBER {
                self.is_interpolating_from_snapshot = false;
                self.freeze_placement_while_interpolating = false;
                finished_interpolating = true;
            }
        }

        let mut still_moving = false;
        let transforming = dragging_with
            .or(inertia_from)
            .or_else(|| if smooth { self.settling_interactor() } else { None });

        if let Some(index) = transforming {
            let mut gizmo = self.interactors[index].data.gizmo;
            let target = if elastic {
                Transform::blend(&gizmo.target, &gizmo.unsnapped_target, self.config.smoothing.elastic_snap_strength)
            } else {
                gizmo.target
            };

            let mut interpolated = target;
            if !target.equals(&gizmo.last, 0.0) {
                if smooth && !target.equals(&gizmo.last, KINDA_SMALL_NUMBER) {
                    still_moving = true;
                    let alpha = (self.config.smoothing.smooth_snap_speed * dt.min(MAX_SMOOTHING_DELTA_TIME)).min(1.0);
                    interpolated = Transform::blend(&gizmo.last, &target, alpha);
                }
                gizmo.last = interpolated;
            }

            if self.is_interpolating_from_snapshot {
                interpolated.blend_with(&gizmo.interpolation_snapshot, 1.0 - progress);
            }

            self.interactors[index].data.gizmo = gizmo;
            self.transformables.apply_gizmo_transform(&gizmo.start, &interpolated, false);
        }

        if transforming.is_none() && (!was_interpolation_needed || finished_interpolating) && !still_moving {
            self.finished_moving_transformables();
        }
    }

    /// Ends a move: stops interpolation, notifies listeners and closes the
    /// drag's undo transaction.
    pub(crate) fn finished_moving_transformables(&mut self) {
        debug!("finished moving transformables");
        self.are_transformables_moving = false;
        self.is_interpolating_from_snapshot = false;
        self.freeze_placement_while_interpolating = false;
        for slot in &mut self.interactors {
            slot.data.gizmo.is_driving_velocity_of_simulated_transformables = false;
        }
        self.broadcast(InteractionEvent::FinishedMovingTransformables);
        self.end_move_transaction();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::interaction::StartDragParams;
    use approx::assert_relative_eq;
    use vwi_core::InteractionConfig;

    #[test]
    fn test_damping_zeroes_small_velocity() {
        let mut velocity = Vec3::new(0.005, 0.0, -0.002);
        apply_velocity_damping(&mut velocity, true, 1.0);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn test_damping_zeroes_velocity_that_drops_below_epsilon() {
        let mut velocity = Vec3::new(0.0102, 0.0, 0.0);
        apply_velocity_damping(&mut velocity, false, 1.0);
        assert_eq!(velocity, Vec3::ZERO);

        let mut velocity = Vec3::new(0.02, 0.0, 0.0);
        apply_velocity_damping(&mut velocity, false, 1.0);
        assert_relative_eq!(velocity.x, 0.019, epsilon = 1e-6);
    }

    #[test]
    fn test_velocity_sensitive_damping_keeps_fast_motion() {
        let mut fast = Vec3::new(10.0, 0.0, 0.0);
        apply_velocity_damping(&mut fast, true, 1.0);
        assert_relative_eq!(fast.x, 9.9, epsilon = 1e-5);

        let mut slow = Vec3::new(1.25, 0.0, 0.0);
        apply_velocity_damping(&mut slow, true, 1.0);
        assert_relative_eq!(slow.x, 1.25 * 0.965, epsilon = 1e-5);

        let mut flat = Vec3::new(10.0, 0.0, 0.0);
        apply_velocity_damping(&mut flat, false, 1.0);
        assert_relative_eq!(flat.x, 9.5, epsilon = 1e-5);
    }

    #[test]
    fn test_smooth_snapping_needs_snapping() {
        let mut config = InteractionConfig::default();
        let rig = Rig::new(config.clone());
        assert!(!rig.engine.is_smooth_snapping_enabled());

        config.snap.rotation_enabled = true;
        let rig = Rig::new(config.clone());
        assert!(rig.engine.is_smooth_snapping_enabled());

        config.smoothing.smooth_snap_speed = 0.0;
        let rig = Rig::new(config);
        assert!(!rig.engine.is_smooth_snapping_enabled());
    }

    #[test]
    fn test_smoothing_trails_and_settles_on_snapped_target() {
        let mut config = InteractionConfig::default();
        config.snap.grid_enabled = true;
        config.snap.grid_size = 10.0;
        config.smoothing.smooth_snap_speed = 15.0;
        config.smoothing.elastic_snap_enabled = false;
        let mut rig = Rig::new(config);
        let (hand, pose) = rig.add_hand(pointing_down_at(100.0, 0.0));
        rig.select_boxes(&[Vec3::ZERO]);
        let events = rig.record_events();
        rig.tick();

        rig.engine
            .start_dragging(StartDragParams::new(hand, Vec3::new(100.0, 0.0, 0.0)))
            .unwrap();
        set_pose(&pose, pointing_down_at(112.0, 0.0));
        rig.tick();
        // Half way from 0 toward the snapped 10.
        assert_relative_eq!(rig.location(0).x, 5.0, epsilon = 1e-3);

        // Hold still so the release leaves no inertia.
        rig.tick();
        assert_relative_eq!(rig.location(0).x, 7.5, epsilon = 1e-3);
        rig.engine.stop_dragging(hand).unwrap();
        assert!(rig.engine.are_transformables_moving());
        for _ in 0..60 {
            rig.tick();
        }
        assert_relative_eq!(rig.location(0).x, 10.0, epsilon = 1e-3);
        assert!(!rig.engine.are_transformables_moving());
        let finished = events
            .borrow()
            .iter()
            .filter(|e| **e == InteractionEvent::FinishedMovingTransformables)
            .count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn test_placing_new_objects_interpolates_from_spawn() {
        let mut rig = Rig::new(InteractionConfig::default());
        let (hand, pose) = rig.add_hand(pointing_down_at(0.0, 0.0));
        rig.select_boxes(&[Vec3::ZERO]);
        rig.tick();

        rig.engine
            .start_dragging(StartDragParams::new(hand, Vec3::ZERO).placing_new_objects())
            .unwrap();
        set_pose(&pose, pointing_down_at(60.0, 0.0));
        rig.tick();
        // Default placement interpolation lasts 0.6 s, this is one 1/30 s frame in.
        let x = rig.location(0).x;
        assert!(x > 0.0 && x < 10.0);

        for _ in 0..30 {
            rig.tick();
        }
        assert_relative_eq!(rig.location(0).x, 60.0, epsilon = 1e-3);
    }
}
