//! Scripted interactors driven by pose keyframes.

use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vwi_core::Transform;
use vwi_engine::{InteractorKind, InteractorSource, Sphere};

/// Device kind of a scripted hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    #[default]
    MotionController,
    MouseCursor,
}

impl From<DeviceKind> for InteractorKind {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::MotionController => InteractorKind::MotionController,
            DeviceKind::MouseCursor => InteractorKind::MouseCursor,
        }
    }
}

/// Room-space pose at a frame. Pitch 90 points the laser straight down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: u64,
    /// Meters, in tracking space
    pub location: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub pitch_degrees: f32,
    #[serde(default = "default_tracked")]
    pub tracked: bool,
}

fn default_tracked() -> bool {
    true
}

impl Keyframe {
    fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw_degrees.to_radians()) * Quat::from_rotation_y(self.pitch_degrees.to_radians())
    }
}

/// Pose of a keyframe track at `frame`: interpolated between keys, held
/// before the first and after the last. Tracking follows the latest key.
pub fn sample_keyframes(keys: &[Keyframe], frame: u64) -> Option<Transform> {
    let first = keys.first()?;
    let next = keys.iter().position(|k| k.frame > frame);
    let (from, to) = match next {
        Some(0) => (first, first),
        Some(index) => (&keys[index - 1], &keys[index]),
        None => {
            let last = keys.last()?;
            (last, last)
        }
    };
    if !from.tracked {
        return None;
    }

    let span = to.frame.saturating_sub(from.frame);
    let t = if span == 0 {
        0.0
    } else {
        (frame.saturating_sub(from.frame)) as f32 / span as f32
    };
    Some(Transform::from_rotation_translation(
        from.rotation().slerp(to.rotation(), t),
        from.location.lerp(to.location, t),
    ))
}

/// State written by the runner each frame and read by the engine.
#[derive(Debug, Default)]
pub struct HandState {
    pub pose: Option<Transform>,
    pub slide: Option<f32>,
    pub haptic_pulses: Vec<f32>,
}

pub type SharedHand = Arc<Mutex<HandState>>;

/// Interactor source reading a [`SharedHand`].
pub struct ScriptedInteractor {
    kind: DeviceKind,
    hand: SharedHand,
    grabber_radius: Option<f32>,
    absolute_slide: bool,
}

impl ScriptedInteractor {
    pub fn new(kind: DeviceKind, hand: SharedHand, grabber_radius: Option<f32>, absolute_slide: bool) -> Self {
        Self {
            kind,
            hand,
            grabber_radius,
            absolute_slide,
        }
    }
}

impl InteractorSource for ScriptedInteractor {
    fn kind(&self) -> InteractorKind {
        self.kind.into()
    }

    fn poll_room_space_pose(&mut self) -> Option<Transform> {
        self.hand.lock().pose
    }

    fn grabber_sphere(&self, world_transform: &Transform) -> Option<Sphere> {
        self.grabber_radius.map(|radius| Sphere {
            center: world_transform.location(),
            radius,
        })
    }

    fn slide_delta(&mut self) -> Option<f32> {
        self.hand.lock().slide.take()
    }

    fn is_slide_absolute(&self) -> bool {
        self.absolute_slide
    }

    fn play_haptic_effect(&mut self, strength: f32) {
        self.hand.lock().haptic_pulses.push(strength);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn key(frame: u64, x: f32) -> Keyframe {
        Keyframe {
            frame,
            location: Vec3::new(x, 0.0, 1.0),
            yaw_degrees: 0.0,
            pitch_degrees: 90.0,
            tracked: true,
        }
    }

    #[test]
    fn test_keyframes_interpolate_and_hold() {
        let keys = [key(10, 0.0), key(20, 1.0)];
        assert_relative_eq!(sample_keyframes(&keys, 0).unwrap().location().x, 0.0);
        assert_relative_eq!(sample_keyframes(&keys, 15).unwrap().location().x, 0.5);
        assert_relative_eq!(sample_keyframes(&keys, 40).unwrap().location().x, 1.0);
        assert!(sample_keyframes(&[], 0).is_none());
    }

    #[test]
    fn test_pitch_points_laser_down() {
        let pose = sample_keyframes(&[key(0, 0.0)], 0).unwrap();
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn test_untracked_key_drops_pose() {
        let mut lost = key(5, 0.5);
        lost.tracked = false;
        let keys = [key(0, 0.0), lost, key(10, 1.0)];
        assert!(sample_keyframes(&keys, 3).is_some());
        assert!(sample_keyframes(&keys, 7).is_none());
        assert!(sample_keyframes(&keys, 10).is_some());
    }

    #[test]
    fn test_slide_is_consumed_once() {
        let hand = SharedHand::default();
        let mut source = ScriptedInteractor::new(DeviceKind::MotionController, hand.clone(), None, false);
        hand.lock().slide = Some(2.0);
        assert_eq!(source.slide_delta(), Some(2.0));
        assert_eq!(source.slide_delta(), None);
        source.play_haptic_effect(0.4);
        assert_eq!(hand.lock().haptic_pulses, vec![0.4]);
    }
}
