//! Scenario files
//!
//! A scenario is a RON document describing the scene, the scripted hands and
//! the actions to run at given frames. Everything except the name has a
//! default, so a scenario only lists what it uses.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vwi_core::{ConfigError, InteractionConfig};
use vwi_engine::InteractionError;

use crate::source::{DeviceKind, Keyframe};

/// Scenario loading and running errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),
    #[error("Unknown actor: {0}")]
    UnknownActor(String),
    #[error("Unknown hand: {0}")]
    UnknownHand(String),
}

fn default_frames() -> u64 {
    90
}

fn default_dt() -> f32 {
    1.0 / 30.0
}

fn default_half_extents() -> Vec3 {
    Vec3::splat(10.0)
}

fn default_scale() -> f32 {
    1.0
}

/// A box actor in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    pub location: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub editor_only: bool,
    #[serde(default)]
    pub simulated: bool,
}

/// A scripted hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandSpec {
    pub name: String,
    #[serde(default)]
    pub kind: DeviceKind,
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub grabber_radius: Option<f32>,
    #[serde(default)]
    pub absolute_slide: bool,
}

/// What a drag grabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grab {
    /// The selection itself, no handle
    #[default]
    Free,
    /// Whatever handle the hand hovered last frame
    HoveredHandle,
    /// A handle by id
    Handle(u16),
}

/// Actions a scenario can trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Select actors by name
    Select(Vec<String>),
    ClearSelection,
    /// Start a drag at the hand's hover location
    StartDrag {
        hand: String,
        #[serde(default)]
        grab: Grab,
        #[serde(default)]
        laser_impact: bool,
        #[serde(default)]
        placing: bool,
        #[serde(default)]
        grabber_sphere: bool,
    },
    /// Join the paired hand's drag
    AssistDrag(String),
    /// Grab the world
    WorldDrag(String),
    StopDrag(String),
    /// Slide input for the next tick
    Slide { hand: String, delta: f32 },
    CycleGizmoSpace,
    SetWorldScale { world_to_meters: f32, compensate: bool },
    SetSimulating(bool),
    SelectionAsCandidates(bool),
}

/// An action and the frame it runs on, before that frame's tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub frame: u64,
    pub action: Action,
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub config: InteractionConfig,
    #[serde(default)]
    pub floor_z: Option<f32>,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub hands: Vec<HandSpec>,
    /// Hands acting as each other's second hand
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from RON text and validate it
    pub fn from_ron_str(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario =
            ron::from_str(content).map_err(|e| ScenarioError::Deserialize(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ScenarioError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.dt > 0.0) {
            return Err(ScenarioError::Invalid(format!("dt must be positive, got {}", self.dt)));
        }
        if self.frames == 0 {
            return Err(ScenarioError::Invalid("frames must be at least 1".into()));
        }
        for hand in &self.hands {
            if hand.keyframes.windows(2).any(|w| w[0].frame > w[1].frame) {
                return Err(ScenarioError::Invalid(format!(
                    "keyframes of hand '{}' are out of order",
                    hand.name
                )));
            }
        }
        self.config.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let scenario = Scenario::from_ron_str(r#"(name: "empty")"#).unwrap();
        assert_eq!(scenario.frames, 90);
        assert!(scenario.actors.is_empty());
        assert_eq!(scenario.config, InteractionConfig::default());
    }

    #[test]
    fn test_parses_actions_and_config_overrides() {
        let scenario = Scenario::from_ron_str(
            r#"(
                name: "drag",
                config: (snap: (grid_enabled: true, grid_size: 5.0)),
                actors: [(name: "crate", location: (0.0, 0.0, 10.0))],
                hands: [(name: "right", keyframes: [(frame: 0, location: (0.3, 0.0, 0.5), pitch_degrees: 90.0)])],
                steps: [
                    (frame: 0, action: Select(["crate"])),
                    (frame: 1, action: StartDrag(hand: "right", grab: HoveredHandle)),
                    (frame: 9, action: StopDrag("right")),
                ],
            )"#,
        )
        .unwrap();
        assert!(scenario.config.snap.grid_enabled);
        assert_eq!(scenario.config.snap.grid_size, 5.0);
        assert_eq!(scenario.actors[0].half_extents, Vec3::splat(10.0));
        assert!(scenario.hands[0].keyframes[0].tracked);
        assert_eq!(
            scenario.steps[1].action,
            Action::StartDrag {
                hand: "right".into(),
                grab: Grab::HoveredHandle,
                laser_impact: false,
                placing: false,
                grabber_sphere: false,
            }
        );
    }

    #[test]
    fn test_rejects_invalid_scenarios() {
        assert!(matches!(
            Scenario::from_ron_str(r#"(name: "x", dt: 0.0)"#),
            Err(ScenarioError::Invalid(_))
        ));
        assert!(matches!(
            Scenario::from_ron_str(r#"(name: "x", config: (world: (scale_min: 100.0, scale_max: 10.0)))"#),
            Err(ScenarioError::Config(_))
        ));
        assert!(matches!(
            Scenario::from_ron_str("not ron"),
            Err(ScenarioError::Deserialize(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.ron");
        std::fs::write(&path, r#"(name: "from disk", frames: 3)"#).unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.name, "from disk");
        assert_eq!(scenario.frames, 3);

        assert!(matches!(
            Scenario::load(dir.path().join("missing.ron")),
            Err(ScenarioError::Io(_))
        ));
    }
}
