//! Interaction configuration
//!
//! Every tunable of the manipulation engine lives here. The engine receives
//! a copy at construction and whenever the caller swaps it; nothing is read
//! from globals. Files are RON and every field falls back to its default, so
//! a config file only needs the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Grid, rotation, scale and actor-alignment snapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapConfig {
    /// Whether location grid snapping is enabled
    pub grid_enabled: bool,
    /// Location grid spacing in world units
    pub grid_size: f32,
    /// Whether rotation snapping is enabled
    pub rotation_enabled: bool,
    /// Rotation snap increment in degrees
    pub rotation_grid_degrees: f32,
    /// Whether scale snapping is enabled
    pub scale_enabled: bool,
    /// Scale snap increment
    pub scale_grid_size: f32,
    /// Whether dragged objects align to nearby actors
    pub actor_align_enabled: bool,
    /// Alignment tolerance, in percent of the gizmo bounds size
    pub force_snap_distance: f32,
    /// Candidate search radius, as a multiple of the gizmo bounds size
    pub align_candidate_distance: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            grid_enabled: false,
            grid_size: 10.0,
            rotation_enabled: false,
            rotation_grid_degrees: 15.0,
            scale_enabled: false,
            scale_grid_size: 0.25,
            actor_align_enabled: false,
            force_snap_distance: 25.0,
            align_candidate_distance: 2.0,
        }
    }
}

/// Smooth snapping and snapshot interpolation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Whether snapped targets are approached smoothly
    pub smooth_snap_enabled: bool,
    /// Exponential approach speed per second
    pub smooth_snap_speed: f32,
    /// Whether the smoothed transform leans toward the unsnapped target
    pub elastic_snap_enabled: bool,
    /// How far toward the unsnapped target the elastic lean goes (0..1)
    pub elastic_snap_strength: f32,
    /// Interpolation length in seconds for newly placed objects
    pub placement_interpolation_duration: f32,
    /// Interpolation length in seconds after a laser impact jump
    pub laser_impact_interpolation_duration: f32,
    /// Per-frame laser impact jump, in world-scaled units, that triggers interpolation
    pub laser_impact_interpolation_threshold: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            smooth_snap_enabled: true,
            smooth_snap_speed: 30.0,
            elastic_snap_enabled: true,
            elastic_snap_strength: 0.3,
            placement_interpolation_duration: 0.6,
            laser_impact_interpolation_duration: 0.1,
            laser_impact_interpolation_threshold: 5.0,
        }
    }
}

/// Inertia after release and physics interplay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InertiaConfig {
    /// Hand movement per frame, in world-scaled units, below which no inertia is kept
    pub min_velocity_for_inertia: f32,
    /// Velocity, in world-scaled units, where inertia stops
    pub drag_translation_velocity_stop_epsilon: f32,
    /// Multiplier for the velocity handed to simulated objects
    pub inertia_velocity_boost: f32,
    /// Whether simulated objects are swept while dragged
    pub sweep_physics_while_simulating: bool,
    /// Extra placement pull-back for simulated objects, as a fraction of their size
    pub placement_offset_scale_while_simulating: f32,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            min_velocity_for_inertia: 1.0,
            drag_translation_velocity_stop_epsilon: 0.0001,
            inertia_velocity_boost: 0.5,
            sweep_physics_while_simulating: false,
            placement_offset_scale_while_simulating: 0.25,
        }
    }
}

/// World (room) movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Whether free and world drags may move vertically
    pub allow_vertical_world_movement: bool,
    /// Whether world rotation keeps pitch and roll instead of yaw only
    pub allow_world_rotation_pitch_and_roll: bool,
    /// Whether two-handed world drags may scale and rotate at once
    pub allow_simultaneous_scale_and_rotate: bool,
    /// Whether world scaling pivots on the floor
    pub scale_world_from_floor: bool,
    /// Whether the two-hand pivot leans toward the hand that moved less
    pub scale_world_with_dynamic_pivot: bool,
    /// Accumulated scale drag that locks a world drag into scaling
    pub world_scaling_drag_threshold: f32,
    /// Accumulated rotation, in degrees, that locks a world drag into rotating
    pub world_rotation_drag_threshold_degrees: f32,
    /// Smallest world-to-meters scale
    pub scale_min: f32,
    /// Largest world-to-meters scale
    pub scale_max: f32,
    /// Haptic strength when the room crosses a grid line
    pub grid_haptic_feedback_strength: f32,
    /// Room translation between grid haptic pulses, before world scaling
    pub haptic_translation_interval: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            allow_vertical_world_movement: true,
            allow_world_rotation_pitch_and_roll: false,
            allow_simultaneous_scale_and_rotate: true,
            scale_world_from_floor: false,
            scale_world_with_dynamic_pivot: true,
            world_scaling_drag_threshold: 7.0,
            world_rotation_drag_threshold_degrees: 8.0,
            scale_min: 10.0,
            scale_max: 6000.0,
            grid_haptic_feedback_strength: 0.4,
            haptic_translation_interval: 25.0,
        }
    }
}

/// Transform gizmo and snap grid visuals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GizmoConfig {
    /// Whether the transform gizmo is shown at all
    pub show_transform_gizmo: bool,
    /// Always put the pivot at the bounds center
    pub force_pivot_to_bounds_center: bool,
    /// Put the pivot at the bounds center when several objects are selected
    pub center_pivot_for_multiple: bool,
    /// Whether the gizmo bounds may be used for actor alignment
    pub can_align_to_actors: bool,
    /// Scale of a hovered handle
    pub handle_hover_scale: f32,
    /// Seconds a handle takes to grow or shrink on hover
    pub handle_hover_animation_duration: f32,
    /// Gizmo scale when not in VR
    pub scale_in_desktop: f32,
    /// Snap grid size as a multiple of the selection footprint
    pub snap_grid_size_multiplier: f32,
    /// Snap grid line width
    pub snap_grid_line_width: f32,
    /// Seconds the gizmo takes to fade in after a selection change
    pub selection_animation_duration: f32,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            show_transform_gizmo: true,
            force_pivot_to_bounds_center: false,
            center_pivot_for_multiple: true,
            can_align_to_actors: true,
            handle_hover_scale: 1.5,
            handle_hover_animation_duration: 0.1,
            scale_in_desktop: 0.35,
            snap_grid_size_multiplier: 3.0,
            snap_grid_line_width: 3.0,
            selection_animation_duration: 0.15,
        }
    }
}

/// Complete interaction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InteractionConfig {
    /// Snapping settings
    #[serde(default)]
    pub snap: SnapConfig,
    /// Smoothing settings
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    /// Inertia settings
    #[serde(default)]
    pub inertia: InertiaConfig,
    /// World movement settings
    #[serde(default)]
    pub world: WorldConfig,
    /// Gizmo settings
    #[serde(default)]
    pub gizmo: GizmoConfig,
}

impl InteractionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from RON text and validate it
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: InteractionConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON text
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("snap.grid_size", self.snap.grid_size),
            ("snap.rotation_grid_degrees", self.snap.rotation_grid_degrees),
            ("snap.scale_grid_size", self.snap.scale_grid_size),
            ("smoothing.placement_interpolation_duration", self.smoothing.placement_interpolation_duration),
            ("smoothing.laser_impact_interpolation_duration", self.smoothing.laser_impact_interpolation_duration),
            ("world.scale_min", self.world.scale_min),
            ("world.haptic_translation_interval", self.world.haptic_translation_interval),
            ("gizmo.handle_hover_animation_duration", self.gizmo.handle_hover_animation_duration),
            ("gizmo.selection_animation_duration", self.gizmo.selection_animation_duration),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        if self.world.scale_min > self.world.scale_max {
            return Err(ConfigError::Invalid(format!(
                "world.scale_min ({}) is above world.scale_max ({})",
                self.world.scale_min, self.world.scale_max
            )));
        }

        if !(0.0..=1.0).contains(&self.smoothing.elastic_snap_strength) {
            return Err(ConfigError::Invalid(format!(
                "smoothing.elastic_snap_strength must be within 0..=1, got {}",
                self.smoothing.elastic_snap_strength
            )));
        }

        if self.smoothing.smooth_snap_speed < 0.0 {
            return Err(ConfigError::Invalid("smoothing.smooth_snap_speed is negative".to_string()));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(InteractionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = InteractionConfig::from_ron_str("(snap: (grid_enabled: true, grid_size: 5.0))").unwrap();
        assert!(config.snap.grid_enabled);
        assert_eq!(config.snap.grid_size, 5.0);
        assert_eq!(config.snap.rotation_grid_degrees, 15.0);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_scale_range() {
        let mut config = InteractionConfig::default();
        config.world.scale_min = 500.0;
        config.world.scale_max = 50.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let mut config = InteractionConfig::default();
        config.snap.grid_size = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interaction.ron");

        let mut config = InteractionConfig::default();
        config.snap.actor_align_enabled = true;
        config.world.scale_max = 1200.0;
        config.save(&path).unwrap();

        let loaded = InteractionConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = InteractionConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
