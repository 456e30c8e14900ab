//! Global constants for vwi-core

/// World-to-meters scale the engine starts with (one unit is one centimeter)
pub const DEFAULT_WORLD_TO_METERS: f32 = 100.0;

/// Tolerance used when deciding whether two floats are "nearly" equal
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Looser tolerance for transform and velocity comparisons
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Epsilon of the double-precision segment solver
pub const SEGMENT_SOLVER_EPSILON: f64 = 1.0e-10;

/// Velocities below this length are treated as stopped by the damping pass
pub const INERTIAL_MOVEMENT_ZERO_EPSILON: f32 = 0.01;

/// Damping multiplier for slow velocity-sensitive movement
pub const DAMPEN_MULTIPLIER_AT_LOW_SPEEDS: f32 = 0.94;

/// Damping multiplier for fast velocity-sensitive movement
pub const DAMPEN_MULTIPLIER_AT_HIGH_SPEEDS: f32 = 0.99;

/// Damping multiplier when damping is not velocity sensitive
pub const DAMPEN_MULTIPLIER: f32 = 0.95;

/// Room-space speed (per frame, before world scaling) where damping is minimal
pub const SPEED_FOR_MINIMAL_DAMPING: f32 = 2.5;

/// Vertical offset of the snap grid to avoid z-fighting with a supporting floor
pub const SNAP_GRID_Z_OFFSET: f32 = 0.1;

/// Edge length of the snap grid mesh in local units
pub const SNAP_GRID_MESH_SIZE: f32 = 100.0;

/// Upper bound on the per-frame delta time used for smoothing
pub const MAX_SMOOTHING_DELTA_TIME: f32 = 1.0 / 30.0;

/// Lower bound applied to scale factors produced by scale drags
pub const MIN_DRAG_SCALE: f32 = 0.01;
