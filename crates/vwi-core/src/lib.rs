//! Viewport Interaction Core
//!
//! Math and policy leaves shared by the manipulation engine and its hosts.
//!
//! # Module Structure
//!
//! ```text
//! vwi-core/
//! ├── transform.rs   # Scale/rotation/translation transform, left-first composition
//! ├── bounds.rs      # BoundingBox, Plane
//! ├── geometry.rs    # Segment/segment solver, segment/plane intersection
//! ├── collision.rs   # Ray picking tests for gizmo handles
//! ├── snap.rs        # Grid, rotation and scale snapping
//! ├── color.rs       # LinearColor, HSV lerp, pulsating values
//! ├── config.rs      # InteractionConfig (RON)
//! └── constants.rs
//! ```

pub mod bounds;
pub mod collision;
pub mod color;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod snap;
pub mod transform;

pub use bounds::{BoundingBox, Plane};
pub use color::LinearColor;
pub use config::{ConfigError, InteractionConfig};
pub use transform::Transform;
