//! Viewport World Interaction Simulator
//!
//! Headless host for the manipulation engine: an in-memory box scene,
//! keyframed hands and RON scenarios that script selections and drags.
//!
//! # Module Structure
//!
//! ```text
//! vwi-sim/
//! ├── scenario.rs # Scenario file format and errors
//! ├── runner.rs   # Simulation loop and report
//! ├── scene.rs    # Shared scene, scene queries, actor transformables
//! └── source.rs   # Keyframed interactor sources
//! ```

pub mod runner;
pub mod scenario;
pub mod scene;
pub mod source;

// Re-exports for convenience
pub use runner::{Report, Simulation};
pub use scenario::{Scenario, ScenarioError};
pub use scene::{SharedScene, SimScene};
