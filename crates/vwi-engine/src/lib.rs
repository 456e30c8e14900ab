//! Viewport World Interaction Engine
//!
//! Grabs, drags, snaps and throws selected objects with motion controllers
//! or a mouse, and moves, rotates and scales the user's room within the
//! world. Rendering and input devices stay with the host, which talks to the
//! engine through [`InteractorSource`], [`Transformable`] and [`SceneQuery`].
//!
//! # Module Structure
//!
//! ```text
//! vwi-engine/
//! ├── interaction/     # WorldInteraction: tick, drag, smoothing, world movement
//! ├── gizmo/           # Handle layout, picking, constraints, drag operations
//! ├── interactor.rs    # Interactor state and the device trait
//! ├── transformable.rs # Movable objects and the selection set
//! ├── scene.rs         # Host scene queries
//! ├── align.rs         # Snapping to nearby actors' bounds
//! ├── two_hand.rs      # Two-handed gesture decomposition
//! ├── events.rs        # Event listeners
//! └── transaction.rs   # Undo transaction tracking
//! ```

pub mod align;
pub mod events;
pub mod gizmo;
pub mod interaction;
pub mod interactor;
pub mod scene;
pub mod transaction;
pub mod transformable;
pub mod two_hand;

// Re-exports for convenience
pub use events::{InteractionEvent, SubscriptionId};
pub use gizmo::visuals::{GizmoVisualState, SnapGridState};
pub use gizmo::{GizmoHandleId, GizmoHandleKind, GizmoSpace};
pub use interaction::{
    DragUpdate, Interactable, InteractionError, StartDragParams, WorldInteraction, WorldScale,
    apply_velocity_damping,
};
pub use interactor::{DraggingMode, InteractorData, InteractorId, InteractorKind, InteractorSource, Sphere};
pub use scene::{ActorInfo, EmptyScene, RayHit, SceneQuery};
pub use transformable::{Transformable, TransformableSet};
