//! Scene queries the engine needs from its host.

use glam::Vec3;
use uuid::Uuid;
use vwi_core::{BoundingBox, Transform};

/// Result of a scene raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Actor that was hit
    pub actor: Uuid,
    /// World-space impact point
    pub impact_point: Vec3,
    /// World-space surface normal at the impact
    pub impact_normal: Vec3,
}

/// What alignment needs to know about a scene actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorInfo {
    /// Actor id
    pub id: Uuid,
    /// World transform
    pub transform: Transform,
    /// Bounds in the actor's own space
    pub local_bounds: BoundingBox,
    /// Hidden in the editor
    pub hidden: bool,
    /// Exists only in the editor (helpers, gizmos)
    pub editor_only: bool,
    /// Currently selected
    pub selected: bool,
}

impl ActorInfo {
    /// Alignment may only snap to visible, unselected, real actors.
    pub fn is_alignment_candidate(&self) -> bool {
        !self.selected && !self.hidden && !self.editor_only
    }
}

/// Collision and lookup services of the host scene.
pub trait SceneQuery {
    /// First hit along `start..end`, skipping the `ignored` actors.
    fn raycast(&self, start: Vec3, end: Vec3, ignored: &[Uuid]) -> Option<RayHit>;

    /// Actors whose bounds overlap the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Uuid>;

    /// Looks up an actor.
    fn actor(&self, id: Uuid) -> Option<ActorInfo>;
}

/// A scene with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl SceneQuery for EmptyScene {
    fn raycast(&self, _start: Vec3, _end: Vec3, _ignored: &[Uuid]) -> Option<RayHit> {
        None
    }

    fn overlap_sphere(&self, _center: Vec3, _radius: f32) -> Vec<Uuid> {
        Vec::new()
    }

    fn actor(&self, _id: Uuid) -> Option<ActorInfo> {
        None
    }
}
