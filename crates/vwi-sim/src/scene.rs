//! In-memory scene of boxes on an optional floor.
//!
//! The scene is shared between the engine's scene queries and the actor
//! transformables, so both see every move immediately.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use uuid::Uuid;
use vwi_core::{BoundingBox, Transform};
use vwi_engine::{ActorInfo, RayHit, SceneQuery, Transformable};

const PARALLEL_EPSILON: f32 = 1.0e-6;

/// A box-shaped actor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimActor {
    pub name: String,
    pub transform: Transform,
    pub half_extents: Vec3,
    pub hidden: bool,
    pub editor_only: bool,
    pub selected: bool,
    pub simulated: bool,
    pub velocity: Vec3,
}

impl SimActor {
    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_center_half_extents(Vec3::ZERO, self.half_extents)
    }

    pub fn world_bounds(&self) -> BoundingBox {
        self.local_bounds().transform(&self.transform)
    }
}

/// Actors keyed by id, plus the floor height.
#[derive(Debug, Default)]
pub struct SimScene {
    pub floor_z: Option<f32>,
    actors: HashMap<Uuid, SimActor>,
    names: HashMap<String, Uuid>,
}

pub type SharedScene = Arc<Mutex<SimScene>>;

/// Create a new shared scene
pub fn create_shared_scene(floor_z: Option<f32>) -> SharedScene {
    Arc::new(Mutex::new(SimScene {
        floor_z,
        ..Default::default()
    }))
}

impl SimScene {
    /// Adds an actor and returns its new id.
    pub fn add_actor(&mut self, actor: SimActor) -> Uuid {
        let id = Uuid::new_v4();
        self.names.insert(actor.name.clone(), id);
        self.actors.insert(id, actor);
        id
    }

    pub fn actor(&self, id: Uuid) -> Option<&SimActor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: Uuid) -> Option<&mut SimActor> {
        self.actors.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Uuid> {
        self.names.get(name).copied()
    }

    /// Actors sorted by name, for stable reports.
    pub fn actors_by_name(&self) -> Vec<(&str, &SimActor)> {
        let mut actors: Vec<_> = self.actors.values().map(|a| (a.name.as_str(), a)).collect();
        actors.sort_by(|a, b| a.0.cmp(b.0));
        actors
    }

    pub fn set_selection(&mut self, selected: &[Uuid]) {
        for (id, actor) in &mut self.actors {
            actor.selected = selected.contains(id);
        }
    }

    /// Moves simulated actors by their velocity.
    pub fn step_physics(&mut self, dt: f32) {
        for actor in self.actors.values_mut() {
            if actor.simulated && actor.velocity != Vec3::ZERO {
                actor.transform.translation += actor.velocity * dt;
            }
        }
    }
}

/// Segment parameter and local entry normal of a segment entering the box
/// `[-half_extents, half_extents]`.
fn segment_box_intersection(start: Vec3, end: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let direction = end - start;
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (s, d, h) = (start[axis], direction[axis], half_extents[axis]);
        if d.abs() < PARALLEL_EPSILON {
            if s < -h || s > h {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((-h - s) / d, (h - s) / d);
        let mut face = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = 1.0;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }
    Some((t_enter, normal))
}

/// Scene queries over a [`SharedScene`].
#[derive(Clone)]
pub struct SceneView {
    scene: SharedScene,
}

impl SceneView {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }
}

impl SceneQuery for SceneView {
    fn raycast(&self, start: Vec3, end: Vec3, ignored: &[Uuid]) -> Option<RayHit> {
        let scene = self.scene.lock();
        let mut best: Option<(f32, RayHit)> = None;

        for (id, actor) in &scene.actors {
            if actor.hidden || ignored.contains(id) {
                continue;
            }
            let local_start = actor.transform.inverse_transform_position(start);
            let local_end = actor.transform.inverse_transform_position(end);
            let Some((t, local_normal)) = segment_box_intersection(local_start, local_end, actor.half_extents) else {
                continue;
            };
            if best.as_ref().is_some_and(|(best_t, _)| *best_t <= t) {
                continue;
            }
            best = Some((
                t,
                RayHit {
                    actor: *id,
                    impact_point: start + (end - start) * t,
                    impact_normal: actor.transform.transform_vector_no_scale(local_normal).normalize_or_zero(),
                },
            ));
        }

        if let Some(floor) = scene.floor_z {
            let (a, b) = (start.z - floor, end.z - floor);
            if a >= 0.0 && b < 0.0 {
                let t = a / (a - b);
                if best.as_ref().is_none_or(|(best_t, _)| t < *best_t) {
                    best = Some((
                        t,
                        RayHit {
                            actor: Uuid::nil(),
                            impact_point: start + (end - start) * t,
                            impact_normal: Vec3::Z,
                        },
                    ));
                }
            }
        }

        best.map(|(_, hit)| hit)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Uuid> {
        let scene = self.scene.lock();
        scene
            .actors
            .iter()
            .filter(|(_, actor)| {
                let bounds = actor.world_bounds();
                let closest = center.clamp(bounds.min, bounds.max);
                closest.distance_squared(center) <= radius * radius
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn actor(&self, id: Uuid) -> Option<ActorInfo> {
        let scene = self.scene.lock();
        scene.actor(id).map(|actor| ActorInfo {
            id,
            transform: actor.transform,
            local_bounds: actor.local_bounds(),
            hidden: actor.hidden,
            editor_only: actor.editor_only,
            selected: actor.selected,
        })
    }
}

/// A scene actor seen by the engine as a transformable.
pub struct ActorTransformable {
    id: Uuid,
    scene: SharedScene,
}

impl ActorTransformable {
    pub fn new(id: Uuid, scene: SharedScene) -> Self {
        Self { id, scene }
    }
}

impl Transformable for ActorTransformable {
    fn actor_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn transform(&self) -> Transform {
        self.scene
            .lock()
            .actor(self.id)
            .map(|a| a.transform)
            .unwrap_or(Transform::IDENTITY)
    }

    fn apply_transform(&mut self, transform: &Transform, _sweep: bool) {
        if let Some(actor) = self.scene.lock().actor_mut(self.id) {
            actor.transform = *transform;
        }
    }

    fn is_physically_simulated(&self) -> bool {
        self.scene.lock().actor(self.id).is_some_and(|a| a.simulated)
    }

    fn linear_velocity(&self) -> Vec3 {
        self.scene.lock().actor(self.id).map(|a| a.velocity).unwrap_or(Vec3::ZERO)
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        if let Some(actor) = self.scene.lock().actor_mut(self.id) {
            actor.velocity = velocity;
        }
    }

    fn build_bounding_box(&self, gizmo_to_world: &Transform) -> BoundingBox {
        let scene = self.scene.lock();
        let Some(actor) = scene.actor(self.id) else {
            return BoundingBox::empty();
        };
        BoundingBox::from_points(
            actor
                .local_bounds()
                .corners()
                .into_iter()
                .map(|corner| gizmo_to_world.inverse_transform_position(actor.transform.transform_position(corner))),
        )
    }
}
