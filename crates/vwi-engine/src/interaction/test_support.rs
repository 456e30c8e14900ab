//! Shared rig for interaction tests: scripted hands, boxes and a floor.

use std::cell::{Cell, RefCell};
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::{Quat, Vec3};
use uuid::Uuid;
use vwi_core::{BoundingBox, InteractionConfig, Transform};

use super::WorldInteraction;
use crate::events::InteractionEvent;
use crate::interactor::{InteractorId, InteractorSource};
use crate::scene::{ActorInfo, RayHit, SceneQuery};
use crate::transformable::Transformable;

pub(crate) const BOX_HALF_EXTENT: f32 = 10.0;
pub(crate) const DT: f32 = 1.0 / 30.0;

pub(crate) type SharedPose = Rc<RefCell<Option<Transform>>>;

struct TestHand {
    pose: SharedPose,
    slide: Rc<Cell<Option<f32>>>,
    haptics: Rc<RefCell<Vec<f32>>>,
}

impl InteractorSource for TestHand {
    fn poll_room_space_pose(&mut self) -> Option<Transform> {
        *self.pose.borrow()
    }

    fn slide_delta(&mut self) -> Option<f32> {
        self.slide.take()
    }

    fn play_haptic_effect(&mut self, strength: f32) {
        self.haptics.borrow_mut().push(strength);
    }
}

struct TestBox {
    id: Uuid,
    transform: Rc<RefCell<Transform>>,
    point: bool,
}

impl Transformable for TestBox {
    fn actor_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn transform(&self) -> Transform {
        *self.transform.borrow()
    }

    fn apply_transform(&mut self, transform: &Transform, _sweep: bool) {
        *self.transform.borrow_mut() = *transform;
    }

    fn is_unoriented_point(&self) -> bool {
        self.point
    }

    fn build_bounding_box(&self, gizmo_to_world: &Transform) -> BoundingBox {
        let transform = self.transform();
        if self.point {
            let p = gizmo_to_world.inverse_transform_position(transform.location());
            return BoundingBox::new(p, p);
        }
        let local = BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(BOX_HALF_EXTENT));
        BoundingBox::from_points(
            local
                .corners()
                .into_iter()
                .map(|c| gizmo_to_world.inverse_transform_position(transform.transform_position(c))),
        )
    }
}

/// Horizontal floor plane, or nothing.
#[derive(Debug, Default)]
pub(crate) struct TestScene {
    pub(crate) floor_z: Option<f32>,
}

impl SceneQuery for TestScene {
    fn raycast(&self, start: Vec3, end: Vec3, _ignored: &[Uuid]) -> Option<RayHit> {
        let floor = self.floor_z?;
        let (a, b) = (start.z - floor, end.z - floor);
        if a * b > 0.0 || (a - b).abs() < f32::EPSILON {
            return None;
        }
        let t = a / (a - b);
        Some(RayHit {
            actor: Uuid::nil(),
            impact_point: start + (end - start) * t,
            impact_normal: Vec3::Z,
        })
    }

    fn overlap_sphere(&self, _center: Vec3, _radius: f32) -> Vec<Uuid> {
        Vec::new()
    }

    fn actor(&self, _id: Uuid) -> Option<ActorInfo> {
        None
    }
}

pub(crate) struct Rig {
    pub(crate) engine: WorldInteraction,
    pub(crate) scene: TestScene,
    boxes: Vec<Rc<RefCell<Transform>>>,
    starts: Vec<Transform>,
    slides: Vec<(InteractorId, Rc<Cell<Option<f32>>>)>,
    haptics: Vec<(InteractorId, Rc<RefCell<Vec<f32>>>)>,
}

impl Rig {
    pub(crate) fn new(config: InteractionConfig) -> Self {
        Self {
            engine: WorldInteraction::new(config),
            scene: TestScene::default(),
            boxes: Vec::new(),
            starts: Vec::new(),
            slides: Vec::new(),
            haptics: Vec::new(),
        }
    }

    pub(crate) fn add_hand(&mut self, pose: Transform) -> (InteractorId, SharedPose) {
        let pose = Rc::new(RefCell::new(Some(pose)));
        let slide = Rc::new(Cell::new(None));
        let haptics = Rc::new(RefCell::new(Vec::new()));
        let id = self.engine.add_interactor(Box::new(TestHand {
            pose: pose.clone(),
            slide: slide.clone(),
            haptics: haptics.clone(),
        }));
        self.slides.push((id, slide));
        self.haptics.push((id, haptics));
        (id, pose)
    }

    /// Haptic strengths played on a hand so far.
    pub(crate) fn haptics(&self, id: InteractorId) -> Vec<f32> {
        self.haptics
            .iter()
            .find(|(hand, _)| *hand == id)
            .map(|(_, played)| played.borrow().clone())
            .unwrap_or_default()
    }

    /// Queues a slide value read by the next tick only.
    pub(crate) fn set_slide(&mut self, id: InteractorId, delta: Option<f32>) {
        if let Some((_, slide)) = self.slides.iter().find(|(hand, _)| *hand == id) {
            slide.set(delta);
        }
    }

    fn select(&mut self, transforms: Vec<Transform>, point: bool) {
        self.starts = transforms.clone();
        self.boxes = transforms.into_iter().map(|t| Rc::new(RefCell::new(t))).collect();
        let transformables: Vec<Box<dyn Transformable>> = self
            .boxes
            .iter()
            .map(|shared| {
                Box::new(TestBox {
                    id: Uuid::new_v4(),
                    transform: shared.clone(),
                    point,
                }) as Box<dyn Transformable>
            })
            .collect();
        self.engine.set_transformables(transformables);
    }

    pub(crate) fn select_boxes(&mut self, centers: &[Vec3]) {
        self.select(centers.iter().map(|c| Transform::from_translation(*c)).collect(), false);
    }

    pub(crate) fn select_transforms(&mut self, transforms: Vec<Transform>) {
        self.select(transforms, false);
    }

    pub(crate) fn select_points(&mut self, points: &[Vec3]) {
        self.select(points.iter().map(|c| Transform::from_translation(*c)).collect(), true);
    }

    pub(crate) fn tick(&mut self) {
        self.engine.tick(DT, &self.scene);
    }

    pub(crate) fn transform(&self, index: usize) -> Transform {
        *self.boxes[index].borrow()
    }

    pub(crate) fn location(&self, index: usize) -> Vec3 {
        self.transform(index).location()
    }

    pub(crate) fn start_location(&self, index: usize) -> Vec3 {
        self.starts[index].location()
    }

    pub(crate) fn record_events(&mut self) -> Rc<RefCell<Vec<InteractionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        self.engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }
}

/// Hand half a meter above the floor at world `(x, y)`, laser pointing down.
pub(crate) fn pointing_down_at(x: f32, y: f32) -> Transform {
    Transform::from_rotation_translation(Quat::from_rotation_y(FRAC_PI_2), Vec3::new(x / 100.0, y / 100.0, 0.5))
}

/// Hand a meter up at world `x`, laser along +X.
pub(crate) fn hand_at(x: f32) -> Transform {
    Transform::from_translation(Vec3::new(x / 100.0, 0.0, 1.0))
}

pub(crate) fn set_pose(pose: &SharedPose, transform: Transform) {
    *pose.borrow_mut() = Some(transform);
}
