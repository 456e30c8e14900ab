//! Things that can be moved by the engine.
//!
//! A [`TransformableSet`] is rebuilt on every selection change. Entries are
//! owned by the set; the objects they stand for are reached through the
//! adapter, never owned.

use glam::Vec3;
use uuid::Uuid;
use vwi_core::{BoundingBox, Transform};

/// Adapter over a movable object (actor, component, sub-object).
pub trait Transformable {
    /// Identity of the scene actor behind this transformable, if any.
    fn actor_id(&self) -> Option<Uuid> {
        None
    }

    /// Current world transform.
    fn transform(&self) -> Transform;

    /// Moves the object. `sweep` asks for a swept move that stops at collisions.
    fn apply_transform(&mut self, transform: &Transform, sweep: bool);

    /// Whether physics currently drives the object.
    fn is_physically_simulated(&self) -> bool {
        false
    }

    /// Linear velocity under simulation.
    fn linear_velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    /// Sets the linear velocity under simulation.
    fn set_linear_velocity(&mut self, _velocity: Vec3) {}

    /// A single point has no meaningful orientation or size, so rotation and
    /// scale handles are hidden for it.
    fn is_unoriented_point(&self) -> bool {
        false
    }

    /// Bounds of the object expressed in the space of `gizmo_to_world`.
    fn build_bounding_box(&self, gizmo_to_world: &Transform) -> BoundingBox {
        let local = self.transform().location();
        let point = gizmo_to_world.inverse_transform_position(local);
        BoundingBox::new(point, point)
    }

    /// Actors raycasts should ignore while this transformable is moved.
    fn collect_ignored_actors(&self, out: &mut Vec<Uuid>) {
        if let Some(id) = self.actor_id() {
            out.push(id);
        }
    }
}

/// A transformable and its transform frozen at drag start.
pub struct TransformableEntry {
    /// The adapter
    pub transformable: Box<dyn Transformable>,
    /// Transform captured when the current drag started
    pub start_transform: Transform,
}

impl std::fmt::Debug for TransformableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformableEntry")
            .field("actor_id", &self.transformable.actor_id())
            .field("start_transform", &self.start_transform)
            .finish()
    }
}

/// The current selection.
#[derive(Debug, Default)]
pub struct TransformableSet {
    entries: Vec<TransformableEntry>,
}

impl TransformableSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection, capturing each start transform.
    pub fn replace(&mut self, transformables: Vec<Box<dyn Transformable>>) {
        self.entries = transformables
            .into_iter()
            .map(|transformable| {
                let start_transform = transformable.transform();
                TransformableEntry { transformable, start_transform }
            })
            .collect();
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is selected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries
    pub fn iter(&self) -> impl Iterator<Item = &TransformableEntry> {
        self.entries.iter()
    }

    /// Iterate entries mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TransformableEntry> {
        self.entries.iter_mut()
    }

    /// Last entry; the gizmo follows it.
    pub fn last(&self) -> Option<&TransformableEntry> {
        self.entries.last()
    }

    /// Freezes every entry's current transform as its drag start.
    pub fn capture_start_transforms(&mut self) {
        for entry in &mut self.entries {
            entry.start_transform = entry.transformable.transform();
        }
    }

    /// Applies `start * gizmo_start⁻¹ * gizmo` to every entry, which keeps
    /// the entries' relative offsets exact.
    pub fn apply_gizmo_transform(&mut self, gizmo_start: &Transform, gizmo: &Transform, sweep: bool) {
        let delta = gizmo_start.inverse() * *gizmo;
        for entry in &mut self.entries {
            let new_transform = entry.start_transform * delta;
            entry.transformable.apply_transform(&new_transform, sweep);
        }
    }

    /// Whether any entry is driven by physics.
    pub fn any_simulated(&self) -> bool {
        self.entries.iter().any(|e| e.transformable.is_physically_simulated())
    }

    /// Average world location of all entries.
    pub fn average_location(&self) -> Vec3 {
        if self.entries.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self.entries.iter().map(|e| e.transformable.transform().location()).sum();
        sum / self.entries.len() as f32
    }

    /// Actor ids of all entries that have one.
    pub fn actor_ids(&self) -> Vec<Uuid> {
        self.entries.iter().filter_map(|e| e.transformable.actor_id()).collect()
    }

    /// Actors to ignore when raycasting past the selection.
    pub fn ignored_actors(&self) -> Vec<Uuid> {
        let mut ignored = Vec::new();
        for entry in &self.entries {
            entry.transformable.collect_ignored_actors(&mut ignored);
        }
        ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    struct Point(Transform);

    impl Transformable for Point {
        fn transform(&self) -> Transform {
            self.0
        }

        fn apply_transform(&mut self, transform: &Transform, _sweep: bool) {
            self.0 = *transform;
        }
    }

    fn set_of(locations: &[Vec3]) -> TransformableSet {
        let mut set = TransformableSet::new();
        set.replace(
            locations
                .iter()
                .map(|l| Box::new(Point(Transform::from_translation(*l))) as Box<dyn Transformable>)
                .collect(),
        );
        set
    }

    #[test]
    fn test_group_move_keeps_offsets() {
        let mut set = set_of(&[Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 2.0)]);
        let gizmo_start = Transform::from_translation(Vec3::new(0.0, 5.0, 2.0));
        let gizmo = Transform::from_rotation_translation(Quat::from_rotation_z(0.7), Vec3::new(3.0, 8.0, 2.0));
        set.apply_gizmo_transform(&gizmo_start, &gizmo, false);

        let deltas: Vec<Transform> = set
            .iter()
            .map(|e| e.start_transform.inverse() * e.transformable.transform())
            .collect();
        for delta in &deltas[1..] {
            assert!(delta.equals(&deltas[0], 1e-4));
        }
    }

    #[test]
    fn test_replace_captures_start_transforms() {
        let mut set = set_of(&[Vec3::ZERO]);
        let moved = Point(Transform::from_translation(Vec3::new(4.0, 0.0, 0.0)));
        set.replace(vec![Box::new(moved) as Box<dyn Transformable>]);
        assert_eq!(set.len(), 1);
        let entry = set.iter().next().unwrap();
        assert_eq!(entry.start_transform.location(), Vec3::new(4.0, 0.0, 0.0));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_average_location() {
        let set = set_of(&[Vec3::ZERO, Vec3::new(4.0, 2.0, 0.0)]);
        let average = set.average_location();
        assert_relative_eq!(average.x, 2.0);
        assert_relative_eq!(average.y, 1.0);
    }
}
