//! Transform gizmo
//!
//! Handle layout, handle placements and ray picking. The gizmo lives in its
//! own unscaled space (`gizmo_to_world`); every handle shape is expressed in
//! that space around the selection's local bounds.
//!
//! # Module Structure
//!
//! ```text
//! gizmo/
//! ├── mod.rs             # Spaces, placements, handle layout, picking
//! ├── constraint.rs      # Line/plane constrained drag delta
//! ├── drag_operation.rs  # Per-handle drag behavior
//! └── visuals.rs         # Visual state for hosts (gizmo and snap grid)
//! ```

pub mod constraint;
pub mod drag_operation;
pub mod visuals;

use glam::Vec3;
use vwi_core::collision::{ray_cylinder_intersection, ray_ring_intersection, ray_sphere_intersection};
use vwi_core::{BoundingBox, Transform};

use drag_operation::DragOperation;

const ARROW_LENGTH: f32 = 30.0;
const ARROW_RADIUS: f32 = 1.5;
const PLANE_HANDLE_OFFSET: f32 = 10.0;
const PLANE_HANDLE_RADIUS: f32 = 4.0;
const ROTATION_RING_PADDING: f32 = 15.0;
const ROTATION_RING_THICKNESS: f32 = 2.0;
const UNIFORM_SCALE_HANDLE_RADIUS: f32 = 5.0;
const STRETCH_HANDLE_RADIUS: f32 = 3.0;

/// Coordinate system of the gizmo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GizmoSpace {
    /// Axes aligned with the world
    #[default]
    World,
    /// Axes aligned with the last selected object
    Local,
}

impl GizmoSpace {
    /// The other space.
    pub fn cycled(self) -> Self {
        match self {
            Self::World => Self::Local,
            Self::Local => Self::World,
        }
    }
}

/// Which side of an axis a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleDirection {
    /// On the negative side
    Negative,
    /// Centered on the axis
    Center,
    /// On the positive side
    Positive,
}

impl HandleDirection {
    fn from_sign(sign: i32) -> Self {
        match sign {
            s if s < 0 => Self::Negative,
            0 => Self::Center,
            _ => Self::Positive,
        }
    }

    /// -1, 0 or 1.
    pub fn sign(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Center => 0.0,
            Self::Positive => 1.0,
        }
    }
}

/// Position of a handle relative to the gizmo bounds, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlePlacement {
    /// X, Y and Z directions
    pub axes: [HandleDirection; 3],
}

impl HandlePlacement {
    /// Placement from per-axis signs.
    pub fn from_signs(x: i32, y: i32, z: i32) -> Self {
        Self {
            axes: [
                HandleDirection::from_sign(x),
                HandleDirection::from_sign(y),
                HandleDirection::from_sign(z),
            ],
        }
    }

    /// Number of centered axes, and the single off-center axis when exactly
    /// two axes are centered.
    pub fn center_handle_count_and_facing_axis(&self) -> (usize, Option<usize>) {
        let count = self.axes.iter().filter(|d| **d == HandleDirection::Center).count();
        let facing = if count == 2 {
            self.axes.iter().position(|d| *d != HandleDirection::Center)
        } else {
            None
        };
        (count, facing)
    }

    /// Unit vector pointing from the bounds center toward the handle.
    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.axes[0].sign(), self.axes[1].sign(), self.axes[2].sign())
    }
}

/// Index of a handle in the gizmo layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GizmoHandleId(pub u16);

/// What a handle does when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoHandleKind {
    /// Arrow moving along one axis
    Translate,
    /// Square moving within a plane
    PlaneTranslate,
    /// Ring rotating about one axis
    Rotate,
    /// Center ball scaling uniformly
    UniformScale,
    /// Edge or corner ball stretching the bounds
    Stretch,
}

impl GizmoHandleKind {
    /// Drag operation bound to handles of this kind.
    pub fn drag_operation(self) -> DragOperation {
        match self {
            Self::Translate => DragOperation::TranslateAlongAxis,
            Self::PlaneTranslate => DragOperation::TranslateOnPlane,
            Self::Rotate => DragOperation::Rotate,
            Self::UniformScale => DragOperation::UniformScale,
            Self::Stretch => DragOperation::Stretch,
        }
    }

    /// Rotation and scale handles make no sense on a single point.
    pub fn needs_orientation(self) -> bool {
        matches!(self, Self::Rotate | Self::UniformScale | Self::Stretch)
    }
}

/// Pickable shape of a handle, in gizmo space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleShape {
    /// Cylinder from `start` to `end`
    Arrow {
        /// Base of the arrow
        start: Vec3,
        /// Tip of the arrow
        end: Vec3,
        /// Pick radius
        radius: f32,
    },
    /// Flat ring
    Ring {
        /// Ring center
        center: Vec3,
        /// Rotation axis
        normal: Vec3,
        /// Ring radius
        radius: f32,
        /// Half width of the band
        thickness: f32,
    },
    /// Sphere
    Ball {
        /// Ball center
        center: Vec3,
        /// Ball radius
        radius: f32,
    },
}

impl HandleShape {
    /// Ray parameter of the nearest hit, in gizmo space.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            HandleShape::Arrow { start, end, radius } => ray_cylinder_intersection(origin, direction, start, end, radius),
            HandleShape::Ring {
                center,
                normal,
                radius,
                thickness,
            } => ray_ring_intersection(origin, direction, center, normal, radius, thickness),
            HandleShape::Ball { center, radius } => ray_sphere_intersection(origin, direction, center, radius),
        }
    }
}

/// One grabbable part of the gizmo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoHandle {
    /// Stable id within a layout
    pub id: GizmoHandleId,
    /// Behavior
    pub kind: GizmoHandleKind,
    /// Placement consumed by constrained dragging. Uniform scale has none.
    pub placement: Option<HandlePlacement>,
    /// Pick shape
    pub shape: HandleShape,
}

/// Builds the full handle set around `local_bounds`.
///
/// Ids are assigned in a fixed order: six arrows, three planes, three rings,
/// the uniform scale ball, then edge and corner stretch balls.
pub fn build_handles(local_bounds: &BoundingBox, handle_size: f32) -> Vec<GizmoHandle> {
    let bounds = if local_bounds.is_valid() {
        *local_bounds
    } else {
        BoundingBox::new(Vec3::ZERO, Vec3::ZERO)
    };
    let center = bounds.center();
    let extents = bounds.half_extents();
    let axes = [Vec3::X, Vec3::Y, Vec3::Z];

    let mut handles = Vec::with_capacity(33);
    let mut push = |kind, placement, shape| {
        let id = GizmoHandleId(handles.len() as u16);
        handles.push(GizmoHandle {
            id,
            kind,
            placement,
            shape,
        });
    };

    for (index, axis) in axes.iter().enumerate() {
        for sign in [1, -1] {
            let mut signs = [0; 3];
            signs[index] = sign;
            let dir = *axis * sign as f32;
            let start = center + dir * extents[index];
            push(
                GizmoHandleKind::Translate,
                Some(HandlePlacement::from_signs(signs[0], signs[1], signs[2])),
                HandleShape::Arrow {
                    start,
                    end: start + dir * ARROW_LENGTH * handle_size,
                    radius: ARROW_RADIUS * handle_size,
                },
            );
        }
    }

    for index in 0..3 {
        let mut signs = [0; 3];
        signs[index] = 1;
        let offset: Vec3 = (0..3)
            .filter(|other| *other != index)
            .map(|other| axes[other] * (extents[other] + PLANE_HANDLE_OFFSET * handle_size))
            .sum();
        push(
            GizmoHandleKind::PlaneTranslate,
            Some(HandlePlacement::from_signs(signs[0], signs[1], signs[2])),
            HandleShape::Ball {
                center: center + offset,
                radius: PLANE_HANDLE_RADIUS * handle_size,
            },
        );
    }

    let ring_radius = extents.length() + ROTATION_RING_PADDING * handle_size;
    for (index, axis) in axes.iter().enumerate() {
        let mut signs = [0; 3];
        signs[index] = 1;
        push(
            GizmoHandleKind::Rotate,
            Some(HandlePlacement::from_signs(signs[0], signs[1], signs[2])),
            HandleShape::Ring {
                center,
                normal: *axis,
                radius: ring_radius,
                thickness: ROTATION_RING_THICKNESS * handle_size,
            },
        );
    }

    push(
        GizmoHandleKind::UniformScale,
        None,
        HandleShape::Ball {
            center,
            radius: UNIFORM_SCALE_HANDLE_RADIUS * handle_size,
        },
    );

    for x in -1..=1 {
        for y in -1..=1 {
            for z in -1..=1 {
                let placement = HandlePlacement::from_signs(x, y, z);
                let (center_count, _) = placement.center_handle_count_and_facing_axis();
                if center_count > 1 {
                    continue;
                }
                push(
                    GizmoHandleKind::Stretch,
                    Some(placement),
                    HandleShape::Ball {
                        center: center + placement.direction() * extents,
                        radius: STRETCH_HANDLE_RADIUS * handle_size,
                    },
                );
            }
        }
    }

    handles
}

/// A handle hit by a laser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleHit {
    /// Handle that was hit
    pub id: GizmoHandleId,
    /// World-space hit point
    pub location: Vec3,
    /// Distance along the laser
    pub distance: f32,
}

/// Nearest handle along the world-space laser `start..end`.
pub fn pick_handle<'a>(
    handles: impl IntoIterator<Item = &'a GizmoHandle>,
    gizmo_to_world: &Transform,
    start: Vec3,
    end: Vec3,
) -> Option<HandleHit> {
    let length = start.distance(end);
    let direction = (end - start).normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let local_origin = gizmo_to_world.inverse_transform_position(start);
    let local_direction = gizmo_to_world.inverse_transform_vector_no_scale(direction);

    handles
        .into_iter()
        .filter_map(|handle| {
            let t = handle.shape.intersect(local_origin, local_direction)?;
            (t <= length).then_some((handle.id, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, t)| HandleHit {
            id,
            location: start + direction * t,
            distance: t,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn unit_bounds() -> BoundingBox {
        BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(10.0))
    }

    #[test]
    fn test_placement_facing_axis() {
        let arrow = HandlePlacement::from_signs(0, -1, 0);
        assert_eq!(arrow.center_handle_count_and_facing_axis(), (2, Some(1)));
        let edge = HandlePlacement::from_signs(1, 0, -1);
        assert_eq!(edge.center_handle_count_and_facing_axis(), (1, None));
        let center = HandlePlacement::from_signs(0, 0, 0);
        assert_eq!(center.center_handle_count_and_facing_axis(), (3, None));
    }

    #[test]
    fn test_layout_counts() {
        let handles = build_handles(&unit_bounds(), 1.0);
        let count = |kind| handles.iter().filter(|h| h.kind == kind).count();
        assert_eq!(count(GizmoHandleKind::Translate), 6);
        assert_eq!(count(GizmoHandleKind::PlaneTranslate), 3);
        assert_eq!(count(GizmoHandleKind::Rotate), 3);
        assert_eq!(count(GizmoHandleKind::UniformScale), 1);
        assert_eq!(count(GizmoHandleKind::Stretch), 20);
        for (index, handle) in handles.iter().enumerate() {
            assert_eq!(handle.id, GizmoHandleId(index as u16));
        }
    }

    #[test]
    fn test_pick_positive_x_arrow() {
        let handles = build_handles(&unit_bounds(), 1.0);
        let gizmo = Transform::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let hit = pick_handle(
            &handles,
            &gizmo,
            Vec3::new(125.0, 0.0, 100.0),
            Vec3::new(125.0, 0.0, -100.0),
        )
        .unwrap();
        assert_eq!(handles[hit.id.0 as usize].kind, GizmoHandleKind::Translate);
        assert_eq!(
            handles[hit.id.0 as usize].placement,
            Some(HandlePlacement::from_signs(1, 0, 0))
        );
        assert!((hit.location.z - ARROW_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn test_pick_respects_gizmo_rotation() {
        let handles = build_handles(&unit_bounds(), 1.0);
        let gizmo = Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let hit = pick_handle(&handles, &gizmo, Vec3::new(0.0, 25.0, 100.0), Vec3::new(0.0, 25.0, -100.0)).unwrap();
        assert_eq!(
            handles[hit.id.0 as usize].placement,
            Some(HandlePlacement::from_signs(1, 0, 0))
        );
    }

    #[test]
    fn test_pick_misses_beyond_laser_length() {
        let handles = build_handles(&unit_bounds(), 1.0);
        let hit = pick_handle(&handles, &Transform::IDENTITY, Vec3::new(25.0, 0.0, 100.0), Vec3::new(25.0, 0.0, 50.0));
        assert!(hit.is_none());
    }
}
