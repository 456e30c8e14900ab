//! Visual state of the transform gizmo and the snap grid.
//!
//! The engine never draws. Hosts read these structs after each tick and
//! render whatever they like from them.

use vwi_core::{BoundingBox, LinearColor, Transform};

use super::{GizmoHandle, GizmoHandleId, GizmoSpace};

/// Drawing state of one handle.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleVisual {
    /// Handle geometry
    pub handle: GizmoHandle,
    /// Shown this frame
    pub visible: bool,
    /// 0 when idle, 1 when fully hovered
    pub hover_alpha: f32,
}

impl HandleVisual {
    /// Draw scale, growing toward `hover_scale` while hovered.
    pub fn scale(&self, hover_scale: f32) -> f32 {
        1.0 + (hover_scale - 1.0) * self.hover_alpha
    }
}

/// Gizmo state for rendering and picking.
#[derive(Debug, Clone, PartialEq)]
pub struct GizmoVisualState {
    /// Whether the gizmo is shown
    pub visible: bool,
    /// Gizmo pivot and orientation, without scale
    pub gizmo_to_world: Transform,
    /// Selection bounds in gizmo space
    pub local_bounds: BoundingBox,
    /// Coordinate space the gizmo is aligned to
    pub space: GizmoSpace,
    /// Handle size multiplier, including the world scale factor
    pub handle_size: f32,
    /// Fade-in after a selection change, 0..=1
    pub animation_alpha: f32,
    /// Handles and their visibility
    pub handles: Vec<HandleVisual>,
}

impl Default for GizmoVisualState {
    fn default() -> Self {
        Self {
            visible: false,
            gizmo_to_world: Transform::IDENTITY,
            local_bounds: BoundingBox::empty(),
            space: GizmoSpace::World,
            handle_size: 1.0,
            animation_alpha: 0.0,
            handles: Vec::new(),
        }
    }
}

impl GizmoVisualState {
    /// Replaces the handle geometry, keeping hover animation of surviving ids.
    pub fn set_handles(&mut self, handles: Vec<GizmoHandle>, is_visible: impl Fn(&GizmoHandle) -> bool) {
        let previous = std::mem::take(&mut self.handles);
        self.handles = handles
            .into_iter()
            .map(|handle| {
                let hover_alpha = previous
                    .iter()
                    .find(|v| v.handle.id == handle.id)
                    .map(|v| v.hover_alpha)
                    .unwrap_or(0.0);
                HandleVisual {
                    visible: is_visible(&handle),
                    handle,
                    hover_alpha,
                }
            })
            .collect();
    }

    /// Handles that can currently be picked.
    pub fn visible_handles(&self) -> impl Iterator<Item = &GizmoHandle> {
        self.handles
            .iter()
            .filter(move |v| self.visible && v.visible)
            .map(|v| &v.handle)
    }

    /// Looks up a handle by id.
    pub fn handle(&self, id: GizmoHandleId) -> Option<&GizmoHandle> {
        self.handles.iter().map(|v| &v.handle).find(|h| h.id == id)
    }

    /// Advances hover animations toward the hovered set.
    pub fn update_hover(&mut self, hovered: &[GizmoHandleId], dt: f32, animation_duration: f32) {
        let step = if animation_duration > 0.0 { dt / animation_duration } else { 1.0 };
        for visual in &mut self.handles {
            let target = if hovered.contains(&visual.handle.id) { 1.0 } else { 0.0 };
            visual.hover_alpha = if visual.hover_alpha < target {
                (visual.hover_alpha + step).min(target)
            } else {
                (visual.hover_alpha - step).max(target)
            };
        }
    }
}

/// Snap grid under the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGridState {
    /// Whether the grid is shown
    pub visible: bool,
    /// Mesh transform (location at the bounds bottom, mesh scale)
    pub transform: Transform,
    /// World-space center the grid fades out from
    pub center: glam::Vec3,
    /// Fade radius
    pub radius: f32,
    /// Grid line color
    pub color: LinearColor,
    /// Distance between grid lines
    pub interval: f32,
    /// Grid line width
    pub line_width: f32,
}

impl Default for SnapGridState {
    fn default() -> Self {
        Self {
            visible: false,
            transform: Transform::IDENTITY,
            center: glam::Vec3::ZERO,
            radius: 0.0,
            color: LinearColor::WHITE,
            interval: 0.0,
            line_width: 0.0,
        }
    }
}
