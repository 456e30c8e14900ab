//! Gizmo and snap grid refresh.

use glam::Vec3;
use tracing::warn;
use vwi_core::color::make_pulsating_value;
use vwi_core::constants::{KINDA_SMALL_NUMBER, SNAP_GRID_MESH_SIZE, SNAP_GRID_Z_OFFSET};
use vwi_core::{BoundingBox, LinearColor, Transform};

use super::WorldInteraction;
use crate::gizmo::{GizmoSpace, build_handles};

impl WorldInteraction {
    /// Recomputes the gizmo pivot, bounds, handles and visibility from the
    /// selection, then the snap grid. Re-entrant calls are ignored.
    pub fn refresh_transform_gizmo(&mut self, new_objects_selected: bool) {
        if self.is_refreshing_gizmo {
            warn!("ignoring re-entrant gizmo refresh");
            return;
        }
        self.is_refreshing_gizmo = true;

        if new_objects_selected {
            self.selection_changed_time = self.time;
        }

        match self.transformables.last() {
            Some(last) => {
                let mut gizmo_to_world = last.transformable.transform().without_scale();
                if self.gizmo_space == GizmoSpace::World {
                    gizmo_to_world.set_rotation(glam::Quat::IDENTITY);
                }
                let single_unoriented = self.transformables.len() == 1 && last.transformable.is_unoriented_point();

                let mut local_bounds = self
                    .transformables
                    .iter()
                    .map(|e| e.transformable.build_bounding_box(&gizmo_to_world))
                    .fold(BoundingBox::empty(), |acc, b| acc.union(&b));

                let gizmo_config = &self.config.gizmo;
                let center_pivot = gizmo_config.force_pivot_to_bounds_center
                    || (self.transformables.len() > 1 && gizmo_config.center_pivot_for_multiple);
                if center_pivot && local_bounds.is_valid() {
                    let center = local_bounds.center();
                    gizmo_to_world.set_location(gizmo_to_world.transform_position(center));
                    local_bounds = local_bounds.shift_by(-center);
                }

                let dragging_index = self
                    .interactors
                    .iter()
                    .position(|s| s.data.dragging_mode.is_transforming_transformables());
                let dragged_handle = dragging_index.and_then(|i| self.interactors[i].data.dragged_handle);
                let hidden_by_simulation = self.simulating && self.transformables.any_simulated();
                let visible = gizmo_config.show_transform_gizmo && self.want_gizmo_visible && !hidden_by_simulation;

                let desktop_scale = if self.in_vr { 1.0 } else { gizmo_config.scale_in_desktop };
                let handle_size = self.gizmo_scale * desktop_scale * self.world_scale_factor();
                let selection_animation = gizmo_config.selection_animation_duration;

                self.gizmo.set_handles(build_handles(&local_bounds, handle_size), |handle| {
                    let allowed = dragging_index.is_none() || dragged_handle == Some(handle.id);
                    allowed && !(single_unoriented && handle.kind.needs_orientation())
                });
                self.gizmo.visible = visible;
                self.gizmo.gizmo_to_world = gizmo_to_world;
                self.gizmo.local_bounds = local_bounds;
                self.gizmo.space = self.gizmo_space;
                self.gizmo.handle_size = handle_size;
                self.gizmo.animation_alpha = if selection_animation > 0.0 {
                    (((self.time - self.selection_changed_time) / f64::from(selection_animation)) as f32).clamp(0.0, 1.0)
                } else {
                    1.0
                };

                self.update_snap_grid(dragging_index);
            }
            None => {
                self.gizmo.visible = false;
                self.gizmo.local_bounds = BoundingBox::empty();
                self.gizmo.set_handles(Vec::new(), |_| false);
                self.snap_grid.visible = false;
            }
        }

        self.is_refreshing_gizmo = false;
    }

    fn update_snap_grid(&mut self, dragging_index: Option<usize>) {
        let grid_size = self.config.snap.grid_size;
        self.snap_grid.visible = self.config.snap.grid_enabled && self.gizmo.visible;
        if !self.snap_grid.visible {
            return;
        }

        let gizmo_to_world = self.gizmo.gizmo_to_world;
        let local_bounds = self.gizmo.local_bounds;
        let mut location = gizmo_to_world.transform_position(Vec3::new(0.0, 0.0, local_bounds.min.z));
        location.z += SNAP_GRID_Z_OFFSET;

        let world_size = local_bounds.transform(&gizmo_to_world).size();
        let footprint = Vec3::new(world_size.x, world_size.y, 0.0).abs().max_element();
        let size = footprint.max(grid_size * 2.5) * self.config.gizmo.snap_grid_size_multiplier;

        let center = match dragging_index {
            Some(index) => self.interactors[index].data.gizmo.start.location(),
            None if self.dragged_since_last_selection
                && self
                    .interactors
                    .iter()
                    .any(|s| s.data.last_dragging_mode.is_transforming_transformables()) =>
            {
                self.last_drag_gizmo_start_transform.location()
            }
            None => location,
        };

        let mut line_width = self.config.gizmo.snap_grid_line_width;
        while line_width > KINDA_SMALL_NUMBER && grid_size < line_width * 3.0 {
            line_width *= 0.5;
        }

        let pulse = make_pulsating_value(self.time, 0.5, 0.0);
        self.snap_grid.transform = Transform::new(
            gizmo_to_world.rotation,
            location,
            Vec3::splat(size / SNAP_GRID_MESH_SIZE),
        );
        self.snap_grid.center = center;
        self.snap_grid.radius = size * 0.5;
        self.snap_grid.color =
            LinearColor::lerp_using_hsv(LinearColor::WHITE, LinearColor::YELLOW, pulse).with_opacity(self.gizmo.animation_alpha);
        self.snap_grid.interval = grid_size;
        self.snap_grid.line_width = line_width;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::gizmo::{GizmoHandleKind, GizmoSpace};
    use crate::interaction::StartDragParams;
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};
    use vwi_core::{InteractionConfig, Transform};

    #[test]
    fn test_gizmo_follows_last_transformable() {
        let mut rig = Rig::new(InteractionConfig::default());
        rig.select_transforms(vec![Transform::from_rotation_translation(
            Quat::from_rotation_z(0.5),
            Vec3::new(5.0, 6.0, 7.0),
        )]);

        let gizmo = rig.engine.gizmo();
        assert!(gizmo.visible);
        assert_eq!(gizmo.gizmo_to_world.location(), Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(gizmo.gizmo_to_world.rotation, Quat::IDENTITY);
        assert_eq!(gizmo.handles.len(), 33);

        rig.engine.set_gizmo_space(GizmoSpace::Local);
        let rotation = rig.engine.gizmo().gizmo_to_world.rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_z(0.5), 1e-5));
    }

    #[test]
    fn test_multiple_selection_pivots_on_bounds_center() {
        let mut rig = Rig::new(InteractionConfig::default());
        rig.select_boxes(&[Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]);
        let gizmo = rig.engine.gizmo();
        assert_relative_eq!(gizmo.gizmo_to_world.location().x, 50.0);
        assert_relative_eq!(gizmo.local_bounds.min.x, -60.0);
        assert_relative_eq!(gizmo.local_bounds.max.x, 60.0);
    }

    #[test]
    fn test_empty_selection_hides_gizmo() {
        let mut rig = Rig::new(InteractionConfig::default());
        rig.select_boxes(&[Vec3::ZERO]);
        rig.engine.clear_transformables();
        assert!(!rig.engine.gizmo().visible);
        assert!(rig.engine.gizmo().handles.is_empty());
        assert!(!rig.engine.snap_grid().visible);
    }

    #[test]
    fn test_single_point_hides_orientation_handles() {
        let mut rig = Rig::new(InteractionConfig::default());
        rig.select_points(&[Vec3::ZERO]);
        let gizmo = rig.engine.gizmo();
        assert!(gizmo.visible_handles().all(|h| !h.kind.needs_orientation()));
        assert!(gizmo.visible_handles().any(|h| h.kind == GizmoHandleKind::Translate));
    }

    #[test]
    fn test_only_dragged_handle_visible_while_dragging() {
        let mut rig = Rig::new(InteractionConfig::default());
        let (hand, _) = rig.add_hand(pointing_down_at(36.0, 0.0));
        rig.select_boxes(&[Vec3::ZERO]);
        rig.tick();
        let hit = rig.engine.interactor_data(hand).unwrap().hover_location.unwrap();
        let handle = rig.engine.interactor_data(hand).unwrap().hovered_handle.unwrap();

        rig.engine
            .start_dragging(StartDragParams::new(hand, hit).with_handle(handle))
            .unwrap();
        let visible: Vec<_> = rig.engine.gizmo().visible_handles().map(|h| h.id).collect();
        assert_eq!(visible, vec![handle]);

        rig.engine.stop_dragging(hand).unwrap();
        assert_eq!(rig.engine.gizmo().visible_handles().count(), 33);
    }

    #[test]
    fn test_snap_grid_sits_under_selection() {
        let mut config = InteractionConfig::default();
        config.snap.grid_enabled = true;
        config.snap.grid_size = 5.0;
        let mut rig = Rig::new(config);
        rig.select_boxes(&[Vec3::new(0.0, 0.0, 40.0)]);

        let grid = rig.engine.snap_grid();
        assert!(grid.visible);
        assert_relative_eq!(grid.transform.location().z, 30.1, epsilon = 1e-4);
        // 20 unit footprint times the default multiplier of 3.
        assert_relative_eq!(grid.radius, 30.0, epsilon = 1e-4);
        assert_eq!(grid.interval, 5.0);
        // The default 3 unit line is halved until it is under a third of the interval.
        assert_relative_eq!(grid.line_width, 1.5);
    }
}
