//! Actor alignment: snapping the selection's bounds to nearby actors' bounds.
//!
//! Snap points are face centers, edge midpoints and corners of both boxes.
//! A pair of points matches when they are within the snap distance on every
//! free axis; the match needing the smallest offset wins, first found on ties.

use glam::Vec3;
use uuid::Uuid;
use vwi_core::{BoundingBox, LinearColor, Transform};

use crate::scene::SceneQuery;

const NEARLY_ZERO_AXIS: f32 = 1.0e-4;

/// Alignment guide found by the last search, for debug drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideData {
    /// Actor aligned to
    pub aligned_actor: Uuid,
    /// Offset in desired-gizmo space
    pub local_offset: Vec3,
    /// World-space gizmo point that snaps
    pub snap_point: Vec3,
    /// World-space gizmo point after the offset
    pub guide_start: Vec3,
    /// World-space candidate point
    pub guide_end: Vec3,
    /// Guide color
    pub color: LinearColor,
    /// Guide opacity
    pub alpha: f32,
    /// Distance from guide start to guide end
    pub length: f32,
}

/// Inputs of an alignment search.
#[derive(Debug, Clone, Copy)]
pub struct AlignRequest<'a> {
    /// Gizmo transform the result is expressed against
    pub gizmo_start: Transform,
    /// Gizmo transform at the desired location
    pub desired: Transform,
    /// Selection bounds in gizmo space
    pub gizmo_local_bounds: BoundingBox,
    /// Only align along `constraint_axes`
    pub constrain_movement: bool,
    /// World-space axes allowed to move when constrained
    pub constraint_axes: Vec3,
    /// Snap distance as a percentage of the gizmo size
    pub force_snap_distance: f32,
    /// Candidate search radius as a multiple of the gizmo size
    pub align_candidate_distance: f32,
    /// Explicit candidates. Empty means search around the desired location.
    pub candidates: &'a [Uuid],
}

fn snap_points(bounds: &BoundingBox) -> Vec<Vec3> {
    let center = bounds.center();
    bounds.snap_points().into_iter().map(|p| p + center).collect()
}

/// Searches candidates and returns the gizmo-space location offset to apply,
/// with the guide that produced it. A zero offset means nothing aligned.
pub fn find_transform_gizmo_align_point(
    request: &AlignRequest<'_>,
    scene: &dyn SceneQuery,
) -> (Vec3, Option<GuideData>) {
    let desired = request.desired;
    let gizmo_points = snap_points(&request.gizmo_local_bounds);
    let min_guide_length = request.gizmo_local_bounds.half_extents();
    let gizmo_size = min_guide_length.abs().max_element();

    let constraint_axes = if request.constrain_movement {
        request.gizmo_start.inverse_transform_vector(request.constraint_axes)
    } else {
        request.constraint_axes
    };
    let axis_allowed = |axis: usize| !request.constrain_movement || constraint_axes[axis].abs() > NEARLY_ZERO_AXIS;

    let adjusted_snap_distance = (request.force_snap_distance / 100.0) * 2.0 * gizmo_size;
    let matches_needed = if request.constrain_movement {
        (0..3).filter(|axis| axis_allowed(*axis)).count()
    } else {
        3
    };

    let candidates: Vec<_> = if request.candidates.is_empty() {
        let compare_distance = request.align_candidate_distance * gizmo_size;
        scene
            .overlap_sphere(desired.location(), compare_distance)
            .into_iter()
            .filter_map(|id| scene.actor(id))
            .filter(|actor| actor.is_alignment_candidate())
            .filter(|actor| (desired.location() - actor.transform.location()).abs().min_element() <= compare_distance)
            .collect()
    } else {
        request
            .candidates
            .iter()
            .filter_map(|id| scene.actor(*id))
            .filter(|actor| actor.is_alignment_candidate())
            .collect()
    };

    let mut best: Option<GuideData> = None;
    let mut best_offset_size = f32::MAX;

    for candidate in &candidates {
        for local_candidate_point in snap_points(&candidate.local_bounds) {
            let world_candidate_point = candidate.transform.transform_position(local_candidate_point);
            let desired_space_candidate_point = desired.inverse_transform_position(world_candidate_point);

            for gizmo_point in &gizmo_points {
                let mut matching_axes = 0;
                let mut offset = Vec3::ZERO;
                for axis in 0..3 {
                    let difference = desired_space_candidate_point[axis] - gizmo_point[axis];
                    if difference.abs() <= adjusted_snap_distance && axis_allowed(axis) {
                        matching_axes += 1;
                        offset[axis] = difference;
                    }
                }
                if matching_axes < matches_needed {
                    continue;
                }

                let offset_size = offset.length();
                if offset_size < best_offset_size && offset_size > NEARLY_ZERO_AXIS {
                    let guide_start = desired.transform_position(*gizmo_point + offset);
                    best_offset_size = offset_size;
                    best = Some(GuideData {
                        aligned_actor: candidate.id,
                        local_offset: offset,
                        snap_point: desired.transform_position(*gizmo_point),
                        guide_start,
                        guide_end: world_candidate_point,
                        color: LinearColor::YELLOW,
                        alpha: 1.0,
                        length: world_candidate_point.distance(guide_start),
                    });
                }
            }
        }
    }

    match best {
        Some(guide) => {
            let offset = request.gizmo_start.inverse_transform_position(guide.guide_start)
                - request.gizmo_start.inverse_transform_position(guide.snap_point);
            (offset, Some(guide))
        }
        None => (Vec3::ZERO, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ActorInfo, RayHit};

    struct BoxScene(Vec<ActorInfo>);

    impl SceneQuery for BoxScene {
        fn raycast(&self, _start: Vec3, _end: Vec3, _ignored: &[Uuid]) -> Option<RayHit> {
            None
        }

        fn overlap_sphere(&self, _center: Vec3, _radius: f32) -> Vec<Uuid> {
            self.0.iter().map(|a| a.id).collect()
        }

        fn actor(&self, id: Uuid) -> Option<ActorInfo> {
            self.0.iter().find(|a| a.id == id).cloned()
        }
    }

    fn cube_actor(location: Vec3) -> ActorInfo {
        ActorInfo {
            id: Uuid::new_v4(),
            transform: Transform::from_translation(location),
            local_bounds: BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(10.0)),
            hidden: false,
            editor_only: false,
            selected: false,
        }
    }

    fn request<'a>(desired: Vec3) -> AlignRequest<'a> {
        AlignRequest {
            gizmo_start: Transform::IDENTITY,
            desired: Transform::from_translation(desired),
            gizmo_local_bounds: BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::splat(10.0)),
            constrain_movement: false,
            constraint_axes: Vec3::ZERO,
            force_snap_distance: 25.0,
            align_candidate_distance: 2.0,
            candidates: &[],
        }
    }

    #[test]
    fn test_aligns_faces_of_neighbouring_cubes() {
        let scene = BoxScene(vec![cube_actor(Vec3::new(100.0, 0.0, 0.0))]);
        let (offset, guide) = find_transform_gizmo_align_point(&request(Vec3::new(81.0, 0.0, 0.0)), &scene);
        assert!(offset.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-4));
        let guide = guide.unwrap();
        assert!(guide.guide_end.abs_diff_eq(guide.guide_start, 1e-4));
        assert_eq!(guide.aligned_actor, scene.0[0].id);
    }

    #[test]
    fn test_equal_offsets_keep_first_candidate() {
        // Mirrored neighbours, each one unit away from a face of the selection.
        let right = cube_actor(Vec3::new(100.0, 0.0, 0.0));
        let left = cube_actor(Vec3::new(62.0, 0.0, 0.0));
        let (right_id, left_id) = (right.id, left.id);

        let scene = BoxScene(vec![right.clone(), left.clone()]);
        let (offset, guide) = find_transform_gizmo_align_point(&request(Vec3::new(81.0, 0.0, 0.0)), &scene);
        assert_eq!(guide.map(|g| g.aligned_actor), Some(right_id));
        assert!(offset.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-4));

        let scene = BoxScene(vec![left, right]);
        let (offset, guide) = find_transform_gizmo_align_point(&request(Vec3::new(81.0, 0.0, 0.0)), &scene);
        assert_eq!(guide.map(|g| g.aligned_actor), Some(left_id));
        assert!(offset.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_selected_and_hidden_actors_are_skipped() {
        let mut selected = cube_actor(Vec3::new(100.0, 0.0, 0.0));
        selected.selected = true;
        let mut hidden = cube_actor(Vec3::new(100.0, 0.0, 0.0));
        hidden.hidden = true;
        let scene = BoxScene(vec![selected, hidden]);
        let (offset, guide) = find_transform_gizmo_align_point(&request(Vec3::new(81.0, 0.0, 0.0)), &scene);
        assert_eq!(offset, Vec3::ZERO);
        assert!(guide.is_none());
    }

    #[test]
    fn test_constrained_axis_limits_alignment() {
        let scene = BoxScene(vec![cube_actor(Vec3::new(100.0, 2.0, 0.0))]);
        let mut constrained = request(Vec3::new(81.0, 0.0, 0.0));
        constrained.constrain_movement = true;
        constrained.constraint_axes = Vec3::X;
        let (offset, _) = find_transform_gizmo_align_point(&constrained, &scene);
        assert!(offset.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_explicit_candidates_skip_search() {
        let near = cube_actor(Vec3::new(100.0, 0.0, 0.0));
        let far = cube_actor(Vec3::new(81.0, 0.0, 23.0));
        let far_id = far.id;
        let scene = BoxScene(vec![near, far]);
        let mut explicit = request(Vec3::new(81.0, 0.0, 0.0));
        let candidates = [far_id];
        explicit.candidates = &candidates;
        let (offset, guide) = find_transform_gizmo_align_point(&explicit, &scene);
        assert_eq!(guide.map(|g| g.aligned_actor), Some(far_id));
        assert!(offset.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-4));
    }
}
