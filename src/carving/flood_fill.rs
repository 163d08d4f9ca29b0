use std::collections::VecDeque;

use tracing::info;

use super::{carve_voxel, CarveStrategy, CarveSummary};
use crate::{
    frame::Frame,
    model::{VoxelCoord, VoxelModel},
};

/// Breadth-first carving seeded at voxel `(0, 0, 0)`. Only the face neighbors of carved
/// voxels are tested next, so the cost follows the carved volume instead of the whole
/// grid.
///
/// This is an under-approximation: carved regions that are not connected to the
/// origin through carved voxels are never reached and stay occupied and unseen.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloodFillCarve;

const FACE_OFFSETS: [(isize, isize, isize); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

fn face_neighbors(
    model: &VoxelModel,
    voxel: VoxelCoord,
) -> impl Iterator<Item = VoxelCoord> + '_ {
    FACE_OFFSETS.iter().filter_map(move |(dx, dy, dz)| {
        let (x, y, z) = (
            voxel[0] as isize + dx,
            voxel[1] as isize + dy,
            voxel[2] as isize + dz,
        );
        if model.contains(x, y, z) {
            Some(VoxelCoord::new(x as usize, y as usize, z as usize))
        } else {
            None
        }
    })
}

impl CarveStrategy for FloodFillCarve {
    fn carve(&self, model: &mut VoxelModel, frames: &[Frame]) -> CarveSummary {
        let mut summary = CarveSummary::default();
        if model.is_empty() {
            return summary;
        }

        // Arena of traversal states indexed like the model storage.
        let mut visited = vec![false; model.len()];
        let mut queue = VecDeque::from([VoxelCoord::zeros()]);

        while let Some(voxel) = queue.pop_front() {
            let index = model.linear_index(&voxel);
            if visited[index] {
                continue;
            }
            visited[index] = true;
            summary.num_visited += 1;

            let (carved, tests) = carve_voxel(model, frames, voxel[0], voxel[1], voxel[2]);
            summary.num_tests += tests;
            if !carved {
                continue;
            }
            summary.num_carved += 1;

            let next = face_neighbors(model, voxel)
                .filter(|neighbor| !visited[model.linear_index(neighbor)])
                .collect::<Vec<_>>();
            queue.extend(next);
        }

        info!(
            visited = summary.num_visited,
            tests = summary.num_tests,
            carved = summary.num_carved,
            "flood fill carving finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        carving::ExhaustiveCarve,
        unit_test::{disc_mask, oblique_origin_frame, top_down_frame, TopDownScene},
    };
    use rstest::rstest;

    fn occupancy(model: &VoxelModel) -> Vec<bool> {
        model
            .indices()
            .map(|(x, y, z)| model.is_occupied(x as isize, y as isize, z as isize))
            .collect()
    }

    #[test]
    fn test_face_neighbors() {
        let model = VoxelModel::new(3, 3, 3, 1.0);
        assert_eq!(face_neighbors(&model, VoxelCoord::zeros()).count(), 3);
        assert_eq!(face_neighbors(&model, VoxelCoord::new(1, 1, 1)).count(), 6);
        assert_eq!(face_neighbors(&model, VoxelCoord::new(2, 1, 0)).count(), 4);
    }

    #[rstest]
    fn test_matches_exhaustive_on_connected_region(top_down_frame: TopDownScene) {
        let TopDownScene { model, frame } = top_down_frame;
        let mut second = frame.clone();
        second.mask = disc_mask(400, 400, 30.0);
        let frames = [frame, second];

        let mut exhaustive = model.clone();
        let exhaustive_summary = ExhaustiveCarve.carve(&mut exhaustive, &frames);
        let mut flood = model;
        let flood_summary = FloodFillCarve.carve(&mut flood, &frames);

        assert_eq!(occupancy(&flood), occupancy(&exhaustive));
        assert_eq!(flood_summary.num_carved, exhaustive_summary.num_carved);
        assert!(flood_summary.num_tests <= exhaustive_summary.num_tests);
    }

    #[rstest]
    fn test_misses_disconnected_region(top_down_frame: TopDownScene) {
        let TopDownScene { model, mut frame } = top_down_frame;
        // Everything is foreground except a hole on the optical axis.
        frame.mask = disc_mask(400, 400, 10.0).mapv(|v| if v > 0 { 0 } else { 255 });
        let frames = [frame];

        let mut exhaustive = model.clone();
        ExhaustiveCarve.carve(&mut exhaustive, &frames);
        let mut flood = model;
        let summary = FloodFillCarve.carve(&mut flood, &frames);

        assert_eq!(summary.num_visited, 1);
        assert_eq!(summary.num_carved, 0);
        assert_eq!(flood.occupied_count(), flood.len());
        assert_eq!(flood.seen_count(), 1);
        assert!(exhaustive.occupied_count() < exhaustive.len());
        // Flood fill never removes more than the exhaustive pass.
        for (f, e) in occupancy(&flood).iter().zip(occupancy(&exhaustive)) {
            assert!(*f || !e);
        }
    }

    #[test]
    fn test_unjudged_neighbors_stay_unseen() {
        let mut model = VoxelModel::new(2, 2, 2, 1.0);
        let summary = FloodFillCarve.carve(&mut model, &[oblique_origin_frame(0)]);

        assert_eq!(summary.num_carved, 1);
        // The origin plus its three face neighbors.
        assert_eq!(summary.num_visited, 4);
        assert_eq!(model.seen_count(), 1);
        assert!(model.seen(0, 0, 0));
        assert_eq!(model.occupied_count(), 7);
    }
}
