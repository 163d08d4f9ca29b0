use tracing::info;

use super::{carve_voxel, CarveStrategy, CarveSummary};
use crate::{frame::Frame, model::VoxelModel};

/// Tests every voxel against every frame, in frame order. The result is the exact
/// intersection of the silhouettes whatever the topology of the carved region.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveCarve;

impl CarveStrategy for ExhaustiveCarve {
    fn carve(&self, model: &mut VoxelModel, frames: &[Frame]) -> CarveSummary {
        let mut summary = CarveSummary::default();
        let (size_x, size_y, size_z) = model.dim();

        for x in 0..size_x {
            for y in 0..size_y {
                for z in 0..size_z {
                    let (carved, tests) = carve_voxel(model, frames, x, y, z);
                    summary.num_visited += 1;
                    summary.num_tests += tests;
                    if carved {
                        summary.num_carved += 1;
                    }
                }
            }
        }

        info!(
            visited = summary.num_visited,
            tests = summary.num_tests,
            carved = summary.num_carved,
            "exhaustive carving finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_test::{oblique_origin_frame, top_down_frame, TopDownScene};
    use nalgebra::Vector4;
    use rstest::rstest;

    #[rstest]
    fn test_carves_outside_cone(top_down_frame: TopDownScene) {
        let TopDownScene { mut model, frame } = top_down_frame;
        let summary = ExhaustiveCarve.carve(&mut model, &[frame]);

        assert_eq!(summary.num_visited, 512);
        assert_eq!(summary.num_tests, 512);
        assert!(summary.num_carved > 0 && summary.num_carved < 512);
        assert_eq!(model.occupied_count(), 512 - summary.num_carved);
        assert_eq!(model.seen_count(), 512);

        // Corners are outside the silhouette, the vertical axis is inside.
        assert!(!model.is_occupied(0, 0, 0));
        assert!(!model.is_occupied(7, 7, 7));
        assert!(model.is_occupied(3, 4, 0));
        assert!(model.is_occupied(4, 3, 7));
    }

    #[test]
    fn test_only_judged_voxels_are_seen() {
        let mut model = VoxelModel::new(2, 2, 2, 1.0);
        let before = model.clone();
        let summary = ExhaustiveCarve.carve(&mut model, &[oblique_origin_frame(0)]);

        assert_eq!(summary.num_carved, 1);
        assert!(!model.is_occupied(0, 0, 0));
        assert!(model.seen(0, 0, 0));
        for (x, y, z) in model.indices().skip(1) {
            assert!(!model.seen(x, y, z));
            let (i, j, k) = (x as isize, y as isize, z as isize);
            assert_eq!(model.get(i, j, k), before.get(i, j, k));
        }
        assert_eq!(model.get(0, 0, 0), Vector4::zeros());
    }

    #[test]
    fn test_no_frames() {
        let mut model = VoxelModel::new(2, 2, 2, 1.0);
        let summary = ExhaustiveCarve.carve(&mut model, &[]);
        assert_eq!(summary.num_carved, 0);
        assert_eq!(summary.num_tests, 0);
        assert_eq!(model.seen_count(), 0);
    }
}
