//! Silhouette carving. Voxels projecting onto background pixels of any view are emptied.
//!
//! Two strategies share the same per-view test:
//!
//! * [`ExhaustiveCarve`] tests every voxel against every view. Always matches the
//!   intersection of the silhouettes.
//! * [`FloodFillCarve`] walks outwards from voxel `(0, 0, 0)` through carved voxels
//!   only. Much cheaper, but misses carved regions that are not connected to the origin.

use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};

use crate::{frame::Frame, image::is_background, model::VoxelModel};

mod exhaustive;
pub use exhaustive::ExhaustiveCarve;

mod flood_fill;
pub use flood_fill::FloodFillCarve;

/// Outcome of testing one voxel against one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Projects outside the image (or behind the camera): the view says nothing.
    NotJudged,
    Foreground,
    Background,
}

/// Projects a world point into the frame and samples its mask.
pub fn judge(frame: &Frame, world: &Vector3<f32>) -> Verdict {
    match frame.camera.project_if_visible(world) {
        None => Verdict::NotJudged,
        Some((u, v)) => {
            if is_background(&frame.mask, u, v) {
                Verdict::Background
            } else {
                Verdict::Foreground
            }
        }
    }
}

/// Tests a voxel against the frames in order, marking it seen when any frame judges
/// it and carving it on the first background verdict.
///
/// # Returns
///
/// * `(carved, tests)` whether the voxel was carved and the number of projections done.
pub(crate) fn carve_voxel(
    model: &mut VoxelModel,
    frames: &[Frame],
    x: usize,
    y: usize,
    z: usize,
) -> (bool, usize) {
    let world = model.to_world(x, y, z).xyz();
    let mut tests = 0;
    for frame in frames {
        tests += 1;
        match judge(frame, &world) {
            Verdict::NotJudged => continue,
            Verdict::Foreground => model.see(x, y, z),
            Verdict::Background => {
                model.see(x, y, z);
                model.carve(x, y, z);
                return (true, tests);
            }
        }
    }
    (false, tests)
}

/// Counters reported by a carving pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarveSummary {
    /// Voxels the strategy looked at.
    pub num_visited: usize,
    /// Voxel against frame projections performed.
    pub num_tests: usize,
    pub num_carved: usize,
}

/// A way of carving a model against a set of frames.
pub trait CarveStrategy {
    fn carve(&self, model: &mut VoxelModel, frames: &[Frame]) -> CarveSummary;
}

/// Carving strategy selection for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarveMethod {
    #[default]
    Exhaustive,
    FloodFill,
}

impl CarveMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CarveMethod::Exhaustive => "exhaustive",
            CarveMethod::FloodFill => "flood_fill",
        }
    }
}

impl CarveStrategy for CarveMethod {
    fn carve(&self, model: &mut VoxelModel, frames: &[Frame]) -> CarveSummary {
        match self {
            CarveMethod::Exhaustive => ExhaustiveCarve.carve(model, frames),
            CarveMethod::FloodFill => FloodFillCarve.carve(model, frames),
        }
    }
}

impl std::str::FromStr for CarveMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exhaustive" => Ok(CarveMethod::Exhaustive),
            "flood_fill" | "flood-fill" | "floodfill" => Ok(CarveMethod::FloodFill),
            _ => Err(crate::error::Error::invalid_parameter(format!(
                "Invalid carving method: {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_test::{top_down_frame, TopDownScene};
    use ndarray::Array2;
    use rstest::rstest;

    #[rstest]
    fn test_judge(top_down_frame: TopDownScene) {
        let TopDownScene { model, mut frame } = top_down_frame;
        let world = model.to_world(0, 0, 0).xyz();

        frame.mask.fill(255);
        assert_eq!(judge(&frame, &world), Verdict::Foreground);
        frame.mask.fill(0);
        assert_eq!(judge(&frame, &world), Verdict::Background);
        assert_eq!(
            judge(&frame, &Vector3::new(1000.0, 0.0, 0.0)),
            Verdict::NotJudged
        );
    }

    #[rstest]
    fn test_carve_voxel_short_circuits(top_down_frame: TopDownScene) {
        let TopDownScene { mut model, frame } = top_down_frame;
        let mut background = frame.clone();
        background.mask = Array2::zeros(frame.mask.dim());

        let (carved, tests) =
            carve_voxel(&mut model, &[background, frame.clone(), frame], 1, 1, 1);
        assert!(carved);
        assert_eq!(tests, 1);
        assert!(model.seen(1, 1, 1));
        assert!(!model.is_occupied(1, 1, 1));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            "flood-fill".parse::<CarveMethod>().unwrap(),
            CarveMethod::FloodFill
        );
        assert_eq!(
            "exhaustive".parse::<CarveMethod>().unwrap(),
            CarveMethod::Exhaustive
        );
        assert!("random".parse::<CarveMethod>().is_err());
        assert_eq!(
            serde_json::from_str::<CarveMethod>("\"flood_fill\"").unwrap(),
            CarveMethod::FloodFill
        );
    }
}
