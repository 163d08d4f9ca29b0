use nalgebra::{Vector3, Vector4};
use ordered_float::OrderedFloat;
use serde_derive::{Deserialize, Serialize};
use tracing::info;

use crate::{
    frame::Frame,
    image::pixel_color,
    model::{ColorObservation, VoxelModel},
};

/// How the observations of a voxel become its color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Color seen by the closest camera. Exact depth ties keep the first frame.
    #[default]
    Nearest,
    /// Per channel mean, rounded to the nearest integer.
    Average,
}

impl FusionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            FusionPolicy::Nearest => "nearest",
            FusionPolicy::Average => "average",
        }
    }

    pub fn fuse(&self, observations: &[ColorObservation]) -> Option<Vector4<f32>> {
        match self {
            FusionPolicy::Nearest => nearest_color(observations),
            FusionPolicy::Average => average_color(observations),
        }
    }
}

impl std::str::FromStr for FusionPolicy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(FusionPolicy::Nearest),
            "average" => Ok(FusionPolicy::Average),
            _ => Err(crate::error::Error::invalid_parameter(format!(
                "Invalid fusion policy: {s}"
            ))),
        }
    }
}

/// Color of the observation with the smallest depth. On exact ties the first one
/// wins, so the result depends on frame order.
pub fn nearest_color(observations: &[ColorObservation]) -> Option<Vector4<f32>> {
    observations
        .iter()
        .min_by_key(|observation| OrderedFloat(observation.depth))
        .map(|observation| observation.color.push(1.0))
}

pub fn average_color(observations: &[ColorObservation]) -> Option<Vector4<f32>> {
    if observations.is_empty() {
        return None;
    }

    let sum = observations
        .iter()
        .fold(Vector3::<f32>::zeros(), |sum, observation| {
            sum + observation.color
        });
    let mean = sum / observations.len() as f32;
    Some(mean.map(f32::round).push(1.0))
}

#[derive(Debug, Clone, Copy)]
pub struct FusionParameters {
    pub policy: FusionPolicy,
    /// Skip voxels whose six neighbors are all occupied, no camera can see them.
    pub skip_inner: bool,
}

impl Default for FusionParameters {
    fn default() -> Self {
        FusionParameters {
            policy: FusionPolicy::Nearest,
            skip_inner: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionSummary {
    pub num_colored: usize,
    pub num_unobserved: usize,
    pub num_inner: usize,
    pub num_observations: usize,
}

/// Assigns colors to the surface of a carved model from the frames' color images.
pub struct ColorFusion {
    params: FusionParameters,
}

impl ColorFusion {
    pub fn new(params: FusionParameters) -> Self {
        ColorFusion { params }
    }

    /// Projects every occupied surface voxel into every frame and stores the pixel color
    /// and camera distance of each in-bounds projection in the model.
    pub fn gather(&self, model: &mut VoxelModel, frames: &[Frame]) -> FusionSummary {
        let mut summary = FusionSummary::default();
        let centers = frames
            .iter()
            .map(|frame| frame.camera.center())
            .collect::<Vec<_>>();

        let (size_x, size_y, size_z) = model.dim();
        for x in 0..size_x {
            for y in 0..size_y {
                for z in 0..size_z {
                    if !model.is_occupied(x as isize, y as isize, z as isize) {
                        continue;
                    }
                    if self.params.skip_inner && model.is_inner(x, y, z) {
                        summary.num_inner += 1;
                        continue;
                    }

                    let world = model.to_world(x, y, z).xyz();
                    for (frame, center) in frames.iter().zip(centers.iter()) {
                        if let Some((u, v)) = frame.camera.project_if_visible(&world) {
                            let color = pixel_color(&frame.image, u, v);
                            model.add_color(x, y, z, color, (center - world).norm());
                            summary.num_observations += 1;
                        }
                    }
                }
            }
        }

        summary
    }

    /// Replaces the color of every voxel with observations according to the policy.
    /// Voxels without observations keep their color.
    pub fn fuse(&self, model: &mut VoxelModel, summary: &mut FusionSummary) {
        let (size_x, size_y, size_z) = model.dim();
        for x in 0..size_x {
            for y in 0..size_y {
                for z in 0..size_z {
                    if !model.is_occupied(x as isize, y as isize, z as isize) {
                        continue;
                    }
                    let fused = self.params.policy.fuse(model.colors(x, y, z));
                    match fused {
                        Some(color) => {
                            model.set(x, y, z, color);
                            summary.num_colored += 1;
                        }
                        None if self.params.skip_inner && model.is_inner(x, y, z) => (),
                        None => summary.num_unobserved += 1,
                    }
                }
            }
        }
    }

    /// Clears previous observations, gathers new ones and fuses them.
    pub fn integrate(&self, model: &mut VoxelModel, frames: &[Frame]) -> FusionSummary {
        model.clear_colors();
        let mut summary = self.gather(model, frames);
        self.fuse(model, &mut summary);

        info!(
            policy = self.params.policy.name(),
            colored = summary.num_colored,
            unobserved = summary.num_unobserved,
            inner = summary.num_inner,
            observations = summary.num_observations,
            "color fusion finished"
        );
        summary
    }
}
