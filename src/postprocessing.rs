use itertools::iproduct;
use nalgebra::Vector4;
use tracing::info;

use crate::{
    error::{Error, Result},
    model::{VoxelCoord, VoxelModel, EMPTY_VOXEL},
};

/// Counters reported by [`apply_closure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosingSummary {
    /// Voxels grown by the dilation pass.
    pub num_dilated: usize,
    /// Previously empty voxels that are occupied after closing.
    pub num_filled: usize,
    /// Previously occupied voxels that are empty after closing.
    pub num_removed: usize,
}

/// The `(2 * radius + 1)^3` window around a voxel, clipped to the grid.
fn window(
    dim: (usize, usize, usize),
    voxel: (usize, usize, usize),
    radius: usize,
) -> impl Iterator<Item = (usize, usize, usize)> {
    let axis = |center: usize, size: usize| {
        center.saturating_sub(radius)..=(center + radius).min(size - 1)
    };
    iproduct!(
        axis(voxel.0, dim.0),
        axis(voxel.1, dim.1),
        axis(voxel.2, dim.2)
    )
}

/// Occupied voxels are copied, empty voxels with occupied voxels in their window take
/// the mean of those. Returns the grown voxels in the model's flattened order.
fn dilate(model: &VoxelModel, radius: usize) -> (Vec<Vector4<f32>>, usize) {
    let mut dilated = vec![Vector4::from(EMPTY_VOXEL); model.len()];
    let mut num_dilated = 0;

    for (x, y, z) in model.indices() {
        let index = model.linear_index(&VoxelCoord::new(x, y, z));
        let value = model.voxel(&VoxelCoord::new(x, y, z));
        if value[3] != 0.0 {
            dilated[index] = value;
            continue;
        }

        let mut count = 0;
        let mut sum = Vector4::<f32>::zeros();
        for (i, j, k) in window(model.dim(), (x, y, z), radius) {
            let neighbor = model.voxel(&VoxelCoord::new(i, j, k));
            if neighbor[3] != 0.0 {
                count += 1;
                sum += neighbor;
            }
        }
        if count > 0 {
            dilated[index] = sum / count as f32;
            num_dilated += 1;
        }
    }

    (dilated, num_dilated)
}

/// Morphological closing of the occupancy: a dilation followed by an erosion with a
/// cubic kernel of `kernel_size` voxels per side. Windows are clipped at the grid
/// border; voxels outside the grid take no part.
///
/// Fills holes smaller than the kernel. Filled voxels take the mean color of their
/// occupied neighbors.
///
/// # Arguments
///
/// * `model` - The carved model, modified in place.
/// * `kernel_size` - Odd kernel size. 1 leaves the model unchanged.
///
/// # Errors
///
/// * `InvalidParameter` if the kernel size is even. The model is not modified.
pub fn apply_closure(model: &mut VoxelModel, kernel_size: usize) -> Result<ClosingSummary> {
    if kernel_size % 2 != 1 {
        return Err(Error::invalid_parameter(format!(
            "Closing kernel size must be odd, got {kernel_size}"
        )));
    }
    let radius = (kernel_size - 1) / 2;
    info!(kernel_size, "starting closing");

    let (dilated, num_dilated) = dilate(model, radius);
    let mut summary = ClosingSummary {
        num_dilated,
        ..Default::default()
    };

    let dim = model.dim();
    for (x, y, z) in model.indices() {
        let voxel = VoxelCoord::new(x, y, z);
        let index = model.linear_index(&voxel);
        if dilated[index][3] == 0.0 {
            // Empty after dilation means empty in the original as well.
            continue;
        }

        let was_occupied = model.voxel(&voxel)[3] != 0.0;
        let eroded = window(dim, (x, y, z), radius)
            .any(|(i, j, k)| dilated[model.linear_index(&VoxelCoord::new(i, j, k))][3] == 0.0);

        if eroded {
            // Voxels empty in the original are kept as they were.
            if was_occupied {
                model.set_voxel(&voxel, Vector4::from(EMPTY_VOXEL));
                summary.num_removed += 1;
            }
        } else {
            model.set_voxel(&voxel, dilated[index]);
            if !was_occupied {
                summary.num_filled += 1;
            }
        }
    }

    info!(
        dilated = summary.num_dilated,
        filled = summary.num_filled,
        removed = summary.num_removed,
        "closing finished"
    );
    Ok(summary)
}
