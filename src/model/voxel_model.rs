use std::fmt;

use itertools::iproduct;
use nalgebra::{Vector3, Vector4};
use ndarray::Array3;

/// Color given to every voxel of a freshly built model.
pub const MODEL_COLOR: [f32; 4] = [50.0, 168.0, 141.0, 1.0];
/// Color given to occupied voxels that no carving pass has evaluated.
pub const UNSEEN_COLOR: [f32; 4] = [204.0, 0.0, 0.0, 1.0];
/// Carved voxel. Also returned for any out-of-range lookup.
pub const EMPTY_VOXEL: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Integer voxel index `(x, y, z)`.
pub type VoxelCoord = Vector3<usize>;

/// A color seen by one camera, together with the camera-to-voxel distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorObservation {
    pub color: Vector3<f32>,
    pub depth: f32,
}

/// Dense voxel grid. Each voxel holds `(r, g, b, occupancy)`; an occupancy of exactly
/// zero means carved.
///
/// Voxels are stored flattened with `index = x + size_x * (y + size_y * z)`.
#[derive(Clone, Debug)]
pub struct VoxelModel {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    voxel_size: f32,
    voxels: Vec<Vector4<f32>>,
    colors: Vec<Vec<ColorObservation>>,
    seen: Vec<bool>,
}

impl VoxelModel {
    /// Creates a fully occupied model filled with [`MODEL_COLOR`].
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z` - Grid resolution, each must be at least 1.
    /// * `voxel_size` - Edge length of a voxel in world units, must be positive.
    pub fn new(x: usize, y: usize, z: usize, voxel_size: f32) -> Self {
        let len = x * y * z;
        Self {
            size_x: x,
            size_y: y,
            size_z: z,
            voxel_size,
            voxels: vec![Vector4::from(MODEL_COLOR); len],
            colors: vec![Vec::new(); len],
            seen: vec![false; len],
        }
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    pub fn size_z(&self) -> usize {
        self.size_z
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        (self.size_x, self.size_y, self.size_z)
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    fn flatten(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.size_x * (y + self.size_y * z)
    }

    /// Position of a voxel in the flattened storage, for arenas sized [`Self::len`].
    #[inline]
    pub fn linear_index(&self, voxel: &VoxelCoord) -> usize {
        self.flatten(voxel[0], voxel[1], voxel[2])
    }

    #[inline]
    pub fn contains(&self, x: isize, y: isize, z: isize) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.size_x
            && (y as usize) < self.size_y
            && (z as usize) < self.size_z
    }

    /// Returns the voxel value, or [`EMPTY_VOXEL`] outside the grid.
    pub fn get(&self, x: isize, y: isize, z: isize) -> Vector4<f32> {
        if !self.contains(x, y, z) {
            return Vector4::from(EMPTY_VOXEL);
        }
        self.voxels[self.flatten(x as usize, y as usize, z as usize)]
    }

    pub fn voxel(&self, voxel: &VoxelCoord) -> Vector4<f32> {
        self.get(voxel[0] as isize, voxel[1] as isize, voxel[2] as isize)
    }

    /// Writes a voxel. The coordinates must be inside the grid.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: Vector4<f32>) {
        let index = self.flatten(x, y, z);
        self.voxels[index] = value;
    }

    pub fn set_voxel(&mut self, voxel: &VoxelCoord, value: Vector4<f32>) {
        self.set(voxel[0], voxel[1], voxel[2], value);
    }

    pub fn is_occupied(&self, x: isize, y: isize, z: isize) -> bool {
        self.get(x, y, z)[3] != 0.0
    }

    /// Marks the voxel as empty.
    pub fn carve(&mut self, x: usize, y: usize, z: usize) {
        self.set(x, y, z, Vector4::from(EMPTY_VOXEL));
    }

    /// True when all six face neighbors are occupied. Voxels on the grid border are
    /// never inner.
    pub fn is_inner(&self, x: usize, y: usize, z: usize) -> bool {
        let (x, y, z) = (x as isize, y as isize, z as isize);
        self.is_occupied(x - 1, y, z)
            && self.is_occupied(x + 1, y, z)
            && self.is_occupied(x, y - 1, z)
            && self.is_occupied(x, y + 1, z)
            && self.is_occupied(x, y, z - 1)
            && self.is_occupied(x, y, z + 1)
    }

    /// Homogeneous world position of a voxel. The grid x and y axes are swapped
    /// and z grows towards negative world z.
    pub fn to_world(&self, x: usize, y: usize, z: usize) -> Vector4<f32> {
        Vector4::new(
            y as f32 * self.voxel_size,
            x as f32 * self.voxel_size,
            -(z as f32) * self.voxel_size,
            1.0,
        )
    }

    pub fn voxel_to_world(&self, voxel: &VoxelCoord) -> Vector4<f32> {
        self.to_world(voxel[0], voxel[1], voxel[2])
    }

    pub fn see(&mut self, x: usize, y: usize, z: usize) {
        let index = self.flatten(x, y, z);
        self.seen[index] = true;
    }

    pub fn seen(&self, x: usize, y: usize, z: usize) -> bool {
        self.seen[self.flatten(x, y, z)]
    }

    pub fn visit(&mut self, voxel: &VoxelCoord) {
        self.see(voxel[0], voxel[1], voxel[2]);
    }

    pub fn visited(&self, voxel: &VoxelCoord) -> bool {
        self.seen(voxel[0], voxel[1], voxel[2])
    }

    pub fn add_color(&mut self, x: usize, y: usize, z: usize, color: Vector3<f32>, depth: f32) {
        let index = self.flatten(x, y, z);
        self.colors[index].push(ColorObservation { color, depth });
    }

    pub fn colors(&self, x: usize, y: usize, z: usize) -> &[ColorObservation] {
        &self.colors[self.flatten(x, y, z)]
    }

    /// Drops every collected color observation, keeping the allocations.
    pub fn clear_colors(&mut self) {
        self.colors.iter_mut().for_each(|observations| observations.clear());
    }

    /// Paints every voxel that was never seen by a carving pass with [`UNSEEN_COLOR`],
    /// leaving its occupancy untouched.
    ///
    /// # Returns
    ///
    /// * The number of unseen voxels.
    pub fn handle_unseen(&mut self) -> usize {
        let mut count = 0;
        for (voxel, seen) in self.voxels.iter_mut().zip(self.seen.iter()) {
            if !seen {
                let occupancy = voxel[3];
                *voxel = Vector4::from(UNSEEN_COLOR);
                voxel[3] = occupancy;
                count += 1;
            }
        }
        count
    }

    pub fn occupied_count(&self) -> usize {
        self.voxels.iter().filter(|v| v[3] != 0.0).count()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.iter().filter(|s| **s).count()
    }

    /// Iterates all voxel coordinates, x outermost and z innermost.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        iproduct!(0..self.size_x, 0..self.size_y, 0..self.size_z)
    }

    /// The occupancy channel as a scalar field indexed `[x, y, z]`, for mesh extraction.
    pub fn occupancy_field(&self) -> Array3<f32> {
        Array3::from_shape_fn(self.dim(), |(x, y, z)| {
            self.voxels[self.flatten(x, y, z)][3]
        })
    }
}

impl fmt::Display for VoxelModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for z in 0..self.size_z {
            writeln!(f, "z = {z}:")?;
            for y in 0..self.size_y {
                for x in 0..self.size_x {
                    let v = self.voxels[self.flatten(x, y, z)];
                    write!(f, "({}, {}, {}, {})", v[0], v[1], v[2], v[3])?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
