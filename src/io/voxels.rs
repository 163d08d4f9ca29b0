use nalgebra::Vector4;
use ndarray::Array2;

use super::Geometry;
use crate::model::VoxelModel;

/// Corner `i` of a cube has offset `-1/+1` on x, y, z given by bits 0, 1, 2 of `i`.
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 2, 3, 1],
    [4, 5, 7, 6],
];

fn rgb(value: &Vector4<f32>) -> [u8; 3] {
    [0, 1, 2].map(|c| value[c].round().clamp(0.0, 255.0) as u8)
}

/// Voxels that appear in the exported geometry: occupied and not enclosed by six
/// occupied neighbors.
fn surface_voxels(model: &VoxelModel) -> Vec<(usize, usize, usize)> {
    model
        .indices()
        .filter(|&(x, y, z)| {
            model.is_occupied(x as isize, y as isize, z as isize) && !model.is_inner(x, y, z)
        })
        .collect()
}

/// One axis aligned cube per surface voxel, in world coordinates. Each cube has 8
/// vertices and 6 quad faces colored with the voxel color.
pub fn voxel_cube_geometry(model: &VoxelModel) -> Geometry {
    let voxels = surface_voxels(model);
    let half = model.voxel_size() * 0.5;

    let mut points = Array2::<f32>::zeros((voxels.len() * 8, 3));
    let mut faces = Array2::<usize>::zeros((voxels.len() * 6, 4));
    let mut face_colors = Array2::<u8>::zeros((voxels.len() * 6, 3));

    for (n, &(x, y, z)) in voxels.iter().enumerate() {
        let center = model.to_world(x, y, z);
        for corner in 0..8 {
            for axis in 0..3 {
                let sign = if corner & (1 << axis) == 0 { -1.0 } else { 1.0 };
                points[[n * 8 + corner, axis]] = center[axis] + sign * half;
            }
        }

        let color = rgb(&model.get(x as isize, y as isize, z as isize));
        for (f, face) in CUBE_FACES.iter().enumerate() {
            for (k, corner) in face.iter().enumerate() {
                faces[[n * 6 + f, k]] = n * 8 + corner;
            }
            for c in 0..3 {
                face_colors[[n * 6 + f, c]] = color[c];
            }
        }
    }

    Geometry {
        points,
        colors: None,
        faces: Some(faces),
        face_colors: Some(face_colors),
    }
}

/// World positions and colors of the surface voxel centers.
pub fn voxel_cloud_geometry(model: &VoxelModel) -> Geometry {
    let voxels = surface_voxels(model);
    let mut points = Array2::<f32>::zeros((voxels.len(), 3));
    let mut colors = Array2::<u8>::zeros((voxels.len(), 3));

    for (n, &(x, y, z)) in voxels.iter().enumerate() {
        let center = model.to_world(x, y, z);
        let color = rgb(&model.get(x as isize, y as isize, z as isize));
        for c in 0..3 {
            points[[n, c]] = center[c];
            colors[[n, c]] = color[c];
        }
    }

    let mut geometry = Geometry::from_points(points);
    geometry.colors = Some(colors);
    geometry
}
