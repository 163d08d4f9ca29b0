use nalgebra::{UnitQuaternion, Vector3};
use ndarray::{Array2, Array3};
use rstest::fixture;

use crate::{
    camera::{CameraIntrinsics, PinholeCamera},
    frame::Frame,
    model::VoxelModel,
    transform::Transform,
};

pub struct TopDownScene {
    pub model: VoxelModel,
    pub frame: Frame,
}

/// Camera centered above the grid looking down the world -z axis. Every voxel of the
/// model projects inside a `width x height` image.
pub fn top_down_camera(model: &VoxelModel, width: usize, height: usize) -> PinholeCamera {
    let size = model.voxel_size();
    let extent = model.size_x().max(model.size_y()).max(model.size_z()) as f32 * size;
    let eye = Vector3::new(
        (model.size_y() - 1) as f32 * size * 0.5,
        (model.size_x() - 1) as f32 * size * 0.5,
        extent * 1.25 + size,
    );

    PinholeCamera::new(
        CameraIntrinsics::from_simple_intrinsic(
            width as f64 / 4.0,
            width as f64 / 4.0,
            width as f64 / 2.0,
            height as f64 / 2.0,
        ),
        Transform::new(
            eye,
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI),
        ),
        width,
        height,
    )
}

/// Foreground disc of `radius` pixels around the image center, background elsewhere.
pub fn disc_mask(width: usize, height: usize, radius: f32) -> Array2<u8> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    Array2::from_shape_fn((height, width), |(v, u)| {
        let (du, dv) = (u as f32 - cx, v as f32 - cy);
        if (du * du + dv * dv).sqrt() <= radius {
            255
        } else {
            0
        }
    })
}

/// 8x8x8 unit voxel grid seen from above, with a 20 pixel foreground disc. The kept
/// voxels form a cone around the grid's vertical axis.
#[fixture]
pub fn top_down_frame() -> TopDownScene {
    let model = VoxelModel::new(8, 8, 8, 1.0);
    let camera = top_down_camera(&model, 400, 400);
    let mut image = Array3::<u8>::zeros((400, 400, 3));
    image.slice_mut(ndarray::s![.., .., 0]).fill(200);

    TopDownScene {
        frame: Frame {
            camera,
            image,
            mask: disc_mask(400, 400, 20.0),
        },
        model,
    }
}

/// A 1x1 pixel view of a 2x2x2 unit grid whose only pixel sees voxel (0, 0, 0). All
/// other voxels project outside the image.
pub fn oblique_origin_frame(mask_value: u8) -> Frame {
    let camera = PinholeCamera::new(
        CameraIntrinsics::from_simple_intrinsic(100.0, 100.0, 0.5, 0.5),
        Transform::look_at(
            &Vector3::new(-3.0, -5.0, 7.0),
            &Vector3::zeros(),
            &Vector3::z(),
        ),
        1,
        1,
    );

    Frame {
        camera,
        image: Array3::from_elem((1, 1, 3), 90),
        mask: Array2::from_elem((1, 1), mask_value),
    }
}
