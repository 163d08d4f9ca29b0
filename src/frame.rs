use ndarray::{Array2, Array3};

use crate::{
    camera::PinholeCamera,
    error::{Error, Result},
};

/// One captured view: its calibrated camera, the (undistorted) color image with shape
/// `[height, width, 3]` and the foreground mask with shape `[height, width]`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub camera: PinholeCamera,
    pub image: Array3<u8>,
    pub mask: Array2<u8>,
}

impl Frame {
    /// Creates a frame, checking that image, mask and camera agree on the size.
    pub fn new(camera: PinholeCamera, image: Array3<u8>, mask: Array2<u8>) -> Result<Self> {
        let frame = Self {
            camera,
            image,
            mask,
        };
        frame.validate()?;
        Ok(frame)
    }

    pub fn width(&self) -> usize {
        self.mask.ncols()
    }

    pub fn height(&self) -> usize {
        self.mask.nrows()
    }

    pub fn validate(&self) -> Result<()> {
        let (height, width, channels) = self.image.dim();
        if channels != 3 {
            return Err(Error::invalid_parameter(format!(
                "Color image must have 3 channels, got {channels}"
            )));
        }
        if self.mask.dim() != (height, width) {
            return Err(Error::invalid_parameter(format!(
                "Mask size {:?} does not match image size {:?}",
                self.mask.dim(),
                (height, width)
            )));
        }
        if (self.camera.height, self.camera.width) != (height, width) {
            return Err(Error::invalid_parameter(format!(
                "Camera size {}x{} does not match image size {}x{}",
                self.camera.width, self.camera.height, width, height
            )));
        }
        Ok(())
    }
}

/// Checks every frame before running the carving and coloring loops.
pub fn validate_frames(frames: &[Frame]) -> Result<()> {
    if frames.is_empty() {
        return Err(Error::invalid_parameter("No frames to reconstruct from"));
    }
    frames.iter().try_for_each(Frame::validate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::CameraIntrinsics, transform::Transform};

    fn camera(width: usize, height: usize) -> PinholeCamera {
        PinholeCamera::new(
            CameraIntrinsics::from_simple_intrinsic(10.0, 10.0, 5.0, 5.0),
            Transform::eye(),
            width,
            height,
        )
    }

    #[test]
    fn test_frame_validation() {
        assert!(Frame::new(
            camera(4, 3),
            Array3::zeros((3, 4, 3)),
            Array2::zeros((3, 4))
        )
        .is_ok());

        assert!(matches!(
            Frame::new(camera(4, 3), Array3::zeros((3, 4, 3)), Array2::zeros((4, 3))),
            Err(Error::InvalidParameter(_))
        ));
        assert!(Frame::new(camera(5, 3), Array3::zeros((3, 4, 3)), Array2::zeros((3, 4))).is_err());
        assert!(Frame::new(camera(4, 3), Array3::zeros((3, 4, 1)), Array2::zeros((3, 4))).is_err());
        assert!(validate_frames(&[]).is_err());
    }
}
