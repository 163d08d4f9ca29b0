use ndarray::{Array2, Array3};

use crate::{
    camera::{CameraIntrinsics, Distortion},
    error::{Error, Result},
};

/// Removes lens distortion from images of a fixed size.
///
/// For every destination pixel the distorted source location is computed once and
/// sampled with nearest neighbour. Pixels mapping outside the source are zero.
pub struct Undistorter {
    width: usize,
    height: usize,
    /// Source `(row, column)` per destination pixel, `None` outside the source.
    map: Option<Array2<Option<(usize, usize)>>>,
}

impl Undistorter {
    pub fn new(
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
        width: usize,
        height: usize,
    ) -> Self {
        if distortion.is_zero() {
            return Self {
                width,
                height,
                map: None,
            };
        }

        let map = Array2::from_shape_fn((height, width), |(v, u)| {
            let x = (u as f64 - intrinsics.cx) / intrinsics.fx;
            let y = (v as f64 - intrinsics.cy) / intrinsics.fy;
            let (xd, yd) = distortion.distort(x, y);
            let su = (xd * intrinsics.fx + intrinsics.cx).round();
            let sv = (yd * intrinsics.fy + intrinsics.cy).round();
            if su >= 0.0 && sv >= 0.0 && su < width as f64 && sv < height as f64 {
                Some((sv as usize, su as usize))
            } else {
                None
            }
        });

        Self {
            width,
            height,
            map: Some(map),
        }
    }

    fn check_size(&self, height: usize, width: usize) -> Result<()> {
        if (height, width) != (self.height, self.width) {
            return Err(Error::invalid_parameter(format!(
                "Image size {width}x{height} does not match the undistortion map {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Undistorts a `[height, width, channels]` image.
    pub fn image(&self, image: &Array3<u8>) -> Result<Array3<u8>> {
        let (height, width, channels) = image.dim();
        self.check_size(height, width)?;
        Ok(match &self.map {
            None => image.clone(),
            Some(map) => Array3::from_shape_fn((height, width, channels), |(v, u, c)| {
                map[(v, u)].map_or(0, |(sv, su)| image[(sv, su, c)])
            }),
        })
    }

    /// Undistorts a `[height, width]` mask.
    pub fn mask(&self, mask: &Array2<u8>) -> Result<Array2<u8>> {
        let (height, width) = mask.dim();
        self.check_size(height, width)?;
        Ok(match &self.map {
            None => mask.clone(),
            Some(map) => map.map(|source| source.map_or(0, |(sv, su)| mask[(sv, su)])),
        })
    }
}

/// Undistorts a single color image.
pub fn undistort(
    image: &Array3<u8>,
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> Result<Array3<u8>> {
    let (height, width, _) = image.dim();
    Undistorter::new(intrinsics, distortion, width, height).image(image)
}
