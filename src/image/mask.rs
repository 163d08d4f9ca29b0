use image::GrayImage;
use ndarray::{Array2, Array3, Axis};

/// Trait to convert a mask into an image::GrayImage
pub trait IntoLumaImage {
    fn to_luma_image(&self) -> GrayImage;
}

impl IntoLumaImage for Array2<u8> {
    fn to_luma_image(&self) -> GrayImage {
        let (height, width) = self.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            image::Luma([self[(y as usize, x as usize)]])
        })
    }
}

/// Collapses a three-channel mask into a single channel one. A pixel is background
/// only when all of its channels are zero.
pub fn mask_from_rgb(mask: &Array3<u8>) -> Array2<u8> {
    mask.map_axis(Axis(2), |pixel| {
        if pixel.iter().all(|c| *c == 0) {
            0
        } else {
            255
        }
    })
}

/// Zero pixels denote background.
#[inline]
pub fn is_background(mask: &Array2<u8>, u: usize, v: usize) -> bool {
    mask[(v, u)] == 0
}
