use image::{flat::SampleLayout, RgbImage};
use nalgebra::Vector3;
use ndarray::{Array3, ShapeBuilder};

/// Trait to convert into ndarray::Array3, this is different than nshare version
/// because it uses the shape [height, width, channels] instead of [channels, height, width].
pub trait IntoArray3 {
    fn into_array3(self) -> Array3<u8>;
}

impl IntoArray3 for image::RgbImage {
    fn into_array3(self) -> Array3<u8> {
        let SampleLayout {
            channels,
            channel_stride,
            height,
            height_stride,
            width,
            width_stride,
        } = self.sample_layout();
        let shape = (height as usize, width as usize, channels as usize);
        let strides = (height_stride, width_stride, channel_stride);
        Array3::from_shape_vec(shape.strides(strides), self.into_raw())
            .expect("RgbImage sample layout always matches its buffer")
    }
}

/// Trait to convert objects into image::RgbImage
pub trait IntoImageRgb8 {
    fn into_image_rgb8(self) -> RgbImage;
}

impl IntoImageRgb8 for &Array3<u8> {
    fn into_image_rgb8(self) -> RgbImage {
        let (height, width, _) = self.dim();
        RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            image::Rgb([self[(y, x, 0)], self[(y, x, 1)], self[(y, x, 2)]])
        })
    }
}

/// Reads the pixel at column `u`, row `v` as a float color.
pub(crate) fn pixel_color(image: &Array3<u8>, u: usize, v: usize) -> Vector3<f32> {
    Vector3::new(
        image[(v, u, 0)] as f32,
        image[(v, u, 1)] as f32,
        image[(v, u, 2)] as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::{pixel_color, IntoArray3, IntoImageRgb8};
    use nalgebra::Vector3;
    use ndarray::Array3;

    #[test]
    fn test_array_image_layout() {
        let mut array = Array3::<u8>::zeros((2, 3, 3));
        array[(1, 2, 0)] = 200;
        array[(1, 2, 2)] = 10;

        let image = (&array).into_image_rgb8();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.get_pixel(2, 1).0, [200, 0, 10]);

        let back = image.into_array3();
        assert_eq!(back, array);
        assert_eq!(pixel_color(&back, 2, 1), Vector3::new(200.0, 0.0, 10.0));
    }
}
