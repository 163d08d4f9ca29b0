use ndarray::{Array2, Array3};
use serde_derive::{Deserialize, Serialize};

/// Produces a foreground mask for a color image.
pub trait Segmentation {
    /// Returns a `[height, width]` mask with 0 for background and 255 for foreground.
    fn segment(&self, image: &Array3<u8>) -> Array2<u8>;
}

/// Marks as background every pixel whose three channels all lie in `[lower, upper]`.
/// The default range captures a bright backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorThresholdSegmentation {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for ColorThresholdSegmentation {
    fn default() -> Self {
        Self {
            lower: [120; 3],
            upper: [255; 3],
        }
    }
}

impl ColorThresholdSegmentation {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    fn is_background(&self, image: &Array3<u8>, v: usize, u: usize) -> bool {
        (0..3).all(|c| {
            let value = image[(v, u, c)];
            self.lower[c] <= value && value <= self.upper[c]
        })
    }
}

impl Segmentation for ColorThresholdSegmentation {
    fn segment(&self, image: &Array3<u8>) -> Array2<u8> {
        let (height, width, _) = image.dim();
        Array2::from_shape_fn((height, width), |(v, u)| {
            if self.is_background(image, v, u) {
                0
            } else {
                255
            }
        })
    }
}
