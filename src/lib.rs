pub mod benchmark;
pub mod camera;
pub mod carving;
pub mod color;
pub mod error;
pub mod frame;
pub mod io;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod postprocessing;
pub mod segmentation;
pub mod transform;
pub mod undistort;

#[cfg(test)]
mod unit_test;

mod image;
pub use crate::image::{is_background, mask_from_rgb, IntoArray3, IntoImageRgb8, IntoLumaImage};

pub use error::{Error, Result};
