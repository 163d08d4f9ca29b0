use std::path::{Path, PathBuf};

use image::ColorType;
use nalgebra::Matrix3;
use ndarray::Array2;
use nshare::ToNdarray2;
use serde_derive::Deserialize;
use tracing::{debug, info};

use crate::{
    camera::{CameraIntrinsics, Distortion, PinholeCamera},
    error::{Error, Result},
    frame::Frame,
    image::{mask_from_rgb, IntoArray3},
    segmentation::{ColorThresholdSegmentation, Segmentation},
    transform::Transform,
    undistort::Undistorter,
};

#[derive(Deserialize, Debug)]
struct IntrinsicsEntry {
    matrix: Vec<Vec<f64>>,
    #[serde(default)]
    distortion: Vec<f64>,
    image_size: (usize, usize),
}

#[derive(Deserialize, Debug, Clone)]
struct FrameEntry {
    image: String,
    mask: Option<String>,
    camera_to_world: Option<Vec<Vec<f32>>>,
}

#[derive(Deserialize, Debug)]
struct Document {
    intrinsics: IntrinsicsEntry,
    frames: Vec<FrameEntry>,
}

/// Calibrated views stored in a directory, described by a `frames.json` file:
///
/// ```json
/// {
///   "intrinsics": {"matrix": [[500, 0, 320], [0, 500, 240], [0, 0, 1]],
///                  "distortion": [0.1, -0.05, 0, 0, 0], "image_size": [640, 480]},
///   "frames": [{"image": "img_00.png", "mask": "mask_00.png",
///               "camera_to_world": [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0.5], [0, 0, 0, 1]]}]
/// }
/// ```
///
/// Frames without a mask are segmented, frames without a pose get the identity.
pub struct CarvingDataset {
    intrinsics: CameraIntrinsics,
    distortion: Distortion,
    width: usize,
    height: usize,
    entries: Vec<FrameEntry>,
    base_dir: PathBuf,
    segmentation: Box<dyn Segmentation>,
}

impl CarvingDataset {
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let buffer = std::io::BufReader::new(std::fs::File::open(base_dir.join("frames.json"))?);
        let doc: Document = serde_json::from_reader(buffer)?;

        let matrix = &doc.intrinsics.matrix;
        if matrix.len() != 3 || matrix.iter().any(|row| row.len() != 3) {
            return Err(Error::parser("Intrinsics matrix must be 3x3"));
        }
        let intrinsics =
            CameraIntrinsics::from_matrix3(&Matrix3::from_fn(|r, c| matrix[r][c]));

        for (i, entry) in doc.frames.iter().enumerate() {
            if let Some(rows) = &entry.camera_to_world {
                if Transform::from_rows(rows).is_none() {
                    return Err(Error::parser(format!(
                        "Frame {i}: camera_to_world must be 4x4"
                    )));
                }
            }
        }

        let (width, height) = doc.intrinsics.image_size;
        info!(
            frames = doc.frames.len(),
            width,
            height,
            "loaded dataset {}",
            base_dir.display()
        );
        Ok(Self {
            intrinsics,
            distortion: Distortion::from_coefficients(&doc.intrinsics.distortion),
            width,
            height,
            entries: doc.frames,
            base_dir: base_dir.to_path_buf(),
            segmentation: Box::new(ColorThresholdSegmentation::default()),
        })
    }

    /// Replaces the segmentation used for frames without a mask file.
    pub fn with_segmentation(mut self, segmentation: Box<dyn Segmentation>) -> Self {
        self.segmentation = segmentation;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    pub fn distortion(&self) -> &Distortion {
        &self.distortion
    }

    fn load_mask(&self, path: &str) -> Result<Array2<u8>> {
        let mask = image::open(self.base_dir.join(path))?;
        Ok(match mask.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                mask.into_luma8().into_ndarray2()
            }
            _ => mask_from_rgb(&mask.into_rgb8().into_array3()),
        })
    }

    fn load_frame(&self, index: usize, undistorter: Option<&Undistorter>) -> Result<Frame> {
        let entry = &self.entries[index];
        let image = image::open(self.base_dir.join(&entry.image))?
            .into_rgb8()
            .into_array3();
        let mask = match &entry.mask {
            Some(path) => self.load_mask(path)?,
            None => self.segmentation.segment(&image),
        };

        let (image, mask) = match undistorter {
            Some(undistorter) => (undistorter.image(&image)?, undistorter.mask(&mask)?),
            None => (image, mask),
        };

        let camera_to_world = entry
            .camera_to_world
            .as_deref()
            .and_then(Transform::from_rows)
            .unwrap_or_default();
        if camera_to_world.is_identity() {
            debug!(index, "frame has no usable pose");
        }

        Frame::new(
            PinholeCamera::new(
                self.intrinsics.clone(),
                camera_to_world,
                self.width,
                self.height,
            ),
            image,
            mask,
        )
    }

    /// Loads frame `index` without undistortion.
    pub fn get(&self, index: usize) -> Result<Frame> {
        if index >= self.len() {
            return Err(Error::invalid_parameter(format!(
                "Frame index {index} out of range for {} frames",
                self.len()
            )));
        }
        self.load_frame(index, None)
    }

    /// Loads all frames, undistorting images and masks alike when `undistort` is set.
    pub fn frames(&self, undistort: bool) -> Result<Vec<Frame>> {
        let undistorter = undistort.then(|| {
            Undistorter::new(&self.intrinsics, &self.distortion, self.width, self.height)
        });
        (0..self.len())
            .map(|index| self.load_frame(index, undistorter.as_ref()))
            .collect()
    }
}
