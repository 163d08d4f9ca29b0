use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::{
    carving::CarveMethod,
    color::{FusionParameters, FusionPolicy},
    error::{Error, Result},
};

/// Parameters of a reconstruction run. Missing fields in a JSON file take the
/// default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionParams {
    /// Number of voxels along x, y and z.
    pub resolution: [usize; 3],
    /// World space edge length of a voxel.
    pub voxel_size: f32,
    pub carve_method: CarveMethod,
    pub fusion_policy: FusionPolicy,
    /// Skip color fusion on voxels enclosed by occupied neighbors.
    pub skip_inner: bool,
    /// Closing kernel size, odd. 1 disables the closing.
    pub closing_kernel: usize,
    /// Run color fusion. Without it the voxels keep the model color.
    pub color: bool,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            resolution: [64, 64, 64],
            voxel_size: 0.005,
            carve_method: CarveMethod::default(),
            fusion_policy: FusionPolicy::default(),
            skip_inner: true,
            closing_kernel: 3,
            color: true,
        }
    }
}

impl ReconstructionParams {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(buffer)?)
    }

    pub fn resolution(&'_ mut self, x: usize, y: usize, z: usize) -> &'_ mut Self {
        self.resolution = [x, y, z];
        self
    }

    pub fn voxel_size(&'_ mut self, value: f32) -> &'_ mut Self {
        self.voxel_size = value;
        self
    }

    pub fn carve_method(&'_ mut self, value: CarveMethod) -> &'_ mut Self {
        self.carve_method = value;
        self
    }

    pub fn fusion_policy(&'_ mut self, value: FusionPolicy) -> &'_ mut Self {
        self.fusion_policy = value;
        self
    }

    pub fn skip_inner(&'_ mut self, value: bool) -> &'_ mut Self {
        self.skip_inner = value;
        self
    }

    pub fn closing_kernel(&'_ mut self, value: usize) -> &'_ mut Self {
        self.closing_kernel = value;
        self
    }

    pub fn color(&'_ mut self, value: bool) -> &'_ mut Self {
        self.color = value;
        self
    }

    pub fn fusion(&self) -> FusionParameters {
        FusionParameters {
            policy: self.fusion_policy,
            skip_inner: self.skip_inner,
        }
    }

    /// Rejects configurations no run can start with. An even closing kernel is not
    /// rejected here: the closing stage reports it and is skipped.
    pub fn validate(&self) -> Result<()> {
        if self.resolution.iter().any(|size| *size == 0) {
            return Err(Error::invalid_parameter(format!(
                "Grid resolution must be positive, got {:?}",
                self.resolution
            )));
        }
        let [x, y, z] = self.resolution;
        if x.checked_mul(y).and_then(|xy| xy.checked_mul(z)).is_none() {
            return Err(Error::invalid_parameter(format!(
                "Grid resolution {:?} has too many voxels",
                self.resolution
            )));
        }
        if !(self.voxel_size > 0.0 && self.voxel_size.is_finite()) {
            return Err(Error::invalid_parameter(format!(
                "Voxel size must be positive, got {}",
                self.voxel_size
            )));
        }
        if self.closing_kernel == 0 {
            return Err(Error::invalid_parameter("Closing kernel size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let params = ReconstructionParams::default();
        assert_eq!(params.resolution, [64, 64, 64]);
        assert_eq!(params.carve_method, CarveMethod::Exhaustive);
        assert_eq!(params.fusion_policy, FusionPolicy::Nearest);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"resolution": [16, 8, 4], "carve_method": "flood_fill", "fusion_policy": "average"}"#,
        )
        .unwrap();

        let params = ReconstructionParams::load(&path).unwrap();
        assert_eq!(params.resolution, [16, 8, 4]);
        assert_eq!(params.carve_method, CarveMethod::FloodFill);
        assert_eq!(params.fusion().policy, FusionPolicy::Average);
        assert_eq!(params.closing_kernel, 3);

        std::fs::write(&path, r#"{"carve_method": "random"}"#).unwrap();
        assert!(matches!(
            ReconstructionParams::load(&path),
            Err(Error::Parser(_))
        ));
    }

    #[rstest]
    #[case(ReconstructionParams::default().resolution(0, 4, 4).clone())]
    #[case(ReconstructionParams::default().resolution(usize::MAX, 2, 1).clone())]
    #[case(ReconstructionParams::default().resolution(1 << 22, 1 << 22, 1 << 22).clone())]
    #[case(ReconstructionParams::default().voxel_size(0.0).clone())]
    #[case(ReconstructionParams::default().voxel_size(-1.0).clone())]
    #[case(ReconstructionParams::default().voxel_size(f32::NAN).clone())]
    #[case(ReconstructionParams::default().closing_kernel(0).clone())]
    fn test_invalid(#[case] params: ReconstructionParams) {
        assert!(matches!(params.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_even_kernel_passes_validation() {
        assert!(ReconstructionParams::default()
            .closing_kernel(4)
            .validate()
            .is_ok());
    }
}
