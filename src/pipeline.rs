use tracing::{debug, info, warn};

use crate::{
    benchmark::{Benchmark, Stage},
    carving::{CarveStrategy, CarveSummary},
    color::{ColorFusion, FusionSummary},
    error::Result,
    frame::{validate_frames, Frame},
    model::VoxelModel,
    params::ReconstructionParams,
    postprocessing::{apply_closure, ClosingSummary},
};

/// Counters of every stage of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionSummary {
    pub carving: CarveSummary,
    /// `None` when coloring is disabled.
    pub fusion: Option<FusionSummary>,
    pub num_unseen: usize,
    /// `None` when the closing was skipped.
    pub closing: Option<ClosingSummary>,
}

/// Runs carving, color fusion, unseen handling and closing on a set of frames.
///
/// ```no_run
/// use voxcarve::{benchmark::{Benchmark, ModelSize}, io::CarvingDataset};
/// use voxcarve::{params::ReconstructionParams, pipeline::Reconstruction};
///
/// let frames = CarvingDataset::load("data/statue").unwrap().frames(true).unwrap();
/// let params = ReconstructionParams::default();
/// let mut benchmark = Benchmark::new();
/// benchmark.next_run("statue", ModelSize::new(64, 64, 64, params.voxel_size));
/// let model = Reconstruction::new(params).run(&frames, &mut benchmark).unwrap();
/// println!("{} voxels kept\n{benchmark}", model.occupied_count());
/// ```
pub struct Reconstruction {
    params: ReconstructionParams,
}

impl Reconstruction {
    pub fn new(params: ReconstructionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReconstructionParams {
        &self.params
    }

    /// Reconstructs a model from the frames. Stage timings are recorded against the
    /// current run of `benchmark`; opening the run is up to the caller.
    pub fn run(&self, frames: &[Frame], benchmark: &mut Benchmark) -> Result<VoxelModel> {
        self.run_with_summary(frames, benchmark)
            .map(|(model, _)| model)
    }

    pub fn run_with_summary(
        &self,
        frames: &[Frame],
        benchmark: &mut Benchmark,
    ) -> Result<(VoxelModel, ReconstructionSummary)> {
        self.params.validate()?;
        validate_frames(frames)?;
        for (index, frame) in frames.iter().enumerate() {
            if !frame.camera.has_pose() {
                debug!(index, "frame has no usable pose");
            }
        }

        let params = &self.params;
        let [size_x, size_y, size_z] = params.resolution;
        info!(
            method = params.carve_method.name(),
            size_x,
            size_y,
            size_z,
            voxel_size = params.voxel_size,
            frames = frames.len(),
            "starting reconstruction"
        );

        benchmark.start(Stage::Overall);
        let mut model = VoxelModel::new(size_x, size_y, size_z, params.voxel_size);
        let mut summary = ReconstructionSummary {
            carving: benchmark.measure(Stage::Carving, || {
                params.carve_method.carve(&mut model, frames)
            }),
            ..Default::default()
        };

        if params.color {
            let fusion = ColorFusion::new(params.fusion());
            summary.fusion =
                Some(benchmark.measure(Stage::Coloring, || fusion.integrate(&mut model, frames)));
        }
        summary.num_unseen = model.handle_unseen();
        if summary.num_unseen > 0 {
            info!(unseen = summary.num_unseen, "unseen voxels painted");
        }

        summary.closing = match benchmark.measure(Stage::PostProcessing, || {
            apply_closure(&mut model, params.closing_kernel)
        }) {
            Ok(closing) => Some(closing),
            Err(err) => {
                warn!("closing skipped: {err}");
                None
            }
        };
        benchmark.stop(Stage::Overall);

        info!(
            occupied = model.occupied_count(),
            seen = model.seen_count(),
            "reconstruction finished"
        );
        Ok((model, summary))
    }
}
