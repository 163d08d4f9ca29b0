use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxcarve::{
    benchmark::{Benchmark, ModelSize, Stage},
    carving::CarveMethod,
    color::FusionPolicy,
    io::{voxel_cloud_geometry, voxel_cube_geometry, write_off, write_ply, CarvingDataset},
    params::ReconstructionParams,
    pipeline::Reconstruction,
};

#[derive(Parser)]
#[command(version, about = "Carves a colored voxel model out of calibrated silhouettes")]
struct Args {
    /// Dataset directory containing a frames.json file
    dataset: PathBuf,
    /// JSON file with the reconstruction parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// Carving method: exhaustive or flood-fill
    #[arg(long)]
    method: Option<CarveMethod>,
    /// Color fusion policy: nearest or average
    #[arg(long)]
    policy: Option<FusionPolicy>,
    /// Cubic grid resolution, one run per value
    #[arg(long, short)]
    resolution: Vec<usize>,
    /// Skip lens undistortion
    #[arg(long, action)]
    no_undistort: bool,
    /// Writes the voxel cubes of the last run as an OFF mesh
    #[arg(long)]
    mesh: Option<PathBuf>,
    /// Writes the voxel centers of the last run as a PLY point cloud
    #[arg(long)]
    cloud: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut params = match &args.config {
        Some(path) => ReconstructionParams::load(path)?,
        None => ReconstructionParams::default(),
    };
    if let Some(method) = args.method {
        params.carve_method(method);
    }
    if let Some(policy) = args.policy {
        params.fusion_policy(policy);
    }

    let dataset = CarvingDataset::load(&args.dataset)?;
    let frames = dataset.frames(!args.no_undistort)?;
    info!(frames = frames.len(), "frames loaded");

    let resolutions = if args.resolution.is_empty() {
        vec![params.resolution]
    } else {
        args.resolution.iter().map(|size| [*size; 3]).collect()
    };

    let mut benchmark = Benchmark::new();
    let mut last_model = None;
    for [x, y, z] in resolutions {
        let mut run_params = params.clone();
        run_params.resolution(x, y, z);
        benchmark.next_run(
            format!("{} {x}", run_params.carve_method.name()),
            ModelSize::new(x, y, z, run_params.voxel_size),
        );
        last_model = Some(Reconstruction::new(run_params).run(&frames, &mut benchmark)?);
    }

    if let Some(model) = &last_model {
        // Mesh export stands in for the surface extraction stage.
        benchmark.start(Stage::MarchingCubes);
        if let Some(path) = &args.mesh {
            write_off(path, &voxel_cube_geometry(model))?;
            info!("mesh written to {}", path.display());
        }
        if let Some(path) = &args.cloud {
            write_ply(path, &voxel_cloud_geometry(model))?;
            info!("point cloud written to {}", path.display());
        }
        benchmark.stop(Stage::MarchingCubes);
    }

    println!("{benchmark}");
    Ok(())
}
