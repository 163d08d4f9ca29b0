use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{UnitQuaternion, Vector3};
use ndarray::{Array2, Array3};
use voxcarve::{
    camera::{CameraIntrinsics, PinholeCamera},
    carving::{CarveStrategy, ExhaustiveCarve, FloodFillCarve},
    color::{ColorFusion, FusionParameters},
    frame::Frame,
    model::VoxelModel,
    transform::Transform,
};

const IMAGE_SIZE: usize = 640;

/// Views from above and from four sides of a unit cube, each seeing a centered disc.
fn orbit_frames() -> Vec<Frame> {
    let center = Vector3::new(0.5, 0.5, -0.5);
    let eyes = [
        Vector3::new(0.5, 0.5, 2.0),
        Vector3::new(3.0, 0.5, -0.5),
        Vector3::new(-2.0, 0.5, -0.5),
        Vector3::new(0.5, 3.0, -0.5),
        Vector3::new(0.5, -2.0, -0.5),
    ];
    let half = IMAGE_SIZE as f32 / 2.0;
    let mask = Array2::from_shape_fn((IMAGE_SIZE, IMAGE_SIZE), |(v, u)| {
        let (du, dv) = (u as f32 - half, v as f32 - half);
        if (du * du + dv * dv).sqrt() < half * 0.5 {
            255
        } else {
            0
        }
    });

    eyes.iter()
        .map(|eye| {
            let up = if eye[2] > 1.0 { Vector3::y() } else { Vector3::z() };
            Frame::new(
                PinholeCamera::new(
                    CameraIntrinsics::from_simple_intrinsic(500.0, 500.0, half as f64, half as f64),
                    Transform::look_at(eye, &center, &up),
                    IMAGE_SIZE,
                    IMAGE_SIZE,
                ),
                Array3::from_elem((IMAGE_SIZE, IMAGE_SIZE, 3), 128),
                mask.clone(),
            )
            .unwrap()
        })
        .collect()
}

fn carving_benchmark(c: &mut Criterion) {
    let frames = orbit_frames();
    let mut group = c.benchmark_group("carving");
    group.sample_size(10);

    for resolution in [16, 32, 64] {
        let voxel_size = 1.0 / resolution as f32;
        group.bench_with_input(
            BenchmarkId::new("exhaustive", resolution),
            &resolution,
            |b, &resolution| {
                b.iter(|| {
                    let mut model = VoxelModel::new(resolution, resolution, resolution, voxel_size);
                    ExhaustiveCarve.carve(&mut model, &frames)
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("flood_fill", resolution),
            &resolution,
            |b, &resolution| {
                b.iter(|| {
                    let mut model = VoxelModel::new(resolution, resolution, resolution, voxel_size);
                    FloodFillCarve.carve(&mut model, &frames)
                });
            },
        );
    }
    group.finish();

    let mut carved = VoxelModel::new(32, 32, 32, 1.0 / 32.0);
    ExhaustiveCarve.carve(&mut carved, &frames);
    let fusion = ColorFusion::new(FusionParameters::default());
    c.bench_function("color fusion 32", |b| {
        b.iter(|| {
            let mut model = carved.clone();
            fusion.integrate(&mut model, &frames)
        });
    });
}

criterion_group!(benches, carving_benchmark);
criterion_main!(benches);
