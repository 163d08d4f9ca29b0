mod dataset;
pub use dataset::CarvingDataset;

mod geometry;
pub use geometry::Geometry;

mod off;
pub use off::{read_off, write_off};

mod ply;
pub use ply::{read_ply, write_ply};

mod voxels;
pub use voxels::{voxel_cloud_geometry, voxel_cube_geometry};
