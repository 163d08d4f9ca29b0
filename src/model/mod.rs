mod voxel_model;
pub use voxel_model::{
    ColorObservation, VoxelCoord, VoxelModel, EMPTY_VOXEL, MODEL_COLOR, UNSEEN_COLOR,
};
