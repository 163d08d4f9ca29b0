mod fusion;
pub use fusion::{
    average_color, nearest_color, ColorFusion, FusionParameters, FusionPolicy, FusionSummary,
};
