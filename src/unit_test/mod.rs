mod scenes;
pub(crate) use scenes::{disc_mask, oblique_origin_frame, top_down_frame, TopDownScene};
