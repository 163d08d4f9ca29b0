mod rgb;
pub use rgb::{IntoArray3, IntoImageRgb8};
pub(crate) use rgb::pixel_color;

mod mask;
pub use mask::{is_background, mask_from_rgb, IntoLumaImage};
