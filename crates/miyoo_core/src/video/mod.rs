//! Per frame pixel transforms, everything produces RGB565 for the display.
pub use blend::{blend_frames, blend_pixel, BLEND_MAX};
pub use convert::{convert_no_correction, convert_rgb32_to_rgb565, convert_with_correction};

pub mod blend;
pub mod convert;
