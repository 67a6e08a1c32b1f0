mod bayer;
mod rgb;

pub use bayer::{bgr_from_bayer_rggb, rgb_from_bayer_rggb};
pub use rgb::rgb_from_bgr;
