//! Proportional downscale to a maximum width.
//!
//! Shared by the static and the animated path: the static path resizes its
//! single raster, the compositor resizes every resolved canvas.

use super::calculations::calculate_fit_dimensions;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::borrow::Cow;

/// Scale `raster` down so it is at most `max_width` pixels wide.
///
/// Rasters already within the cap are returned borrowed and untouched.
/// Larger ones are resampled with Catmull-Rom into the proportional bounds
/// computed by [`calculate_fit_dimensions`].
pub fn fit_width(raster: &RgbaImage, max_width: u32) -> Cow<'_, RgbaImage> {
    match calculate_fit_dimensions(raster.dimensions(), max_width) {
        None => Cow::Borrowed(raster),
        Some((width, height)) => Cow::Owned(imageops::resize(
            raster,
            width,
            height,
            FilterType::CatmullRom,
        )),
    }
}
