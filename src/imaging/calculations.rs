//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of a raster scaled down to fit `max_width`.
///
/// Returns `None` when the source is already no wider than `max_width`:
/// renditions never upscale, and callers keep the source untouched.
/// Otherwise the height follows the source aspect ratio, rounded to the
/// nearest pixel and never below one.
///
/// # Examples
/// ```
/// # use image_store::imaging::calculate_fit_dimensions;
/// // 1200x800 into a 600px feed → 600x400
/// assert_eq!(calculate_fit_dimensions((1200, 800), 600), Some((600, 400)));
///
/// // 400x400 is already below the cap
/// assert_eq!(calculate_fit_dimensions((400, 400), 600), None);
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max_width: u32) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w <= max_width {
        return None;
    }

    let ratio = src_h as f64 / src_w as f64;
    let height = (max_width as f64 * ratio).round() as u32;
    Some((max_width, height.max(1)))
}
