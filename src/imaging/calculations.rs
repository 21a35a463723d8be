//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Tallest thumbnail the backend will render.
///
/// Width is fixed by config, so a very narrow source scales to an enormous
/// height. Past this bound the render is refused instead of allocated.
pub const MAX_THUMBNAIL_HEIGHT: u32 = 10_000;

/// Whether a planned output stays inside [`MAX_THUMBNAIL_HEIGHT`].
pub fn within_output_bounds((_, height): (u32, u32)) -> bool {
    height <= MAX_THUMBNAIL_HEIGHT
}

/// Calculate output dimensions for a width-bounded resize.
///
/// The width is always `target_width` (small sources are enlarged, large ones
/// reduced); the height keeps the source aspect ratio and is never below 1.
///
/// # Examples
/// ```
/// # use gallery_index::imaging::calculate_scaled_dimensions;
/// assert_eq!(calculate_scaled_dimensions((1200, 800), 300), (300, 200));
/// assert_eq!(calculate_scaled_dimensions((100, 400), 300), (300, 1200));
/// ```
pub fn calculate_scaled_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return (target_width, src_h.max(1));
    }
    let h = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    (target_width, h.max(1))
}
