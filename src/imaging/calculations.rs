//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::WidthSpec;

/// Calculate which widths to generate for a source of `original_width` pixels.
///
/// - `Auto` resolves to the original width.
/// - Widths larger than the original are skipped (no upscaling).
/// - If every requested width is skipped, the original width is used alone.
///
/// The result is sorted ascending with duplicates removed.
///
/// # Examples
/// ```
/// # use respimg::imaging::calculate_output_widths;
/// # use respimg::config::WidthSpec;
/// let widths = [WidthSpec::Pixels(400), WidthSpec::Pixels(3000)];
/// assert_eq!(calculate_output_widths(1000, &widths), vec![400]);
/// ```
pub fn calculate_output_widths(original_width: u32, requested: &[WidthSpec]) -> Vec<u32> {
    let mut widths: Vec<u32> = requested
        .iter()
        .map(|spec| match *spec {
            WidthSpec::Pixels(px) => px,
            WidthSpec::Auto => original_width,
        })
        .filter(|&w| w <= original_width)
        .collect();

    if widths.is_empty() {
        widths.push(original_width);
    }

    widths.sort_unstable();
    widths.dedup();
    widths
}

/// Height that keeps the source aspect ratio at `width`. Never below 1px.
pub fn scale_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h.max(1);
    }
    let h = (width as f64 * orig_h as f64 / orig_w as f64).round() as u32;
    h.max(1)
}
