//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take a
//! processing configuration, compute the variant list, and call the backend
//! for the ones that are not on disk yet.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_output_widths, scale_height};
use super::params::{Quality, ResizeParams};
use crate::config::{OutputFormat, ProcessingConfig};
use crate::metadata::ImageVariant;
use crate::naming::{join_url, output_filename};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Resolve the configured formats against the source format.
///
/// `auto` entries become the source's own format; duplicates keep their first
/// position.
pub fn resolve_formats(
    formats: &[OutputFormat],
    source_format: Option<OutputFormat>,
) -> Vec<OutputFormat> {
    let mut resolved: Vec<OutputFormat> = Vec::with_capacity(formats.len());
    for format in formats {
        let format = format.resolve(source_format);
        if !resolved.contains(&format) {
            resolved.push(format);
        }
    }
    resolved
}

/// Plan every variant for one source, grouped by format in configured order.
///
/// Pure: no files are touched. `size` is left unset.
pub fn plan_variants(
    id: &str,
    original_dims: (u32, u32),
    formats: &[OutputFormat],
    config: &ProcessingConfig,
) -> Vec<(OutputFormat, Vec<ImageVariant>)> {
    let widths = calculate_output_widths(original_dims.0, &config.widths);

    formats
        .iter()
        .map(|&format| {
            let variants = widths
                .iter()
                .map(|&width| {
                    let filename = output_filename(id, width, format);
                    let url = join_url(&config.url_path, &filename);
                    ImageVariant {
                        format,
                        width,
                        height: scale_height(original_dims, width),
                        srcset: format!("{url} {width}w"),
                        url,
                        source_type: format.mime_type().to_string(),
                        output_path: config.output_dir.join(&filename),
                        filename,
                        size: None,
                    }
                })
                .collect();
            (format, variants)
        })
        .collect()
}

/// Write every planned variant that is not already on disk, then record sizes.
///
/// File names are content-addressed, so an existing file holds the same pixels
/// and is reused as is. Returns the number of files encoded.
pub fn create_variants(
    backend: &impl ImageBackend,
    source: &Path,
    planned: &mut [(OutputFormat, Vec<ImageVariant>)],
    quality: Quality,
) -> Result<usize> {
    let jobs: Vec<ResizeParams> = planned
        .iter()
        .flat_map(|(_, variants)| variants.iter())
        .filter(|variant| {
            let exists = variant.output_path.exists();
            if exists {
                tracing::debug!(output = %variant.output_path.display(), "reusing existing output");
            }
            !exists
        })
        .map(|variant| ResizeParams {
            output: variant.output_path.clone(),
            width: variant.width,
            height: variant.height,
            format: variant.format,
            quality,
        })
        .collect();

    backend.resize(source, &jobs)?;

    for variant in planned.iter_mut().flat_map(|(_, variants)| variants.iter_mut()) {
        variant.size = Some(std::fs::metadata(&variant.output_path)?.len());
    }

    Ok(jobs.len())
}
