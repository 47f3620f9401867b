//! Image processing entry point.
//!
//! [`process_image`] takes one source path and an effective
//! [`ProcessingConfig`] and returns [`Metadata`] for every format and width.
//!
//! ```text
//! source ─ identify ─┬─ widths  (≤ source width, or the source width alone)
//!                    ├─ formats (config order, "auto" → source format)
//!                    └─ id      (sha256 of bytes + quality)
//!                          │
//!                    plan variants ── dry run? ── yes ──► metadata
//!                          │ no
//!                    create output dir, encode missing files, record sizes
//!                          │
//!                          ▼
//!                       metadata
//! ```
//!
//! ## Output structure
//!
//! ```text
//! _site/images/
//! ├── 3f9a0c41de-400.avif
//! ├── 3f9a0c41de-400.webp
//! ├── 3f9a0c41de-400.jpeg
//! ├── 3f9a0c41de-800.avif
//! └── ...
//! ```

use crate::config::{OutputFormat, ProcessingConfig};
use crate::imaging::{
    BackendError, ImageBackend, Quality, create_variants, get_dimensions, plan_variants,
    resolve_formats, supported_input_extensions,
};
use crate::metadata::Metadata;
use crate::naming::source_id;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Unsupported source image type: {0}")]
    UnsupportedSource(PathBuf),
}

fn is_supported_source(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    supported_input_extensions()
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(ext))
}

/// Process one source image according to `config`.
///
/// The source must be a file whose extension has a compiled-in decoder
/// ([`supported_input_extensions`]); anything else is rejected before decoding.
pub fn process_image(
    backend: &impl ImageBackend,
    source: &Path,
    config: &ProcessingConfig,
) -> Result<Metadata, ProcessError> {
    if !source.is_file() {
        return Err(ProcessError::SourceNotFound(source.to_path_buf()));
    }
    if !is_supported_source(source) {
        return Err(ProcessError::UnsupportedSource(source.to_path_buf()));
    }

    let dimensions = get_dimensions(backend, source)?;
    let bytes = std::fs::read(source)?;
    let id = source_id(&bytes, config.quality);
    let formats = resolve_formats(&config.formats, OutputFormat::from_path(source));

    let mut planned = plan_variants(&id, dimensions, &formats, config);
    tracing::debug!(
        source = %source.display(),
        width = dimensions.0,
        height = dimensions.1,
        formats = ?formats,
        variants = planned.iter().map(|(_, v)| v.len()).sum::<usize>(),
        dry_run = config.dry_run,
        "planned image variants"
    );

    if !config.dry_run {
        std::fs::create_dir_all(&config.output_dir)?;
        let encoded = create_variants(backend, source, &mut planned, Quality::new(config.quality))?;
        tracing::info!(
            source = %source.display(),
            output_dir = %config.output_dir.display(),
            encoded,
            "processed image"
        );
    }

    Ok(Metadata::new(planned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WidthSpec;
    use crate::imaging::backend::tests::{MOCK_OUTPUT, MockBackend, RecordedOp};
    use crate::test_helpers::create_test_jpeg;

    fn dry_run() -> ProcessingConfig {
        ProcessingConfig {
            dry_run: true,
            ..ProcessingConfig::default()
        }
    }

    #[test]
    fn missing_source_is_rejected_before_backend() {
        let backend = MockBackend::with_dimensions(100, 100);
        let result = process_image(&backend, Path::new("/nonexistent/image.jpg"), &dry_run());

        assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn directory_source_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(100, 100);
        let result = process_image(&backend, tmp.path(), &dry_run());
        assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(100, 100);

        for name in ["photo.avif", "photo.gif", "photo"] {
            let source = tmp.path().join(name);
            std::fs::write(&source, b"bytes").unwrap();
            let result = process_image(&backend, &source, &dry_run());
            assert!(
                matches!(result, Err(ProcessError::UnsupportedSource(_))),
                "{name} accepted"
            );
        }
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn extension_check_ignores_case() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("PHOTO.JPG");
        std::fs::write(&source, b"bytes").unwrap();

        let backend = MockBackend::with_dimensions(800, 600);
        assert!(process_image(&backend, &source, &dry_run()).is_ok());
    }

    #[test]
    fn backend_failure_propagates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        std::fs::write(&source, b"bytes").unwrap();

        let backend = MockBackend::new();
        let result = process_image(&backend, &source, &dry_run());
        assert!(matches!(result, Err(ProcessError::Imaging(_))));
    }

    #[test]
    fn dry_run_default_metadata_shape() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        std::fs::write(&source, b"bytes").unwrap();

        let backend = MockBackend::with_dimensions(2000, 1500);
        let metadata = process_image(&backend, &source, &dry_run()).unwrap();

        let formats: Vec<OutputFormat> = metadata.formats().collect();
        assert_eq!(
            formats,
            vec![OutputFormat::Avif, OutputFormat::Webp, OutputFormat::Jpeg]
        );
        for (_, variants) in metadata.iter() {
            let widths: Vec<u32> = variants.iter().map(|v| v.width).collect();
            assert_eq!(widths, vec![400, 800, 1200, 1600]);
            assert!(variants.iter().all(|v| v.url.starts_with("/images/")));
            assert!(
                variants
                    .iter()
                    .all(|v| v.output_path.starts_with("_site/images/"))
            );
        }

        // Dry run: identify only, nothing written.
        assert_eq!(backend.resize_count(), 0);
        assert!(
            metadata
                .iter()
                .all(|(_, variants)| variants.iter().all(|v| v.size.is_none()))
        );
    }

    #[test]
    fn auto_format_follows_source_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        std::fs::write(&source, b"bytes").unwrap();

        let config = ProcessingConfig {
            formats: vec![OutputFormat::Webp, OutputFormat::Auto],
            ..dry_run()
        };
        let backend = MockBackend::with_dimensions(800, 600);
        let metadata = process_image(&backend, &source, &config).unwrap();

        let formats: Vec<OutputFormat> = metadata.formats().collect();
        assert_eq!(formats, vec![OutputFormat::Webp, OutputFormat::Png]);
    }

    #[test]
    fn same_content_same_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("a.jpg");
        let b = tmp.path().join("b.jpg");
        std::fs::write(&a, b"same").unwrap();
        std::fs::write(&b, b"same").unwrap();

        let backend = MockBackend::with_dimensions(800, 600);
        let first = process_image(&backend, &a, &dry_run()).unwrap();
        let second = process_image(&backend, &b, &dry_run()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_dry_run_sends_every_variant_to_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        std::fs::write(&source, b"bytes").unwrap();
        let output_dir = tmp.path().join("out/images");

        let config = ProcessingConfig {
            widths: vec![WidthSpec::Pixels(100), WidthSpec::Pixels(200)],
            output_dir: output_dir.clone(),
            ..ProcessingConfig::default()
        };
        let backend = MockBackend::with_dimensions(300, 200).writing_outputs();
        let metadata = process_image(&backend, &source, &config).unwrap();

        assert!(output_dir.is_dir());
        assert_eq!(backend.resize_count(), 6);
        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(
            metadata
                .iter()
                .all(|(_, variants)| variants.iter().all(|v| v.size == Some(MOCK_OUTPUT.len() as u64)))
        );
    }

    #[test]
    fn writes_real_files_and_reports_sizes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("photo.jpg");
        create_test_jpeg(&source, 160, 120);

        let config = ProcessingConfig {
            widths: vec![WidthSpec::Pixels(40), WidthSpec::Pixels(80)],
            formats: vec![OutputFormat::Webp, OutputFormat::Jpeg],
            output_dir: tmp.path().join("images"),
            ..ProcessingConfig::default()
        };
        let metadata =
            process_image(&crate::imaging::RustBackend::new(), &source, &config).unwrap();

        for (_, variants) in metadata.iter() {
            for variant in variants {
                assert!(variant.output_path.exists());
                assert!(variant.size.unwrap() > 0);
            }
        }
        let jpeg = metadata.get(OutputFormat::Jpeg).unwrap();
        assert_eq!((jpeg[1].width, jpeg[1].height), (80, 60));
        assert_eq!(
            image::image_dimensions(&jpeg[1].output_path).unwrap(),
            (80, 60)
        );
    }
}
