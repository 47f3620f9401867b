//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! A batch decodes the source once; the jobs then resize and encode in
//! parallel on rayon's pool.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use crate::config::OutputFormat;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is absent: the `image` crate's `"avif"` feature only
/// enables the **encoder** (rav1e). `ImageFormat::reading_enabled()` still
/// reports `true` for AVIF with that feature, so it cannot be trusted alone.
const SOURCE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    SOURCE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of source file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk, sniffing the format from its content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Drop channels the target encoder cannot take: JPEG has no alpha, and the
/// other encoders are fed 8-bit RGB(A).
fn prepare_for(img: &DynamicImage, format: OutputFormat) -> DynamicImage {
    if format == OutputFormat::Jpeg || !img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        DynamicImage::ImageRgba8(img.to_rgba8())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Encode `img` into `writer` and flush it.
///
/// I/O failures, including the final flush, surface as [`BackendError::Io`].
fn encode<W: Write>(
    img: &DynamicImage,
    params: &ResizeParams,
    writer: &mut W,
) -> Result<(), BackendError> {
    let prepared = prepare_for(img, params.format);
    let quality = params.quality.value() as u8;

    let encoded = match params.format {
        OutputFormat::Avif => prepared.write_with_encoder(
            image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut *writer, 6, quality),
        ),
        OutputFormat::Jpeg => prepared.write_with_encoder(
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut *writer, quality),
        ),
        OutputFormat::Webp => prepared
            .write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(&mut *writer)),
        OutputFormat::Png => {
            prepared.write_with_encoder(image::codecs::png::PngEncoder::new(&mut *writer))
        }
        OutputFormat::Auto => {
            return Err(BackendError::ProcessingFailed(
                "output format must be resolved before encoding".into(),
            ));
        }
    };

    encoded.map_err(|e| match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::ProcessingFailed(format!(
            "{} encode failed for {}: {}",
            params.format,
            params.output.display(),
            other
        )),
    })?;
    writer.flush()?;
    Ok(())
}

/// Encode into `writer` (open on `part`), then rename `part` to the output.
///
/// On any failure `part` is removed and the output name is never created, so
/// later runs cannot mistake a truncated file for a finished one.
fn write_and_commit<W: Write>(
    img: &DynamicImage,
    params: &ResizeParams,
    part: &Path,
    mut writer: W,
) -> Result<(), BackendError> {
    let written = encode(img, params, &mut writer);
    drop(writer);
    if let Err(e) = written {
        let _ = std::fs::remove_file(part);
        return Err(e);
    }
    std::fs::rename(part, &params.output)?;
    Ok(())
}

fn save_image(img: &DynamicImage, params: &ResizeParams) -> Result<(), BackendError> {
    let part = partial_path(&params.output);
    let writer = BufWriter::new(File::create(&part)?);
    write_and_commit(img, params, &part, writer)
}

fn resize_and_save(img: &DynamicImage, params: &ResizeParams) -> Result<(), BackendError> {
    if (params.width, params.height) == (img.width(), img.height()) {
        return save_image(img, params);
    }
    let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
    save_image(&resized, params)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to read dimensions of {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, source: &Path, jobs: &[ResizeParams]) -> Result<(), BackendError> {
        if jobs.is_empty() {
            return Ok(());
        }
        let img = load_image(source)?;
        jobs.par_iter().try_for_each(|job| resize_and_save(&img, job))
    }
}
