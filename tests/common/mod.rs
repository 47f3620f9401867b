//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Source photo wide enough for every default width.
pub const PHOTO_WIDTH: u32 = 1800;
pub const PHOTO_HEIGHT: u32 = 1200;

/// Write a gradient JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let writer = std::io::BufWriter::new(std::fs::File::create(path).unwrap());
    image::codecs::jpeg::JpegEncoder::new_with_quality(writer, 85)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// A temp dir holding `test-content/image.jpg`.
pub fn photo_fixture() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("test-content");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("image.jpg");
    write_jpeg(&path, PHOTO_WIDTH, PHOTO_HEIGHT);
    (tmp, path)
}

/// The `<img …>` tag of a rendered fragment.
pub fn img_tag(html: &str) -> &str {
    let start = html.find("<img").expect("no <img> in markup");
    let end = html[start..].find('>').expect("unterminated <img>") + start;
    &html[start..=end]
}

/// The first `<source …>` tag of a rendered fragment.
pub fn first_source_tag(html: &str) -> &str {
    let start = html.find("<source").expect("no <source> in markup");
    let end = html[start..].find('>').expect("unterminated <source>") + start;
    &html[start..=end]
}
