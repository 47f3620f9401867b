//! Metadata describing the generated variants of one source image.
//!
//! Serialized as an ordered map from format name to variant list:
//!
//! ```json
//! {
//!   "avif": [{ "format": "avif", "width": 400, "height": 267,
//!              "url": "/images/3f9a0c41de-400.avif", "sourceType": "image/avif",
//!              "srcset": "/images/3f9a0c41de-400.avif 400w",
//!              "filename": "3f9a0c41de-400.avif",
//!              "outputPath": "_site/images/3f9a0c41de-400.avif", "size": 10233 }, ...],
//!   "webp": [...],
//!   "jpeg": [...]
//! }
//! ```
//!
//! Map order is the configured format order; each list is in ascending width.

use crate::config::OutputFormat;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// `<img>` fallback candidates, most widely supported first.
pub const FALLBACK_PREFERENCE: [OutputFormat; 4] = [
    OutputFormat::Jpeg,
    OutputFormat::Png,
    OutputFormat::Webp,
    OutputFormat::Avif,
];

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVariant {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub url: String,
    /// MIME type, used as the `<source type>` attribute.
    pub source_type: String,
    /// Single srcset candidate: `"{url} {width}w"`.
    pub srcset: String,
    pub filename: String,
    pub output_path: PathBuf,
    /// Bytes on disk. Absent in dry-run mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// All variants of one source image, keyed by format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(OutputFormat, Vec<ImageVariant>)>,
}

impl Metadata {
    pub fn new(entries: Vec<(OutputFormat, Vec<ImageVariant>)>) -> Self {
        Self { entries }
    }

    /// Variants for `format`, ascending by width.
    pub fn get(&self, format: OutputFormat) -> Option<&[ImageVariant]> {
        self.entries
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, variants)| variants.as_slice())
    }

    pub fn contains(&self, format: OutputFormat) -> bool {
        self.get(format).is_some()
    }

    /// Formats in configured order.
    pub fn formats(&self) -> impl Iterator<Item = OutputFormat> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputFormat, &[ImageVariant])> + '_ {
        self.entries.iter().map(|(f, v)| (*f, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Format used for the `<img>` element: the most widely supported one
    /// present, by [`FALLBACK_PREFERENCE`].
    pub fn fallback_format(&self) -> Option<OutputFormat> {
        FALLBACK_PREFERENCE
            .iter()
            .copied()
            .find(|&format| self.contains(format))
            .or_else(|| self.formats().last())
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (format, variants) in &self.entries {
            map.serialize_entry(format.name(), variants)?;
        }
        map.end()
    }
}
