//! Plugin configuration: processing defaults and rendering options.
//!
//! There are two option sets, each layered the same way:
//!
//! ```text
//! processing:  built-in defaults  ←  plugin config (captured at registration)
//! rendering:   built-in defaults  ←  call-site options (per shortcode call)
//! ```
//!
//! Merging is **shallow**: every top-level option in an override replaces the
//! base value wholesale. A `widths` list supplied by the plugin config replaces
//! the default list; it is never merged element by element. Unset override
//! fields keep the base value.
//!
//! ## Processing options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! widths = [400, 800, 1200, 1600]  # Output widths in pixels; "auto" = original width
//! formats = ["avif", "webp", "jpeg"] # avif, webp, jpeg, png, or "auto" (source format)
//! urlPath = "/images/"             # URL prefix for generated files
//! outputDir = "_site/images/"      # Directory generated files are written to
//! dryRun = false                   # Compute metadata only, write nothing
//! quality = 80                     # Lossy encoding quality (1-100)
//! ```
//!
//! Snake-case spellings (`url_path`, `output_dir`, `dry_run`) are accepted too.
//! Unknown keys are rejected to catch typos early.
//!
//! ## Rendering options
//!
//! `alt`, `sizes`, `loading`, `fetchPriority` and `class` are named fields.
//! Any other key is an extra attribute written verbatim onto the `<img>`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// An output image format.
///
/// `Auto` stands for "whatever the source is" and is resolved per image by
/// [`OutputFormat::resolve`]; it never shows up in generated metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Avif,
    Webp,
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Auto,
}

impl OutputFormat {
    /// Name used as the metadata key and in file extensions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Auto => "auto",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Auto => "application/octet-stream",
        }
    }

    /// Guess a format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "avif" => Some(Self::Avif),
            "webp" => Some(Self::Webp),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Resolve `Auto` against the source image; concrete formats pass through.
    ///
    /// Sources we cannot re-encode in their own format (e.g. TIFF) fall back to JPEG.
    pub fn resolve(self, source: Option<OutputFormat>) -> OutputFormat {
        match self {
            Self::Auto => source.unwrap_or(Self::Jpeg),
            concrete => concrete,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A requested output width.
///
/// Deserializes from a positive integer, or from `"auto"` / null meaning
/// "the original width of the source".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthSpec {
    Pixels(u32),
    Auto,
}

impl Serialize for WidthSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Pixels(px) => serializer.serialize_u32(*px),
            Self::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for WidthSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WidthVisitor;

        impl<'de> Visitor<'de> for WidthVisitor {
            type Value = WidthSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a pixel width or \"auto\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<WidthSpec, E> {
                u32::try_from(v)
                    .map(WidthSpec::Pixels)
                    .map_err(|_| E::custom(format!("width {v} is out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<WidthSpec, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("width {v} must not be negative")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<WidthSpec, E> {
                if v.eq_ignore_ascii_case("auto") {
                    Ok(WidthSpec::Auto)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<WidthSpec, E> {
                Ok(WidthSpec::Auto)
            }

            fn visit_none<E: de::Error>(self) -> Result<WidthSpec, E> {
                Ok(WidthSpec::Auto)
            }
        }

        deserializer.deserialize_any(WidthVisitor)
    }
}

/// Effective processing configuration for one configurator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Widths to generate, before filtering against the source width.
    pub widths: Vec<WidthSpec>,
    /// Output formats, in `<source>` order.
    pub formats: Vec<OutputFormat>,
    /// URL prefix prepended to generated file names.
    pub url_path: String,
    /// Directory generated files are written to.
    pub output_dir: PathBuf,
    /// When set, metadata is computed but nothing is written.
    pub dry_run: bool,
    /// Lossy encoding quality (1-100). WebP output is lossless and ignores it.
    pub quality: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            widths: [400, 800, 1200, 1600]
                .into_iter()
                .map(WidthSpec::Pixels)
                .collect(),
            formats: vec![OutputFormat::Avif, OutputFormat::Webp, OutputFormat::Jpeg],
            url_path: "/images/".to_string(),
            output_dir: PathBuf::from("_site/images/"),
            dry_run: false,
            quality: 80,
        }
    }
}

impl ProcessingConfig {
    /// Overlay `overrides` onto `self`, top-level field by field.
    pub fn merge(mut self, overrides: &ProcessingOverrides) -> Self {
        if let Some(widths) = &overrides.widths {
            self.widths = widths.clone();
        }
        if let Some(formats) = &overrides.formats {
            self.formats = formats.clone();
        }
        if let Some(url_path) = &overrides.url_path {
            self.url_path = url_path.clone();
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(dry_run) = overrides.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(quality) = overrides.quality {
            self.quality = quality;
        }
        self
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widths.is_empty() {
            return Err(ConfigError::Validation("widths must not be empty".into()));
        }
        if self.widths.contains(&WidthSpec::Pixels(0)) {
            return Err(ConfigError::Validation(
                "widths values must be non-zero".into(),
            ));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Validation("formats must not be empty".into()));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.url_path.is_empty() {
            return Err(ConfigError::Validation("urlPath must not be empty".into()));
        }
        Ok(())
    }
}

/// Sparse processing options supplied at plugin registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ProcessingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widths: Option<Vec<WidthSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<OutputFormat>>,
    #[serde(alias = "url_path", skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(alias = "output_dir", skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(alias = "dry_run", skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

impl ProcessingOverrides {
    /// Overrides that only switch on dry-run mode.
    pub fn dry_run() -> Self {
        Self {
            dry_run: Some(true),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load overrides from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Effective rendering options for one shortcode call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub alt: String,
    pub sizes: String,
    pub loading: String,
    pub fetch_priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Extra `<img>` attributes, written verbatim.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            alt: String::new(),
            sizes: "100vw".to_string(),
            loading: "lazy".to_string(),
            fetch_priority: "auto".to_string(),
            class: None,
            attributes: BTreeMap::new(),
        }
    }
}

impl RenderOptions {
    /// Overlay call-site options. `None` leaves the options untouched.
    pub fn merge(mut self, overrides: Option<&RenderOverrides>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };
        if let Some(alt) = &overrides.alt {
            self.alt = alt.clone();
        }
        if let Some(sizes) = &overrides.sizes {
            self.sizes = sizes.clone();
        }
        if let Some(loading) = &overrides.loading {
            self.loading = loading.clone();
        }
        if let Some(fetch_priority) = &overrides.fetch_priority {
            self.fetch_priority = fetch_priority.clone();
        }
        if let Some(class) = &overrides.class {
            self.class = Some(class.clone());
        }
        for (name, value) in &overrides.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
        self
    }
}

/// Sparse rendering options passed at the call site.
///
/// Deserializes from a template map such as
/// `{"alt": "Dusk", "fetchPriority": "high", "data-index": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading: Option<String>,
    #[serde(alias = "fetchpriority", skip_serializing_if = "Option::is_none")]
    pub fetch_priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A documented TOML file with every processing default.
pub fn stock_config_toml() -> &'static str {
    r#"# Responsive image processing options.
# All options are optional - defaults shown below.

# Output widths in pixels. "auto" means the source's own width.
# Widths larger than the source are skipped; if none fit, the source width is used.
widths = [400, 800, 1200, 1600]

# Output formats in <source> order: avif, webp, jpeg, png, or "auto" (source format).
# The <img> fallback is the first of jpeg, png, webp, avif that is listed.
formats = ["avif", "webp", "jpeg"]

# URL prefix for generated files.
urlPath = "/images/"

# Directory generated files are written to.
outputDir = "_site/images/"

# Compute metadata only; write nothing to disk.
dryRun = false

# Lossy encoding quality (1-100). WebP output is lossless.
quality = 80
"#
}
