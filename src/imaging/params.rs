//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between [`operations`](super::operations), which decides which variants a
//! source needs, and the [`backend`](super::backend), which does the pixel
//! work. Keeping them separate lets tests swap in a mock backend.
//!
//! - [`Quality`]: lossy encoding quality (1-100, default 80), clamped on construction.
//! - [`ResizeParams`]: one output file: path, target dimensions, format, quality.

use crate::config::OutputFormat;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for one resize-and-encode job.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}
