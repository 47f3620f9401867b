//! Output file naming.
//!
//! Generated files are content-addressed:
//!
//! ```text
//! {id}-{width}.{format}        e.g.  3f9a0c41de-800.webp
//! ```
//!
//! The `id` is the first 10 hex characters of a SHA-256 over the source bytes
//! and the encoding quality. Anything else that changes the pixels (width,
//! format) is already part of the name. Renaming or moving the source keeps the
//! id, and editing it changes the id, so a stale output can never be served
//! under a current name.

use crate::config::OutputFormat;
use sha2::{Digest, Sha256};

const ID_LEN: usize = 10;

/// Content id for a source image at a given quality.
pub fn source_id(source_bytes: &[u8], quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_bytes);
    hasher.update(quality.to_le_bytes());
    let digest = hasher.finalize();
    let mut hex = format!("{digest:x}");
    hex.truncate(ID_LEN);
    hex
}

/// File name of one generated variant.
pub fn output_filename(id: &str, width: u32, format: OutputFormat) -> String {
    format!("{id}-{width}.{}", format.name())
}

/// Join a URL prefix and a file name with exactly one `/` between them.
pub fn join_url(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let filename = filename.trim_start_matches('/');
    format!("{prefix}/{filename}")
}
