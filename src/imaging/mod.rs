//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (header only) |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | AVIF (rav1e), WebP (lossless), JPEG, PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for width and height math (unit testable)
//! - **Parameters**: Data structures describing encode jobs
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Variant planning and execution on top of a backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_output_widths, scale_height};
pub use operations::{create_variants, get_dimensions, plan_variants, resolve_formats};
pub use params::{Quality, ResizeParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
