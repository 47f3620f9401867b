//! # respimg
//!
//! Responsive images for template-driven static sites. Registers an `image`
//! shortcode that turns one source photo into a `<picture>` element with
//! several formats and widths, plus a `relativeTo` filter for resolving image
//! paths next to the template being rendered.
//!
//! ```jinja
//! {{ image("content/photos/dusk.jpg", {"alt": "Dusk over the bay"}) }}
//! ```
//!
//! renders (with the default configuration):
//!
//! ```html
//! <picture>
//!   <source type="image/avif" srcset="/images/3f9a0c41de-400.avif 400w, …" sizes="100vw">
//!   <source type="image/webp" srcset="/images/3f9a0c41de-400.webp 400w, …" sizes="100vw">
//!   <img alt="Dusk over the bay" src="/images/3f9a0c41de-400.jpeg" width="1600" height="1067"
//!        srcset="…" sizes="100vw" loading="lazy" fetchpriority="auto">
//! </picture>
//! ```
//!
//! and writes the twelve variants to `_site/images/`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use minijinja::Environment;
//! use respimg::config::ProcessingOverrides;
//!
//! let mut env = Environment::new();
//! respimg::plugin::register(&mut env, Some(ProcessingOverrides::load("images.toml".as_ref())?))?;
//! let html = env.render_str(r#"{{ image("photos/dusk.jpg") }}"#, ())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`plugin`] | Registrar: `image` shortcode + `relativeTo` filter on a [`plugin::PluginHost`] (minijinja) |
//! | [`configurator`] | Captures plugin defaults; merges call-site options; processes and renders |
//! | [`config`] | Processing and rendering option sets, shallow merging, TOML loading, validation |
//! | [`process`] | Image-processing entry point: source → [`metadata::Metadata`] |
//! | [`html`] | HTML-generation entry point: metadata + options → `<picture>` markup (Maud) |
//! | [`metadata`] | Per-format, per-width variant descriptors |
//! | [`naming`] | Content-addressed output names and URL joining |
//! | [`imaging`] | Pure-Rust decode, resize and encode behind the [`imaging::ImageBackend`] trait |
//!
//! # Design Decisions
//!
//! ## Shallow, Layered Options
//!
//! Processing options are built-in defaults overlaid with the plugin config
//! given at registration. Rendering options are built-in defaults overlaid
//! with the options given at each call. Both overlays are shallow: a field set
//! in the override replaces the base value wholesale, an unset field keeps it.
//! Each option set is an explicit struct with an `Option`-per-field override
//! twin, so "unset" and "set to empty" stay distinguishable.
//!
//! ## Content-Addressed Outputs
//!
//! Output names are `{id}-{width}.{format}` where `id` hashes the source bytes
//! and quality. An existing file under that name holds the same pixels, so it
//! is reused instead of re-encoded; repeated builds only encode new or edited
//! images.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding (AVIF via rav1e, WebP, JPEG,
//! PNG) use the `image` crate only. No system libraries, no external
//! processes.
//!
//! ## One Suspension Point
//!
//! [`configurator::Configurator::render`] is async and suspends exactly once,
//! while processing runs on tokio's blocking pool. Within that job the encode
//! work fans out over rayon. No state is shared between calls beyond the
//! configurator's immutable defaults.

pub mod config;
pub mod configurator;
pub mod html;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod plugin;
pub mod process;

pub use configurator::{Configurator, ImageError, Rendered};

#[cfg(test)]
pub(crate) mod test_helpers;
