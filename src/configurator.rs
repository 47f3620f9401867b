//! The configurator: plugin defaults captured once, applied to every call.
//!
//! ```text
//! Configurator::new(plugin config)      ← once, at registration
//!        │
//!        ▼
//! render(path, call-site options)       ← per shortcode call
//!   ├─ process_image(path, processing)  → Metadata      (blocking pool)
//!   └─ generate_html(metadata, options) → String
//! ```
//!
//! Errors from processing and HTML generation surface unchanged: the
//! [`ImageError`] variants are transparent.

use crate::config::{ConfigError, ProcessingConfig, ProcessingOverrides, RenderOptions, RenderOverrides};
use crate::html::{HtmlError, generate_html};
use crate::imaging::{ImageBackend, RustBackend};
use crate::metadata::Metadata;
use crate::process::{ProcessError, process_image};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Html(#[from] HtmlError),
    #[error("Image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Output of one call: the markup and the metadata it was rendered from.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    pub metadata: Metadata,
}

/// Processing defaults for one plugin registration.
pub struct Configurator<B = RustBackend> {
    processing: ProcessingConfig,
    backend: Arc<B>,
}

impl Configurator<RustBackend> {
    /// Built-in defaults overlaid with `plugin_config`, on the pure Rust backend.
    pub fn new(plugin_config: Option<ProcessingOverrides>) -> Result<Self, ConfigError> {
        Self::with_backend(plugin_config, RustBackend::new())
    }
}

impl<B: ImageBackend + 'static> Configurator<B> {
    pub fn with_backend(
        plugin_config: Option<ProcessingOverrides>,
        backend: B,
    ) -> Result<Self, ConfigError> {
        let processing = match &plugin_config {
            Some(overrides) => ProcessingConfig::default().merge(overrides),
            None => ProcessingConfig::default(),
        };
        processing.validate()?;
        Ok(Self {
            processing,
            backend: Arc::new(backend),
        })
    }

    /// Effective processing configuration shared by every call.
    pub fn processing(&self) -> &ProcessingConfig {
        &self.processing
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Process `source` and render its markup.
    ///
    /// Processing runs on tokio's blocking pool when called inside a runtime,
    /// and inline otherwise.
    pub async fn render(
        &self,
        source: impl AsRef<Path>,
        options: Option<&RenderOverrides>,
    ) -> Result<Rendered, ImageError> {
        let source = source.as_ref().to_path_buf();
        let backend = Arc::clone(&self.backend);
        let processing = self.processing.clone();

        let job = move || process_image(backend.as_ref(), &source, &processing);
        let metadata = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.spawn_blocking(job).await??,
            Err(_) => job()?,
        };

        let options = RenderOptions::default().merge(options);
        let html = generate_html(&metadata, &options)?;
        Ok(Rendered { html, metadata })
    }
}
