//! Registration with the template host.
//!
//! [`register`] attaches two callables to a [`PluginHost`]:
//!
//! | Name | Kind | Signature |
//! |---|---|---|
//! | `image` | async shortcode | `image(path, options?) → markup` |
//! | `relativeTo` | filter | `relativePath \| relativeTo(inputPath) → path` |
//!
//! With minijinja as the host:
//!
//! ```jinja
//! {{ image("content/photos/dusk.jpg", {"alt": "Dusk over the bay", "loading": "eager"}) }}
//! {{ image("./dusk.jpg" | relativeTo(page.input_path)) }}
//! ```

use crate::config::{ConfigError, ProcessingOverrides, RenderOverrides};
use crate::configurator::{Configurator, ImageError};
use crate::imaging::ImageBackend;
use minijinja::value::ViaDeserialize;
use minijinja::{ErrorKind, Value};
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

pub const IMAGE_SHORTCODE: &str = "image";
pub const RELATIVE_TO_FILTER: &str = "relativeTo";

/// Future returned by an async shortcode.
pub type ShortcodeFuture = Pin<Box<dyn Future<Output = Result<String, ImageError>> + Send>>;

/// The template host's extension points.
pub trait PluginHost {
    /// Register an async shortcode taking a path and optional rendering options.
    fn add_async_shortcode<F>(&mut self, name: &'static str, shortcode: F)
    where
        F: Fn(String, Option<RenderOverrides>) -> ShortcodeFuture + Send + Sync + 'static;

    /// Register a synchronous two-argument path filter.
    fn add_path_filter<F>(&mut self, name: &'static str, filter: F)
    where
        F: Fn(&str, &str) -> io::Result<String> + Send + Sync + 'static;
}

/// Register the `image` shortcode and `relativeTo` filter on `host`.
///
/// `plugin_config` is captured once and applies to every `image` call.
pub fn register(
    host: &mut impl PluginHost,
    plugin_config: Option<ProcessingOverrides>,
) -> Result<(), ConfigError> {
    register_configurator(host, Configurator::new(plugin_config)?);
    Ok(())
}

/// Register with an already-built configurator (custom backend).
pub fn register_configurator<B: ImageBackend + 'static>(
    host: &mut impl PluginHost,
    configurator: Configurator<B>,
) {
    let configurator = Arc::new(configurator);
    tracing::debug!(
        shortcode = IMAGE_SHORTCODE,
        filter = RELATIVE_TO_FILTER,
        processing = ?configurator.processing(),
        "registering image plugin"
    );

    host.add_async_shortcode(
        IMAGE_SHORTCODE,
        move |path: String, options: Option<RenderOverrides>| -> ShortcodeFuture {
            let configurator = Arc::clone(&configurator);
            Box::pin(async move {
                configurator
                    .render(&path, options.as_ref())
                    .await
                    .map(|rendered| rendered.html)
            })
        },
    );

    host.add_path_filter(RELATIVE_TO_FILTER, |relative_path, input_path| {
        relative_to(relative_path, input_path).map(|p| p.to_string_lossy().into_owned())
    });
}

/// Resolve `relative_path` against the directory holding `input_path`.
///
/// `input_path` is split on `/` and its last segment (the file name) dropped;
/// the remainder is joined with the platform separator. The result is
/// anchored at the current working directory when still relative, and `.`/`..`
/// are resolved lexically. An absolute `relative_path` wins outright.
pub fn relative_to(relative_path: &str, input_path: &str) -> io::Result<PathBuf> {
    let mut segments: Vec<&str> = input_path.split('/').collect();
    segments.pop();
    let dir = segments.join(std::path::MAIN_SEPARATOR_STR);

    let joined = Path::new(&dir).join(relative_path);
    let absolute = if joined.is_absolute() {
        joined
    } else {
        std::env::current_dir()?.join(joined)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn template_error(err: impl std::error::Error + Send + Sync + 'static) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

/// minijinja renders synchronously, so the shortcode future is driven to
/// completion where the template calls it. Markup is returned as a safe
/// string so auto-escaping leaves it intact.
impl PluginHost for minijinja::Environment<'_> {
    fn add_async_shortcode<F>(&mut self, name: &'static str, shortcode: F)
    where
        F: Fn(String, Option<RenderOverrides>) -> ShortcodeFuture + Send + Sync + 'static,
    {
        self.add_function(
            name,
            move |path: String,
                  options: Option<ViaDeserialize<RenderOverrides>>|
                  -> Result<Value, minijinja::Error> {
                let html = futures::executor::block_on(shortcode(path, options.map(|o| o.0)))
                    .map_err(template_error)?;
                Ok(Value::from_safe_string(html))
            },
        );
    }

    fn add_path_filter<F>(&mut self, name: &'static str, filter: F)
    where
        F: Fn(&str, &str) -> io::Result<String> + Send + Sync + 'static,
    {
        self.add_filter(
            name,
            move |relative_path: String, input_path: String| -> Result<String, minijinja::Error> {
                filter(&relative_path, &input_path).map_err(template_error)
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use std::collections::HashMap;

    type Shortcode = Box<dyn Fn(String, Option<RenderOverrides>) -> ShortcodeFuture + Send + Sync>;
    type Filter = Box<dyn Fn(&str, &str) -> io::Result<String> + Send + Sync>;

    /// Host that keeps registered callables so tests can invoke them.
    #[derive(Default)]
    struct RecordingHost {
        shortcodes: HashMap<&'static str, Shortcode>,
        filters: HashMap<&'static str, Filter>,
    }

    impl PluginHost for RecordingHost {
        fn add_async_shortcode<F>(&mut self, name: &'static str, shortcode: F)
        where
            F: Fn(String, Option<RenderOverrides>) -> ShortcodeFuture + Send + Sync + 'static,
        {
            self.shortcodes.insert(name, Box::new(shortcode));
        }

        fn add_path_filter<F>(&mut self, name: &'static str, filter: F)
        where
            F: Fn(&str, &str) -> io::Result<String> + Send + Sync + 'static,
        {
            self.filters.insert(name, Box::new(filter));
        }
    }

    fn mock_host() -> RecordingHost {
        let mut host = RecordingHost::default();
        let configurator = Configurator::with_backend(
            Some(ProcessingOverrides::dry_run()),
            MockBackend::with_dimensions(2000, 1000),
        )
        .unwrap();
        register_configurator(&mut host, configurator);
        host
    }

    #[test]
    fn registers_shortcode_and_filter() {
        let host = mock_host();
        assert_eq!(host.shortcodes.len(), 1);
        assert!(host.shortcodes.contains_key("image"));
        assert_eq!(host.filters.len(), 1);
        assert!(host.filters.contains_key("relativeTo"));
    }

    #[test]
    fn register_rejects_invalid_plugin_config() {
        let mut host = RecordingHost::default();
        let result = register(
            &mut host,
            Some(ProcessingOverrides {
                quality: Some(0),
                ..Default::default()
            }),
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert!(host.shortcodes.is_empty());
    }

    #[test]
    fn shortcode_returns_only_markup() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        std::fs::write(&source, b"bytes").unwrap();

        let host = mock_host();
        let shortcode = &host.shortcodes["image"];
        let overrides = RenderOverrides {
            class: Some("hero".into()),
            ..Default::default()
        };
        let html = futures::executor::block_on(shortcode(
            source.to_string_lossy().into_owned(),
            Some(overrides),
        ))
        .unwrap();

        assert!(html.starts_with("<picture>"));
        assert!(html.contains(r#"class="hero""#));
    }

    #[test]
    fn shortcode_propagates_missing_source() {
        let host = mock_host();
        let result =
            futures::executor::block_on(host.shortcodes["image"]("/nonexistent.jpg".into(), None));
        assert!(result.is_err());
    }

    #[test]
    fn filter_resolves_against_input_directory() {
        let host = mock_host();
        let resolved = host.filters["relativeTo"]("./dusk.jpg", "/site/src/posts/post.md").unwrap();
        assert_eq!(
            PathBuf::from(resolved),
            Path::new("/site/src/posts").join("dusk.jpg")
        );
    }

    #[test]
    fn relative_to_handles_parent_segments() {
        let resolved = relative_to("../img/a.jpg", "/site/src/posts/post.md").unwrap();
        assert_eq!(resolved, PathBuf::from("/site/src/img/a.jpg"));
    }

    #[test]
    fn relative_to_absolute_relative_path_wins() {
        let resolved = relative_to("/assets/a.jpg", "/site/src/post.md").unwrap();
        assert_eq!(resolved, PathBuf::from("/assets/a.jpg"));
    }

    #[test]
    fn relative_to_anchors_relative_input_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let resolved = relative_to("a.jpg", "./src/posts/post.md").unwrap();
        assert_eq!(resolved, normalize(&cwd.join("src/posts/a.jpg")));
    }

    #[test]
    fn relative_to_bare_file_name_uses_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let resolved = relative_to("a.jpg", "post.md").unwrap();
        assert_eq!(resolved, normalize(&cwd.join("a.jpg")));
    }

    #[test]
    fn relative_to_empty_paths_is_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(relative_to("", "").unwrap(), normalize(&cwd));
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c/")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }
}
