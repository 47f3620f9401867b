//! Responsive markup generation.
//!
//! Turns [`Metadata`] plus [`RenderOptions`] into a `<picture>` element:
//!
//! ```html
//! <picture>
//!   <source type="image/avif" srcset="/images/id-400.avif 400w, …" sizes="100vw">
//!   <source type="image/webp" srcset="/images/id-400.webp 400w, …" sizes="100vw">
//!   <img alt="" src="/images/id-400.jpeg" width="1600" height="1067"
//!        srcset="/images/id-400.jpeg 400w, …" sizes="100vw"
//!        loading="lazy" fetchpriority="auto">
//! </picture>
//! ```
//!
//! The `<img>` uses the fallback format ([`Metadata::fallback_format`]): `src`
//! is its smallest variant, `width`/`height` its largest, so the browser can
//! reserve the right aspect ratio before anything loads. With a single format
//! the `<picture>` wrapper is dropped and only the `<img>` is emitted.
//!
//! Uses [maud](https://maud.lambda.xyz/); every value is escaped. Extra
//! attributes have caller-chosen names, which maud's macro cannot express, so
//! the `<img>` tag is assembled from escaped parts and spliced in.

use crate::config::RenderOptions;
use crate::metadata::{ImageVariant, Metadata};
use maud::{Markup, PreEscaped, html};
use thiserror::Error;

/// Attributes the generator owns; callers cannot override them.
const RESERVED_ATTRIBUTES: &[&str] = &["src", "srcset", "width", "height"];

/// Attributes set through named options. Extra keys may not repeat them in any case.
const NAMED_ATTRIBUTES: &[&str] = &["alt", "sizes", "loading", "fetchpriority", "class"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HtmlError {
    #[error("No image variants to render")]
    NoVariants,
    #[error("Missing `sizes` attribute: required when a srcset lists several widths")]
    MissingSizes,
    #[error("Invalid attribute name: {0:?}")]
    InvalidAttributeName(String),
    #[error("Attribute `{0}` is generated and cannot be overridden")]
    ReservedAttribute(String),
    #[error("Attribute `{0}` duplicates the `{1}` option")]
    DuplicateAttribute(String, String),
    #[error("Attribute `{0}` must be a string, number, boolean or null")]
    InvalidAttributeValue(String),
}

/// Render the markup for one processed image.
pub fn generate_html(metadata: &Metadata, options: &RenderOptions) -> Result<String, HtmlError> {
    let fallback_format = metadata.fallback_format().ok_or(HtmlError::NoVariants)?;
    let fallback = metadata
        .get(fallback_format)
        .filter(|v| !v.is_empty())
        .ok_or(HtmlError::NoVariants)?;

    let sources: Vec<&[ImageVariant]> = metadata
        .iter()
        .filter(|(format, variants)| *format != fallback_format && !variants.is_empty())
        .map(|(_, variants)| variants)
        .collect();

    let needs_sizes = fallback.len() > 1 || sources.iter().any(|v| v.len() > 1);
    if needs_sizes && options.sizes.is_empty() {
        return Err(HtmlError::MissingSizes);
    }

    let img = render_img(fallback, options)?;
    if sources.is_empty() {
        return Ok(img.into_string());
    }

    let markup = html! {
        picture {
            @for variants in &sources {
                @if variants.len() > 1 {
                    source type=(variants[0].source_type) srcset=(srcset(variants)) sizes=(options.sizes);
                } @else {
                    source type=(variants[0].source_type) srcset=(srcset(variants));
                }
            }
            (img)
        }
    };
    Ok(markup.into_string())
}

fn srcset(variants: &[ImageVariant]) -> String {
    variants
        .iter()
        .map(|v| v.srcset.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// An attribute value; `None` renders a bare (boolean) attribute.
type Attribute = (String, Option<String>);

fn render_img(fallback: &[ImageVariant], options: &RenderOptions) -> Result<Markup, HtmlError> {
    let (Some(low), Some(high)) = (fallback.first(), fallback.last()) else {
        return Err(HtmlError::NoVariants);
    };

    let mut attributes: Vec<Attribute> = vec![
        ("alt".into(), Some(options.alt.clone())),
        ("src".into(), Some(low.url.clone())),
        ("width".into(), Some(high.width.to_string())),
        ("height".into(), Some(high.height.to_string())),
    ];
    if fallback.len() > 1 {
        attributes.push(("srcset".into(), Some(srcset(fallback))));
        attributes.push(("sizes".into(), Some(options.sizes.clone())));
    }
    attributes.push(("loading".into(), Some(options.loading.clone())));
    attributes.push(("fetchpriority".into(), Some(options.fetch_priority.clone())));
    if let Some(class) = &options.class {
        attributes.push(("class".into(), Some(class.clone())));
    }
    for (name, value) in &options.attributes {
        if let Some(attribute) = extra_attribute(name, value)? {
            attributes.push(attribute);
        }
    }

    let mut tag = String::from("<img");
    for (name, value) in &attributes {
        tag.push(' ');
        tag.push_str(name);
        if let Some(value) = value {
            tag.push_str("=\"");
            tag.push_str(&html! { (value) }.into_string());
            tag.push('"');
        }
    }
    tag.push('>');
    Ok(PreEscaped(tag))
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn extra_attribute(
    name: &str,
    value: &serde_json::Value,
) -> Result<Option<Attribute>, HtmlError> {
    if !is_valid_attribute_name(name) {
        return Err(HtmlError::InvalidAttributeName(name.to_string()));
    }
    let lowered = name.to_ascii_lowercase();
    if RESERVED_ATTRIBUTES.contains(&lowered.as_str()) {
        return Err(HtmlError::ReservedAttribute(name.to_string()));
    }
    if NAMED_ATTRIBUTES.contains(&lowered.as_str()) {
        return Err(HtmlError::DuplicateAttribute(name.to_string(), lowered));
    }

    use serde_json::Value;
    let value = match value {
        Value::Null | Value::Bool(false) => return Ok(None),
        Value::Bool(true) => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => {
            return Err(HtmlError::InvalidAttributeValue(name.to_string()));
        }
    };
    Ok(Some((name.to_string(), value)))
}
