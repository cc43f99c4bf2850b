use lol_html::html_content::{ContentType, Element};
use lol_html::{element, rewrite_str, HandlerResult, RewriteStrSettings};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{OtoError, OtoResult};

use super::traits::{Document, ElementRef};

const INNER_START: &str = "<!--oto:inner-start-->";
const INNER_END: &str = "<!--oto:inner-end-->";

/// An HTML page held as text.
///
/// Lookups and mounts stream the markup through a CSS-selector rewriter, so
/// mounting a fragment changes only the target element's content and every
/// other byte of the page stays as written.
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    source: String,
    generation: u64,
}

impl HtmlDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            generation: 0,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> OtoResult<Self> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            OtoError::IoError(format!("Failed to read template {}: {}", path.display(), e))
        })?;
        Ok(Self::new(source))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }

    /// Streams the page, calling `edit` on the `target`-th element matching
    /// `selector` that can hold content. Returns the rewritten markup and the
    /// number of such elements.
    fn rewrite<F>(&self, selector: &str, target: Option<usize>, mut edit: F) -> OtoResult<(String, usize)>
    where
        F: FnMut(&mut Element<'_, '_>) -> HandlerResult,
    {
        if selector.parse::<lol_html::Selector>().is_err() {
            return Err(OtoError::Internal(format!(
                "unsupported selector \"{}\"",
                selector
            )));
        }

        let mut count = 0;
        let output = rewrite_str(
            &self.source,
            RewriteStrSettings {
                element_content_handlers: vec![element!(selector, |el| {
                    if !el.can_have_content() {
                        return Ok(());
                    }
                    if target == Some(count) {
                        edit(el)?;
                    }
                    count += 1;
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|e| OtoError::Internal(format!("Failed to rewrite document: {}", e)))?;

        Ok((output, count))
    }

    fn check_generation(&self, element: &ElementRef) -> OtoResult<()> {
        if element.generation != self.generation {
            return Err(OtoError::Internal(format!(
                "stale element reference {}[{}] (generation {} != {})",
                element.selector, element.index, element.generation, self.generation
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Document for HtmlDocument {
    fn select(&self, selector: &str) -> Vec<ElementRef> {
        match self.rewrite(selector, None, |_| Ok(())) {
            Ok((_, count)) => (0..count)
                .map(|index| ElementRef::new(selector, index, self.generation))
                .collect(),
            Err(e) => {
                debug!(selector = %selector, error = %e, "Selector matches nothing");
                Vec::new()
            }
        }
    }

    fn set_inner_html(&mut self, element: &ElementRef, html: &str) -> OtoResult<()> {
        self.check_generation(element)?;

        let (output, count) = self.rewrite(&element.selector, Some(element.index), |el| {
            el.set_inner_content(html, ContentType::Html);
            Ok(())
        })?;

        if element.index >= count {
            return Err(OtoError::Internal(format!(
                "element {}[{}] no longer exists",
                element.selector, element.index
            )));
        }

        self.source = output;
        self.generation += 1;
        Ok(())
    }

    fn inner_html(&self, element: &ElementRef) -> Option<String> {
        if self.check_generation(element).is_err() {
            return None;
        }

        let (output, _) = self
            .rewrite(&element.selector, Some(element.index), |el| {
                el.prepend(INNER_START, ContentType::Html);
                el.append(INNER_END, ContentType::Html);
                Ok(())
            })
            .ok()?;

        let start = output.find(INNER_START)? + INNER_START.len();
        let end = start + output[start..].find(INNER_END)?;
        Some(output[start..end].to_string())
    }
}
