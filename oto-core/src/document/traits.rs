use serde::{Deserialize, Serialize};

use crate::error::OtoResult;

/// Handle to an element returned by [`Document::select`]: the `index`-th
/// mountable element matching `selector`, in document order.
///
/// Handles are only valid until the next mutation of the document that
/// produced them; `generation` lets implementations reject stale handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub selector: String,
    pub index: usize,
    pub generation: u64,
}

impl ElementRef {
    pub fn new(selector: impl Into<String>, index: usize, generation: u64) -> Self {
        Self {
            selector: selector.into(),
            index,
            generation,
        }
    }
}

/// The page the loader mounts fragments into.
pub trait Document: Send {
    /// Every element matching `selector`, in document order. Elements that
    /// cannot hold content never match.
    fn select(&self, selector: &str) -> Vec<ElementRef>;

    /// Replaces the element's entire content.
    fn set_inner_html(&mut self, element: &ElementRef, html: &str) -> OtoResult<()>;

    fn inner_html(&self, element: &ElementRef) -> Option<String>;

    /// Content of the single element matching `selector`, if exactly one does.
    fn content_of(&self, selector: &str) -> Option<String> {
        match self.select(selector).as_slice() {
            [element] => self.inner_html(element),
            _ => None,
        }
    }
}
