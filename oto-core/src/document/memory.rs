use crate::error::{OtoError, OtoResult};

use super::traits::{Document, ElementRef};

/// A document made of named slots, one per mount point.
///
/// Slots are matched by exact selector text, so registering the same
/// selector twice produces an ambiguous target.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    slots: Vec<(String, String)>,
    writes: Vec<String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, selector: impl Into<String>, content: impl Into<String>) -> Self {
        self.slots.push((selector.into(), content.into()));
        self
    }

    /// Content of the first slot registered under `selector`.
    pub fn content(&self, selector: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|(key, _)| key == selector)
            .map(|(_, content)| content.as_str())
    }

    /// Selectors in the order they were written to.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    fn slot_index(&self, element: &ElementRef) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, (key, _))| *key == element.selector)
            .nth(element.index)
            .map(|(position, _)| position)
    }
}

impl Document for MemoryDocument {
    fn select(&self, selector: &str) -> Vec<ElementRef> {
        let count = self.slots.iter().filter(|(key, _)| key == selector).count();
        (0..count)
            .map(|index| ElementRef::new(selector, index, 0))
            .collect()
    }

    fn set_inner_html(&mut self, element: &ElementRef, html: &str) -> OtoResult<()> {
        let position = self.slot_index(element).ok_or_else(|| {
            OtoError::Internal(format!(
                "unknown element {}[{}]",
                element.selector, element.index
            ))
        })?;

        self.slots[position].1 = html.to_string();
        self.writes.push(element.selector.clone());
        Ok(())
    }

    fn inner_html(&self, element: &ElementRef) -> Option<String> {
        self.slot_index(element)
            .map(|position| self.slots[position].1.clone())
    }
}
