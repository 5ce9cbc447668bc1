//! Style resolution: cascade and inheritance over the document mirror.

mod cascade;

pub use cascade::StyleResolver;

use std::collections::HashMap;

use crate::dom::{Document, NodeKey};
use crate::error::StyleError;
use crate::style_model::ComputedStyle;

impl Document {
    /// Resolve the computed style of one element against the sheets attached right now.
    ///
    /// # Errors
    /// Returns `StyleError::Unattached` if `node` is not an element of this document.
    #[inline]
    pub fn compute_style(&self, node: NodeKey) -> Result<ComputedStyle, StyleError> {
        StyleResolver::new(self).compute_style(node)
    }

    /// Computed styles of every element, resolved top-down.
    #[inline]
    pub fn computed_snapshot(&self) -> HashMap<NodeKey, ComputedStyle> {
        StyleResolver::new(self).compute_all()
    }
}
