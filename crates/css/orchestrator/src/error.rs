//! Errors reported by style resolution.

use core::fmt::{self, Display, Formatter};

use crate::dom::NodeKey;

/// Failure to resolve a computed style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleError {
    /// The node is not an element attached to the document.
    Unattached(NodeKey),
}

impl Display for StyleError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unattached(node) => {
                write!(formatter, "node {node:?} is not an element of this document")
            }
        }
    }
}

impl core::error::Error for StyleError {}
