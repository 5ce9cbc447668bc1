//! Selectors Level 3 - Element matching and specificity.
//! Spec: <https://www.w3.org/TR/selectors-3/>
//!
//! This crate implements the subset the cascade needs:
//! - Type, universal, class, id, and attribute (`[a]`, `[a=b]`, `[a~=b]`) selectors
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Specificity calculation
//!
//! Anything outside that subset (pseudo-classes, namespaces, ...) is rejected at
//! parse time so that callers can drop the owning rule.

mod matcher;
mod parser;
mod specificity;

use core::fmt::{self, Display, Formatter};

pub use matcher::{matches_complex, matches_compound};
pub use parser::{parse_complex_selector, parse_selector_list};
pub use specificity::{Specificity, specificity_of_complex, specificity_of_compound};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
///
/// Spec references:
/// - Section 3: Selectors overview and element matching
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any.
    /// Spec: Section 11 - Combinators (for tree relationships)
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 11 - Sibling combinators
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase (per HTML parsing conventions).
    /// Spec: Section 5 - Type selectors
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns Some(id) if the element has an id attribute, else None.
    /// Spec: Section 7 - ID selectors
    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    /// Spec: Section 6 - Class selectors
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    /// Spec: Section 8 - Attribute selectors
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;
}

/// Simple selectors (subset).
/// Spec: Section 5, 6, 7, 8
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// Spec: Section 5 - Type selectors
    Type(String),
    /// Spec: Section 6 - Class selectors
    Class(String),
    /// Spec: Section 7 - ID selectors
    IdSelector(String),
    /// Spec: Section 8 - `[attr]`
    AttrExists(String),
    /// Spec: Section 8 - `[attr=value]`
    AttrEquals { name: String, value: String },
    /// Spec: Section 8 - `[attr~=value]`
    AttrIncludes { name: String, value: String },
    /// Spec: Section 5 - Universal selector
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Spec: Section 5 - Simple selector sequences
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
/// Spec: Section 11 - Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
///
/// `rest[i].0` is the combinator joining the compound before it (either `first`
/// or `rest[i - 1].1`) to `rest[i].1`. The subject of the selector is the last
/// compound.
/// Spec: Section 3, 11
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// Number of compounds in the selector.
    #[inline]
    pub fn len(&self) -> usize {
        self.rest.len().saturating_add(1)
    }

    /// A complex selector always holds at least one compound.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Compound at `index`, counting `first` as zero.
    #[inline]
    pub fn compound(&self, index: usize) -> Option<&CompoundSelector> {
        if index == 0 {
            return Some(&self.first);
        }
        self.rest.get(index - 1).map(|pair| &pair.1)
    }

    /// Combinator joining compound `index - 1` to compound `index`.
    #[inline]
    pub fn combinator_before(&self, index: usize) -> Option<Combinator> {
        index
            .checked_sub(1)
            .and_then(|slot| self.rest.get(slot))
            .map(|pair| pair.0)
    }
}

/// A selector list separated by commas.
/// Spec: Section 4 - Groups of selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Highest specificity among the members of this list that match `element`.
    ///
    /// Returns `None` when no member matches.
    /// Spec: Section 13 - specificity of a selector list is taken per matching selector
    pub fn matching_specificity<A: ElementAdapter>(
        &self,
        adapter: &A,
        element: A::Handle,
    ) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|selector| matches_complex(adapter, element, selector))
            .map(specificity_of_complex)
            .max()
    }
}

/// Reason a selector failed to parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorParseError {
    /// The selector (or a member of a list) was empty.
    Empty,
    /// A combinator was not followed or preceded by a compound.
    DanglingCombinator,
    /// A character outside the supported grammar was found.
    Unsupported(char),
    /// `.`, `#` or `[` were not followed by an identifier.
    MissingIdent,
    /// An attribute selector was not closed with `]`.
    UnclosedAttribute,
}

impl Display for SelectorParseError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(formatter, "empty selector"),
            Self::DanglingCombinator => write!(formatter, "combinator without a compound"),
            Self::Unsupported(character) => {
                write!(formatter, "unsupported selector syntax at '{character}'")
            }
            Self::MissingIdent => write!(formatter, "expected an identifier"),
            Self::UnclosedAttribute => write!(formatter, "unclosed attribute selector"),
        }
    }
}

impl core::error::Error for SelectorParseError {}
