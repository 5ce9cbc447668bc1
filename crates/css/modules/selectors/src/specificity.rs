//! CSS selector specificity calculation.
//! Spec: <https://www.w3.org/TR/selectors-3/#specificity>

use crate::{ComplexSelector, CompoundSelector, SimpleSelector};

/// Specificity triple (a, b, c). Ordering is lexicographic, so an id beats any
/// number of classes and a class beats any number of type selectors.
/// Spec: Section 13 - Calculating a selector's specificity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    /// Component-wise saturating sum.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }
}

/// Compute the specificity of a compound selector.
/// Spec: Section 13 - Specificity (a, b, c)
pub fn specificity_of_compound(compound: &CompoundSelector) -> Specificity {
    compound
        .simples
        .iter()
        .fold(Specificity::default(), |total, simple| {
            let contribution = match simple {
                SimpleSelector::IdSelector(_) => Specificity(1, 0, 0),
                SimpleSelector::Class(_)
                | SimpleSelector::AttrExists(_)
                | SimpleSelector::AttrEquals { .. }
                | SimpleSelector::AttrIncludes { .. } => Specificity(0, 1, 0),
                SimpleSelector::Type(_) => Specificity(0, 0, 1),
                SimpleSelector::Universal => Specificity(0, 0, 0),
            };
            total.saturating_add(contribution)
        })
}

/// Compute the specificity of a complex selector (sum of its compounds).
/// Spec: Section 13 - Specificity accumulation
pub fn specificity_of_complex(sel: &ComplexSelector) -> Specificity {
    sel.rest
        .iter()
        .fold(specificity_of_compound(&sel.first), |total, pair| {
            total.saturating_add(specificity_of_compound(&pair.1))
        })
}
