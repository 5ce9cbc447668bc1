//! CSS Cascading and Inheritance Level 4 - Cascade, inheritance, and initial values.
//! Spec: <https://www.w3.org/TR/css-cascade-4/>

#![forbid(unsafe_code)]

use core::cmp::Ordering;
use css_selectors::Specificity;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Where a declaration came from.
/// Spec: Section 6.2 - Cascading origins
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    UserAgent,
    User,
    #[default]
    Author,
}

/// Source order given to inline (`style` attribute) declarations: always latest.
pub const INLINE_SOURCE_ORDER: u32 = u32::MAX;

/// Priority tuple used to order declarations in the cascade.
/// Spec: Section 6.1 - Cascade sorting order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadePriority {
    /// Spec: Section 6.2 - Origins
    pub origin: Origin,
    /// Spec: Section 6.4 - Importance
    pub important: bool,
    /// Declared through the element's `style` attribute.
    /// Spec: Section 6.1 - Element-attached declarations beat selector-based ones
    pub inline: bool,
    /// Spec: Section 6.1 - Specificity
    pub specificity: Specificity,
    /// Global rule order across every attached sheet.
    /// Spec: Section 6.1 - Order of appearance
    pub source_order: u32,
    /// Position of the declaration inside its block.
    pub position: u32,
}

impl CascadePriority {
    /// Priority of a declaration coming from a style rule.
    #[inline]
    pub const fn for_rule(
        origin: Origin,
        important: bool,
        specificity: Specificity,
        source_order: u32,
        position: u32,
    ) -> Self {
        Self {
            origin,
            important,
            inline: false,
            specificity,
            source_order,
            position,
        }
    }

    /// Priority of a declaration from the element's `style` attribute.
    #[inline]
    pub const fn for_inline(important: bool, position: u32) -> Self {
        Self {
            origin: Origin::Author,
            important,
            inline: true,
            specificity: Specificity(0, 0, 0),
            source_order: INLINE_SOURCE_ORDER,
            position,
        }
    }

    /// Whether this declaration beats `other` for the same property.
    #[inline]
    pub fn wins_over(&self, other: &Self) -> bool {
        compare_priority(self, other) == Ordering::Greater
    }
}

/// Compare two `CascadePriority` values according to the cascade rules.
/// Return `Ordering::Greater` if `left` should win over `right`.
/// Spec: Section 6.1 - Cascade sorting order
pub fn compare_priority(left: &CascadePriority, right: &CascadePriority) -> Ordering {
    origin_importance_rank(left.origin, left.important)
        .cmp(&origin_importance_rank(right.origin, right.important))
        .then(left.inline.cmp(&right.inline))
        .then(left.specificity.cmp(&right.specificity))
        .then(left.source_order.cmp(&right.source_order))
        .then(left.position.cmp(&right.position))
}

/// Rank of an origin/importance pair. Important declarations beat every
/// normal one and reverse the origin order.
/// Spec: Section 6.2 - Cascading origins and importance
const fn origin_importance_rank(origin: Origin, important: bool) -> u8 {
    match (important, origin) {
        (false, Origin::UserAgent) => 0,
        (false, Origin::User) => 1,
        (false, Origin::Author) => 2,
        (true, Origin::Author) => 3,
        (true, Origin::User) => 4,
        (true, Origin::UserAgent) => 5,
    }
}

/// Longhand properties inherited by default.
/// Spec: Section 7 - Inheritance; property definition tables ("Inherited: yes")
pub const INHERITED_PROPERTIES: &[&str] = &[
    "border-collapse",
    "border-spacing",
    "caption-side",
    "color",
    "cursor",
    "direction",
    "empty-cells",
    "font-family",
    "font-size",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style-image",
    "list-style-position",
    "list-style-type",
    "orphans",
    "quotes",
    "tab-size",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "widows",
    "word-spacing",
];

/// Whether a property is inherited by default. Custom properties always are.
/// Spec: Section 7 - Inheritance
pub fn is_inherited_property(property_name: &str) -> bool {
    if property_name.starts_with("--") {
        return true;
    }
    let lowered = property_name.to_ascii_lowercase();
    INHERITED_PROPERTIES.binary_search(&lowered.as_str()).is_ok()
}

/// Initial values for a subset of properties.
/// Spec: Section 7.1 - Initial values
pub fn initial_value(property_name: &str) -> Option<&'static str> {
    match property_name.to_ascii_lowercase().as_str() {
        "color" => Some("canvastext"),
        "display" => Some("inline"),
        "font-size" => Some("medium"),
        "font-style" | "font-weight" | "font-variant" | "line-height" | "letter-spacing"
        | "word-spacing" | "white-space" => Some("normal"),
        "margin" | "margin-top" | "margin-right" | "margin-bottom" | "margin-left" | "padding"
        | "padding-top" | "padding-right" | "padding-bottom" | "padding-left" | "text-indent" => {
            Some("0")
        }
        "text-align" => Some("start"),
        "text-transform" | "text-decoration-line" | "float" => Some("none"),
        "background-color" => Some("transparent"),
        "visibility" => Some("visible"),
        "position" => Some("static"),
        "width" | "height" | "z-index" => Some("auto"),
        _ => None,
    }
}

/// Resolve a property's value via inheritance fallback.
///
/// Returns the declared value, else the parent's value when the property is
/// inherited. Initial values are never substituted here.
/// Spec: Section 7 - Inheritance
pub fn inherit_property(
    property_name: &str,
    declared_value: Option<String>,
    parent_computed_value: Option<&str>,
) -> Option<String> {
    if declared_value.is_some() {
        return declared_value;
    }
    if is_inherited_property(property_name) {
        return parent_computed_value.map(ToOwned::to_owned);
    }
    None
}

/// Per-property winner accumulation for one element.
/// Spec: Section 6 - Cascading: one cascaded value per property
#[derive(Clone, Debug, Default)]
pub struct CascadedValues {
    winners: BTreeMap<String, (CascadePriority, String)>,
}

impl CascadedValues {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate declaration; it replaces the current winner for
    /// `name` only if it wins over it.
    pub fn put(&mut self, name: &str, value: &str, priority: CascadePriority) {
        match self.winners.entry(name.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert((priority, value.to_owned()));
            }
            Entry::Occupied(mut slot) => {
                if priority.wins_over(&slot.get().0) {
                    slot.insert((priority, value.to_owned()));
                }
            }
        }
    }

    /// Current winning value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.winners.get(name).map(|(_, value)| value.as_str())
    }

    /// Number of properties with a winner.
    #[inline]
    pub fn len(&self) -> usize {
        self.winners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Drop priorities and return property → winning value.
    pub fn into_values(self) -> BTreeMap<String, String> {
        self.winners
            .into_iter()
            .map(|(name, (_, value))| (name, value))
            .collect()
    }
}
