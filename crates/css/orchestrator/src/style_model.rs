//! Resolved property values of one element.

use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// Property name to value map produced by style resolution.
///
/// Only properties that were declared for the element, or inherited from an
/// ancestor, are present. Nothing is filled in from initial values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    properties: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for ComputedStyle {
    #[inline]
    fn from(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }
}

impl<'style> IntoIterator for &'style ComputedStyle {
    type Item = (&'style String, &'style String);
    type IntoIter = Iter<'style, String, String>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

impl ComputedStyle {
    /// Number of resolved properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Value of `name`, if it resolved for this element.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Value of `name`, falling back to the property's initial value.
    /// Does not add anything to the map.
    #[inline]
    pub fn value_or_initial(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| css_cascade::initial_value(name))
    }

    /// Properties in name order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.properties.iter()
    }

    #[inline]
    pub(crate) fn insert(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
    }

    #[inline]
    pub fn color(&self) -> Option<&str> {
        self.get("color")
    }

    #[inline]
    pub fn background_color(&self) -> Option<&str> {
        self.get("background-color")
    }

    #[inline]
    pub fn display(&self) -> Option<&str> {
        self.get("display")
    }

    #[inline]
    pub fn font_family(&self) -> Option<&str> {
        self.get("font-family")
    }

    #[inline]
    pub fn font_size(&self) -> Option<&str> {
        self.get("font-size")
    }

    #[inline]
    pub fn font_style(&self) -> Option<&str> {
        self.get("font-style")
    }

    #[inline]
    pub fn font_weight(&self) -> Option<&str> {
        self.get("font-weight")
    }

    #[inline]
    pub fn line_height(&self) -> Option<&str> {
        self.get("line-height")
    }

    /// The `margin` shorthand as declared. Longhands are not expanded.
    #[inline]
    pub fn margin(&self) -> Option<&str> {
        self.get("margin")
    }

    #[inline]
    pub fn text_align(&self) -> Option<&str> {
        self.get("text-align")
    }
}
