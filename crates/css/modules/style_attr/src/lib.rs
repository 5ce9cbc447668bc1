//! CSS Style Attributes - style="..." attribute processing.
//! Spec: <https://www.w3.org/TR/css-style-attr/>

#![forbid(unsafe_code)]

use css_syntax::parse_declaration_list;

/// A single CSS declaration parsed from a style attribute.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name normalized to ASCII lowercase as per CSS case-insensitivity.
    pub property: String,
    /// Value text trimmed of surrounding whitespace, without `!important`.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// Parse the value of a `style` attribute into a list of declarations.
///
/// The attribute is parsed as the contents of a declaration block: invalid
/// items are skipped, `!important` is recognised, and declaration order is
/// preserved (duplicates included).
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_style_attribute(input: &str) -> Vec<Declaration> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    parse_declaration_list(input)
        .into_iter()
        .map(|decl| Declaration {
            property: decl.name,
            value: decl.value,
            important: decl.important,
        })
        .collect()
}
