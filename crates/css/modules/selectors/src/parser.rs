//! CSS selector parsing.
//! Spec: <https://www.w3.org/TR/selectors-3/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, SelectorList, SelectorParseError,
    SimpleSelector,
};
use core::mem::take;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
enum Tok {
    /// An explicit combinator token: child, adjacent or general sibling.
    Combinator(Combinator),
    /// A run of whitespace; implies a descendant combinator between compounds.
    Whitespace,
    /// A simple selector token (type, class, id, attribute, universal).
    Simple(SimpleSelector),
}

/// Tokenizer over a selector string.
struct SelectorTokenizer<'input> {
    /// Underlying bytes of the selector.
    input_bytes: &'input [u8],
    /// Current cursor index into `input_bytes`.
    index: usize,
}

impl<'input> SelectorTokenizer<'input> {
    #[inline]
    const fn new(input: &'input str) -> Self {
        Self {
            input_bytes: input.as_bytes(),
            index: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input_bytes.get(self.index).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Return the next selector token, if any.
    fn next_token(&mut self) -> Option<Result<Tok, SelectorParseError>> {
        let current = self.peek()?;
        let token = match current {
            byte if byte.is_ascii_whitespace() => {
                self.skip_spaces();
                Ok(Tok::Whitespace)
            }
            b'*' => {
                self.bump();
                Ok(Tok::Simple(SimpleSelector::Universal))
            }
            b'.' => {
                self.bump();
                self.consume_ident(false)
                    .map(|ident| Tok::Simple(SimpleSelector::Class(ident)))
            }
            b'#' => {
                self.bump();
                self.consume_ident(false)
                    .map(|ident| Tok::Simple(SimpleSelector::IdSelector(ident)))
            }
            b'[' => {
                self.bump();
                self.consume_attr().map(Tok::Simple)
            }
            b'>' => {
                self.bump();
                Ok(Tok::Combinator(Combinator::Child))
            }
            b'+' => {
                self.bump();
                Ok(Tok::Combinator(Combinator::AdjacentSibling))
            }
            b'~' => {
                self.bump();
                Ok(Tok::Combinator(Combinator::GeneralSibling))
            }
            byte if is_ident_byte(byte) => self
                .consume_ident(true)
                .map(|ident| Tok::Simple(SimpleSelector::Type(ident))),
            other => Err(SelectorParseError::Unsupported(char::from(other))),
        };
        Some(token)
    }

    /// Consume an identifier. Type selectors are matched case-insensitively and
    /// are lowercased; class and id names keep their case.
    fn consume_ident(&mut self, lowercase: bool) -> Result<String, SelectorParseError> {
        let start = self.index;
        while self.peek().is_some_and(is_ident_byte) {
            self.bump();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        if slice.is_empty() {
            return Err(SelectorParseError::MissingIdent);
        }
        let ident = String::from_utf8_lossy(slice);
        Ok(if lowercase {
            ident.to_ascii_lowercase()
        } else {
            ident.into_owned()
        })
    }

    /// Parse the inside of `[...]` once the opening bracket has been consumed.
    fn consume_attr(&mut self) -> Result<SimpleSelector, SelectorParseError> {
        self.skip_spaces();
        let name = self.consume_ident(true)?;
        self.skip_spaces();
        let selector = match self.peek() {
            Some(b']') => SimpleSelector::AttrExists(name),
            Some(b'=') => {
                self.bump();
                let value = self.consume_attr_value()?;
                SimpleSelector::AttrEquals { name, value }
            }
            Some(b'~') if self.input_bytes.get(self.index + 1) == Some(&b'=') => {
                self.bump();
                self.bump();
                let value = self.consume_attr_value()?;
                SimpleSelector::AttrIncludes { name, value }
            }
            Some(other) => return Err(SelectorParseError::Unsupported(char::from(other))),
            None => return Err(SelectorParseError::UnclosedAttribute),
        };
        self.skip_spaces();
        if self.peek() != Some(b']') {
            return Err(SelectorParseError::UnclosedAttribute);
        }
        self.bump();
        Ok(selector)
    }

    /// Consume a quoted or unquoted attribute value.
    fn consume_attr_value(&mut self) -> Result<String, SelectorParseError> {
        self.skip_spaces();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.bump();
                let start = self.index;
                while self.peek().is_some_and(|byte| byte != quote) {
                    self.bump();
                }
                if self.peek().is_none() {
                    return Err(SelectorParseError::UnclosedAttribute);
                }
                let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
                self.bump();
                Ok(String::from_utf8_lossy(slice).into_owned())
            }
            _ => self.consume_ident(false),
        }
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.bump();
        }
    }
}

/// Identifier bytes: ASCII alphanumerics, `-`, `_` and any non-ASCII byte.
#[inline]
const fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

/// Split a selector list on top-level commas (commas inside `[...]` or quotes
/// belong to attribute values).
fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (offset, character) in input.char_indices() {
        match (quote, character) {
            (Some(open), _) if character == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(character),
            (None, '[') => depth = depth.saturating_add(1),
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(input.get(start..offset).unwrap_or_default());
                start = offset + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(input.get(start..).unwrap_or_default());
    parts
}

/// Parse a selector list from CSS text. Any invalid member invalidates the
/// whole list, as for a style rule prelude.
/// Spec: Section 4 - Groups of selectors
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorParseError> {
    let selectors = split_top_level_commas(input)
        .into_iter()
        .map(parse_complex_selector)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SelectorList { selectors })
}

/// Parse one complex selector.
/// Spec: Section 11 - Combinators; Section 5-8 - simple selectors
pub fn parse_complex_selector(input: &str) -> Result<ComplexSelector, SelectorParseError> {
    let mut tokens = SelectorTokenizer::new(input.trim());
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut pending_combinator: Option<Combinator> = None;

    while let Some(token) = tokens.next_token() {
        match token? {
            Tok::Whitespace => {
                if !current.simples.is_empty() {
                    compounds.push(take(&mut current));
                }
            }
            Tok::Combinator(combinator) => {
                if !current.simples.is_empty() {
                    compounds.push(take(&mut current));
                }
                if compounds.is_empty() || pending_combinator.is_some() {
                    return Err(SelectorParseError::DanglingCombinator);
                }
                pending_combinator = Some(combinator);
            }
            Tok::Simple(simple) => {
                if current.simples.is_empty() && !compounds.is_empty() {
                    combinators.push(pending_combinator.take().unwrap_or(Combinator::Descendant));
                }
                current.simples.push(simple);
            }
        }
    }
    if !current.simples.is_empty() {
        compounds.push(current);
    }
    if pending_combinator.is_some() {
        return Err(SelectorParseError::DanglingCombinator);
    }

    let mut compounds = compounds.into_iter();
    let Some(first) = compounds.next() else {
        return Err(SelectorParseError::Empty);
    };
    Ok(ComplexSelector {
        first,
        rest: combinators.into_iter().zip(compounds).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_combinator_survives_surrounding_whitespace() {
        let parsed = parse_complex_selector("p > span").unwrap();
        assert_eq!(
            parsed.first.simples,
            vec![SimpleSelector::Type("p".to_owned())]
        );
        assert_eq!(parsed.rest.len(), 1);
        assert_eq!(parsed.rest[0].0, Combinator::Child);
        assert_eq!(
            parsed.rest[0].1.simples,
            vec![SimpleSelector::Type("span".to_owned())]
        );
    }

    #[test]
    fn compact_child_and_descendant_mix() {
        let parsed = parse_complex_selector("div p>span.bold").unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.combinator_before(1), Some(Combinator::Descendant));
        assert_eq!(parsed.combinator_before(2), Some(Combinator::Child));
        assert_eq!(
            parsed.compound(2).map(|compound| compound.simples.clone()),
            Some(vec![
                SimpleSelector::Type("span".to_owned()),
                SimpleSelector::Class("bold".to_owned()),
            ])
        );
    }

    #[test]
    fn id_keeps_case_and_type_is_lowercased() {
        let parsed = parse_complex_selector("DIV#prioOne").unwrap();
        assert_eq!(
            parsed.first.simples,
            vec![
                SimpleSelector::Type("div".to_owned()),
                SimpleSelector::IdSelector("prioOne".to_owned()),
            ]
        );
    }

    #[test]
    fn attribute_forms() {
        let list = parse_selector_list("[hidden], a[rel~=\"next\"], input[type=text]").unwrap();
        assert_eq!(list.selectors.len(), 3);
        assert_eq!(
            list.selectors[0].first.simples,
            vec![SimpleSelector::AttrExists("hidden".to_owned())]
        );
        assert_eq!(
            list.selectors[1].first.simples[1],
            SimpleSelector::AttrIncludes {
                name: "rel".to_owned(),
                value: "next".to_owned()
            }
        );
    }

    #[test]
    fn comma_inside_attribute_value_is_not_a_separator() {
        let list = parse_selector_list("a[title='x,y'], b").unwrap();
        assert_eq!(list.selectors.len(), 2);
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        assert_eq!(
            parse_complex_selector("> p"),
            Err(SelectorParseError::DanglingCombinator)
        );
        assert_eq!(
            parse_complex_selector("p >"),
            Err(SelectorParseError::DanglingCombinator)
        );
        assert_eq!(
            parse_complex_selector("a:hover"),
            Err(SelectorParseError::Unsupported(':'))
        );
        assert_eq!(parse_complex_selector("  "), Err(SelectorParseError::Empty));
        assert!(parse_selector_list("p, ").is_err());
        assert_eq!(
            parse_complex_selector("[x=1"),
            Err(SelectorParseError::UnclosedAttribute)
        );
    }
}
