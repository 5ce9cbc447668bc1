//! Turn stylesheet text into a [`Stylesheet`] of matchable rules.

use core::str::Utf8Error;
use css_selectors::parse_selector_list;
use log::debug;

use crate::types::{Declaration, Origin, Rule, Stylesheet};

/// Parse `css` into a fresh sheet with the given origin.
#[inline]
pub fn parse_stylesheet(css: &str, origin: Origin) -> Stylesheet {
    parse_into(Stylesheet::with_origin(origin), css)
}

/// Parse `css` into `template`, keeping its metadata and replacing its rules.
///
/// Rules whose selector list does not parse are dropped whole.
pub fn parse_into(mut template: Stylesheet, css: &str) -> Stylesheet {
    let parsed = css_syntax::parse_stylesheet(css);
    let mut rules = Vec::with_capacity(parsed.rules.len());
    for style_rule in parsed.rules {
        let selectors = match parse_selector_list(&style_rule.prelude) {
            Ok(list) => list,
            Err(error) => {
                debug!("Dropping rule with selector {:?}: {error}", style_rule.prelude);
                continue;
            }
        };
        let index = u32::try_from(rules.len()).unwrap_or(u32::MAX);
        rules.push(Rule {
            selectors,
            prelude: style_rule.prelude,
            declarations: style_rule
                .declarations
                .into_iter()
                .map(|decl| Declaration {
                    name: decl.name,
                    value: decl.value,
                    important: decl.important,
                })
                .collect(),
            media: style_rule.media,
            index,
        });
    }
    template.rules = rules;
    template
}

/// Decode a fetched stylesheet body. A UTF-8 byte order mark is skipped.
pub fn decode_stylesheet(bytes: &[u8]) -> Result<&str, Utf8Error> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    core::str::from_utf8(body)
}
