//! Media Queries Level 4 - media text parsing and evaluation (subset).
//! Spec: <https://www.w3.org/TR/mediaqueries-4/>
//!
//! Supported: media types (`all`, `screen`, `print`, `speech`), the `not` and
//! `only` modifiers, `and`-joined features `width`, `height`, their `min-`/`max-`
//! forms with `px`/`em` lengths, and `orientation`. Anything else fails to
//! parse, and a media list that fails to parse never matches.

#![forbid(unsafe_code)]

use core::fmt::{self, Display, Formatter};

/// Font size used to resolve `em` lengths inside media features.
/// Spec: Section 5 - relative lengths in media queries use the initial font size
const INITIAL_FONT_SIZE_PX: f32 = 16.0;

/// Error raised while parsing media text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaParseError {
    /// Unknown media type identifier.
    InvalidMediaType(String),
    /// Unknown or malformed media feature.
    InvalidFeature(String),
    /// Unsupported or malformed length value.
    InvalidLength(String),
    /// A query in the list was empty or structurally invalid.
    InvalidQuery(String),
}

impl Display for MediaParseError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMediaType(text) => write!(formatter, "invalid media type '{text}'"),
            Self::InvalidFeature(text) => write!(formatter, "invalid media feature '{text}'"),
            Self::InvalidLength(text) => write!(formatter, "invalid media length '{text}'"),
            Self::InvalidQuery(text) => write!(formatter, "invalid media query '{text}'"),
        }
    }
}

impl core::error::Error for MediaParseError {}

/// Broad device category.
/// Spec: Section 2.3 - Media types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    All,
    Screen,
    Print,
    Speech,
}

impl MediaType {
    /// Parse a media type identifier (ASCII case-insensitive).
    pub fn parse(text: &str) -> Result<Self, MediaParseError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "screen" => Ok(Self::Screen),
            "print" => Ok(Self::Print),
            "speech" => Ok(Self::Speech),
            other => Err(MediaParseError::InvalidMediaType(other.to_owned())),
        }
    }
}

/// Query modifier.
/// Spec: Section 2.2 - `not` negates, `only` is a legacy guard with no effect
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaModifier {
    Not,
    Only,
}

/// Viewport orientation.
/// Spec: Section 4.4 - orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// A supported media feature with its length already resolved to px.
/// Spec: Section 4 - Viewport/page characteristics
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaFeature {
    Width(f32),
    MinWidth(f32),
    MaxWidth(f32),
    Height(f32),
    MinHeight(f32),
    MaxHeight(f32),
    Orientation(Orientation),
}

impl MediaFeature {
    /// Parse the inside of a `( name: value )` feature expression.
    fn parse(expression: &str) -> Result<Self, MediaParseError> {
        let Some((raw_name, raw_value)) = expression.split_once(':') else {
            return Err(MediaParseError::InvalidFeature(expression.trim().to_owned()));
        };
        let name = raw_name.trim().to_ascii_lowercase();
        let value = raw_value.trim();
        match name.as_str() {
            "width" => parse_length(value).map(Self::Width),
            "min-width" => parse_length(value).map(Self::MinWidth),
            "max-width" => parse_length(value).map(Self::MaxWidth),
            "height" => parse_length(value).map(Self::Height),
            "min-height" => parse_length(value).map(Self::MinHeight),
            "max-height" => parse_length(value).map(Self::MaxHeight),
            "orientation" => match value.to_ascii_lowercase().as_str() {
                "portrait" => Ok(Self::Orientation(Orientation::Portrait)),
                "landscape" => Ok(Self::Orientation(Orientation::Landscape)),
                _ => Err(MediaParseError::InvalidFeature(expression.trim().to_owned())),
            },
            _ => Err(MediaParseError::InvalidFeature(name)),
        }
    }
}

/// Resolve a `px`/`em` (or unitless zero) length to px.
fn parse_length(value: &str) -> Result<f32, MediaParseError> {
    let lowered = value.to_ascii_lowercase();
    let invalid = || MediaParseError::InvalidLength(value.to_owned());
    if let Some(number) = lowered.strip_suffix("px") {
        return number.trim().parse::<f32>().map_err(|_| invalid());
    }
    if let Some(number) = lowered.strip_suffix("em") {
        return number
            .trim()
            .parse::<f32>()
            .map(|ems| ems * INITIAL_FONT_SIZE_PX)
            .map_err(|_| invalid());
    }
    lowered
        .parse::<f32>()
        .ok()
        .filter(|number| number.abs() < f32::EPSILON)
        .map(|_| 0.0)
        .ok_or_else(invalid)
}

/// A single media query: optional modifier and type plus `and`-joined features.
/// Spec: Section 2 - Media queries
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MediaQuery {
    pub modifier: Option<MediaModifier>,
    pub media_type: Option<MediaType>,
    pub features: Vec<MediaFeature>,
}

impl MediaQuery {
    /// `not all`: the query an invalid one is replaced with.
    /// Spec: Section 3.2 - Error handling
    pub const fn never() -> Self {
        Self {
            modifier: Some(MediaModifier::Not),
            media_type: Some(MediaType::All),
            features: Vec::new(),
        }
    }

    /// Parse one query such as `only screen and (min-width: 600px)`.
    pub fn parse(text: &str) -> Result<Self, MediaParseError> {
        let mut query = Self::default();
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(MediaParseError::InvalidQuery(String::new()));
        }
        let mut expect_and = false;
        while !rest.is_empty() {
            if let Some(after_paren) = rest.strip_prefix('(') {
                let Some((inner, tail)) = after_paren.split_once(')') else {
                    return Err(MediaParseError::InvalidQuery(text.trim().to_owned()));
                };
                if expect_and {
                    return Err(MediaParseError::InvalidQuery(text.trim().to_owned()));
                }
                query.features.push(MediaFeature::parse(inner)?);
                expect_and = true;
                rest = tail.trim_start();
                continue;
            }
            let (word, tail) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            let lowered = word.to_ascii_lowercase();
            match lowered.as_str() {
                "and" if expect_and => expect_and = false,
                "not" | "only"
                    if query.modifier.is_none()
                        && query.media_type.is_none()
                        && query.features.is_empty() =>
                {
                    query.modifier = Some(if lowered == "not" {
                        MediaModifier::Not
                    } else {
                        MediaModifier::Only
                    });
                }
                _ if query.media_type.is_none() && query.features.is_empty() && !expect_and => {
                    query.media_type = Some(MediaType::parse(word)?);
                    expect_and = true;
                }
                _ => return Err(MediaParseError::InvalidQuery(text.trim().to_owned())),
            }
            rest = tail.trim_start();
        }
        // Trailing `and`, or a modifier without a media type.
        if !expect_and || (query.modifier.is_some() && query.media_type.is_none()) {
            return Err(MediaParseError::InvalidQuery(text.trim().to_owned()));
        }
        Ok(query)
    }
}

/// A comma-separated media query list, as found in a `media` attribute.
/// An empty list matches every environment.
/// Spec: Section 2.1 - Combining media queries
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MediaList {
    pub queries: Vec<MediaQuery>,
}

impl MediaList {
    /// Parse media text. Empty (or all-whitespace) text yields an empty list.
    /// A query that fails to parse becomes `not all`; the rest of the list
    /// is kept.
    /// Spec: Section 3.2 - Error handling
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        let queries = text
            .split(',')
            .map(|query_text| MediaQuery::parse(query_text).unwrap_or_else(|_| MediaQuery::never()))
            .collect();
        Self { queries }
    }

    /// Whether this list applies in `environment`.
    pub fn matches(&self, environment: &MediaEnvironment) -> bool {
        self.queries.is_empty()
            || self
                .queries
                .iter()
                .any(|query| environment.evaluate(query))
    }
}

/// The environment media text is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaEnvironment {
    pub media_type: MediaType,
    /// Viewport width in CSS pixels.
    pub viewport_width: f32,
    /// Viewport height in CSS pixels.
    pub viewport_height: f32,
}

impl Default for MediaEnvironment {
    #[inline]
    fn default() -> Self {
        Self::screen(1024.0, 768.0)
    }
}

impl MediaEnvironment {
    /// A screen environment with the given viewport size.
    #[inline]
    pub const fn screen(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            media_type: MediaType::Screen,
            viewport_width,
            viewport_height,
        }
    }

    /// Evaluate media text directly. Unparsable queries never match.
    pub fn matches_text(&self, text: &str) -> bool {
        MediaList::parse(text).matches(self)
    }

    /// Evaluate a single query.
    /// Spec: Section 2.2 - `not` negates the whole query
    pub fn evaluate(&self, query: &MediaQuery) -> bool {
        let type_matches = query
            .media_type
            .is_none_or(|media_type| media_type == MediaType::All || media_type == self.media_type);
        let matched = type_matches
            && query
                .features
                .iter()
                .all(|feature| self.evaluate_feature(*feature));
        if query.modifier == Some(MediaModifier::Not) {
            !matched
        } else {
            matched
        }
    }

    fn evaluate_feature(&self, feature: MediaFeature) -> bool {
        match feature {
            MediaFeature::Width(target) => (self.viewport_width - target).abs() < 0.5,
            MediaFeature::MinWidth(target) => self.viewport_width >= target,
            MediaFeature::MaxWidth(target) => self.viewport_width <= target,
            MediaFeature::Height(target) => (self.viewport_height - target).abs() < 0.5,
            MediaFeature::MinHeight(target) => self.viewport_height >= target,
            MediaFeature::MaxHeight(target) => self.viewport_height <= target,
            MediaFeature::Orientation(orientation) => {
                let portrait = self.viewport_height >= self.viewport_width;
                match orientation {
                    Orientation::Portrait => portrait,
                    Orientation::Landscape => !portrait,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_media_matches_everything() {
        let env = MediaEnvironment::default();
        assert!(env.matches_text(""));
        assert!(env.matches_text("   "));
        assert!(env.matches_text("all"));
    }

    #[test]
    fn media_types_and_modifiers() {
        let env = MediaEnvironment::screen(800.0, 600.0);
        assert!(env.matches_text("screen"));
        assert!(!env.matches_text("print"));
        assert!(env.matches_text("not print"));
        assert!(env.matches_text("only screen"));
        assert!(env.matches_text("print, screen"));
        assert!(!env.matches_text("not screen"));
    }

    #[test]
    fn size_features() {
        let env = MediaEnvironment::screen(800.0, 600.0);
        assert!(env.matches_text("(min-width: 600px)"));
        assert!(!env.matches_text("screen and (max-width: 40em)"));
        assert!(env.matches_text("screen and (min-width: 40em) and (max-height: 600px)"));
        assert!(env.matches_text("(orientation: landscape)"));
        assert!(!env.matches_text("(orientation: portrait)"));
    }

    #[test]
    fn malformed_text_never_matches() {
        let env = MediaEnvironment::default();
        assert!(!env.matches_text("screen and"));
        assert!(!env.matches_text("(min-width: wide)"));
        assert!(!env.matches_text("tv"));
        assert!(!env.matches_text("screen (min-width: 1px)"));
        assert!(!env.matches_text(","));
    }

    #[test]
    fn invalid_query_does_not_void_the_list() {
        let env = MediaEnvironment::default();
        assert!(env.matches_text("tv, screen"));
        assert!(env.matches_text("screen,"));
        assert!(env.matches_text("(min-width: wide), (min-width: 100px)"));
        let list = MediaList::parse("screen and, print");
        assert_eq!(list.queries.len(), 2);
        assert_eq!(list.queries[0], MediaQuery::never());
        assert!(!list.matches(&env));
    }
}
