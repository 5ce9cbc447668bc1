//! Stylesheet data model shared by the document mirror, the sheet set and the loader.

use crate::dom::NodeKey;
use css_selectors::SelectorList;
use url::Url;

pub use css_cascade::Origin;

/// One `name: value [!important]` entry of a rule or inline style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name in ASCII lowercase.
    pub name: String,
    /// Value text without the `!important` suffix.
    pub value: String,
    pub important: bool,
}

/// A style rule whose selector list parsed successfully.
#[derive(Clone, Debug)]
pub struct Rule {
    pub selectors: SelectorList,
    /// Selector text as authored, for diagnostics.
    pub prelude: String,
    pub declarations: Vec<Declaration>,
    /// Query lists of the enclosing `@media` blocks; all must match.
    pub media: Vec<String>,
    /// Position of the rule inside its sheet. The global order is assigned on attach.
    pub index: u32,
}

/// A parsed stylesheet with the metadata its owner supplied.
///
/// Sheets are immutable once attached; replacing a sheet swaps the whole value.
#[derive(Clone, Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub origin: Origin,
    /// Media text the sheet applies under. Empty means every medium.
    pub media: String,
    /// A disabled sheet contributes nothing.
    pub disabled: bool,
    /// Set for `rel="alternate stylesheet"`; contributes only once selected.
    pub alternate: bool,
    pub title: Option<String>,
    /// Where the sheet was fetched from; `None` for embedded sheets.
    pub href: Option<Url>,
}

impl Stylesheet {
    #[inline]
    pub fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_media(mut self, media: &str) -> Self {
        media.trim().clone_into(&mut self.media);
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_href(mut self, href: Url) -> Self {
        self.href = Some(href);
        self
    }

    /// Number of rules kept after selector validation.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Everything a `<link rel=stylesheet>` element says about the sheet it wants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleLink {
    pub owner: NodeKey,
    /// `href` resolved against the document base URL.
    pub href: Url,
    /// `type` attribute; `None` means `text/css`.
    pub link_type: Option<String>,
    /// `media` attribute, `None` when absent.
    pub media: Option<String>,
    /// Raw `crossorigin` attribute, `Some("")` when present without a value.
    pub cross_origin: Option<String>,
    /// `rel` tokens in ASCII lowercase.
    pub rel: Vec<String>,
    pub title: Option<String>,
    pub disabled: bool,
}

impl StyleLink {
    /// MIME type of the requested sheet.
    #[inline]
    pub fn content_type(&self) -> &str {
        self.link_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("text/css")
    }

    #[inline]
    pub fn is_alternate(&self) -> bool {
        self.rel.iter().any(|token| token == "alternate")
    }

    /// Metadata-only sheet shell that a parsed body is poured into.
    pub fn sheet_template(&self) -> Stylesheet {
        Stylesheet::with_origin(Origin::Author)
            .with_media(self.media.as_deref().unwrap_or(""))
            .with_disabled(self.disabled)
            .with_alternate(self.is_alternate())
            .with_title(self.title.clone())
            .with_href(self.href.clone())
    }
}
