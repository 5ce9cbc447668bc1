//! Request and response descriptors exchanged with a `ResourceLoader`.

use bytes::Bytes;
use std::collections::HashMap;
use url::Url;

use crate::cors::is_cross_origin;

/// Cross-origin mode derived from a `crossorigin` attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CorsSetting {
    /// No `crossorigin` attribute: a plain no-CORS fetch.
    #[default]
    None,
    /// `crossorigin` or `crossorigin="anonymous"` (and any unknown value).
    Anonymous,
    /// `crossorigin="use-credentials"`.
    UseCredentials,
}

impl CorsSetting {
    /// Map the raw attribute value. Absent means `None`; invalid values mean `Anonymous`.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            None => Self::None,
            Some(raw) if raw.trim().eq_ignore_ascii_case("use-credentials") => Self::UseCredentials,
            Some(_) => Self::Anonymous,
        }
    }
}

/// What to do with a cross-origin response fetched without CORS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OriginBehavior {
    /// Accept the response but mark it tainted.
    #[default]
    Taint,
    /// Reject the response.
    Fail,
}

/// A resource to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRequest {
    pub url: Url,
    /// Document URL the request is made on behalf of; its origin decides
    /// whether the fetch is cross-origin. `None` skips origin checks.
    pub initiator: Option<Url>,
}

impl ResourceRequest {
    #[inline]
    pub const fn new(url: Url) -> Self {
        Self { url, initiator: None }
    }

    #[inline]
    #[must_use]
    pub fn with_initiator(mut self, initiator: Option<Url>) -> Self {
        self.initiator = initiator;
        self
    }

    /// Whether the target lives on another origin than the initiator.
    #[inline]
    pub fn is_cross_origin(&self) -> bool {
        self.initiator
            .as_ref()
            .is_some_and(|initiator| is_cross_origin(initiator, &self.url))
    }
}

/// A fetched resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    /// Header values keyed by ASCII lowercase name.
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    /// Set when a cross-origin response was accepted without CORS.
    pub tainted: bool,
}

impl Response {
    /// A successful response with no headers.
    #[inline]
    pub fn ok(url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
            tainted: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_owned());
        self
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// MIME essence of the `Content-Type` header, lowercased and without parameters.
    pub fn mime_type(&self) -> Option<String> {
        let raw = self.header("content-type")?;
        let essence = raw.split(';').next().unwrap_or(raw).trim();
        (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
    }
}
