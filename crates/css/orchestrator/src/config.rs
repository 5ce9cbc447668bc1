//! Configuration for style resolution.
//!
//! The media environment sheets and `@media` blocks are evaluated against can be
//! set programmatically or read from environment variables.

use css_media_queries::{MediaEnvironment, MediaType};
use std::env;

/// Runtime configuration for the style resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
    /// Medium the document is rendered for
    pub medium: MediaType,
    /// Viewport width in CSS pixels
    pub viewport_width: f32,
    /// Viewport height in CSS pixels
    pub viewport_height: f32,
}

impl Default for StyleConfig {
    #[inline]
    fn default() -> Self {
        Self::new(MediaType::Screen, 1024.0, 768.0)
    }
}

impl StyleConfig {
    /// Construct a `StyleConfig` with explicit values. Negative sizes clamp to zero.
    #[inline]
    #[must_use]
    pub fn new(medium: MediaType, viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            medium,
            viewport_width: viewport_width.max(0.0),
            viewport_height: viewport_height.max(0.0),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CSS_MEDIUM`: media type name (default: `screen`)
    /// - `CSS_VIEWPORT_WIDTH`: viewport width in pixels (default: 1024)
    /// - `CSS_VIEWPORT_HEIGHT`: viewport height in pixels (default: 768)
    ///
    /// Unparsable values fall back to the defaults.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Like [`StyleConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let medium = lookup("CSS_MEDIUM")
            .and_then(|val| MediaType::parse(val.trim()).ok())
            .unwrap_or(defaults.medium);
        let viewport_width = lookup("CSS_VIEWPORT_WIDTH")
            .and_then(|val| val.trim().parse::<f32>().ok())
            .unwrap_or(defaults.viewport_width);
        let viewport_height = lookup("CSS_VIEWPORT_HEIGHT")
            .and_then(|val| val.trim().parse::<f32>().ok())
            .unwrap_or(defaults.viewport_height);
        Self::new(medium, viewport_width, viewport_height)
    }

    /// The environment media text is evaluated against.
    #[inline]
    #[must_use]
    pub const fn media_environment(&self) -> MediaEnvironment {
        MediaEnvironment {
            media_type: self.medium,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
        }
    }
}
