//! Style engines: turn a fetched body into a `Stylesheet`, selected by MIME type.

use css_orchestrator::{Stylesheet, decode_stylesheet, parse_into};
use futures::future::{BoxFuture, FutureExt as _};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::request::Response;

/// MIME type used when a link does not declare one.
pub const CSS_MIME_TYPE: &str = "text/css";

/// Parser for one stylesheet format.
pub trait StyleEngine: Send + Sync {
    /// Parse `response` into `template`, keeping the template's metadata.
    fn parse<'engine>(
        &'engine self,
        response: &'engine Response,
        template: Stylesheet,
    ) -> BoxFuture<'engine, Result<Stylesheet, LoadError>>;
}

/// Engine for `text/css`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CssStyleEngine;

impl StyleEngine for CssStyleEngine {
    fn parse<'engine>(
        &'engine self,
        response: &'engine Response,
        template: Stylesheet,
    ) -> BoxFuture<'engine, Result<Stylesheet, LoadError>> {
        async move {
            let text = decode_stylesheet(&response.body).map_err(|err| LoadError::Parse {
                url: response.url.clone(),
                message: err.to_string(),
            })?;
            if let Some(mime) = response.mime_type().filter(|mime| mime != CSS_MIME_TYPE) {
                debug!("Parsing {} as CSS despite content type {mime}", response.url);
            }
            Ok(parse_into(template, text))
        }
        .boxed()
    }
}

/// Engines keyed by ASCII lowercase MIME type.
#[derive(Clone)]
pub struct StyleEngineRegistry {
    engines: HashMap<String, Arc<dyn StyleEngine>>,
}

impl Default for StyleEngineRegistry {
    /// A registry that understands `text/css`.
    #[inline]
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(CSS_MIME_TYPE, Arc::new(CssStyleEngine));
        registry
    }
}

impl StyleEngineRegistry {
    /// A registry with no engines at all.
    #[inline]
    pub fn empty() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Register `engine` for `mime_type`, replacing any previous one.
    pub fn register(&mut self, mime_type: &str, engine: Arc<dyn StyleEngine>) {
        self.engines.insert(normalize_mime(mime_type), engine);
    }

    /// Engine for `mime_type`. Parameters such as `charset` are ignored.
    pub fn get(&self, mime_type: &str) -> Option<Arc<dyn StyleEngine>> {
        self.engines.get(&normalize_mime(mime_type)).map(Arc::clone)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase()
}
