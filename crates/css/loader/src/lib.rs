//! Asynchronous acquisition of linked stylesheets.
//!
//! A [`StyleSheetRequestProcessor`] fetches the sheet one `<link>` element points
//! at, parses it with the [`StyleEngine`] registered for the link's type and
//! attaches it to the document's sheet set. Retargeting a link cancels the
//! outstanding fetch before the new one starts. [`DocumentStyleLoader`] keeps one
//! processor per link of a document.

pub mod config;
pub mod cors;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod processor;
pub mod request;

pub use config::LoaderConfig;
pub use document::DocumentStyleLoader;
pub use engine::{CSS_MIME_TYPE, CssStyleEngine, StyleEngine, StyleEngineRegistry};
pub use error::LoadError;
pub use loader::{HttpResourceLoader, ResourceLoader};
pub use processor::{LinkStatus, LoadOutcome, PendingLoad, StyleSheetRequestProcessor};
pub use request::{CorsSetting, OriginBehavior, ResourceRequest, Response};
