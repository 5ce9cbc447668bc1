//! Style subsystem of the CSS engine.
//!
//! A [`Document`] mirrors the DOM through [`DomUpdate`]s, owns the set of attached
//! stylesheets, and resolves computed styles through the cascade. Linked sheets are
//! fetched elsewhere and attached through the shared [`StyleSheetSet`].

pub mod config;
pub mod dom;
pub mod error;
pub mod parser;
pub mod sheet_set;
mod style;
pub mod style_model;
pub mod types;

pub use config::StyleConfig;
pub use dom::{Document, DomSubscriber, DomUpdate, NodeKey};
pub use error::StyleError;
pub use parser::{decode_stylesheet, parse_into, parse_stylesheet};
pub use sheet_set::{AttachedSheet, StyleSheetSet};
pub use style::StyleResolver;
pub use style_model::ComputedStyle;
pub use types::{Declaration, Origin, Rule, StyleLink, Stylesheet};
