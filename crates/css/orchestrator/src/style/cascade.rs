//! CSS cascade resolution over the attached sheets and inline styles.
//!
//! Every declaration whose rule matches the element competes per property under
//! origin and importance, then inline-ness, specificity, global source order and
//! position inside its block. Inherited properties without a winner take the
//! parent's resolved value. Ancestors are resolved first, top-down.

use css_cascade::{CascadePriority, CascadedValues, inherit_property};
use css_media_queries::MediaEnvironment;
use log::trace;
use std::collections::HashMap;

use crate::dom::{Document, NodeKey};
use crate::error::StyleError;
use crate::sheet_set::AttachedSheet;
use crate::style_model::ComputedStyle;

/// Clamp an index into the `u32` range used by cascade priorities.
fn position_of(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Resolver bound to one consistent snapshot of a document's sheets.
///
/// Sheets attached after construction are not seen; build a new resolver to
/// pick them up.
pub struct StyleResolver<'doc> {
    document: &'doc Document,
    /// Active sheets in attach order.
    sheets: Vec<AttachedSheet>,
    environment: MediaEnvironment,
}

impl<'doc> StyleResolver<'doc> {
    pub fn new(document: &'doc Document) -> Self {
        let environment = document.config().media_environment();
        let sheets = document
            .sheets()
            .snapshot()
            .into_iter()
            .filter(|attached| attached.is_active(&environment))
            .collect();
        Self {
            document,
            sheets,
            environment,
        }
    }

    /// Resolve the computed style of `node`.
    pub fn compute_style(&self, node: NodeKey) -> Result<ComputedStyle, StyleError> {
        if !self.document.contains(node) {
            return Err(StyleError::Unattached(node));
        }
        let mut resolved: Option<ComputedStyle> = None;
        for element in self.document.ancestor_chain(node) {
            resolved = Some(self.cascade_element(element, resolved.as_ref()));
        }
        Ok(resolved.unwrap_or_default())
    }

    /// Resolve every element of the document, reusing each parent's result.
    pub fn compute_all(&self) -> HashMap<NodeKey, ComputedStyle> {
        let mut out: HashMap<NodeKey, ComputedStyle> = HashMap::new();
        for element in self.document.elements_in_tree_order() {
            let parent_style = self
                .document
                .parent_element(element)
                .and_then(|parent| out.get(&parent));
            let style = self.cascade_element(element, parent_style);
            out.insert(element, style);
        }
        out
    }

    /// Cascade one element given its parent's resolved style.
    fn cascade_element(&self, element: NodeKey, parent_style: Option<&ComputedStyle>) -> ComputedStyle {
        let mut values = CascadedValues::new();
        for attached in &self.sheets {
            for rule in &attached.sheet.rules {
                if !rule.media.iter().all(|media| self.environment.matches_text(media)) {
                    continue;
                }
                let Some(specificity) = rule.selectors.matching_specificity(self.document, element) else {
                    continue;
                };
                let source_order = attached.source_order(rule);
                for (index, decl) in rule.declarations.iter().enumerate() {
                    let priority = CascadePriority::for_rule(
                        attached.sheet.origin,
                        decl.important,
                        specificity,
                        source_order,
                        position_of(index),
                    );
                    values.put(&decl.name, &decl.value, priority);
                }
            }
        }
        for (index, decl) in self.document.inline_declarations(element).iter().enumerate() {
            values.put(
                &decl.property,
                &decl.value,
                CascadePriority::for_inline(decl.important, position_of(index)),
            );
        }
        let mut computed = ComputedStyle::from(values.into_values());
        if let Some(parent) = parent_style {
            for (name, parent_value) in parent {
                if computed.contains(name) {
                    continue;
                }
                if let Some(inherited) = inherit_property(name, None, Some(parent_value)) {
                    computed.insert(name, &inherited);
                }
            }
        }
        trace!("Resolved {} properties for {element:?}", computed.len());
        computed
    }
}
