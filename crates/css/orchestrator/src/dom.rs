//! Document mirror built from a stream of DOM updates.
//!
//! The mirror keeps exactly what style resolution needs: the element tree, the
//! attributes selectors look at, parsed inline styles, and the text of `<style>`
//! elements. Embedded sheets are parsed and attached once the document ends, and
//! re-attached whenever their text or attributes change afterwards.

use anyhow::{Result, bail};
use css_selectors::ElementAdapter;
use log::{debug, trace, warn};
use std::collections::HashMap;
use url::Url;

use crate::config::StyleConfig;
use crate::parser::parse_into;
use crate::sheet_set::StyleSheetSet;
use crate::types::{Origin, StyleLink, Stylesheet};

/// Opaque identifier of a DOM node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document node. It is never an element and has no parent.
    pub const ROOT: Self = Self(0);
}

/// A change to the DOM, applied in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomUpdate {
    InsertElement {
        parent: NodeKey,
        node: NodeKey,
        tag: String,
        pos: usize,
    },
    InsertText {
        parent: NodeKey,
        node: NodeKey,
        text: String,
        pos: usize,
    },
    SetAttr {
        node: NodeKey,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: NodeKey,
        name: String,
    },
    UpdateText {
        node: NodeKey,
        text: String,
    },
    /// Remove a node together with its subtree.
    RemoveNode {
        node: NodeKey,
    },
    EndOfDocument,
}

/// A subscriber that mirrors `DomUpdate`s into its own state.
pub trait DomSubscriber {
    /// Apply a single `DomUpdate` to the subscriber state.
    fn apply_update(&mut self, update: DomUpdate) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
struct ElementData {
    /// ASCII lowercase tag name.
    tag: String,
    /// `None` for children of the document node.
    parent: Option<NodeKey>,
    /// Attributes keyed by ASCII lowercase name.
    attrs: HashMap<String, String>,
    classes: Vec<String>,
    inline: Vec<css_style_attr::Declaration>,
}

#[derive(Clone, Debug)]
struct TextData {
    parent: NodeKey,
    text: String,
}

/// The style-relevant mirror of one document.
#[derive(Debug, Default)]
pub struct Document {
    elements: HashMap<NodeKey, ElementData>,
    /// Element children per parent, in tree order. Keyed by `NodeKey::ROOT` for top-level elements.
    children: HashMap<NodeKey, Vec<NodeKey>>,
    texts: HashMap<NodeKey, TextData>,
    text_children: HashMap<NodeKey, Vec<NodeKey>>,
    /// `<style>` elements in insertion order.
    style_nodes_order: Vec<NodeKey>,
    parsed: bool,
    document_url: Option<Url>,
    sheets: StyleSheetSet,
    config: StyleConfig,
}

/// Insert `node` into `list` at `pos`, clamped to the end.
fn insert_at(list: &mut Vec<NodeKey>, node: NodeKey, pos: usize) {
    list.retain(|existing| *existing != node);
    let index = pos.min(list.len());
    list.insert(index, node);
}

impl Document {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_config(config: StyleConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the URL the document was loaded from; relative `href`s resolve against it.
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.document_url = Some(url);
        self
    }

    #[inline]
    pub const fn config(&self) -> &StyleConfig {
        &self.config
    }

    #[inline]
    pub fn set_config(&mut self, config: StyleConfig) {
        self.config = config;
    }

    /// The sheets attached to this document. Clones share the same set.
    #[inline]
    pub const fn sheets(&self) -> &StyleSheetSet {
        &self.sheets
    }

    /// Whether `EndOfDocument` has been seen.
    #[inline]
    pub const fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Whether `node` is an element of this document.
    #[inline]
    pub fn contains(&self, node: NodeKey) -> bool {
        self.elements.contains_key(&node)
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// ASCII lowercase tag name of an element.
    #[inline]
    pub fn tag(&self, node: NodeKey) -> Option<&str> {
        self.elements.get(&node).map(|data| data.tag.as_str())
    }

    #[inline]
    pub fn attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        let data = self.elements.get(&node)?;
        data.attrs
            .get(name)
            .or_else(|| data.attrs.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Parent element, `None` for top-level elements.
    #[inline]
    pub fn parent_element(&self, node: NodeKey) -> Option<NodeKey> {
        self.elements.get(&node).and_then(|data| data.parent)
    }

    /// Element children of `node` (or of the document for `NodeKey::ROOT`).
    #[inline]
    pub fn child_elements(&self, node: NodeKey) -> &[NodeKey] {
        self.children.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Concatenated text of the direct text children of `node`.
    pub fn text_content(&self, node: NodeKey) -> String {
        self.text_children
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|text_node| self.texts.get(text_node))
            .map(|data| data.text.as_str())
            .collect()
    }

    /// Declarations of the element's `style` attribute in authored order.
    #[inline]
    pub(crate) fn inline_declarations(&self, node: NodeKey) -> &[css_style_attr::Declaration] {
        self.elements
            .get(&node)
            .map_or(&[], |data| data.inline.as_slice())
    }

    /// Elements from the outermost ancestor down to `node` itself.
    pub(crate) fn ancestor_chain(&self, node: NodeKey) -> Vec<NodeKey> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent_element(current) {
            if chain.len() > self.elements.len() || chain.contains(&parent) {
                warn!("Parent chain of {node:?} loops back through {parent:?}");
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Every element in tree order.
    pub fn elements_in_tree_order(&self) -> Vec<NodeKey> {
        let mut out = Vec::with_capacity(self.elements.len());
        let mut stack: Vec<NodeKey> = self.child_elements(NodeKey::ROOT).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.child_elements(node).iter().rev().copied());
        }
        out
    }

    /// Base URL for resolving `href`s: the first `<base href>` resolved against
    /// the document URL, else the document URL.
    pub fn base_url(&self) -> Option<Url> {
        let declared = self
            .elements_in_tree_order()
            .into_iter()
            .filter(|node| self.tag(*node) == Some("base"))
            .find_map(|node| self.attribute(node, "href"));
        match (declared, self.document_url.as_ref()) {
            (Some(href), Some(document_url)) => document_url.join(href).ok().or_else(|| Some(document_url.clone())),
            (Some(href), None) => Url::parse(href).ok(),
            (None, document_url) => document_url.cloned(),
        }
    }

    /// `<link rel=stylesheet>` elements in tree order, with `href` resolved.
    /// Links without an `href`, or whose `href` does not resolve, are skipped.
    pub fn stylesheet_links(&self) -> Vec<StyleLink> {
        let base = self.base_url();
        self.elements_in_tree_order()
            .into_iter()
            .filter_map(|node| {
                let data = self.elements.get(&node)?;
                if data.tag != "link" {
                    return None;
                }
                let rel: Vec<String> = data
                    .attrs
                    .get("rel")
                    .map(|value| value.split_ascii_whitespace().map(str::to_ascii_lowercase).collect())
                    .unwrap_or_default();
                if !rel.iter().any(|token| token == "stylesheet") {
                    return None;
                }
                let raw_href = data.attrs.get("href").map(|href| href.trim()).filter(|href| !href.is_empty())?;
                let resolved = match base.as_ref() {
                    Some(base_url) => base_url.join(raw_href),
                    None => Url::parse(raw_href),
                };
                let href = match resolved {
                    Ok(url) => url,
                    Err(error) => {
                        warn!("Ignoring stylesheet link {node:?} with href {raw_href:?}: {error}");
                        return None;
                    }
                };
                Some(StyleLink {
                    owner: node,
                    href,
                    link_type: data.attrs.get("type").cloned(),
                    media: data.attrs.get("media").cloned(),
                    cross_origin: data.attrs.get("crossorigin").cloned(),
                    rel,
                    title: data.attrs.get("title").cloned(),
                    disabled: data.attrs.contains_key("disabled"),
                })
            })
            .collect()
    }

    /// Parse and attach the sheet of one `<style>` element.
    fn refresh_style_element(&self, node: NodeKey) {
        if !self.parsed {
            return;
        }
        let Some(data) = self.elements.get(&node) else {
            return;
        };
        let template = Stylesheet::with_origin(Origin::Author)
            .with_media(data.attrs.get("media").map_or("", String::as_str))
            .with_title(data.attrs.get("title").cloned());
        let sheet = parse_into(template, &self.text_content(node));
        debug!("Embedded sheet {node:?} parsed with {} rules", sheet.len());
        self.sheets.attach(node, sheet);
    }

    fn is_style_element(&self, node: NodeKey) -> bool {
        self.tag(node) == Some("style")
    }

    fn insert_element(&mut self, parent: NodeKey, node: NodeKey, tag: &str, pos: usize) -> Result<()> {
        if node == NodeKey::ROOT {
            bail!("InsertElement cannot target the document node");
        }
        if parent != NodeKey::ROOT && !self.elements.contains_key(&parent) {
            bail!("InsertElement {node:?} under unknown parent {parent:?}");
        }
        if self.elements.contains_key(&node) && self.is_inclusive_ancestor(node, parent) {
            bail!("InsertElement would move {node:?} under its own descendant {parent:?}");
        }
        if let Some(previous) = self.elements.get(&node).map(|data| data.parent.unwrap_or(NodeKey::ROOT)) {
            if let Some(siblings) = self.children.get_mut(&previous) {
                siblings.retain(|sibling| *sibling != node);
            }
        }
        let entry = self.elements.entry(node).or_default();
        entry.tag = tag.to_ascii_lowercase();
        entry.parent = (parent != NodeKey::ROOT).then_some(parent);
        insert_at(self.children.entry(parent).or_default(), node, pos);
        if entry.tag == "style" && !self.style_nodes_order.contains(&node) {
            self.style_nodes_order.push(node);
            self.refresh_style_element(node);
        }
        trace!("Inserted <{tag}> {node:?} under {parent:?}");
        Ok(())
    }

    /// Whether `ancestor` is `node` itself or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        let mut steps = 0_usize;
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            if steps > self.elements.len() {
                return false;
            }
            steps += 1;
            current = self.parent_element(candidate);
        }
        false
    }

    fn insert_text(&mut self, parent: NodeKey, node: NodeKey, text: String, pos: usize) -> Result<()> {
        if parent != NodeKey::ROOT && !self.elements.contains_key(&parent) {
            bail!("InsertText {node:?} under unknown parent {parent:?}");
        }
        if self.elements.contains_key(&node) {
            bail!("InsertText reuses element key {node:?}");
        }
        if let Some(previous) = self.texts.get(&node).map(|data| data.parent) {
            if let Some(siblings) = self.text_children.get_mut(&previous) {
                siblings.retain(|sibling| *sibling != node);
            }
        }
        self.texts.insert(node, TextData { parent, text });
        insert_at(self.text_children.entry(parent).or_default(), node, pos);
        if self.is_style_element(parent) {
            self.refresh_style_element(parent);
        }
        Ok(())
    }

    fn update_text(&mut self, node: NodeKey, text: String) -> Result<()> {
        let Some(data) = self.texts.get_mut(&node) else {
            bail!("UpdateText for unknown text node {node:?}");
        };
        data.text = text;
        let parent = data.parent;
        if self.is_style_element(parent) {
            self.refresh_style_element(parent);
        }
        Ok(())
    }

    fn set_attr(&mut self, node: NodeKey, name: &str, value: String) -> Result<()> {
        let Some(data) = self.elements.get_mut(&node) else {
            bail!("SetAttr {name:?} for unknown element {node:?}");
        };
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => {
                data.classes = value.split_ascii_whitespace().map(str::to_owned).collect();
            }
            "style" => data.inline = css_style_attr::parse_style_attribute(&value),
            _ => {}
        }
        data.attrs.insert(name.clone(), value);
        if data.tag == "style" && matches!(name.as_str(), "media" | "title") {
            self.refresh_style_element(node);
        }
        Ok(())
    }

    fn remove_attr(&mut self, node: NodeKey, name: &str) -> Result<()> {
        let Some(data) = self.elements.get_mut(&node) else {
            bail!("RemoveAttr {name:?} for unknown element {node:?}");
        };
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => data.classes.clear(),
            "style" => data.inline.clear(),
            _ => {}
        }
        let removed = data.attrs.remove(&name).is_some();
        if removed && data.tag == "style" && matches!(name.as_str(), "media" | "title") {
            self.refresh_style_element(node);
        }
        Ok(())
    }

    fn remove_node(&mut self, node: NodeKey) -> Result<()> {
        if let Some(text) = self.texts.remove(&node) {
            if let Some(siblings) = self.text_children.get_mut(&text.parent) {
                siblings.retain(|sibling| *sibling != node);
            }
            if self.is_style_element(text.parent) {
                self.refresh_style_element(text.parent);
            }
            return Ok(());
        }
        let Some(parent) = self.elements.get(&node).map(|data| data.parent.unwrap_or(NodeKey::ROOT)) else {
            bail!("RemoveNode for unknown node {node:?}");
        };
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|sibling| *sibling != node);
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(kids) = self.children.remove(&current) {
                stack.extend(kids);
            }
            for text_node in self.text_children.remove(&current).unwrap_or_default() {
                self.texts.remove(&text_node);
            }
            if let Some(data) = self.elements.remove(&current) {
                if data.tag == "style" || data.tag == "link" {
                    self.sheets.detach(current);
                }
            }
            self.style_nodes_order.retain(|style_node| *style_node != current);
        }
        trace!("Removed subtree rooted at {node:?}");
        Ok(())
    }

    fn end_of_document(&mut self) {
        self.parsed = true;
        for node in self.style_nodes_order.clone() {
            self.refresh_style_element(node);
        }
        debug!(
            "Document parsed: {} elements, {} embedded sheets",
            self.elements.len(),
            self.style_nodes_order.len()
        );
    }
}

impl DomSubscriber for Document {
    fn apply_update(&mut self, update: DomUpdate) -> Result<()> {
        match update {
            DomUpdate::InsertElement { parent, node, tag, pos } => self.insert_element(parent, node, &tag, pos)?,
            DomUpdate::InsertText { parent, node, text, pos } => self.insert_text(parent, node, text, pos)?,
            DomUpdate::SetAttr { node, name, value } => self.set_attr(node, &name, value)?,
            DomUpdate::RemoveAttr { node, name } => self.remove_attr(node, &name)?,
            DomUpdate::UpdateText { node, text } => self.update_text(node, text)?,
            DomUpdate::RemoveNode { node } => self.remove_node(node)?,
            DomUpdate::EndOfDocument => self.end_of_document(),
        }
        Ok(())
    }
}

impl ElementAdapter for Document {
    type Handle = NodeKey;

    #[inline]
    fn parent(&self, element: NodeKey) -> Option<NodeKey> {
        self.parent_element(element)
    }

    fn previous_sibling_element(&self, element: NodeKey) -> Option<NodeKey> {
        let parent = self.elements.get(&element)?.parent.unwrap_or(NodeKey::ROOT);
        let siblings = self.children.get(&parent)?;
        let index = siblings.iter().position(|sibling| *sibling == element)?;
        index.checked_sub(1).and_then(|previous| siblings.get(previous)).copied()
    }

    #[inline]
    fn tag_name(&self, element: NodeKey) -> &str {
        self.tag(element).unwrap_or("")
    }

    #[inline]
    fn element_id(&self, element: NodeKey) -> Option<&str> {
        self.attribute(element, "id")
    }

    #[inline]
    fn has_class(&self, element: NodeKey, class: &str) -> bool {
        self.elements
            .get(&element)
            .is_some_and(|data| data.classes.iter().any(|token| token == class))
    }

    #[inline]
    fn attr(&self, element: NodeKey, name: &str) -> Option<&str> {
        self.attribute(element, name)
    }
}
