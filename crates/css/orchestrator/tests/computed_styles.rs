#![cfg(test)]

use core::error::Error;
use css_orchestrator::{
    Document, DomSubscriber as _, DomUpdate, NodeKey, Origin, StyleConfig, StyleError, parse_stylesheet,
};
use css_media_queries::MediaType;

/// Builds a document through the same `DomUpdate` stream a parser would send.
struct TreeBuilder {
    document: Document,
    next_key: u64,
}

impl TreeBuilder {
    fn new() -> Self {
        Self::with_document(Document::new())
    }

    fn with_document(document: Document) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            document,
            next_key: 1,
        }
    }

    fn mint(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Append an element with the given attributes under `parent`.
    ///
    /// # Errors
    /// Returns an error if the mirror rejects an update.
    fn element(&mut self, parent: NodeKey, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeKey, Box<dyn Error>> {
        let node = self.mint();
        self.document.apply_update(DomUpdate::InsertElement {
            parent,
            node,
            tag: tag.to_owned(),
            pos: usize::MAX,
        })?;
        for (name, value) in attrs {
            self.document.apply_update(DomUpdate::SetAttr {
                node,
                name: (*name).to_owned(),
                value: (*value).to_owned(),
            })?;
        }
        Ok(node)
    }

    /// Append a `<style>` element holding `css` under `parent`.
    ///
    /// # Errors
    /// Returns an error if the mirror rejects an update.
    fn style(&mut self, parent: NodeKey, css: &str) -> Result<NodeKey, Box<dyn Error>> {
        let style = self.element(parent, "style", &[])?;
        let text = self.mint();
        self.document.apply_update(DomUpdate::InsertText {
            parent: style,
            node: text,
            text: css.to_owned(),
            pos: 0,
        })?;
        Ok(style)
    }

    /// Finish parsing and hand back the document.
    ///
    /// # Errors
    /// Returns an error if the mirror rejects the update.
    fn finish(mut self) -> Result<Document, Box<dyn Error>> {
        self.document.apply_update(DomUpdate::EndOfDocument)?;
        Ok(self.document)
    }
}

#[test]
fn child_combinator_and_class_rule_both_apply() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let head = tree.element(NodeKey::ROOT, "head", &[])?;
    tree.style(head, "p > span { color: blue } span.bold { font-weight: bold }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let span = tree.element(paragraph, "span", &[("class", "bold")])?;
    let document = tree.finish()?;

    let style = document.compute_style(span)?;
    assert_eq!(style.len(), 2);
    assert_eq!(style.color(), Some("blue"));
    assert_eq!(style.font_weight(), Some("bold"));
    Ok(())
}

#[test]
fn later_rule_and_important_declaration_win_with_inherited_alignment() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(
        NodeKey::ROOT,
        "p>span{color:blue} p>span{color:red} \
         span.bold{font-weight:bold !important} span.bold{font-weight:lighter}",
    )?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[("style", "text-align:center")])?;
    let span = tree.element(paragraph, "span", &[("class", "bold")])?;
    let document = tree.finish()?;

    let style = document.compute_style(span)?;
    assert_eq!(style.color(), Some("red"));
    assert_eq!(style.font_weight(), Some("bold"));
    assert_eq!(style.text_align(), Some("center"));
    assert_eq!(style.len(), 3);
    Ok(())
}

#[test]
fn id_rule_beats_type_rule() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "#prioOne { color: black } div { color: green }")?;
    let div = tree.element(NodeKey::ROOT, "div", &[("id", "prioOne")])?;
    let document = tree.finish()?;

    assert_eq!(document.compute_style(div)?.color(), Some("black"));
    Ok(())
}

#[test]
fn id_rule_beats_earlier_type_rule() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "div{color:green} #prioOne{color:black}")?;
    let div = tree.element(NodeKey::ROOT, "div", &[("id", "prioOne")])?;
    let document = tree.finish()?;

    let style = document.compute_style(div)?;
    assert_eq!(style.color(), Some("black"));
    assert_eq!(style.len(), 1);
    Ok(())
}

#[test]
fn inline_declaration_beats_selector_rule() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p>span{color:blue}")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let span = tree.element(paragraph, "span", &[("style", "color:red")])?;
    let document = tree.finish()?;

    let style = document.compute_style(span)?;
    assert_eq!(style.color(), Some("red"));
    assert_eq!(style.len(), 1);
    Ok(())
}

#[test]
fn several_sheets_combine_on_nested_element() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let head = tree.element(NodeKey::ROOT, "head", &[])?;
    tree.style(head, "p > span{color:blue} span.bold{font-weight:bold}")?;
    tree.style(head, "p{font-size:20px} em{font-style:italic !important} .red{margin:5px}")?;
    tree.style(head, "#text{font-style:normal;margin:0}")?;
    let body = tree.element(NodeKey::ROOT, "body", &[])?;
    let div = tree.element(body, "div", &[])?;
    let paragraph = tree.element(div, "p", &[])?;
    let span = tree.element(paragraph, "span", &[("class", "bold")])?;
    let emphasis = tree.element(
        span,
        "em",
        &[("style", "color: red"), ("class", "red"), ("id", "text")],
    )?;
    let document = tree.finish()?;

    let style = document.compute_style(emphasis)?;
    assert_eq!(style.len(), 5);
    assert_eq!(style.margin(), Some("0"));
    assert_eq!(style.color(), Some("red"));
    assert_eq!(style.font_weight(), Some("bold"));
    assert_eq!(style.font_style(), Some("italic"));
    assert_eq!(style.font_size(), Some("20px"));
    Ok(())
}

#[test]
fn unstyled_element_resolves_to_empty_style() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { margin: 4px }")?;
    let div = tree.element(NodeKey::ROOT, "div", &[])?;
    let paragraph = tree.element(div, "p", &[])?;
    let span = tree.element(paragraph, "span", &[])?;
    let document = tree.finish()?;

    assert!(document.compute_style(div)?.is_empty());
    let style = document.compute_style(span)?;
    assert_eq!(style.len(), 0);
    assert_eq!(style.margin(), None);
    assert_eq!(style.value_or_initial("margin"), Some("0"));
    assert_eq!(style.len(), 0);
    Ok(())
}

#[test]
fn important_wins_regardless_of_order() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { color: red !important } p { color: blue }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let document = tree.finish()?;

    assert_eq!(document.compute_style(paragraph)?.color(), Some("red"));
    Ok(())
}

#[test]
fn specificity_orders_id_class_type() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(
        NodeKey::ROOT,
        "#hero { color: red } .lead { color: green; margin: 1px } p { color: blue; margin: 2px; display: block }",
    )?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[("id", "hero"), ("class", "lead")])?;
    let document = tree.finish()?;

    let style = document.compute_style(paragraph)?;
    assert_eq!(style.color(), Some("red"));
    assert_eq!(style.margin(), Some("1px"));
    assert_eq!(style.display(), Some("block"));
    Ok(())
}

#[test]
fn later_attached_sheet_wins_ties() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { color: red }")?;
    tree.style(NodeKey::ROOT, "p { color: blue }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let document = tree.finish()?;

    assert_eq!(document.compute_style(paragraph)?.color(), Some("blue"));
    Ok(())
}

#[test]
fn important_rule_beats_normal_inline() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { color: green !important; margin: 3px }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[("style", "color: red; margin: 9px")])?;
    let document = tree.finish()?;

    let style = document.compute_style(paragraph)?;
    assert_eq!(style.color(), Some("green"));
    assert_eq!(style.margin(), Some("9px"));
    Ok(())
}

#[test]
fn only_inherited_properties_propagate() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "section { color: teal; margin: 10px; text-align: right }")?;
    let section = tree.element(NodeKey::ROOT, "section", &[])?;
    let div = tree.element(section, "div", &[("style", "text-align: left")])?;
    let span = tree.element(div, "span", &[])?;
    let document = tree.finish()?;

    let style = document.compute_style(span)?;
    assert_eq!(style.color(), Some("teal"));
    assert_eq!(style.text_align(), Some("left"));
    assert_eq!(style.margin(), None);
    assert_eq!(style.len(), 2);
    Ok(())
}

#[test]
fn sibling_combinators_use_element_order() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "h1 + p { color: red } h1 ~ p { margin: 0 }")?;
    let body = tree.element(NodeKey::ROOT, "body", &[])?;
    tree.element(body, "h1", &[])?;
    let first = tree.element(body, "p", &[])?;
    let second = tree.element(body, "p", &[])?;
    let document = tree.finish()?;

    let first_style = document.compute_style(first)?;
    assert_eq!(first_style.color(), Some("red"));
    assert_eq!(first_style.margin(), Some("0"));
    let second_style = document.compute_style(second)?;
    assert_eq!(second_style.color(), None);
    assert_eq!(second_style.margin(), Some("0"));
    Ok(())
}

#[test]
fn media_gates_sheets_and_blocks() -> Result<(), Box<dyn Error>> {
    let config = StyleConfig::new(MediaType::Screen, 600.0, 800.0);
    let mut tree = TreeBuilder::with_document(Document::with_config(config));
    let print = tree.element(NodeKey::ROOT, "style", &[("media", "print")])?;
    let text = tree.mint();
    tree.document.apply_update(DomUpdate::InsertText {
        parent: print,
        node: text,
        text: "p { color: black }".to_owned(),
        pos: 0,
    })?;
    tree.style(
        NodeKey::ROOT,
        "@media (min-width: 800px) { p { margin: 8px } } @media (max-width: 700px) { p { margin: 2px } }",
    )?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let document = tree.finish()?;

    let style = document.compute_style(paragraph)?;
    assert_eq!(style.color(), None);
    assert_eq!(style.margin(), Some("2px"));
    Ok(())
}

#[test]
fn disabled_and_unselected_alternate_sheets_contribute_nothing() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let link = tree.element(NodeKey::ROOT, "link", &[])?;
    let other = tree.element(NodeKey::ROOT, "link", &[])?;
    let document = tree.finish()?;

    document
        .sheets()
        .attach(link, parse_stylesheet("p { color: red }", Origin::Author).with_alternate(true));
    document
        .sheets()
        .attach(other, parse_stylesheet("p { margin: 0 }", Origin::Author).with_disabled(true));
    assert!(document.compute_style(paragraph)?.is_empty());

    document.sheets().select_alternate(link, true);
    assert_eq!(document.compute_style(paragraph)?.color(), Some("red"));
    Ok(())
}

#[test]
fn user_agent_sheet_loses_to_author_unless_important() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { color: blue; display: inline }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let document = tree.finish()?;
    document.sheets().attach(
        NodeKey(9_000),
        parse_stylesheet("p { color: gray; display: block !important }", Origin::UserAgent),
    );

    let style = document.compute_style(paragraph)?;
    assert_eq!(style.color(), Some("blue"));
    assert_eq!(style.display(), Some("block"));
    Ok(())
}

#[test]
fn style_text_changes_after_parse_replace_the_sheet() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let style = tree.element(NodeKey::ROOT, "style", &[])?;
    let text = tree.mint();
    tree.document.apply_update(DomUpdate::InsertText {
        parent: style,
        node: text,
        text: "p { color: red }".to_owned(),
        pos: 0,
    })?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let mut document = tree.finish()?;
    assert_eq!(document.compute_style(paragraph)?.color(), Some("red"));

    document.apply_update(DomUpdate::UpdateText {
        node: text,
        text: "p { color: purple }".to_owned(),
    })?;
    assert_eq!(document.compute_style(paragraph)?.color(), Some("purple"));
    assert_eq!(document.sheets().len(), 1);

    document.apply_update(DomUpdate::RemoveNode { node: style })?;
    assert!(document.compute_style(paragraph)?.is_empty());
    assert!(document.sheets().is_empty());
    Ok(())
}

#[test]
fn sheets_wait_for_end_of_document() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "p { color: red }")?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    assert!(tree.document.compute_style(paragraph)?.is_empty());
    let document = tree.finish()?;
    assert_eq!(document.compute_style(paragraph)?.color(), Some("red"));
    Ok(())
}

#[test]
fn unknown_or_removed_element_is_unattached() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let div = tree.element(NodeKey::ROOT, "div", &[])?;
    let child = tree.element(div, "span", &[])?;
    let mut document = tree.finish()?;

    assert_eq!(document.compute_style(NodeKey(4_242)), Err(StyleError::Unattached(NodeKey(4_242))));
    document.apply_update(DomUpdate::RemoveNode { node: div })?;
    assert_eq!(document.compute_style(child), Err(StyleError::Unattached(child)));
    Ok(())
}

#[test]
fn snapshot_matches_single_queries() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "div { color: red } .x { margin: 1px }")?;
    let div = tree.element(NodeKey::ROOT, "div", &[])?;
    let span = tree.element(div, "span", &[("class", "x")])?;
    let document = tree.finish()?;

    let snapshot = document.computed_snapshot();
    assert_eq!(snapshot.len(), document.element_count());
    assert_eq!(snapshot.get(&div), Some(&document.compute_style(div)?));
    assert_eq!(snapshot.get(&span), Some(&document.compute_style(span)?));
    Ok(())
}

#[test]
fn stylesheet_links_resolve_against_base() -> Result<(), Box<dyn Error>> {
    let base = url::Url::parse("https://example.org/docs/index.html")?;
    let mut tree = TreeBuilder::with_document(Document::new().with_url(base));
    let head = tree.element(NodeKey::ROOT, "head", &[])?;
    let main = tree.element(
        head,
        "link",
        &[("rel", "Stylesheet"), ("href", "site.css"), ("media", "screen"), ("crossorigin", "")],
    )?;
    tree.element(head, "link", &[("rel", "icon"), ("href", "favicon.ico")])?;
    tree.element(head, "link", &[("rel", "stylesheet")])?;
    let alternate = tree.element(
        head,
        "link",
        &[("rel", "alternate stylesheet"), ("href", "/dark.css"), ("title", "Dark")],
    )?;
    let document = tree.finish()?;

    let links = document.stylesheet_links();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].owner, main);
    assert_eq!(links[0].href.as_str(), "https://example.org/docs/site.css");
    assert_eq!(links[0].content_type(), "text/css");
    assert_eq!(links[0].cross_origin.as_deref(), Some(""));
    assert!(!links[0].is_alternate());
    assert_eq!(links[1].owner, alternate);
    assert_eq!(links[1].href.as_str(), "https://example.org/dark.css");
    assert!(links[1].is_alternate());
    assert_eq!(links[1].sheet_template().title.as_deref(), Some("Dark"));
    Ok(())
}

#[test]
fn insert_under_unknown_parent_is_rejected() {
    let mut document = Document::new();
    let result = document.apply_update(DomUpdate::InsertElement {
        parent: NodeKey(77),
        node: NodeKey(78),
        tag: "div".to_owned(),
        pos: 0,
    });
    assert!(result.is_err());
}

#[test]
fn moving_element_under_its_descendant_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(NodeKey::ROOT, "div { color: red }")?;
    let div = tree.element(NodeKey::ROOT, "div", &[])?;
    let paragraph = tree.element(div, "p", &[])?;
    let mut document = tree.finish()?;

    let into_child = document.apply_update(DomUpdate::InsertElement {
        parent: paragraph,
        node: div,
        tag: "div".to_owned(),
        pos: 0,
    });
    assert!(into_child.is_err());
    let into_itself = document.apply_update(DomUpdate::InsertElement {
        parent: div,
        node: div,
        tag: "div".to_owned(),
        pos: 0,
    });
    assert!(into_itself.is_err());

    assert_eq!(document.parent_element(paragraph), Some(div));
    assert_eq!(document.parent_element(div), None);
    assert_eq!(document.compute_style(paragraph)?.color(), Some("red"));
    Ok(())
}

#[test]
fn text_under_unknown_parent_is_rejected() {
    let mut document = Document::new();
    let result = document.apply_update(DomUpdate::InsertText {
        parent: NodeKey(999),
        node: NodeKey(1_000),
        text: "p { color: red }".to_owned(),
        pos: 0,
    });
    assert!(result.is_err());
    assert!(document.text_content(NodeKey(999)).is_empty());
}

#[test]
fn removing_unknown_node_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    let div = tree.element(NodeKey::ROOT, "div", &[])?;
    let mut document = tree.finish()?;

    assert!(document.apply_update(DomUpdate::RemoveNode { node: NodeKey(999) }).is_err());
    document.apply_update(DomUpdate::RemoveNode { node: div })?;
    assert!(document.apply_update(DomUpdate::RemoveNode { node: div }).is_err());
    Ok(())
}

#[test]
fn nested_media_blocks_all_have_to_match() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBuilder::new();
    tree.style(
        NodeKey::ROOT,
        "@media screen, print { @media (max-width: 100px) { p { color: red } } } \
         @media print, screen { @media (min-width: 100px) { p { margin: 2px } } }",
    )?;
    let paragraph = tree.element(NodeKey::ROOT, "p", &[])?;
    let document = tree.finish()?;

    let style = document.compute_style(paragraph)?;
    assert_eq!(style.color(), None);
    assert_eq!(style.margin(), Some("2px"));
    Ok(())
}
