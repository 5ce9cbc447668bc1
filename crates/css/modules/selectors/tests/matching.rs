use css_selectors::{
    ElementAdapter, Specificity, matches_complex, parse_complex_selector, parse_selector_list,
    specificity_of_complex,
};

/// Flat test tree: each node knows its parent and previous sibling.
struct TestNode {
    tag: &'static str,
    id: Option<&'static str>,
    classes: Vec<&'static str>,
    attrs: Vec<(&'static str, &'static str)>,
    parent: Option<usize>,
    previous: Option<usize>,
}

struct TestTree {
    nodes: Vec<TestNode>,
}

impl TestTree {
    fn push(
        &mut self,
        tag: &'static str,
        parent: Option<usize>,
        previous: Option<usize>,
    ) -> usize {
        self.nodes.push(TestNode {
            tag,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            parent,
            previous,
        });
        self.nodes.len() - 1
    }
}

impl ElementAdapter for TestTree {
    type Handle = usize;

    fn parent(&self, element: usize) -> Option<usize> {
        self.nodes[element].parent
    }

    fn previous_sibling_element(&self, element: usize) -> Option<usize> {
        self.nodes[element].previous
    }

    fn tag_name(&self, element: usize) -> &str {
        self.nodes[element].tag
    }

    fn element_id(&self, element: usize) -> Option<&str> {
        self.nodes[element].id
    }

    fn has_class(&self, element: usize, class: &str) -> bool {
        self.nodes[element].classes.contains(&class)
    }

    fn attr(&self, element: usize, name: &str) -> Option<&str> {
        self.nodes[element]
            .attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// `<div><p><span class=bold/><em/></p><p id=second><span/></p></div>`
fn sample_tree() -> (TestTree, [usize; 6]) {
    let mut tree = TestTree { nodes: Vec::new() };
    let div = tree.push("div", None, None);
    let first_p = tree.push("p", Some(div), None);
    let span = tree.push("span", Some(first_p), None);
    tree.nodes[span].classes.push("bold");
    let em = tree.push("em", Some(first_p), Some(span));
    tree.nodes[em].attrs.push(("lang", "en fr"));
    let second_p = tree.push("p", Some(div), Some(first_p));
    tree.nodes[second_p].id = Some("second");
    let inner = tree.push("span", Some(second_p), None);
    (tree, [div, first_p, span, em, second_p, inner])
}

fn matches(tree: &TestTree, element: usize, selector: &str) -> bool {
    let parsed = parse_complex_selector(selector).unwrap();
    matches_complex(tree, element, &parsed)
}

#[test]
fn child_and_descendant_combinators() {
    let (tree, [div, _, span, _, _, inner]) = sample_tree();
    assert!(matches(&tree, span, "p > span"));
    assert!(matches(&tree, span, "div span"));
    assert!(!matches(&tree, span, "div > span"));
    assert!(matches(&tree, inner, "div p#second > span"));
    assert!(!matches(&tree, div, "p div"));
}

#[test]
fn descendant_matching_backtracks_past_first_candidate() {
    let mut tree = TestTree { nodes: Vec::new() };
    let section = tree.push("section", None, None);
    let outer = tree.push("div", Some(section), None);
    tree.nodes[outer].classes.push("a");
    let middle = tree.push("div", Some(outer), None);
    let leaf = tree.push("span", Some(middle), None);
    // The nearest `div` ancestor is not a child of `section`; the outer one is.
    assert!(matches(&tree, leaf, "section > div span"));
    assert!(!matches(&tree, leaf, "section > div > span"));
    assert!(matches(&tree, leaf, ".a > div > span"));
}

#[test]
fn sibling_combinators() {
    let (tree, [_, first_p, _, em, second_p, _]) = sample_tree();
    assert!(matches(&tree, em, "span.bold + em"));
    assert!(matches(&tree, em, "span ~ em"));
    assert!(matches(&tree, second_p, "p + p#second"));
    assert!(!matches(&tree, first_p, "p + p"));
}

#[test]
fn attribute_and_class_matching() {
    let (tree, [_, _, span, em, _, _]) = sample_tree();
    assert!(matches(&tree, em, "em[lang~=fr]"));
    assert!(!matches(&tree, em, "em[lang=fr]"));
    assert!(matches(&tree, em, "[lang]"));
    assert!(matches(&tree, span, "SPAN.bold"));
    assert!(!matches(&tree, span, "span.Bold"));
}

#[test]
fn specificity_orders_id_over_class_over_type() {
    let id = specificity_of_complex(&parse_complex_selector("#prioOne").unwrap());
    let class = specificity_of_complex(&parse_complex_selector("span.bold").unwrap());
    let types = specificity_of_complex(&parse_complex_selector("div p > span").unwrap());
    assert_eq!(id, Specificity(1, 0, 0));
    assert_eq!(class, Specificity(0, 1, 1));
    assert_eq!(types, Specificity(0, 0, 3));
    assert!(id > class && class > types);
}

#[test]
fn list_specificity_uses_best_matching_member() {
    let (tree, [_, _, span, _, _, _]) = sample_tree();
    let list = parse_selector_list("span, p > span.bold, #missing").unwrap();
    assert_eq!(
        list.matching_specificity(&tree, span),
        Some(Specificity(0, 1, 2))
    );
    let none = parse_selector_list("em, #missing").unwrap();
    assert_eq!(none.matching_specificity(&tree, span), None);
}
