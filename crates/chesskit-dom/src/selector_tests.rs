use super::*;
use std::collections::HashMap;

/// Flat tree: node -> (tag, attributes, parent).
#[derive(Default)]
struct FakeTree {
    nodes: HashMap<NodeId, (String, HashMap<String, String>, Option<NodeId>)>,
}

impl FakeTree {
    fn add(&mut self, id: u64, tag: &str, attrs: &[(&str, &str)], parent: Option<u64>) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.nodes
            .insert(NodeId(id), (tag.to_string(), attrs, parent.map(NodeId)));
        NodeId(id)
    }
}

impl ElementView for FakeTree {
    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|(tag, _, _)| tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&node)
            .and_then(|(_, attrs, _)| attrs.get(name).map(String::as_str))
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|(_, _, parent)| *parent)
    }
}

fn sample_tree() -> FakeTree {
    let mut tree = FakeTree::default();
    tree.add(1, "div", &[("id", "board-layout-main")], None);
    tree.add(
        2,
        "div",
        &[("id", "board-layout-player-top"), ("class", "board-layout-player top")],
        Some(1),
    );
    tree.add(3, "div", &[("class", "player-component")], Some(2));
    tree.add(4, "span", &[("class", "clock-component clock-black")], Some(3));
    tree.add(5, "wc-captured-pieces", &[("data-color", "white")], Some(3));
    tree
}

fn matches(selector: &str, tree: &FakeTree, node: u64) -> bool {
    SelectorList::parse(selector).unwrap().matches(tree, NodeId(node))
}

#[test]
fn test_simple_selectors() {
    let tree = sample_tree();
    assert!(matches("#board-layout-main", &tree, 1));
    assert!(matches("div", &tree, 1));
    assert!(matches(".player-component", &tree, 3));
    assert!(matches("wc-captured-pieces", &tree, 5));
    assert!(matches("*", &tree, 4));
    assert!(!matches("span", &tree, 1));
}

#[test]
fn test_compound_selectors() {
    let tree = sample_tree();
    assert!(matches("div.board-layout-player.top", &tree, 2));
    assert!(!matches("div.board-layout-player.bottom", &tree, 2));
    assert!(matches("span.clock-component", &tree, 4));
    assert!(!matches("div.clock-component", &tree, 4));
}

#[test]
fn test_class_match_is_whole_word() {
    let tree = sample_tree();
    assert!(!matches(".clock", &tree, 4));
    assert!(matches(".clock-black", &tree, 4));
}

#[test]
fn test_attribute_selectors() {
    let tree = sample_tree();
    assert!(matches("[data-color]", &tree, 5));
    assert!(matches("[data-color=white]", &tree, 5));
    assert!(matches("[data-color=\"white\"]", &tree, 5));
    assert!(matches("wc-captured-pieces[data-color='white']", &tree, 5));
    assert!(!matches("[data-color=black]", &tree, 5));
    assert!(!matches("[data-missing]", &tree, 5));
}

#[test]
fn test_descendant_combinator() {
    let tree = sample_tree();
    assert!(matches("#board-layout-main .clock-component", &tree, 4));
    assert!(matches("#board-layout-player-top .player-component span", &tree, 4));
    assert!(!matches("#board-layout-player-bottom .clock-component", &tree, 4));
}

#[test]
fn test_child_combinator() {
    let tree = sample_tree();
    assert!(matches(".player-component > .clock-component", &tree, 4));
    assert!(matches(".player-component>.clock-component", &tree, 4));
    assert!(!matches("#board-layout-player-top > .clock-component", &tree, 4));
}

#[test]
fn test_selector_groups() {
    let tree = sample_tree();
    assert!(matches(".user-username-component, .clock-component", &tree, 4));
    assert!(!matches(".user-username-component, .player-rating", &tree, 4));
}

#[test]
fn test_tag_is_case_insensitive() {
    let tree = sample_tree();
    assert!(matches("DIV#board-layout-main", &tree, 1));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(SelectorList::parse(""), Err(SelectorError::Empty(_))));
    assert!(matches!(SelectorList::parse("a,"), Err(SelectorError::Empty(_))));
    assert!(matches!(
        SelectorList::parse("div:hover"),
        Err(SelectorError::Unexpected { found: ':', .. })
    ));
    assert!(matches!(
        SelectorList::parse("div >"),
        Err(SelectorError::DanglingCombinator(_))
    ));
    assert!(matches!(
        SelectorList::parse("> div"),
        Err(SelectorError::Unexpected { found: '>', .. })
    ));
    assert!(matches!(
        SelectorList::parse("[data-x"),
        Err(SelectorError::UnterminatedAttribute(_))
    ));
    assert!(matches!(
        SelectorList::parse("[data-x=\"y]"),
        Err(SelectorError::UnterminatedAttribute(_))
    ));
}
