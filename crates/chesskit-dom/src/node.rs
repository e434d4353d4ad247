//! Node storage for [`crate::MemoryDocument`].

use std::collections::{BTreeMap, HashMap};

use chesskit_protocols::NodeId;

use crate::selector::ElementView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Document,
    Element { tag: String },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Every attribute except `style`.
    pub attributes: BTreeMap<String, String>,
    /// Inline style declarations in insertion order.
    pub styles: Vec<(String, String)>,
    pub listeners: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub image_loaded: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            styles: Vec::new(),
            listeners: Vec::new(),
            properties: BTreeMap::new(),
            image_loaded: false,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn style_attribute(&self) -> Option<String> {
        if self.styles.is_empty() {
            return None;
        }
        let declarations: Vec<String> = self
            .styles
            .iter()
            .map(|(property, value)| format!("{}: {};", property, value))
            .collect();
        Some(declarations.join(" "))
    }

    pub fn set_style_attribute(&mut self, value: &str) {
        self.styles = value
            .split(';')
            .filter_map(|declaration| {
                let (property, value) = declaration.split_once(':')?;
                let property = property.trim();
                if property.is_empty() {
                    return None;
                }
                Some((property.to_string(), value.trim().to_string()))
            })
            .collect();
    }
}

/// Arena of nodes.
///
/// Ids are never reused, so a handle to a freed node resolves to nothing.
/// Detached elements stay allocated: like a browser node they can be
/// re-inserted for as long as someone holds the handle. Text children
/// dropped by `set_text_content` are freed straight away.
#[derive(Debug)]
pub(crate) struct Tree {
    pub nodes: HashMap<NodeId, Node>,
    next_id: u64,
    pub document: NodeId,
    pub head: NodeId,
    pub body: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            next_id: 0,
            document: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        tree.document = tree.allocate(NodeKind::Document);
        let html = tree.allocate(NodeKind::Element {
            tag: "html".to_string(),
        });
        tree.head = tree.allocate(NodeKind::Element {
            tag: "head".to_string(),
        });
        tree.body = tree.allocate(NodeKind::Element {
            tag: "body".to_string(),
        });
        tree.link(tree.document, html);
        tree.link(html, tree.head);
        tree.link(html, tree.body);
        tree
    }

    pub fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Whether `node` is `ancestor` or below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Free a detached text node. Elements and attached nodes are kept.
    pub fn free_text(&mut self, id: NodeId) -> bool {
        let detached_text = self
            .get(id)
            .is_some_and(|n| n.parent.is_none() && matches!(n.kind, NodeKind::Text(_)));
        if detached_text {
            self.nodes.remove(&id);
        }
        detached_text
    }

    /// Remove `node` from its parent's child list. Returns the old parent.
    pub fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.get_mut(node)?.parent.take()?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        Some(parent)
    }

    /// Descendants of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .get(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }
}

impl ElementView for Tree {
    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.get(node).and_then(Node::tag)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
            .filter(|&p| self.get(p).is_some_and(|n| n.tag().is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_shape() {
        let tree = Tree::new();
        assert_eq!(tree.descendants(tree.document).len(), 3);
        assert!(tree.contains(tree.document, tree.body));
        assert_eq!(tree.tag_name(tree.head), Some("head"));
    }

    #[test]
    fn test_style_attribute_roundtrip() {
        let mut node = Node::new(NodeKind::Element {
            tag: "div".to_string(),
        });
        node.set_style_attribute("display: none; width:300px;;");
        assert_eq!(
            node.styles,
            vec![
                ("display".to_string(), "none".to_string()),
                ("width".to_string(), "300px".to_string()),
            ]
        );
        assert_eq!(
            node.style_attribute().as_deref(),
            Some("display: none; width: 300px;")
        );
    }

    #[test]
    fn test_free_text_only_drops_detached_text() {
        let mut tree = Tree::new();
        let body = tree.body;
        let text = tree.allocate(NodeKind::Text("x".to_string()));
        tree.link(body, text);
        assert!(!tree.free_text(text));
        assert!(!tree.free_text(body));

        tree.detach(text);
        assert!(tree.free_text(text));
        assert!(tree.get(text).is_none());
        assert!(!tree.contains(tree.document, text));
    }

    #[test]
    fn test_detach() {
        let mut tree = Tree::new();
        let body = tree.body;
        let child = tree.allocate(NodeKind::Text("x".to_string()));
        tree.link(body, child);
        assert_eq!(tree.detach(child), Some(body));
        assert_eq!(tree.detach(child), None);
        assert!(tree.get(body).unwrap().children.is_empty());
    }
}
