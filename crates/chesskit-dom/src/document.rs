//! In-memory [`DomPort`] implementation.

use chesskit_protocols::{DomError, DomPort, MutationKind, MutationReceiver, MutationRecord, NodeId};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::warn;

use crate::node::{NodeKind, Tree};
use crate::selector::SelectorList;

const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

/// A document tree held in memory.
///
/// Cheap to share behind an `Arc`; all access goes through an internal
/// read/write lock that is never held while observers are notified.
pub struct MemoryDocument {
    tree: RwLock<Tree>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MutationRecord>>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        Self {
            tree: RwLock::new(Tree::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Start building an element.
    pub fn element(&self, tag: &str) -> ElementBuilder<'_> {
        ElementBuilder {
            document: self,
            node: self.create_element(tag),
        }
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> NodeId {
        self.tree.write().allocate(NodeKind::Text(text.to_string()))
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree
            .read()
            .get(node)
            .and_then(|n| n.tag().map(str::to_string))
    }

    /// Record an event listener on `node`.
    pub fn add_listener(&self, node: NodeId, event: &str) {
        if let Some(n) = self.tree.write().get_mut(node) {
            n.listeners.push(event.to_string());
        }
    }

    /// Events with a listener attached to `node`.
    pub fn listeners(&self, node: NodeId) -> Vec<String> {
        self.tree
            .read()
            .get(node)
            .map(|n| n.listeners.clone())
            .unwrap_or_default()
    }

    /// Set a JS-side property (custom element instance state). Not reflected
    /// in markup.
    pub fn set_property(&self, node: NodeId, key: &str, value: &str) {
        if let Some(n) = self.tree.write().get_mut(node) {
            n.properties.insert(key.to_string(), value.to_string());
        }
    }

    pub fn property(&self, node: NodeId, key: &str) -> Option<String> {
        self.tree
            .read()
            .get(node)
            .and_then(|n| n.properties.get(key).cloned())
    }

    /// Mark an `<img>` as loaded (or not).
    pub fn set_image_loaded(&self, node: NodeId, loaded: bool) {
        if let Some(n) = self.tree.write().get_mut(node) {
            n.image_loaded = loaded;
        }
    }

    /// Number of nodes held by the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.tree.read().nodes.len()
    }

    /// Number of live mutation subscriptions.
    pub fn observer_count(&self) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|tx| !tx.is_closed());
        observers.len()
    }

    /// Serialise `node` and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        write_html(&tree, node, &mut out);
        out
    }

    /// Serialise the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        if let Some(n) = tree.get(node) {
            for &child in &n.children {
                write_html(&tree, child, &mut out);
            }
        }
        out
    }

    fn notify(&self, records: Vec<MutationRecord>) {
        if records.is_empty() {
            return;
        }
        let mut observers = self.observers.lock();
        observers.retain(|tx| records.iter().all(|record| tx.send(record.clone()).is_ok()));
    }

    fn parse_selector(selector: &str) -> Option<SelectorList> {
        match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(selector, error = %e, "Invalid selector");
                None
            }
        }
    }

    fn find(&self, root: NodeId, selector: &str, first_only: bool) -> Vec<NodeId> {
        let Some(list) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        let tree = self.tree.read();
        let mut found = Vec::new();
        for id in tree.descendants(root) {
            if list.matches(&*tree, id) {
                found.push(id);
                if first_only {
                    break;
                }
            }
        }
        found
    }

    fn attribute_changed(&self, node: NodeId, name: &str) {
        self.notify(vec![MutationRecord {
            target: node,
            kind: MutationKind::Attributes {
                name: name.to_string(),
            },
        }]);
    }
}

impl DomPort for MemoryDocument {
    fn head(&self) -> NodeId {
        self.tree.read().head
    }

    fn body(&self) -> NodeId {
        self.tree.read().body
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        let root = self.tree.read().document;
        self.find(root, selector, true).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let root = self.tree.read().document;
        self.find(root, selector, false)
    }

    fn query_within(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.find(scope, selector, true).into_iter().next()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.read().parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .read()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree.read();
        let parent = tree.get(tree.parent(node)?)?;
        let index = parent.children.iter().position(|&c| c == node)?;
        parent.children.get(index + 1).copied()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree.read();
        let parent = tree.get(tree.parent(node)?)?;
        let index = parent.children.iter().position(|&c| c == node)?;
        index.checked_sub(1).and_then(|i| parent.children.get(i).copied())
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.tree.read();
        tree.contains(tree.document, node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.read().contains(ancestor, node)
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.tree.write().allocate(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let records = {
            let mut tree = self.tree.write();

            let parent_kind = tree
                .get(parent)
                .map(|n| n.kind.clone())
                .ok_or(DomError::NodeNotFound(parent))?;
            let node_kind = tree
                .get(node)
                .map(|n| n.kind.clone())
                .ok_or(DomError::NodeNotFound(node))?;

            if matches!(parent_kind, NodeKind::Text(_)) {
                return Err(DomError::HierarchyRequest(format!(
                    "{} is a text node and cannot have children",
                    parent
                )));
            }
            if matches!(node_kind, NodeKind::Document) {
                return Err(DomError::HierarchyRequest(
                    "the document node cannot be inserted".to_string(),
                ));
            }
            if tree.contains(node, parent) {
                return Err(DomError::HierarchyRequest(format!(
                    "{} is an ancestor of {}",
                    node, parent
                )));
            }

            // Inserting before itself means inserting before its next sibling.
            let mut reference = reference;
            if reference == Some(node) {
                reference = tree.get(parent).and_then(|p| {
                    let index = p.children.iter().position(|&c| c == node)?;
                    p.children.get(index + 1).copied()
                });
            }
            if let Some(reference) = reference {
                if tree.parent(reference) != Some(parent) {
                    return Err(DomError::NotAChild { parent, reference });
                }
            }

            let mut records = Vec::new();
            if let Some(old_parent) = tree.detach(node) {
                records.push(MutationRecord {
                    target: old_parent,
                    kind: MutationKind::ChildList {
                        added: Vec::new(),
                        removed: vec![node],
                    },
                });
            }

            let target = tree
                .get_mut(parent)
                .ok_or(DomError::NodeNotFound(parent))?;
            let index = reference
                .and_then(|r| target.children.iter().position(|&c| c == r))
                .unwrap_or(target.children.len());
            target.children.insert(index, node);
            if let Some(n) = tree.get_mut(node) {
                n.parent = Some(parent);
            }

            records.push(MutationRecord {
                target: parent,
                kind: MutationKind::ChildList {
                    added: vec![node],
                    removed: Vec::new(),
                },
            });
            records
        };

        self.notify(records);
        Ok(())
    }

    fn remove(&self, node: NodeId) {
        let old_parent = self.tree.write().detach(node);
        if let Some(old_parent) = old_parent {
            self.notify(vec![MutationRecord {
                target: old_parent,
                kind: MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![node],
                },
            }]);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.tree.read();
        let n = tree.get(node)?;
        if name == "style" {
            return n.style_attribute();
        }
        n.attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        {
            let mut tree = self.tree.write();
            let Some(n) = tree.get_mut(node) else {
                return;
            };
            if name == "style" {
                n.set_style_attribute(value);
            } else {
                n.attributes.insert(name.to_string(), value.to_string());
            }
        }
        self.attribute_changed(node, name);
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        let removed = {
            let mut tree = self.tree.write();
            match tree.get_mut(node) {
                Some(n) if name == "style" => !std::mem::take(&mut n.styles).is_empty(),
                Some(n) => n.attributes.remove(name).is_some(),
                None => false,
            }
        };
        if removed {
            self.attribute_changed(node, name);
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        if let Some(n) = tree.get(node) {
            if let NodeKind::Text(text) = &n.kind {
                return text.clone();
            }
        }
        tree.descendants(node)
            .into_iter()
            .filter_map(|id| match &tree.get(id)?.kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        let record = {
            let mut tree = self.tree.write();
            let Some(n) = tree.get_mut(node) else {
                return;
            };
            if let NodeKind::Text(current) = &mut n.kind {
                *current = text.to_string();
                Some(MutationRecord {
                    target: node,
                    kind: MutationKind::CharacterData,
                })
            } else {
                let removed = std::mem::take(&mut n.children);
                for &child in &removed {
                    if let Some(c) = tree.get_mut(child) {
                        c.parent = None;
                    }
                    tree.free_text(child);
                }
                let mut added = Vec::new();
                if !text.is_empty() {
                    let text_node = tree.allocate(NodeKind::Text(text.to_string()));
                    if let Some(t) = tree.get_mut(text_node) {
                        t.parent = Some(node);
                    }
                    if let Some(n) = tree.get_mut(node) {
                        n.children.push(text_node);
                    }
                    added.push(text_node);
                }
                if added.is_empty() && removed.is_empty() {
                    None
                } else {
                    Some(MutationRecord {
                        target: node,
                        kind: MutationKind::ChildList { added, removed },
                    })
                }
            }
        };
        if let Some(record) = record {
            self.notify(vec![record]);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.tree.read().get(node).and_then(|n| {
            n.styles
                .iter()
                .find(|(p, _)| p == property)
                .map(|(_, v)| v.clone())
        })
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        {
            let mut tree = self.tree.write();
            let Some(n) = tree.get_mut(node) else {
                return;
            };
            match n.styles.iter_mut().find(|(p, _)| p == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => n.styles.push((property.to_string(), value.to_string())),
            }
        }
        self.attribute_changed(node, "style");
    }

    fn remove_style(&self, node: NodeId, property: &str) {
        let removed = {
            let mut tree = self.tree.write();
            match tree.get_mut(node) {
                Some(n) => {
                    let before = n.styles.len();
                    n.styles.retain(|(p, _)| p != property);
                    n.styles.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.attribute_changed(node, "style");
        }
    }

    fn image_loaded(&self, node: NodeId) -> bool {
        self.tree
            .read()
            .get(node)
            .is_some_and(|n| n.tag() == Some("img") && n.image_loaded)
    }

    fn observe(&self) -> MutationReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }
}

fn escape(text: &str, out: &mut String, in_attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn write_html(tree: &Tree, node: NodeId, out: &mut String) {
    let Some(n) = tree.get(node) else {
        return;
    };
    match &n.kind {
        NodeKind::Document => {
            for &child in &n.children {
                write_html(tree, child, out);
            }
        }
        NodeKind::Text(text) => escape(text, out, false),
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &n.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape(value, out, true);
                out.push('"');
            }
            if let Some(style) = n.style_attribute() {
                out.push_str(" style=\"");
                escape(&style, out, true);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for &child in &n.children {
                write_html(tree, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Fluent element construction, see [`MemoryDocument::element`].
pub struct ElementBuilder<'a> {
    document: &'a MemoryDocument,
    node: NodeId,
}

impl ElementBuilder<'_> {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.document.set_attribute(self.node, name, value);
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        self.document.set_style(self.node, property, value);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.document.set_text_content(self.node, text);
        self
    }

    /// Leave the element detached.
    pub fn build(self) -> NodeId {
        self.node
    }

    /// Append the element to `parent`.
    pub fn append_to(self, parent: NodeId) -> Result<NodeId, DomError> {
        self.document.append_child(parent, self.node)?;
        Ok(self.node)
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
