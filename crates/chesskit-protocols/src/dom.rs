//! Document port.
//!
//! Every piece of code that reads or mutates the host page goes through
//! [`DomPort`]. Nodes are addressed by [`NodeId`] handles; moving a node keeps
//! its handle, which is how live relocation is expressed: the same node (with
//! its listeners, timers and custom element state) changes parent, nothing is
//! cloned.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::DomError;

/// Handle to a node owned by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of structural or attribute change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationKind {
    /// Children were added to or removed from `target`.
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute of `target` changed.
    Attributes { name: String },
    /// Text content of `target` changed.
    CharacterData,
}

/// A single observed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Node the mutation happened on.
    pub target: NodeId,
    /// What changed.
    pub kind: MutationKind,
}

impl MutationRecord {
    /// Whether this is a childList mutation.
    pub fn is_child_list(&self) -> bool {
        matches!(self.kind, MutationKind::ChildList { .. })
    }
}

/// Receiving half of a mutation subscription.
///
/// Dropping the receiver ends the subscription.
pub type MutationReceiver = mpsc::UnboundedReceiver<MutationRecord>;

/// Access to the host page document.
///
/// Implementations use interior mutability; all methods take `&self` so a
/// single document can be shared behind an `Arc` by the layout engine, the
/// watchdog and the telemetry overlay.
pub trait DomPort: Send + Sync {
    /// The `<head>` element.
    fn head(&self) -> NodeId;

    /// The `<body>` element.
    fn body(&self) -> NodeId;

    /// First element in document order matching `selector`.
    fn query(&self, selector: &str) -> Option<NodeId>;

    /// Every element in document order matching `selector`.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// First descendant of `scope` (excluding `scope`) matching `selector`.
    fn query_within(&self, scope: NodeId, selector: &str) -> Option<NodeId>;

    /// Parent node, if attached to one.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child nodes in order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Sibling immediately after `node`.
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Sibling immediately before `node`.
    fn previous_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is part of the live document tree.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Insert `node` into `parent` before `reference` (append when `None`).
    ///
    /// If `node` is already attached somewhere it is moved, not copied.
    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError>;

    /// Append `node` as the last child of `parent`.
    fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Detach `node` from its parent. No-op when already detached.
    fn remove(&self, node: NodeId);

    /// Attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Set an attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute. No-op when absent.
    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Whether the attribute is present.
    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Whether the element carries `class` in its class list.
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Replace all children with a single text node.
    fn set_text_content(&self, node: NodeId, text: &str);

    /// Inline style property value.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    /// Set an inline style property.
    fn set_style(&self, node: NodeId, property: &str, value: &str);

    /// Remove an inline style property.
    fn remove_style(&self, node: NodeId, property: &str);

    /// Whether `node` is an image that finished loading with a non-zero size.
    fn image_loaded(&self, node: NodeId) -> bool;

    /// Subscribe to mutations of the whole document.
    fn observe(&self) -> MutationReceiver;
}
