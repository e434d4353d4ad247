//! Document errors.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Reference {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },
}
