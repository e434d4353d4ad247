//! Element position ledger.
//!
//! [`capture`] records where a node lives right before it is moved;
//! [`restore`] consumes that record and puts the node back. A record can be
//! used once only.

use chesskit_protocols::{DomPort, NodeId};
use tracing::{debug, warn};

/// Original position of a relocated node.
#[derive(Debug, PartialEq, Eq)]
pub struct ElementRestoreData {
    pub element: NodeId,
    pub original_parent: NodeId,
    /// Sibling that followed the element, `None` if it was the last child.
    pub next_sibling: Option<NodeId>,
}

/// Result of [`restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Back at the exact recorded position.
    Restored,
    /// The recorded sibling had moved away; appended as last child instead.
    Appended,
    /// The original parent left the document. Nothing was done.
    ParentDetached,
    /// The DOM refused the insertion. Nothing was done.
    Rejected,
}

/// Record the current position of `element`. `None` if it has no parent.
pub fn capture(dom: &dyn DomPort, element: NodeId) -> Option<ElementRestoreData> {
    let original_parent = dom.parent(element)?;
    Some(ElementRestoreData {
        element,
        original_parent,
        next_sibling: dom.next_sibling(element),
    })
}

/// Put a captured element back. Never fails; degraded cases are reported
/// through the outcome.
pub fn restore(dom: &dyn DomPort, data: ElementRestoreData) -> RestoreOutcome {
    let ElementRestoreData {
        element,
        original_parent,
        next_sibling,
    } = data;

    if !dom.is_connected(original_parent) {
        warn!(%element, parent = %original_parent, "Original parent is gone, leaving element in place");
        return RestoreOutcome::ParentDetached;
    }

    let (reference, outcome) = match next_sibling {
        Some(sibling) if sibling != element && dom.parent(sibling) == Some(original_parent) => {
            (Some(sibling), RestoreOutcome::Restored)
        }
        Some(sibling) => {
            debug!(%element, %sibling, "Recorded sibling moved, appending instead");
            (None, RestoreOutcome::Appended)
        }
        None => (None, RestoreOutcome::Restored),
    };

    match dom.insert_before(original_parent, element, reference) {
        Ok(()) => outcome,
        Err(e) => {
            warn!(%element, error = %e, "Could not restore element");
            RestoreOutcome::Rejected
        }
    }
}
