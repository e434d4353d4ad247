//! Layout errors.

use chesskit_protocols::DomError;
use thiserror::Error;

/// Why an apply was aborted. The page is left untouched in every case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Required element not found: {selector}")]
    MissingAnchor { selector: String },

    #[error("Element was detached from the document: {selector}")]
    DetachedAnchor { selector: String },

    #[error("Apply superseded by a revert")]
    Superseded,

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

impl LayoutError {
    pub fn missing(selector: &str) -> Self {
        Self::MissingAnchor {
            selector: selector.to_string(),
        }
    }

    pub fn detached(selector: &str) -> Self {
        Self::DetachedAnchor {
            selector: selector.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chesskit_protocols::NodeId;

    #[test]
    fn test_missing_anchor_display() {
        let err = LayoutError::missing("#board-layout-sidebar");
        assert_eq!(
            err.to_string(),
            "Required element not found: #board-layout-sidebar"
        );
    }

    #[test]
    fn test_dom_error_from() {
        let err = LayoutError::from(DomError::NodeNotFound(NodeId(3)));
        assert!(err.to_string().contains("node#3"));
    }
}
