//! On-page transformation diagnostics.

use std::sync::Arc;

use chesskit_protocols::{DomError, DomPort, NodeId, TransformationStatus};
use tracing::debug;

pub const DEBUG_OVERLAY_ID: &str = "chess-kit-debug-overlay";

const CONTAINER_STYLES: [(&str, &str); 12] = [
    ("position", "fixed"),
    ("top", "10px"),
    ("left", "10px"),
    ("z-index", "999999"),
    ("background", "rgba(0, 0, 0, 0.9)"),
    ("color", "#00ff00"),
    ("padding", "12px"),
    ("border-radius", "8px"),
    ("font-family", "monospace"),
    ("font-size", "12px"),
    ("line-height", "1.5"),
    ("border", "2px solid #00ff00"),
];

fn check(flag: bool) -> &'static str {
    if flag { "\u{2705}" } else { "\u{274C}" }
}

/// Status lines shown in the panel, in order.
pub fn status_lines(status: &TransformationStatus) -> Vec<String> {
    vec![
        format!("Enabled: {}", check(status.enabled)),
        format!("Player Cards Extracted: {}", check(status.player_cards_extracted)),
        format!("CSS Injected: {}", check(status.css_injected)),
        format!("Sidebar Compacted: {}", check(status.css_injected)),
        format!("Lag Overlay: {}", check(status.lag_overlay)),
        format!("State: {}", status.state),
    ]
}

/// Fixed panel in the top-left corner. Clicking it closes it.
pub struct DebugOverlay {
    dom: Arc<dyn DomPort>,
    container: Option<NodeId>,
}

impl DebugOverlay {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self {
            dom,
            container: None,
        }
    }

    /// Render `status`, replacing any panel already shown.
    pub fn show(&mut self, status: &TransformationStatus) -> Result<(), DomError> {
        self.hide();
        let dom = &*self.dom;

        let container = dom.create_element("div");
        dom.set_attribute(container, "id", DEBUG_OVERLAY_ID);
        for (property, value) in CONTAINER_STYLES {
            dom.set_style(container, property, value);
        }

        let title = dom.create_element("div");
        dom.set_style(title, "font-weight", "bold");
        dom.set_style(title, "margin-bottom", "8px");
        dom.set_text_content(title, "Chess-Kit Debug Mode");
        dom.append_child(container, title)?;

        for line in status_lines(status) {
            let row = dom.create_element("div");
            dom.set_text_content(row, &line);
            dom.append_child(container, row)?;
        }

        let hint = dom.create_element("div");
        dom.set_style(hint, "margin-top", "8px");
        dom.set_style(hint, "font-size", "10px");
        dom.set_style(hint, "color", "#888");
        dom.set_text_content(hint, "Click to close");
        dom.append_child(container, hint)?;

        dom.append_child(dom.body(), container)?;
        self.container = Some(container);
        Ok(())
    }

    pub fn hide(&mut self) {
        for node in self.dom.query_all(&format!("#{}", DEBUG_OVERLAY_ID)) {
            self.dom.remove(node);
        }
        self.container = None;
    }

    pub fn is_visible(&self) -> bool {
        self.container.is_some_and(|node| self.dom.is_connected(node))
    }

    /// A click landed on `target`. Returns whether it closed the panel.
    pub fn click(&mut self, target: NodeId) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        if target != container && !self.dom.contains(container, target) {
            return false;
        }
        debug!("Debug overlay closed by click");
        self.hide();
        true
    }
}
