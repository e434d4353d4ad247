//! Companion stylesheet.

use chesskit_protocols::{DomError, DomPort, NodeId};

use crate::selectors::STYLE_ID;

/// Rules that compact the sidebar and lay out the relocated cards.
pub const COMPANION_CSS: &str = r#"
#board-layout-sidebar {
  --sidebarMinWidth: 250px !important;
  --sidebarMaxWidth: 280px !important;
  max-width: 280px !important;
  display: flex !important;
  flex-direction: column !important;
  position: relative;
}

.chess-kit-clock-top-wrapper,
.chess-kit-clock-bottom-wrapper {
  display: flex;
  justify-content: flex-end;
}

.chess-kit-clock-top-wrapper { margin-bottom: 4px; }
.chess-kit-player-top-wrapper { margin-bottom: 8px; }
.chess-kit-player-bottom-wrapper { margin-top: 8px; }
.chess-kit-clock-bottom-wrapper { margin-top: 4px; }

#board-layout-sidebar .player-component {
  position: relative !important;
  left: auto !important;
  top: auto !important;
  right: auto !important;
  bottom: auto !important;
  width: 100% !important;
  max-width: none !important;
  margin: 0 !important;
}

#board-layout-sidebar .tabs-component {
  flex-shrink: 0;
}

#board-layout-sidebar .sidebar-content {
  flex: 1;
  min-height: 0;
  overflow-y: auto;
}

.chess-kit-resize-handle {
  position: absolute;
  right: 0;
  bottom: 0;
  width: 12px;
  height: 12px;
  cursor: nwse-resize;
}
"#;

/// Insert the stylesheet into `<head>`, replacing a previous copy.
pub fn inject(dom: &dyn DomPort) -> Result<NodeId, DomError> {
    remove(dom);
    let style = dom.create_element("style");
    dom.set_attribute(style, "id", STYLE_ID);
    dom.set_text_content(style, COMPANION_CSS);
    dom.append_child(dom.head(), style)?;
    Ok(style)
}

/// Remove the stylesheet. Returns whether one was present.
pub fn remove(dom: &dyn DomPort) -> bool {
    let selector = format!("#{}", STYLE_ID);
    let existing = dom.query_all(&selector);
    for node in &existing {
        dom.remove(*node);
    }
    !existing.is_empty()
}

pub fn is_injected(dom: &dyn DomPort) -> bool {
    dom.query(&format!("#{}", STYLE_ID)).is_some()
}
