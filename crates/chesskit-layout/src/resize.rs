//! Drag-to-resize affordance for the sidebar.

use chesskit_protocols::{DomError, DomPort, NodeId};
use tracing::debug;

use crate::selectors::RESIZE_HANDLE;

pub const MIN_WIDTH: f64 = 200.0;
pub const MAX_WIDTH: f64 = 600.0;
pub const MIN_HEIGHT: f64 = 300.0;
pub const MAX_HEIGHT: f64 = 1400.0;

/// Size assumed when the target has no inline size yet.
pub const DEFAULT_WIDTH: f64 = 280.0;
pub const DEFAULT_HEIGHT: f64 = 600.0;

pub fn clamp_size(width: f64, height: f64) -> (f64, f64) {
    (
        width.clamp(MIN_WIDTH, MAX_WIDTH),
        height.clamp(MIN_HEIGHT, MAX_HEIGHT),
    )
}

fn parse_px(value: Option<String>) -> Option<f64> {
    value?.trim().strip_suffix("px")?.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragStart {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Handle element in the bottom-right corner of the target, plus the drag
/// state machine driven by pointer events.
#[derive(Debug)]
pub struct ResizeHandle {
    handle: NodeId,
    target: NodeId,
    drag: Option<DragStart>,
}

impl ResizeHandle {
    /// Create the handle element inside `target`.
    pub fn attach(dom: &dyn DomPort, target: NodeId) -> Result<Self, DomError> {
        let handle = dom.create_element("div");
        dom.set_attribute(handle, "class", RESIZE_HANDLE);
        dom.set_attribute(handle, "title", "Drag to resize");
        dom.append_child(target, handle)?;
        Ok(Self {
            handle,
            target,
            drag: None,
        })
    }

    pub fn node(&self) -> NodeId {
        self.handle
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start a drag at pointer position (`x`, `y`).
    pub fn pointer_down(&mut self, dom: &dyn DomPort, x: f64, y: f64) {
        let width = parse_px(dom.style(self.target, "width")).unwrap_or(DEFAULT_WIDTH);
        let height = parse_px(dom.style(self.target, "height")).unwrap_or(DEFAULT_HEIGHT);
        self.drag = Some(DragStart {
            x,
            y,
            width,
            height,
        });
        dom.set_style(self.handle, "cursor", "grabbing");
    }

    /// Resize by the pointer delta since `pointer_down`. Returns the applied
    /// (clamped) size, or `None` when no drag is in progress.
    pub fn pointer_move(&mut self, dom: &dyn DomPort, x: f64, y: f64) -> Option<(f64, f64)> {
        let start = self.drag?;
        let (width, height) = clamp_size(start.width + (x - start.x), start.height + (y - start.y));
        dom.set_style(self.target, "width", &format!("{}px", width.round()));
        dom.set_style(self.target, "height", &format!("{}px", height.round()));
        Some((width, height))
    }

    /// End the drag. Returns whether one was in progress.
    pub fn pointer_up(&mut self, dom: &dyn DomPort) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        dom.remove_style(self.handle, "cursor");
        debug!(
            width = ?dom.style(self.target, "width"),
            height = ?dom.style(self.target, "height"),
            "Resize finished"
        );
        true
    }

    /// Remove the handle element.
    pub fn detach(self, dom: &dyn DomPort) {
        dom.remove(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chesskit_dom::MemoryDocument;

    fn sidebar(doc: &MemoryDocument) -> NodeId {
        doc.element("div")
            .id("board-layout-sidebar")
            .append_to(doc.body())
            .unwrap()
    }

    #[test]
    fn test_clamp_size() {
        assert_eq!(clamp_size(100.0, 100.0), (MIN_WIDTH, MIN_HEIGHT));
        assert_eq!(clamp_size(1000.0, 5000.0), (MAX_WIDTH, MAX_HEIGHT));
        assert_eq!(clamp_size(350.0, 700.0), (350.0, 700.0));
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px(Some("300px".to_string())), Some(300.0));
        assert_eq!(parse_px(Some(" 12.5px ".to_string())), Some(12.5));
        assert_eq!(parse_px(Some("50%".to_string())), None);
        assert_eq!(parse_px(None), None);
    }

    #[test]
    fn test_drag_resizes_target() {
        let doc = MemoryDocument::new();
        let target = sidebar(&doc);
        let mut handle = ResizeHandle::attach(&doc, target).unwrap();
        assert_eq!(doc.parent(handle.node()), Some(target));

        handle.pointer_down(&doc, 100.0, 100.0);
        assert!(handle.is_dragging());
        assert_eq!(handle.pointer_move(&doc, 140.0, 50.0), Some((320.0, 550.0)));
        assert_eq!(doc.style(target, "width").as_deref(), Some("320px"));
        assert_eq!(doc.style(target, "height").as_deref(), Some("550px"));
        assert!(handle.pointer_up(&doc));
        assert!(!handle.pointer_up(&doc));
    }

    #[test]
    fn test_drag_is_clamped() {
        let doc = MemoryDocument::new();
        let target = sidebar(&doc);
        doc.set_style(target, "width", "300px");
        doc.set_style(target, "height", "800px");
        let mut handle = ResizeHandle::attach(&doc, target).unwrap();

        handle.pointer_down(&doc, 0.0, 0.0);
        assert_eq!(
            handle.pointer_move(&doc, -500.0, 2000.0),
            Some((MIN_WIDTH, MAX_HEIGHT))
        );
        assert_eq!(doc.style(target, "width").as_deref(), Some("200px"));
        assert_eq!(doc.style(target, "height").as_deref(), Some("1400px"));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let doc = MemoryDocument::new();
        let target = sidebar(&doc);
        let mut handle = ResizeHandle::attach(&doc, target).unwrap();
        assert_eq!(handle.pointer_move(&doc, 10.0, 10.0), None);
        assert_eq!(doc.style(target, "width"), None);
    }

    #[test]
    fn test_detach_removes_handle() {
        let doc = MemoryDocument::new();
        let target = sidebar(&doc);
        let handle = ResizeHandle::attach(&doc, target).unwrap();
        let node = handle.node();
        handle.detach(&doc);
        assert!(!doc.is_connected(node));
    }
}
