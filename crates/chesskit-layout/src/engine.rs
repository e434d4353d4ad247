//! Layout transform engine.
//!
//! Moves the four live subtrees (top clock, top card, bottom card, bottom
//! clock) into wrapper elements inside the sidebar and puts them back on
//! revert. Nodes are moved, never cloned, so the host's listeners, timers and
//! custom-element state survive the trip.
//!
//! The sidebar carries [`TRANSFORMED_ATTR`] while transformed. It is set
//! before any child is moved: the watchdog keys off that marker and would
//! otherwise re-enter `apply` on the first mutation caused by this one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chesskit_protocols::{DomPort, FrameClock, NodeId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::ledger::{self, ElementRestoreData, RestoreOutcome};
use crate::readiness::wait_for_readiness;
use crate::resize::ResizeHandle;
use crate::selectors::{
    CLOCK, CLOCK_BOTTOM_WRAPPER, CLOCK_TOP_WRAPPER, PLAYER_BOTTOM, PLAYER_BOTTOM_WRAPPER,
    PLAYER_CARD, PLAYER_TOP, PLAYER_TOP_WRAPPER, SIDEBAR, TRANSFORMED_ATTR,
};
use crate::styles;

/// Result of a successful `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Cards and clocks were moved.
    Applied,
    /// The marker was already present; nothing done.
    AlreadyTransformed,
    /// Another apply is suspended waiting for data; nothing done.
    InFlight,
    /// Card repositioning is off; only the stylesheet was (re)injected.
    StylesOnly,
}

/// Host elements the transform needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub sidebar: NodeId,
    pub player_top: NodeId,
    pub player_bottom: NodeId,
}

#[derive(Debug)]
struct Wrappers {
    clock_top: NodeId,
    player_top: NodeId,
    player_bottom: NodeId,
    clock_bottom: NodeId,
}

impl Wrappers {
    fn all(&self) -> [NodeId; 4] {
        [
            self.clock_top,
            self.player_top,
            self.player_bottom,
            self.clock_bottom,
        ]
    }
}

/// Everything needed to undo an applied transform. Only ever stored whole.
#[derive(Debug)]
struct TransformationState {
    clock_top: ElementRestoreData,
    clock_bottom: ElementRestoreData,
    player_top: ElementRestoreData,
    player_bottom: ElementRestoreData,
    wrappers: Wrappers,
    destination: NodeId,
    /// Source containers hidden after being emptied, with their previous
    /// inline `display`.
    hidden: Vec<(NodeId, Option<String>)>,
    /// Destination inline `width`/`height` before any resize.
    original_size: (Option<String>, Option<String>),
    resize: ResizeHandle,
}

/// Owns the one live [`TransformationState`] of a page.
pub struct LayoutEngine {
    dom: Arc<dyn DomPort>,
    frames: Arc<dyn FrameClock>,
    state: Mutex<Option<TransformationState>>,
    in_flight: AtomicBool,
    /// Bumped by every `revert`; an apply begun under an older epoch is void.
    epoch: AtomicU64,
}

/// Undoes the marker (and freshly injected styles) unless committed, and
/// releases the in-flight flag. Covers early returns and a dropped `apply`
/// future alike. A guard outlived by a `revert` does nothing: the revert
/// already cleaned up and a newer apply may own the page.
struct ApplyGuard<'a> {
    engine: &'a LayoutEngine,
    epoch: u64,
    anchors: Anchors,
    marked: bool,
    injected_styles: bool,
    committed: bool,
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        if self.engine.epoch.load(Ordering::SeqCst) != self.epoch {
            return;
        }
        if !self.committed {
            let dom = &*self.engine.dom;
            if self.marked {
                dom.remove_attribute(self.anchors.sidebar, TRANSFORMED_ATTR);
            }
            if self.injected_styles {
                styles::remove(dom);
            }
        }
        self.engine.in_flight.store(false, Ordering::SeqCst);
    }
}

enum Begin<'a> {
    Proceed(ApplyGuard<'a>),
    Done(ApplyOutcome),
}

impl LayoutEngine {
    pub fn new(dom: Arc<dyn DomPort>, frames: Arc<dyn FrameClock>) -> Self {
        Self {
            dom,
            frames,
            state: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn dom(&self) -> &Arc<dyn DomPort> {
        &self.dom
    }

    /// Locate sidebar and both player containers.
    pub fn locate(&self) -> Result<Anchors, LayoutError> {
        let find = |selector: &str| {
            self.dom.query(selector).ok_or_else(|| {
                warn!(selector, "Cannot find required element");
                LayoutError::missing(selector)
            })
        };
        Ok(Anchors {
            sidebar: find(SIDEBAR)?,
            player_top: find(PLAYER_TOP)?,
            player_bottom: find(PLAYER_BOTTOM)?,
        })
    }

    /// Whether sidebar and both player containers exist. Unlike
    /// [`locate`](Self::locate) this does not log.
    pub fn structure_present(&self) -> bool {
        [SIDEBAR, PLAYER_TOP, PLAYER_BOTTOM]
            .iter()
            .all(|selector| self.dom.query(selector).is_some())
    }

    /// Transform the page, waiting for both player cards to be populated
    /// first.
    pub async fn apply(&self, config: &LayoutConfig) -> Result<ApplyOutcome, LayoutError> {
        let mut guard = match self.begin(config)? {
            Begin::Proceed(guard) => guard,
            Begin::Done(outcome) => return Ok(outcome),
        };

        let dom = &*self.dom;
        let frames = &*self.frames;
        let anchors = guard.anchors;
        let (top, bottom) = futures::join!(
            wait_for_readiness(
                dom,
                frames,
                anchors.player_top,
                config.min_signals,
                config.readiness_timeout
            ),
            wait_for_readiness(
                dom,
                frames,
                anchors.player_bottom,
                config.min_signals,
                config.readiness_timeout
            ),
        );
        debug!(top = top.count(), bottom = bottom.count(), "Readiness resolved");

        if self.epoch.load(Ordering::SeqCst) != guard.epoch {
            debug!("Reverted while waiting for data");
            return Err(LayoutError::Superseded);
        }

        for (node, selector) in [
            (anchors.sidebar, SIDEBAR),
            (anchors.player_top, PLAYER_TOP),
            (anchors.player_bottom, PLAYER_BOTTOM),
        ] {
            if !self.dom.is_connected(node) {
                warn!(selector, "Element detached while waiting for data");
                return Err(LayoutError::detached(selector));
            }
        }

        self.finish(&mut guard)
    }

    /// Transform the page without waiting for data; for callers that already
    /// waited.
    pub fn apply_prepared(&self, config: &LayoutConfig) -> Result<ApplyOutcome, LayoutError> {
        let mut guard = match self.begin(config)? {
            Begin::Proceed(guard) => guard,
            Begin::Done(outcome) => return Ok(outcome),
        };
        self.finish(&mut guard)
    }

    /// Everything `begin` and `finish` do to the page happens under the state
    /// lock with the epoch re-checked, so a concurrent `revert` either sees
    /// the stored state or voids the apply.
    fn begin(&self, config: &LayoutConfig) -> Result<Begin<'_>, LayoutError> {
        let anchors = self.locate()?;

        if self.dom.has_attribute(anchors.sidebar, TRANSFORMED_ATTR) {
            debug!("Layout already transformed");
            return Ok(Begin::Done(ApplyOutcome::AlreadyTransformed));
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Apply already in flight");
            return Ok(Begin::Done(ApplyOutcome::InFlight));
        }

        let mut guard = ApplyGuard {
            engine: self,
            epoch: self.epoch.load(Ordering::SeqCst),
            anchors,
            marked: false,
            injected_styles: false,
            committed: false,
        };

        let mut state = self.state.lock();
        if self.epoch.load(Ordering::SeqCst) != guard.epoch {
            debug!("Reverted before apply started");
            return Err(LayoutError::Superseded);
        }
        if let Some(stale) = state.take() {
            self.release_stale_state(stale);
        }

        if config.compact_sidebar {
            styles::inject(&*self.dom)?;
            guard.injected_styles = true;
        }

        if !config.reposition_player_cards {
            guard.committed = true;
            debug!("Player card repositioning disabled, styles only");
            return Ok(Begin::Done(ApplyOutcome::StylesOnly));
        }

        self.dom.set_attribute(anchors.sidebar, TRANSFORMED_ATTR, "true");
        guard.marked = true;
        Ok(Begin::Proceed(guard))
    }

    fn finish(&self, guard: &mut ApplyGuard<'_>) -> Result<ApplyOutcome, LayoutError> {
        let mut state = self.state.lock();
        if self.epoch.load(Ordering::SeqCst) != guard.epoch {
            debug!("Reverted before relocation");
            return Err(LayoutError::Superseded);
        }
        *state = Some(self.relocate(guard.anchors)?);
        guard.committed = true;
        info!("Player cards and clocks relocated");
        Ok(ApplyOutcome::Applied)
    }

    /// Move the four subtrees. On any failure every move made so far is
    /// undone and the wrappers are removed.
    fn relocate(&self, anchors: Anchors) -> Result<TransformationState, LayoutError> {
        let dom = &*self.dom;
        let find = |scope: NodeId, selector: &str, what: &str| {
            dom.query_within(scope, selector).ok_or_else(|| {
                warn!(selector, what, "Cannot find element to relocate");
                LayoutError::missing(selector)
            })
        };

        let player_top = find(anchors.player_top, PLAYER_CARD, "top player card")?;
        let player_bottom = find(anchors.player_bottom, PLAYER_CARD, "bottom player card")?;
        let clock_top = find(anchors.player_top, CLOCK, "top clock")?;
        let clock_bottom = find(anchors.player_bottom, CLOCK, "bottom clock")?;

        let wrappers = self.insert_wrappers(anchors.sidebar)?;

        let plan = [
            (clock_top, wrappers.clock_top, CLOCK),
            (clock_bottom, wrappers.clock_bottom, CLOCK),
            (player_top, wrappers.player_top, PLAYER_CARD),
            (player_bottom, wrappers.player_bottom, PLAYER_CARD),
        ];
        let mut moved: Vec<ElementRestoreData> = Vec::with_capacity(plan.len());
        for (element, wrapper, selector) in plan {
            let result = match ledger::capture(dom, element) {
                Some(data) => dom
                    .append_child(wrapper, element)
                    .map(|()| data)
                    .map_err(LayoutError::from),
                None => Err(LayoutError::detached(selector)),
            };
            match result {
                Ok(data) => moved.push(data),
                Err(e) => {
                    warn!(%element, error = %e, "Relocation failed, rolling back");
                    self.rollback(moved, &wrappers);
                    return Err(e);
                }
            }
        }

        let [clock_top, clock_bottom, player_top, player_bottom] =
            match <[ElementRestoreData; 4]>::try_from(moved) {
                Ok(records) => records,
                Err(partial) => {
                    self.rollback(partial, &wrappers);
                    return Err(LayoutError::missing(PLAYER_CARD));
                }
            };

        let mut hidden = Vec::new();
        for container in [anchors.player_top, anchors.player_bottom] {
            if dom.children(container).is_empty() {
                hidden.push((container, dom.style(container, "display")));
                dom.set_style(container, "display", "none");
            }
        }

        let original_size = (
            dom.style(anchors.sidebar, "width"),
            dom.style(anchors.sidebar, "height"),
        );
        let resize = match ResizeHandle::attach(dom, anchors.sidebar) {
            Ok(handle) => handle,
            Err(e) => {
                let records = vec![clock_top, clock_bottom, player_top, player_bottom];
                self.unhide(&hidden);
                self.rollback(records, &wrappers);
                return Err(e.into());
            }
        };

        Ok(TransformationState {
            clock_top,
            clock_bottom,
            player_top,
            player_bottom,
            wrappers,
            destination: anchors.sidebar,
            hidden,
            original_size,
            resize,
        })
    }

    /// Create the four wrappers in their final sidebar order:
    /// clock-top, player-top, existing content, player-bottom, clock-bottom.
    fn insert_wrappers(&self, sidebar: NodeId) -> Result<Wrappers, LayoutError> {
        let dom = &*self.dom;
        let make = |class: &str| {
            let node = dom.create_element("div");
            dom.set_attribute(node, "class", class);
            node
        };
        let wrappers = Wrappers {
            clock_top: make(CLOCK_TOP_WRAPPER),
            player_top: make(PLAYER_TOP_WRAPPER),
            player_bottom: make(PLAYER_BOTTOM_WRAPPER),
            clock_bottom: make(CLOCK_BOTTOM_WRAPPER),
        };

        let first = dom.children(sidebar).first().copied();
        let inserted = dom
            .insert_before(sidebar, wrappers.clock_top, first)
            .and_then(|()| dom.insert_before(sidebar, wrappers.player_top, first))
            .and_then(|()| dom.append_child(sidebar, wrappers.player_bottom))
            .and_then(|()| dom.append_child(sidebar, wrappers.clock_bottom));
        if let Err(e) = inserted {
            self.remove_wrappers(&wrappers);
            return Err(e.into());
        }
        Ok(wrappers)
    }

    fn rollback(&self, moved: Vec<ElementRestoreData>, wrappers: &Wrappers) {
        for data in moved.into_iter().rev() {
            ledger::restore(&*self.dom, data);
        }
        self.remove_wrappers(wrappers);
    }

    fn remove_wrappers(&self, wrappers: &Wrappers) {
        for wrapper in wrappers.all() {
            self.dom.remove(wrapper);
        }
    }

    fn unhide(&self, hidden: &[(NodeId, Option<String>)]) {
        for (container, display) in hidden {
            match display {
                Some(value) => self.dom.set_style(*container, "display", value),
                None => self.dom.remove_style(*container, "display"),
            }
        }
    }

    /// Unwind state left behind when the marker vanished under us.
    ///
    /// Nodes still in the document go back to their containers, clocks
    /// first. A node is left where it is when it went away with a replaced
    /// sidebar, when its container is gone, or when the host already
    /// rendered a replacement into that container. Those copies are no
    /// longer the host's, so the wrappers holding them are removed too.
    fn release_stale_state(&self, stale: TransformationState) {
        let dom = &*self.dom;
        let TransformationState {
            clock_top,
            clock_bottom,
            player_top,
            player_bottom,
            wrappers,
            destination,
            hidden,
            original_size,
            resize,
        } = stale;
        warn!("Releasing stale transformation state after host re-render");

        for (data, selector) in [
            (clock_top, CLOCK),
            (clock_bottom, CLOCK),
            (player_top, PLAYER_CARD),
            (player_bottom, PLAYER_CARD),
        ] {
            let element = data.element;
            if !dom.is_connected(element) {
                debug!(%element, "Stale element left the document with its wrapper");
                continue;
            }
            if dom.query_within(data.original_parent, selector).is_some() {
                debug!(%element, selector, "Host rendered a replacement, not restoring");
                continue;
            }
            let outcome = ledger::restore(dom, data);
            if outcome != RestoreOutcome::Restored {
                warn!(%element, ?outcome, "Stale element not restored to its exact position");
            }
        }

        for wrapper in wrappers.all() {
            if !dom.children(wrapper).is_empty() {
                debug!(%wrapper, "Dropping wrapper holding superseded host content");
            }
            dom.remove(wrapper);
        }

        let still_there: Vec<_> = hidden
            .into_iter()
            .filter(|(container, _)| dom.is_connected(*container))
            .collect();
        self.unhide(&still_there);

        resize.detach(dom);
        if dom.is_connected(destination) {
            self.restore_size(destination, original_size);
        }
    }

    fn restore_size(&self, destination: NodeId, (width, height): (Option<String>, Option<String>)) {
        let dom = &*self.dom;
        match width {
            Some(width) => dom.set_style(destination, "width", &width),
            None => dom.remove_style(destination, "width"),
        }
        match height {
            Some(height) => dom.set_style(destination, "height", &height),
            None => dom.remove_style(destination, "height"),
        }
    }

    /// Undo the transform. Safe to call at any time, any number of times.
    /// Returns whether a transform was actually reverted.
    pub fn revert(&self) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
        let state = self.state.lock().take();
        let dom = &*self.dom;

        let reverted = match state {
            Some(state) => {
                let TransformationState {
                    clock_top,
                    clock_bottom,
                    player_top,
                    player_bottom,
                    wrappers,
                    destination,
                    hidden,
                    original_size,
                    resize,
                } = state;

                // Clocks first: they go back inside the cards, which are
                // still in their wrappers at this point.
                for data in [clock_top, clock_bottom, player_top, player_bottom] {
                    let element = data.element;
                    let outcome = ledger::restore(dom, data);
                    if outcome != RestoreOutcome::Restored {
                        warn!(%element, ?outcome, "Element not restored to its exact position");
                    }
                }

                for wrapper in wrappers.all() {
                    if dom.children(wrapper).is_empty() {
                        dom.remove(wrapper);
                    } else {
                        warn!(%wrapper, "Wrapper not empty after restore, leaving it");
                    }
                }

                self.unhide(&hidden);

                resize.detach(dom);
                self.restore_size(destination, original_size);
                dom.remove_attribute(destination, TRANSFORMED_ATTR);
                true
            }
            None => false,
        };

        if let Some(sidebar) = dom.query(SIDEBAR) {
            dom.remove_attribute(sidebar, TRANSFORMED_ATTR);
        }
        let had_styles = styles::remove(dom);

        if reverted || had_styles {
            info!(reverted, "Layout transformation removed");
        }
        reverted
    }

    /// Whether a transform is applied and its marker is still in place.
    pub fn is_transformed(&self) -> bool {
        self.state.lock().is_some() && self.marker_present()
    }

    /// Whether the sidebar carries the transformed marker.
    pub fn marker_present(&self) -> bool {
        self.dom
            .query(SIDEBAR)
            .is_some_and(|sidebar| self.dom.has_attribute(sidebar, TRANSFORMED_ATTR))
    }

    /// Whether any player card sits in its original container.
    pub fn cards_in_original_location(&self) -> bool {
        [PLAYER_TOP, PLAYER_BOTTOM].iter().any(|selector| {
            self.dom
                .query(selector)
                .and_then(|container| self.dom.query_within(container, PLAYER_CARD))
                .is_some()
        })
    }

    pub fn styles_injected(&self) -> bool {
        styles::is_injected(&*self.dom)
    }

    /// Forward a pointer-down on the resize handle.
    pub fn resize_pointer_down(&self, x: f64, y: f64) -> bool {
        let mut state = self.state.lock();
        match state.as_mut() {
            Some(state) => {
                state.resize.pointer_down(&*self.dom, x, y);
                true
            }
            None => false,
        }
    }

    pub fn resize_pointer_move(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let mut state = self.state.lock();
        state
            .as_mut()
            .and_then(|state| state.resize.pointer_move(&*self.dom, x, y))
    }

    pub fn resize_pointer_up(&self) -> bool {
        let mut state = self.state.lock();
        state
            .as_mut()
            .is_some_and(|state| state.resize.pointer_up(&*self.dom))
    }

    /// Node of the resize handle while transformed.
    pub fn resize_handle(&self) -> Option<NodeId> {
        self.state.lock().as_ref().map(|state| state.resize.node())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
