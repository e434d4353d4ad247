//! # Chesskit Layout
//!
//! Reshapes the chess.com game page: the player cards and clocks are moved
//! out of the board column and stacked above and below a compacted sidebar,
//! and put back exactly where they were on revert.
//!
//! ## Components
//!
//! - [`ledger`]: remembers where a node lived before it was moved
//! - [`readiness`]: quorum-based detection of populated player cards
//! - [`LayoutEngine`]: apply / revert, companion styles, resize handle
//! - [`MutationWatchdog`]: re-applies after the host page resets the layout
//! - [`NavigationMonitor`]: client-side navigation detection
//! - [`TransformationOrchestrator`]: sequences all of the above per page

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod navigation;
pub mod orchestrator;
pub mod readiness;
pub mod resize;
pub mod selectors;
pub mod styles;
pub mod watchdog;

pub use config::LayoutConfig;
pub use engine::{ApplyOutcome, LayoutEngine};
pub use error::LayoutError;
pub use ledger::{ElementRestoreData, RestoreOutcome};
pub use navigation::{is_game_page, NavigationCallback, NavigationMonitor};
pub use orchestrator::{OrchestratorState, TransformationOrchestrator};
pub use readiness::DataSignals;
pub use resize::ResizeHandle;
pub use watchdog::MutationWatchdog;
