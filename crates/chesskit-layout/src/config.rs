//! Engine configuration.

use std::time::Duration;

use chesskit_config::{ChessKitConfig, LayoutSettings};

use crate::readiness::{DEFAULT_MIN_SIGNALS, DEFAULT_READINESS_TIMEOUT};

/// What the engine should do on apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Inject the companion stylesheet.
    pub compact_sidebar: bool,
    /// Move cards and clocks into the sidebar.
    pub reposition_player_cards: bool,
    /// Readiness quorum.
    pub min_signals: usize,
    pub readiness_timeout: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            compact_sidebar: true,
            reposition_player_cards: true,
            min_signals: DEFAULT_MIN_SIGNALS,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
        }
    }
}

impl LayoutConfig {
    pub fn from_config(config: &ChessKitConfig) -> Self {
        Self {
            compact_sidebar: config.compact_sidebar,
            reposition_player_cards: config.reposition_player_cards,
            ..Self::default()
        }
    }

    pub fn with_settings(mut self, settings: &LayoutSettings) -> Self {
        self.min_signals = settings.min_signals;
        self.readiness_timeout = settings.readiness_timeout();
        self
    }

    /// Whether there is anything to apply at all.
    pub fn enabled(&self) -> bool {
        self.compact_sidebar || self.reposition_player_cards
    }
}
