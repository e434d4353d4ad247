//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

use crate::migration::CURRENT_VERSION;

/// Feature flags persisted in extension storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessKitConfig {
    /// Shrink the sidebar and inject the companion stylesheet.
    pub compact_sidebar: bool,

    /// Move player cards and clocks above/below the sidebar.
    pub reposition_player_cards: bool,

    /// Floating lag telemetry overlay.
    pub lag_overlay: bool,

    /// On-page transformation diagnostics.
    pub debug_mode: bool,

    /// Schema version, used to trigger migrations.
    pub version: u32,
}

impl Default for ChessKitConfig {
    fn default() -> Self {
        Self {
            compact_sidebar: true,
            reposition_player_cards: true,
            lag_overlay: false,
            debug_mode: false,
            version: CURRENT_VERSION,
        }
    }
}

impl ChessKitConfig {
    /// Whether any layout feature is on.
    pub fn layout_enabled(&self) -> bool {
        self.compact_sidebar || self.reposition_player_cards
    }

    pub fn get(&self, key: FeatureKey) -> bool {
        match key {
            FeatureKey::CompactSidebar => self.compact_sidebar,
            FeatureKey::RepositionPlayerCards => self.reposition_player_cards,
            FeatureKey::LagOverlay => self.lag_overlay,
            FeatureKey::DebugMode => self.debug_mode,
        }
    }

    pub fn set(&mut self, key: FeatureKey, value: bool) {
        match key {
            FeatureKey::CompactSidebar => self.compact_sidebar = value,
            FeatureKey::RepositionPlayerCards => self.reposition_player_cards = value,
            FeatureKey::LagOverlay => self.lag_overlay = value,
            FeatureKey::DebugMode => self.debug_mode = value,
        }
    }

    /// Flip a feature. Switching a feature off also switches off every
    /// feature that depends on it.
    pub fn toggle(&mut self, key: FeatureKey) {
        let value = !self.get(key);
        self.set(key, value);

        if !value {
            for dependent in FeatureKey::ALL {
                if dependent.depends_on() == Some(key) {
                    self.set(dependent, false);
                }
            }
        }
    }
}

/// Toggleable feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    CompactSidebar,
    RepositionPlayerCards,
    LagOverlay,
    DebugMode,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 4] = [
        FeatureKey::CompactSidebar,
        FeatureKey::RepositionPlayerCards,
        FeatureKey::LagOverlay,
        FeatureKey::DebugMode,
    ];

    /// Parent feature that must be on for this one to be on.
    pub fn depends_on(&self) -> Option<FeatureKey> {
        match self {
            FeatureKey::RepositionPlayerCards => Some(FeatureKey::CompactSidebar),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeatureKey::CompactSidebar => "Compact Sidebar",
            FeatureKey::RepositionPlayerCards => "Reposition Player Cards",
            FeatureKey::LagOverlay => "Lag Telemetry",
            FeatureKey::DebugMode => "Debug Overlay",
        }
    }
}

impl std::str::FromStr for FeatureKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compactSidebar" | "compact-sidebar" => Ok(FeatureKey::CompactSidebar),
            "repositionPlayerCards" | "reposition-player-cards" => {
                Ok(FeatureKey::RepositionPlayerCards)
            }
            "lagOverlay" | "lag-overlay" => Ok(FeatureKey::LagOverlay),
            "debugMode" | "debug-mode" => Ok(FeatureKey::DebugMode),
            other => Err(format!("unknown feature: {}", other)),
        }
    }
}

/// Raw shape of whatever is on disk, across every schema version.
///
/// Every field is optional so that configs written by any earlier version
/// deserialize; [`crate::migrate`] turns this into a [`ChessKitConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    // v1/v2 flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_player_cards: Option<bool>,

    // v3 flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_sidebar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposition_player_cards: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_overlay: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}
