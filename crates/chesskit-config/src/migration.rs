//! Forward-only configuration migrations.
//!
//! Version history:
//! - v1/v2: `enabled`, `extractPlayerCards`, `debugMode`
//! - v3: `compactSidebar`, `repositionPlayerCards`, `lagOverlay`, `debugMode`
//!
//! A v3 flag takes its own stored value if present, else the value of the
//! legacy flag it replaced, else the default.

use crate::schema::{ChessKitConfig, StoredConfig};

pub const CURRENT_VERSION: u32 = 3;

/// Whether the stored config must be rewritten.
pub fn needs_migration(stored: Option<&StoredConfig>) -> bool {
    stored.is_none_or(|s| s.version != Some(CURRENT_VERSION))
}

/// Build a current config from whatever was stored (or nothing).
pub fn migrate(stored: Option<&StoredConfig>) -> ChessKitConfig {
    let defaults = ChessKitConfig::default();
    let Some(stored) = stored else {
        return defaults;
    };

    ChessKitConfig {
        compact_sidebar: stored
            .compact_sidebar
            .or(stored.enabled)
            .unwrap_or(defaults.compact_sidebar),
        reposition_player_cards: stored
            .reposition_player_cards
            .or(stored.extract_player_cards)
            .unwrap_or(defaults.reposition_player_cards),
        lag_overlay: stored.lag_overlay.unwrap_or(defaults.lag_overlay),
        debug_mode: stored.debug_mode.unwrap_or(defaults.debug_mode),
        version: CURRENT_VERSION,
    }
}
