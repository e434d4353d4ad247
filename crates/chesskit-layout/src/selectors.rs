//! Host page contract.
//!
//! Every selector the engine relies on lives here. chess.com changing its
//! markup is the main way the engine breaks, so keep this list exhaustive.

/// Right-hand column holding move list and tabs. Destination of the cards.
pub const SIDEBAR: &str = "#board-layout-sidebar";

/// Board column.
pub const BOARD_MAIN: &str = "#board-layout-main";

pub const PLAYER_TOP: &str = "#board-layout-player-top";
pub const PLAYER_BOTTOM: &str = "#board-layout-player-bottom";

/// Player card inside a player container.
pub const PLAYER_CARD: &str = ".player-component";

/// Clock, nested inside the player card at rest.
pub const CLOCK: &str = ".clock-component";

pub const BOARD: &str = "wc-chess-board";

// Readiness signals. Alternatives are checked one by one.
pub const USERNAME: [&str; 2] = [".cc-user-username-component", ".user-username-component"];
pub const AVATAR_IMAGE: &str = ".user-avatar-component img";
pub const RATING: [&str; 2] = [".player-rating", ".user-tagline-rating"];
pub const CAPTURED_PIECES: &str = "wc-captured-pieces";

/// Marker attribute set on the sidebar while transformed.
pub const TRANSFORMED_ATTR: &str = "data-chess-kit-transformed";

/// Id of the injected companion `<style>`.
pub const STYLE_ID: &str = "chess-kit-layout-override";

// Wrapper classes, in their order inside the sidebar.
pub const CLOCK_TOP_WRAPPER: &str = "chess-kit-clock-top-wrapper";
pub const PLAYER_TOP_WRAPPER: &str = "chess-kit-player-top-wrapper";
pub const PLAYER_BOTTOM_WRAPPER: &str = "chess-kit-player-bottom-wrapper";
pub const CLOCK_BOTTOM_WRAPPER: &str = "chess-kit-clock-bottom-wrapper";

pub const RESIZE_HANDLE: &str = "chess-kit-resize-handle";

/// Selector form of a class name.
pub fn class_selector(class: &str) -> String {
    format!(".{}", class)
}
