//! # Chesskit Runtime
//!
//! The extension's two long-lived contexts:
//!
//! - [`Background`]: creates or migrates the stored configuration on
//!   install, update and startup.
//! - [`ContentScript`]: runs in the game page, applies the configuration and
//!   answers [`ExtensionMessage`]s.
//!
//! [`ExtensionMessage`]: chesskit_protocols::ExtensionMessage

pub mod background;
pub mod content_script;
pub mod debug_overlay;
pub mod error;

pub use background::{Background, InstallReason};
pub use content_script::ContentScript;
pub use debug_overlay::{DebugOverlay, DEBUG_OVERLAY_ID};
pub use error::RuntimeError;
