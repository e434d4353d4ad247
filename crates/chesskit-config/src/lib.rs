//! # Chesskit Config
//!
//! Configuration management for chesskit:
//!
//! - [`ChessKitConfig`]: the feature flags persisted in extension storage,
//!   with forward-only version migrations.
//! - [`ConfigRepository`]: read → transform → write access to a [`ConfigStore`].
//! - [`RuntimeSettings`]: timing and threshold knobs loaded from TOML.
//!
//! [`ConfigStore`]: chesskit_protocols::ConfigStore

mod error;
mod loader;
mod migration;
mod repository;
mod schema;
mod settings;
mod store;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use migration::{migrate, needs_migration, CURRENT_VERSION};
pub use repository::{ConfigRepository, CONFIG_KEY};
pub use schema::{ChessKitConfig, FeatureKey, StoredConfig};
pub use settings::{
    LayoutSettings, NavigationSettings, RuntimeSettings, StorageSettings, TelemetrySettings,
};
pub use store::{FileConfigStore, MemoryConfigStore};
