//! Typed access to the persisted configuration.

use std::sync::Arc;

use chesskit_protocols::ConfigStore;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::migration::{migrate, needs_migration};
use crate::schema::{ChessKitConfig, FeatureKey, StoredConfig};

/// Storage key of the configuration object.
pub const CONFIG_KEY: &str = "config";

/// Reads, migrates and writes [`ChessKitConfig`] in a [`ConfigStore`].
///
/// Every mutation is a single read → transform → write sequence. The store
/// is shared with other extension surfaces and offers no compare-and-swap,
/// so two surfaces updating at once resolve as last write wins.
#[derive(Clone)]
pub struct ConfigRepository {
    store: Arc<dyn ConfigStore>,
}

impl ConfigRepository {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Raw stored value, if any.
    pub async fn load_stored(&self) -> Result<Option<StoredConfig>, ConfigError> {
        match self.store.get(CONFIG_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Current config, migrated in memory if the stored one is stale.
    ///
    /// Returns `None` when nothing has been stored yet.
    pub async fn load(&self) -> Result<Option<ChessKitConfig>, ConfigError> {
        let stored = self.load_stored().await?;
        Ok(stored.as_ref().map(|s| migrate(Some(s))))
    }

    /// Write a config back.
    pub async fn save(&self, config: &ChessKitConfig) -> Result<(), ConfigError> {
        self.store
            .set(CONFIG_KEY, serde_json::to_value(config)?)
            .await?;
        debug!(?config, "Configuration saved");
        Ok(())
    }

    /// Create or migrate the stored config. Run on install, update and startup.
    pub async fn initialize(&self) -> Result<ChessKitConfig, ConfigError> {
        let stored = self.load_stored().await?;

        if !needs_migration(stored.as_ref()) {
            debug!("Configuration already up to date");
            return Ok(migrate(stored.as_ref()));
        }

        info!(from_version = ?stored.as_ref().and_then(|s| s.version), "Initializing/migrating configuration");
        let config = migrate(stored.as_ref());
        self.save(&config).await?;
        info!(?config, "Configuration initialized");
        Ok(config)
    }

    /// Read → transform → write.
    pub async fn update<F>(&self, transform: F) -> Result<ChessKitConfig, ConfigError>
    where
        F: FnOnce(&mut ChessKitConfig),
    {
        let stored = self.load_stored().await?;
        let mut config = migrate(stored.as_ref());
        transform(&mut config);
        self.save(&config).await?;
        Ok(config)
    }

    /// Flip a feature, honoring feature dependencies.
    pub async fn toggle(&self, key: FeatureKey) -> Result<ChessKitConfig, ConfigError> {
        self.update(|config| config.toggle(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::CURRENT_VERSION;
    use crate::store::MemoryConfigStore;
    use serde_json::json;

    fn repository_with(value: Option<serde_json::Value>) -> (ConfigRepository, Arc<MemoryConfigStore>) {
        let store = Arc::new(match value {
            Some(value) => MemoryConfigStore::with_item(CONFIG_KEY, value),
            None => MemoryConfigStore::new(),
        });
        (ConfigRepository::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let (repo, _) = repository_with(None);
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_writes_defaults() {
        let (repo, store) = repository_with(None);
        let config = repo.initialize().await.unwrap();
        assert_eq!(config, ChessKitConfig::default());

        let raw = store.get(CONFIG_KEY).await.unwrap().unwrap();
        assert_eq!(raw["version"], CURRENT_VERSION);
        assert_eq!(raw["compactSidebar"], true);
    }

    #[tokio::test]
    async fn test_initialize_migrates_legacy_config() {
        let (repo, store) = repository_with(Some(json!({
            "enabled": true,
            "extractPlayerCards": false,
            "debugMode": true,
            "version": 2
        })));

        let config = repo.initialize().await.unwrap();
        assert!(config.compact_sidebar);
        assert!(!config.reposition_player_cards);
        assert!(config.debug_mode);

        let raw = store.get(CONFIG_KEY).await.unwrap().unwrap();
        assert_eq!(raw["version"], CURRENT_VERSION);
        assert!(raw.get("extractPlayerCards").is_none());
    }

    #[tokio::test]
    async fn test_toggle_persists_dependency_rule() {
        let (repo, _) = repository_with(None);
        repo.initialize().await.unwrap();

        let config = repo.toggle(FeatureKey::CompactSidebar).await.unwrap();
        assert!(!config.reposition_player_cards);

        let reloaded = repo.load().await.unwrap().unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_invalid_stored_value() {
        let (repo, _) = repository_with(Some(json!({"compactSidebar": "yes"})));
        assert!(matches!(repo.load().await, Err(ConfigError::Json(_))));
    }
}
