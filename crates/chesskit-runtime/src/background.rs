//! Background worker: keeps the stored configuration current.

use chesskit_config::{ChessKitConfig, ConfigRepository};
use tracing::info;

use crate::error::RuntimeError;

/// Why the extension was (re)installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
    BrowserUpdate,
}

impl InstallReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallReason::Install => "install",
            InstallReason::Update => "update",
            InstallReason::BrowserUpdate => "chrome_update",
        }
    }
}

pub struct Background {
    repository: ConfigRepository,
}

impl Background {
    pub fn new(repository: ConfigRepository) -> Self {
        Self { repository }
    }

    pub async fn on_installed(&self, reason: InstallReason) -> Result<ChessKitConfig, RuntimeError> {
        info!(reason = reason.as_str(), "Extension installed/updated");
        self.initialize().await
    }

    pub async fn on_startup(&self) -> Result<ChessKitConfig, RuntimeError> {
        info!("Extension starting up");
        self.initialize().await
    }

    /// Create or migrate the stored config.
    pub async fn initialize(&self) -> Result<ChessKitConfig, RuntimeError> {
        Ok(self.repository.initialize().await?)
    }
}
