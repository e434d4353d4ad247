//! Runtime errors.

use chesskit_config::ConfigError;
use chesskit_layout::LayoutError;
use chesskit_monitor::MonitorError;
use chesskit_protocols::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Telemetry error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_from() {
        let err = RuntimeError::from(ConfigError::NotFound("storage.json".to_string()));
        assert!(matches!(err, RuntimeError::Config(_)));
        assert!(err.to_string().contains("storage.json"));
    }

    #[test]
    fn test_layout_error_from() {
        let err = RuntimeError::from(LayoutError::missing("#board-layout-sidebar"));
        assert_eq!(
            err.to_string(),
            "Layout error: Required element not found: #board-layout-sidebar"
        );
    }
}
