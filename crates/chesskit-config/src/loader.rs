//! Runtime settings loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::settings::RuntimeSettings;

/// Loads [`RuntimeSettings`] with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<RuntimeSettings, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load settings from a string.
    pub fn load_str(content: &str) -> Result<RuntimeSettings, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let settings: RuntimeSettings = toml::from_str(&expanded)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.chesskit`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_settings() {
        let settings = ConfigLoader::load_str("").unwrap();
        assert_eq!(settings, RuntimeSettings::default());
    }

    #[test]
    fn test_load_partial_settings() {
        let content = r#"
            [layout]
            min_signals = 4

            [telemetry]
            ping_url = "https://www.chess.com/favicon.ico"
        "#;
        let settings = ConfigLoader::load_str(content).unwrap();
        assert_eq!(settings.layout.min_signals, 4);
        assert_eq!(settings.layout.readiness_timeout_ms, 10_000);
        assert_eq!(
            settings.telemetry.ping_url.as_deref(),
            Some("https://www.chess.com/favicon.ico")
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[navigation]").unwrap();
        writeln!(file, "poll_interval_ms = 250").unwrap();

        let settings = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(settings.navigation.poll_interval_ms, 250);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/chesskit.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_rejects_invalid_value() {
        let result = ConfigLoader::load_str("[layout]\nmin_signals = 9");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable
        unsafe {
            std::env::set_var("CHESSKIT_TEST_PING_URL", "http://localhost:9/favicon.ico");
        }
        let content = "[telemetry]\nping_url = \"${CHESSKIT_TEST_PING_URL}\"";
        let settings = ConfigLoader::load_str(content).unwrap();
        assert_eq!(
            settings.telemetry.ping_url.as_deref(),
            Some("http://localhost:9/favicon.ico")
        );
        unsafe {
            std::env::remove_var("CHESSKIT_TEST_PING_URL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${CHESSKIT_NONEXISTENT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        assert_eq!(ConfigLoader::expand_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/.chesskit/storage.json");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/.chesskit/storage.json"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/tmp/storage.json"), "/tmp/storage.json");
    }
}
