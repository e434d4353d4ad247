//! Config subcommand handlers.

use std::sync::Arc;

use chesskit_config::{ConfigRepository, FeatureKey, FileConfigStore};
use chesskit_runtime::Background;

use crate::cli::ConfigAction;

pub(crate) async fn handle_config_command(
    action: ConfigAction,
    store: FileConfigStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = store.path().to_path_buf();
    let repository = ConfigRepository::new(Arc::new(store));

    match action {
        ConfigAction::Show { format } => {
            let Some(config) = repository.load().await? else {
                println!("No configuration stored. Run `chesskit config init` first.");
                return Ok(());
            };
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }
            println!("{:<26} {:<24} {}", "FEATURE", "KEY", "STATE");
            println!("{}", "-".repeat(60));
            for key in FeatureKey::ALL {
                let state = if config.get(key) { "on" } else { "off" };
                println!("{:<26} {:<24} {}", key.label(), key_name(key), state);
            }
            println!("\nVersion: {}", config.version);
        }
        ConfigAction::Init => {
            let config = Background::new(repository).on_startup().await?;
            println!("Configuration ready (version {}) at {}", config.version, path.display());
        }
        ConfigAction::Toggle { feature } => {
            let key: FeatureKey = feature.parse()?;
            let config = repository.toggle(key).await?;
            println!(
                "{} is now {}",
                key.label(),
                if config.get(key) { "on" } else { "off" }
            );
            for dependent in FeatureKey::ALL {
                if dependent.depends_on() == Some(key) && !config.get(key) {
                    println!("  {} switched off with it", dependent.label());
                }
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }

    Ok(())
}

fn key_name(key: FeatureKey) -> String {
    serde_json::to_value(key)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}
