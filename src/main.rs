//! chesskit - Chess.com layout reshaping and lag telemetry engine
//!
//! Main entry point for the chesskit CLI.

mod cli;
mod cmd_config;
mod cmd_simulate;
mod cmd_telemetry;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use chesskit_config::{ConfigLoader, FileConfigStore, RuntimeSettings};

use cli::{Cli, Commands};

/// Initialize tracing with console output and, when `log_dir` is given,
/// a daily-rotated file.
fn init_tracing(log_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("chesskit")
                .filename_suffix("log")
                .max_log_files(14)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Flushes on drop; must live as long as the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_settings(path: &Path) -> Result<RuntimeSettings, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(path = %path.display(), "No settings file, using defaults");
        return Ok(RuntimeSettings::default());
    }
    let settings = ConfigLoader::load(path)?;
    info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

fn storage_path(settings: &RuntimeSettings) -> PathBuf {
    let expanded = ConfigLoader::expand_path(&settings.storage.path);
    if expanded.starts_with('~') {
        warn!(path = %expanded, "Home directory unknown, using the platform config directory");
        return dirs::config_dir()
            .map(|dir| dir.join("chesskit").join("storage.json"))
            .unwrap_or_else(|| PathBuf::from("chesskit-storage.json"));
    }
    PathBuf::from(expanded)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    let settings = load_settings(&cli.config)?;

    match cli.command {
        Commands::Simulate(args) => cmd_simulate::run(args, &settings).await,
        Commands::Config { action } => {
            let store = FileConfigStore::new(storage_path(&settings));
            cmd_config::handle_config_command(action, store).await
        }
        Commands::Telemetry { action } => {
            cmd_telemetry::handle_telemetry_command(action, &settings).await
        }
    }
}
