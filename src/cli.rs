//! CLI definitions for chesskit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chesskit CLI.
#[derive(Parser)]
#[command(name = "chesskit")]
#[command(about = "Chess.com layout reshaping and lag telemetry engine")]
#[command(version)]
pub(crate) struct Cli {
    /// Runtime settings file (TOML). Defaults apply when it does not exist.
    #[arg(short, long, default_value = "config/chesskit.toml", global = true)]
    pub config: PathBuf,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, env = "CHESSKIT_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the content script against a simulated game page
    Simulate(SimulateArgs),

    /// Stored extension configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Lag telemetry probes
    Telemetry {
        #[command(subcommand)]
        action: TelemetryAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct SimulateArgs {
    /// Page URL the simulation starts on
    #[arg(long, default_value = "https://www.chess.com/play/online")]
    pub url: String,

    /// Render the player cards only after this many milliseconds
    #[arg(long)]
    pub late_players_ms: Option<u64>,

    /// Number of host layout resets to throw at the watchdog
    #[arg(long, default_value_t = 1)]
    pub host_resets: u32,

    /// Only compact the sidebar, leave the cards in place
    #[arg(long)]
    pub styles_only: bool,

    /// Run the lag telemetry overlay
    #[arg(long)]
    pub lag_overlay: bool,

    /// Show the debug overlay
    #[arg(long)]
    pub debug: bool,

    /// Simulated move round trips to report through the page bridge
    #[arg(long, default_value_t = 5)]
    pub moves: u32,

    /// Print the final document HTML
    #[arg(long)]
    pub dump_html: bool,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the stored configuration
    Show {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Create or migrate the stored configuration
    Init,

    /// Flip a feature (compactSidebar, repositionPlayerCards, lagOverlay, debugMode)
    Toggle {
        feature: String,
    },

    /// Print the storage file path
    Path,
}

#[derive(Subcommand)]
pub(crate) enum TelemetryAction {
    /// Probe an origin the way the ping monitor does
    Ping {
        /// Page URL whose origin is probed (defaults to telemetry.ping_url)
        #[arg(long)]
        url: Option<String>,

        /// Number of samples to take
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
}
