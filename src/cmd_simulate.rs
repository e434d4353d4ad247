//! Simulate subcommand: drives the content script against an in-memory
//! chess.com game page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use chesskit_config::{ChessKitConfig, ConfigRepository, MemoryConfigStore, RuntimeSettings};
use chesskit_dom::fixtures::{GamePage, GamePageOptions};
use chesskit_dom::MemoryDocument;
use chesskit_layout::OrchestratorState;
use chesskit_monitor::{
    render_rows, HttpPingProbe, MonitorError, PingProbe, WsRttTracker,
};
use chesskit_protocols::{DomPort, IntervalFrameClock, StaticLocation};
use chesskit_runtime::ContentScript;

use crate::cli::SimulateArgs;

const LOBBY_URL: &str = "https://www.chess.com/home";
const TRANSFORM_DEADLINE: Duration = Duration::from_secs(20);

/// Stand-in for the network when no ping URL is configured.
struct SimulatedProbe {
    latency: Duration,
}

#[async_trait]
impl PingProbe for SimulatedProbe {
    async fn probe(&self) -> Result<Duration, MonitorError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.latency)
    }
}

fn probe(settings: &RuntimeSettings) -> Result<Arc<dyn PingProbe>, MonitorError> {
    match &settings.telemetry.ping_url {
        Some(url) => Ok(Arc::new(HttpPingProbe::new(url)?)),
        None => Ok(Arc::new(SimulatedProbe {
            latency: Duration::from_millis(45),
        })),
    }
}

async fn wait_for_outcome(script: &ContentScript) -> OrchestratorState {
    let mut states = script.orchestrator().subscribe();
    let outcome = tokio::time::timeout(
        TRANSFORM_DEADLINE,
        states.wait_for(|state| {
            matches!(state, OrchestratorState::Completed | OrchestratorState::Failed)
        }),
    )
    .await;
    match outcome {
        Ok(Ok(state)) => *state,
        _ => script.orchestrator().state(),
    }
}

pub(crate) async fn run(
    args: SimulateArgs,
    settings: &RuntimeSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Arc::new(MemoryDocument::new());
    let options = GamePageOptions::default();
    let mut page = GamePage::build(
        &doc,
        &GamePageOptions {
            with_players: args.late_players_ms.is_none(),
            ..options.clone()
        },
    )?;

    let store = Arc::new(MemoryConfigStore::new());
    ConfigRepository::new(store.clone())
        .save(&ChessKitConfig {
            reposition_player_cards: !args.styles_only,
            lag_overlay: args.lag_overlay,
            debug_mode: args.debug,
            ..ChessKitConfig::default()
        })
        .await?;

    let location = Arc::new(StaticLocation::new(args.url.clone()));
    let frames = Arc::new(IntervalFrameClock::new(settings.layout.frame_interval()));
    let script = ContentScript::new(
        doc.clone(),
        frames,
        location.clone(),
        store,
        probe(settings)?,
        settings.clone(),
    );

    script.init().await?;
    println!("Page: {}", args.url);

    if let Some(delay) = args.late_players_ms {
        tokio::time::sleep(Duration::from_millis(delay)).await;
        page.add_players(&doc, &options)?;
        info!(delay_ms = delay, "Player cards rendered");
    }

    let state = wait_for_outcome(&script).await;
    println!("Transform: {}", state);
    if state != OrchestratorState::Completed {
        warn!(%state, "Transform did not complete");
    }

    for round in 1..=args.host_resets {
        page.host_rerender(&doc, &options)?;
        tokio::time::sleep(Duration::from_millis(250)).await;
        println!(
            "Host reset {}: transformed again = {}",
            round,
            script.status().player_cards_extracted
        );
    }
    println!(
        "Watchdog re-applies: {}",
        script.orchestrator().watchdog().reapply_count()
    );

    if args.lag_overlay {
        let mut tracker = WsRttTracker::new(script.page_sender());
        for i in 0..args.moves {
            tracker.on_send();
            tokio::time::sleep(Duration::from_millis(90 + u64::from(i) * 40)).await;
            tracker.on_message();
        }
        // let the overlay catch up
        tokio::time::sleep(settings.telemetry.overlay_refresh() + Duration::from_millis(100)).await;

        println!("\n{:<10} {:>10}  {}", "METRIC", "VALUE", "HEALTH");
        let metrics = script.telemetry().metrics();
        for row in render_rows(&metrics) {
            let health = metrics
                .get(&row.name)
                .map(|state| state.health.to_string())
                .unwrap_or_default();
            println!("{:<10} {:>10}  {}", row.label, row.display, health);
        }
        println!("Overall: {}\n", script.telemetry().overall_health());
    }

    println!("Status: {}", serde_json::to_string(&script.status())?);
    if args.dump_html {
        println!("{}", doc.outer_html(doc.body()));
    }

    location.navigate(LOBBY_URL);
    script.notify_popstate();
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!(
        "After leaving the game: state = {}, cards extracted = {}",
        script.orchestrator().state(),
        script.status().player_cards_extracted
    );

    script.shutdown();
    Ok(())
}
