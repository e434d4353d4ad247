//! Extension lifecycle against a file-backed store: install, popup toggles,
//! content script refreshes and client-side navigation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chesskit_config::{ConfigRepository, FeatureKey, FileConfigStore, RuntimeSettings};
use chesskit_dom::fixtures::{GamePage, GamePageOptions};
use chesskit_dom::MemoryDocument;
use chesskit_layout::OrchestratorState;
use chesskit_monitor::{MetricName, MonitorError, PageScriptMessage, PingProbe, WsRttTracker};
use chesskit_protocols::{DomPort, ExtensionMessage, IntervalFrameClock, StaticLocation};
use chesskit_runtime::{Background, ContentScript, InstallReason};
use serde_json::json;

struct LocalProbe;

#[async_trait]
impl PingProbe for LocalProbe {
    async fn probe(&self) -> Result<Duration, MonitorError> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(Duration::from_millis(25))
    }
}

struct Extension {
    _dir: tempfile::TempDir,
    doc: Arc<MemoryDocument>,
    page: GamePage,
    location: Arc<StaticLocation>,
    popup: ConfigRepository,
    script: Arc<ContentScript>,
}

async fn install(url: &str) -> Extension {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileConfigStore::new(dir.path().join("storage.json")));

    Background::new(ConfigRepository::new(store.clone()))
        .on_installed(InstallReason::Install)
        .await
        .unwrap();

    let doc = Arc::new(MemoryDocument::new());
    let page = GamePage::build(&doc, &GamePageOptions::default()).unwrap();
    let location = Arc::new(StaticLocation::new(url));
    let script = ContentScript::new(
        doc.clone(),
        Arc::new(IntervalFrameClock::default()),
        location.clone(),
        store.clone(),
        Arc::new(LocalProbe),
        RuntimeSettings::default(),
    );

    Extension {
        _dir: dir,
        doc,
        page,
        location,
        popup: ConfigRepository::new(store),
        script,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_popup_toggles_reach_the_page() {
    let ext = install("https://www.chess.com/game/live/1").await;
    ext.script.init().await.unwrap();
    settle().await;
    assert_eq!(ext.script.status().state, "COMPLETED");

    // popup flips the overlay on, then tells the page to refresh
    let config = ext.popup.toggle(FeatureKey::LagOverlay).await.unwrap();
    assert!(config.lag_overlay);
    assert!(ext.script.handle_message(ExtensionMessage::Refresh).await.success);
    assert!(ext.script.status().lag_overlay);

    // the page script reports a move round trip
    let mut tracker = WsRttTracker::new(ext.script.page_sender());
    tracker.on_send();
    tokio::time::sleep(Duration::from_millis(180)).await;
    assert_eq!(tracker.on_message(), Some(180.0));
    settle().await;
    let move_rtt = &ext.script.telemetry().metrics()[&MetricName::MoveRtt];
    assert_eq!(move_rtt.value, Some(180.0));

    // switching the compact sidebar off takes the card move with it
    let config = ext.popup.toggle(FeatureKey::CompactSidebar).await.unwrap();
    assert!(!config.compact_sidebar);
    assert!(!config.reposition_player_cards);
    ext.script.handle_message(ExtensionMessage::Refresh).await;
    settle().await;

    let status = ext.script.status();
    assert!(!status.enabled);
    assert!(!status.player_cards_extracted);
    assert!(status.lag_overlay);
    assert_eq!(status.state, "IDLE");
    ext.script.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_navigation_round_trip() {
    let ext = install("https://www.chess.com/home").await;
    let pristine = ext.doc.outer_html(ext.doc.body());
    ext.script.init().await.unwrap();
    settle().await;
    assert_eq!(ext.script.status().state, "IDLE");

    ext.location.navigate("https://www.chess.com/play/online");
    assert!(ext.script.notify_popstate());
    settle().await;
    assert_eq!(
        ext.script.orchestrator().state(),
        OrchestratorState::Completed
    );
    assert!(ext.doc.has_attribute(ext.page.sidebar, "data-chess-kit-transformed"));

    // the location poll notices leaving without a history event
    ext.location.navigate("https://www.chess.com/home");
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(ext.script.orchestrator().state(), OrchestratorState::Idle);
    assert_eq!(ext.doc.outer_html(ext.doc.body()), pristine);
    ext.script.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_invalid_page_messages_are_ignored() {
    let ext = install("https://www.chess.com/game/daily/7").await;
    ext.popup
        .update(|config| config.lag_overlay = true)
        .await
        .unwrap();
    ext.script.init().await.unwrap();
    settle().await;

    let sender = ext.script.page_sender();
    sender.send(json!({"type": "ws-rtt", "rtt": -1, "timestamp": 0})).unwrap();
    sender.send(json!({"type": "ws-open"})).unwrap();
    sender
        .send(serde_json::to_value(PageScriptMessage::ws_rtt(90.0)).unwrap())
        .unwrap();
    settle().await;

    let move_rtt = &ext.script.telemetry().metrics()[&MetricName::MoveRtt];
    assert_eq!(move_rtt.sample_count, 1);
    assert_eq!(move_rtt.raw_latest, Some(90.0));
    ext.script.shutdown();
}
