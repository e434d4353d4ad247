//! End-to-end tests for the layout pipeline.
//!
//! A chess.com game page is built in an in-memory document and driven
//! through navigation, readiness, transform, host resets and revert.

use std::sync::Arc;
use std::time::Duration;

use chesskit_config::ChessKitConfig;
use chesskit_dom::fixtures::{GamePage, GamePageOptions, PlayerFixture};
use chesskit_dom::MemoryDocument;
use chesskit_layout::selectors::{
    class_selector, CLOCK_BOTTOM_WRAPPER, CLOCK_TOP_WRAPPER, PLAYER_BOTTOM_WRAPPER,
    PLAYER_TOP_WRAPPER, TRANSFORMED_ATTR,
};
use chesskit_layout::{
    LayoutConfig, LayoutEngine, OrchestratorState, TransformationOrchestrator,
};
use chesskit_protocols::{DomPort, FrameClock, IntervalFrameClock, NodeId, StaticLocation};

// ============================================================================
// Test Helpers
// ============================================================================

const LOBBY: &str = "https://www.chess.com/home";
const LIVE_GAME: &str = "https://www.chess.com/play/online";

struct Browser {
    doc: Arc<MemoryDocument>,
    location: Arc<StaticLocation>,
    orchestrator: Arc<TransformationOrchestrator>,
}

impl Browser {
    fn open(url: &str, config: LayoutConfig) -> Self {
        let doc = Arc::new(MemoryDocument::new());
        let frames: Arc<dyn FrameClock> = Arc::new(IntervalFrameClock::default());
        let location = Arc::new(StaticLocation::new(url));
        let engine = Arc::new(LayoutEngine::new(doc.clone(), frames.clone()));
        let orchestrator = TransformationOrchestrator::new(
            engine,
            frames,
            location.clone(),
            config,
            Duration::from_millis(500),
        );
        Self {
            doc,
            location,
            orchestrator,
        }
    }

    /// Client-side navigation, picked up by the location poll.
    async fn navigate(&self, url: &str) {
        self.location.navigate(url);
        tokio::time::sleep(Duration::from_millis(600)).await;
    }

    fn wrapper(&self, class: &str) -> NodeId {
        self.doc.query(&class_selector(class)).unwrap()
    }
}

async fn until_state(
    orchestrator: &TransformationOrchestrator,
    wanted: OrchestratorState,
) -> OrchestratorState {
    let mut states = orchestrator.subscribe();
    let _ = tokio::time::timeout(Duration::from_secs(30), states.wait_for(|s| *s == wanted)).await;
    orchestrator.state()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_navigate_into_game_completes_transform() {
    let browser = Browser::open(LOBBY, LayoutConfig::default());
    let page = GamePage::build(&browser.doc, &GamePageOptions::default()).unwrap();
    let players = page.players.unwrap();

    browser.orchestrator.start();
    assert_eq!(browser.orchestrator.state(), OrchestratorState::Idle);

    browser.navigate(LIVE_GAME).await;
    let state = until_state(&browser.orchestrator, OrchestratorState::Completed).await;
    assert_eq!(state, OrchestratorState::Completed);

    let sidebar_children = browser.doc.children(page.sidebar);
    let expected_prefix = [
        browser.wrapper(CLOCK_TOP_WRAPPER),
        browser.wrapper(PLAYER_TOP_WRAPPER),
        page.tabs,
        page.sidebar_content,
        browser.wrapper(PLAYER_BOTTOM_WRAPPER),
        browser.wrapper(CLOCK_BOTTOM_WRAPPER),
    ];
    assert_eq!(&sidebar_children[..6], &expected_prefix);

    for container in [players.top.container, players.bottom.container] {
        assert!(browser.doc.children(container).is_empty());
        assert_eq!(browser.doc.style(container, "display").as_deref(), Some("none"));
    }
    assert!(browser.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));

    browser.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_navigate_away_restores_page() {
    let browser = Browser::open(LIVE_GAME, LayoutConfig::default());
    let page = GamePage::build(&browser.doc, &GamePageOptions::default()).unwrap();
    let players = page.players.unwrap();
    let pristine = browser.doc.outer_html(browser.doc.body());
    let main_children = browser.doc.children(page.main);

    browser.orchestrator.start();
    until_state(&browser.orchestrator, OrchestratorState::Completed).await;

    browser.navigate(LOBBY).await;
    assert_eq!(browser.orchestrator.state(), OrchestratorState::Idle);

    assert_eq!(browser.doc.children(page.main), main_children);
    assert_eq!(browser.doc.parent(players.top.card), Some(players.top.container));
    assert_eq!(
        browser.doc.parent(players.bottom.clock.unwrap()),
        Some(players.bottom.card)
    );
    assert!(!browser.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));
    assert!(browser
        .doc
        .query(&class_selector(PLAYER_TOP_WRAPPER))
        .is_none());
    assert_eq!(browser.doc.outer_html(browser.doc.body()), pristine);

    browser.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_live_behaviour_survives_round_trip() {
    let browser = Browser::open(LIVE_GAME, LayoutConfig::default());
    let page = GamePage::build(&browser.doc, &GamePageOptions::default()).unwrap();
    let clock = page.players.unwrap().bottom.clock.unwrap();

    browser.orchestrator.start();
    until_state(&browser.orchestrator, OrchestratorState::Completed).await;
    assert_eq!(browser.doc.listeners(clock), vec!["tick".to_string()]);
    assert_eq!(browser.doc.property(clock, "remaining").as_deref(), Some("10:00"));

    browser.navigate(LOBBY).await;
    assert_eq!(browser.doc.listeners(clock), vec!["tick".to_string()]);
    assert!(browser.doc.is_connected(clock));

    browser.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_late_player_data_and_host_reset() {
    let browser = Browser::open(LIVE_GAME, LayoutConfig::default());
    let page = GamePage::build(
        &browser.doc,
        &GamePageOptions {
            top: PlayerFixture {
                clock: Some("3:00".to_string()),
                ..PlayerFixture::skeleton()
            },
            ..Default::default()
        },
    )
    .unwrap();
    let top = page.players.unwrap().top;

    browser.orchestrator.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(browser.orchestrator.state(), OrchestratorState::WaitingForData);

    // the host fills in the opponent a little later
    browser.doc.set_text_content(top.username, "opponent");
    browser.doc.set_text_content(top.rating, "(1500)");
    let state = until_state(&browser.orchestrator, OrchestratorState::Completed).await;
    assert_eq!(state, OrchestratorState::Completed);

    // a full board reload puts fresh cards back under the board
    let mut page = page;
    page.host_rerender(&browser.doc, &GamePageOptions::default())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let engine = browser.orchestrator.engine();
    assert!(engine.is_transformed());
    assert!(!engine.cards_in_original_location());
    assert_eq!(browser.orchestrator.watchdog().reapply_count(), 1);

    browser.orchestrator.stop();
    assert!(engine.cards_in_original_location());
}

#[tokio::test(start_paused = true)]
async fn test_config_driven_styles_only() {
    let stored = ChessKitConfig {
        compact_sidebar: true,
        reposition_player_cards: false,
        ..ChessKitConfig::default()
    };
    let browser = Browser::open(LIVE_GAME, LayoutConfig::from_config(&stored));
    GamePage::build(&browser.doc, &GamePageOptions::default()).unwrap();

    browser.orchestrator.start();
    let state = until_state(&browser.orchestrator, OrchestratorState::Completed).await;
    assert_eq!(state, OrchestratorState::Completed);

    let engine = browser.orchestrator.engine();
    assert!(engine.styles_injected());
    assert!(!engine.marker_present());
    assert!(engine.cards_in_original_location());

    browser.orchestrator.stop();
    assert!(!engine.styles_injected());
}
