use super::*;
use crate::selectors::{
    class_selector, CLOCK_BOTTOM_WRAPPER, CLOCK_TOP_WRAPPER, PLAYER_BOTTOM_WRAPPER,
    PLAYER_TOP_WRAPPER, TRANSFORMED_ATTR,
};
use chesskit_dom::fixtures::{GamePage, GamePageOptions, PlayerFixture};
use chesskit_dom::MemoryDocument;
use chesskit_protocols::{DomPort, IntervalFrameClock, StaticLocation};

const HOME: &str = "https://www.chess.com/home";
const GAME: &str = "https://www.chess.com/game/live/123";

struct Harness {
    doc: Arc<MemoryDocument>,
    location: Arc<StaticLocation>,
    orchestrator: Arc<TransformationOrchestrator>,
}

fn harness(url: &str, config: LayoutConfig) -> Harness {
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
    Harness {
        doc,
        location,
        orchestrator,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn slow_config() -> LayoutConfig {
    LayoutConfig {
        readiness_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

#[test]
fn test_state_display() {
    assert_eq!(OrchestratorState::Idle.to_string(), "IDLE");
    assert_eq!(
        OrchestratorState::WaitingForStructure.to_string(),
        "WAITING_FOR_STRUCTURE"
    );
    assert_eq!(OrchestratorState::Completed.as_str(), "COMPLETED");
}

#[tokio::test(start_paused = true)]
async fn test_completes_on_game_page() {
    let h = harness(GAME, LayoutConfig::default());
    let page = GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();

    h.orchestrator.start();
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForStructure);
    settle().await;

    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);
    assert!(h.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));
    assert!(h.orchestrator.watchdog().is_running());
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stays_idle_off_game_page() {
    let h = harness(HOME, LayoutConfig::default());
    GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();

    h.orchestrator.start();
    settle().await;

    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);
    assert!(!h.orchestrator.engine().marker_present());
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_structure() {
    let h = harness(GAME, LayoutConfig::default());
    let mut page = GamePage::build(
        &h.doc,
        &GamePageOptions {
            with_players: false,
            ..Default::default()
        },
    )
    .unwrap();

    h.orchestrator.start();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForStructure);

    page.add_players(&h.doc, &GamePageOptions::default()).unwrap();
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_data_then_transforms() {
    let h = harness(GAME, slow_config());
    let page = GamePage::build(
        &h.doc,
        &GamePageOptions {
            top: PlayerFixture {
                clock: Some("5:00".to_string()),
                ..PlayerFixture::skeleton()
            },
            ..Default::default()
        },
    )
    .unwrap();
    let mut states = h.orchestrator.subscribe();

    h.orchestrator.start();
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForData);
    assert!(states.has_changed().unwrap());
    states.borrow_and_update();

    // data never reaches the quorum; the timeout lets the transform proceed
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(*states.borrow_and_update(), OrchestratorState::Completed);
    assert!(h.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failed_when_clock_missing() {
    let h = harness(GAME, LayoutConfig::default());
    let page = GamePage::build(
        &h.doc,
        &GamePageOptions {
            bottom: PlayerFixture {
                clock: None,
                ..PlayerFixture::named("me", 1400, "1:00")
            },
            ..Default::default()
        },
    )
    .unwrap();
    let before = h.doc.outer_html(h.doc.body());

    h.orchestrator.start();
    settle().await;

    assert_eq!(h.orchestrator.state(), OrchestratorState::Failed);
    assert!(!h.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));
    assert_eq!(h.doc.outer_html(h.doc.body()), before);
    assert!(!h.orchestrator.watchdog().is_running());
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_navigation_away_reverts() {
    let h = harness(HOME, LayoutConfig::default());
    GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();
    let before = h.doc.outer_html(h.doc.body());

    h.orchestrator.start();
    h.location.navigate(GAME);
    assert!(h.orchestrator.notify_popstate());
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);

    h.location.navigate(HOME);
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);
    assert_eq!(h.doc.outer_html(h.doc.body()), before);
    assert!(!h.orchestrator.watchdog().is_running());
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_new_navigation_supersedes_running_sequence() {
    let h = harness(GAME, slow_config());
    let page = GamePage::build(
        &h.doc,
        &GamePageOptions {
            top: PlayerFixture {
                clock: Some("5:00".to_string()),
                ..PlayerFixture::skeleton()
            },
            ..Default::default()
        },
    )
    .unwrap();

    h.orchestrator.start();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForData);

    // the next game starts before the first sequence finished waiting
    h.location.navigate("https://www.chess.com/game/live/456");
    assert!(h.orchestrator.notify_popstate());
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForStructure);

    // the first sequence would have timed out here
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::WaitingForData);
    assert!(!h.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);
    for wrapper in [
        CLOCK_TOP_WRAPPER,
        PLAYER_TOP_WRAPPER,
        PLAYER_BOTTOM_WRAPPER,
        CLOCK_BOTTOM_WRAPPER,
    ] {
        assert_eq!(h.doc.query_all(&class_selector(wrapper)).len(), 1);
    }
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_disabling_reverts_and_idles() {
    let h = harness(GAME, LayoutConfig::default());
    GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();
    let before = h.doc.outer_html(h.doc.body());

    h.orchestrator.start();
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);

    h.orchestrator.update_config(LayoutConfig {
        compact_sidebar: false,
        reposition_player_cards: false,
        ..Default::default()
    });
    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);
    assert_eq!(h.doc.outer_html(h.doc.body()), before);
    assert!(!h.orchestrator.engine().styles_injected());

    // navigating while disabled does nothing
    h.orchestrator.handle_navigation(GAME);
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);

    h.orchestrator.update_config(LayoutConfig::default());
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_styles_only_does_not_arm_watchdog() {
    let h = harness(
        GAME,
        LayoutConfig {
            reposition_player_cards: false,
            ..Default::default()
        },
    );
    GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();

    h.orchestrator.start();
    settle().await;

    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);
    assert!(h.orchestrator.engine().styles_injected());
    assert!(h.orchestrator.engine().cards_in_original_location());
    assert!(!h.orchestrator.watchdog().is_running());
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_recovers_host_reset() {
    let h = harness(GAME, LayoutConfig::default());
    let mut page = GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();

    h.orchestrator.start();
    settle().await;
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);

    page.host_rerender(&h.doc, &GamePageOptions::default()).unwrap();
    settle().await;

    assert!(h.orchestrator.engine().is_transformed());
    assert!(h.doc.has_attribute(page.sidebar, TRANSFORMED_ATTR));
    assert_eq!(h.orchestrator.watchdog().reapply_count(), 1);
    h.orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_and_stop_twice() {
    let h = harness(GAME, LayoutConfig::default());
    GamePage::build(&h.doc, &GamePageOptions::default()).unwrap();

    h.orchestrator.start();
    h.orchestrator.start();
    settle().await;
    assert!(h.orchestrator.is_active());
    assert_eq!(h.orchestrator.state(), OrchestratorState::Completed);

    h.orchestrator.stop();
    h.orchestrator.stop();
    assert!(!h.orchestrator.is_active());
    assert_eq!(h.orchestrator.state(), OrchestratorState::Idle);
    assert!(!h.orchestrator.engine().marker_present());
}
