//! Client-side navigation detection.
//!
//! chess.com is a single-page app: moving from the lobby into a game changes
//! the URL without a page load. The monitor polls the location and also
//! accepts explicit history notifications, and fires its callbacks only when
//! the URL actually changed.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chesskit_protocols::LocationSource;
use parking_lot::Mutex;
use regex::Regex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Default location poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

static GAME_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"chess\.com/(play|game|analysis|daily)").ok());

/// Whether `url` is a page with a board the layout applies to.
pub fn is_game_page(url: &str) -> bool {
    GAME_URL.as_ref().is_some_and(|re| re.is_match(url))
}

/// Called with the new URL after a navigation.
pub type NavigationCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct Shared {
    location: Arc<dyn LocationSource>,
    current_url: Mutex<String>,
    callbacks: Mutex<Vec<NavigationCallback>>,
}

impl Shared {
    fn check(&self) -> bool {
        let url = self.location.current_url();
        {
            let mut current = self.current_url.lock();
            if *current == url {
                return false;
            }
            debug!(from = %current, to = %url, "Navigation detected");
            *current = url.clone();
        }
        // Callbacks may call back into the monitor.
        let callbacks = self.callbacks.lock().clone();
        for callback in callbacks {
            callback(&url);
        }
        true
    }
}

/// Watches the page location for client-side navigation.
pub struct NavigationMonitor {
    shared: Arc<Shared>,
    interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl NavigationMonitor {
    pub fn new(location: Arc<dyn LocationSource>, interval: Duration) -> Self {
        let current_url = location.current_url();
        Self {
            shared: Arc::new(Shared {
                location,
                current_url: Mutex::new(current_url),
                callbacks: Mutex::new(Vec::new()),
            }),
            interval,
            poller: Mutex::new(None),
        }
    }

    /// Register `callback` and start polling if not already polling.
    pub fn start(&self, callback: NavigationCallback) {
        self.shared.callbacks.lock().push(callback);

        let mut poller = self.poller.lock();
        if poller.is_some() {
            return;
        }
        *self.shared.current_url.lock() = self.shared.location.current_url();

        let shared = self.shared.clone();
        let period = self.interval;
        *poller = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.check();
            }
        }));
        info!(interval = ?period, "Navigation monitor started");
    }

    /// The history API reported a navigation (popstate / pushState).
    pub fn notify_popstate(&self) -> bool {
        self.shared.check()
    }

    /// Compare the location against the last seen URL now. Returns whether
    /// a navigation was detected.
    pub fn check(&self) -> bool {
        self.shared.check()
    }

    pub fn current_url(&self) -> String {
        self.shared.current_url.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.poller.lock().is_some()
    }

    /// Stop polling and drop all callbacks. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(poller) = self.poller.lock().take() {
            poller.abort();
            debug!("Navigation monitor stopped");
        }
        self.shared.callbacks.lock().clear();
    }
}

impl Drop for NavigationMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
