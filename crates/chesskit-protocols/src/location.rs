//! Page location.

use std::sync::RwLock;

/// Source of the current page URL.
pub trait LocationSource: Send + Sync {
    fn current_url(&self) -> String;
}

/// A location that only changes when told to.
///
/// Used by the CLI simulator and tests to drive navigation.
#[derive(Debug, Default)]
pub struct StaticLocation {
    url: RwLock<String>,
}

impl StaticLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
        }
    }

    /// Change the URL, as a client-side router would.
    pub fn navigate(&self, url: impl Into<String>) {
        if let Ok(mut guard) = self.url.write() {
            *guard = url.into();
        }
    }
}

impl LocationSource for StaticLocation {
    fn current_url(&self) -> String {
        self.url.read().map(|u| u.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_location_navigate() {
        let location = StaticLocation::new("https://www.chess.com/home");
        assert_eq!(location.current_url(), "https://www.chess.com/home");

        location.navigate("https://www.chess.com/play/online");
        assert_eq!(location.current_url(), "https://www.chess.com/play/online");
    }
}
