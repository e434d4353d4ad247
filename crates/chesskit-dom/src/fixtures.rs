//! chess.com game page fixture.
//!
//! Builds the slice of the live-game markup the layout engine depends on:
//!
//! ```text
//! body
//! ├── #board-layout-main
//! │   ├── #board-layout-player-top.board-layout-player
//! │   │   └── .player-component
//! │   │       ├── .user-avatar-component > img
//! │   │       ├── .user-tagline-component
//! │   │       │   ├── .cc-user-username-component
//! │   │       │   └── .user-tagline-rating
//! │   │       ├── wc-captured-pieces
//! │   │       └── .clock-component
//! │   ├── wc-chess-board
//! │   └── #board-layout-player-bottom.board-layout-player
//! │       └── (same as top)
//! └── #board-layout-sidebar
//!     ├── .tabs-component
//!     └── .sidebar-content
//! ```

use chesskit_protocols::{DomError, DomPort, NodeId};

use crate::document::MemoryDocument;

/// What to render inside one player card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerFixture {
    pub username: Option<String>,
    pub rating: Option<String>,
    pub avatar_loaded: bool,
    pub captured_pieces: bool,
    pub clock: Option<String>,
}

impl PlayerFixture {
    /// Fully populated card.
    pub fn named(username: &str, rating: u32, clock: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            rating: Some(format!("({})", rating)),
            avatar_loaded: true,
            captured_pieces: true,
            clock: Some(clock.to_string()),
        }
    }

    /// Card skeleton before the host has filled in any data: every
    /// readiness signal is false and there is no clock yet.
    pub fn skeleton() -> Self {
        Self {
            username: None,
            rating: None,
            avatar_loaded: false,
            captured_pieces: false,
            clock: None,
        }
    }
}

/// Options for [`GamePage::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePageOptions {
    /// Render the player containers. When false only the board and sidebar
    /// exist, as on the first frames of a client-side navigation.
    pub with_players: bool,
    pub top: PlayerFixture,
    pub bottom: PlayerFixture,
}

impl Default for GamePageOptions {
    fn default() -> Self {
        Self {
            with_players: true,
            top: PlayerFixture::named("opponent", 1512, "9:58"),
            bottom: PlayerFixture::named("me", 1487, "10:00"),
        }
    }
}

/// Handles to one rendered player card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerNodes {
    pub container: NodeId,
    pub card: NodeId,
    pub avatar: NodeId,
    pub username: NodeId,
    pub rating: NodeId,
    pub captured_pieces: Option<NodeId>,
    pub clock: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Players {
    pub top: PlayerNodes,
    pub bottom: PlayerNodes,
}

/// A rendered game page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePage {
    pub main: NodeId,
    pub board: NodeId,
    pub sidebar: NodeId,
    pub tabs: NodeId,
    pub sidebar_content: NodeId,
    pub players: Option<Players>,
}

impl GamePage {
    pub fn build(doc: &MemoryDocument, options: &GamePageOptions) -> Result<Self, DomError> {
        let body = doc.body();
        let main = doc
            .element("div")
            .id("board-layout-main")
            .class("board-layout-main")
            .append_to(body)?;
        let board = doc
            .element("wc-chess-board")
            .id("board-single")
            .class("board")
            .append_to(main)?;
        doc.add_listener(board, "pointerdown");

        let sidebar = doc
            .element("div")
            .id("board-layout-sidebar")
            .class("board-layout-sidebar")
            .append_to(body)?;
        let tabs = doc
            .element("div")
            .class("tabs-component")
            .append_to(sidebar)?;
        let sidebar_content = doc
            .element("div")
            .class("sidebar-content")
            .append_to(sidebar)?;

        let mut page = Self {
            main,
            board,
            sidebar,
            tabs,
            sidebar_content,
            players: None,
        };
        if options.with_players {
            page.add_players(doc, options)?;
        }
        Ok(page)
    }

    /// Render the player containers around the board.
    pub fn add_players(
        &mut self,
        doc: &MemoryDocument,
        options: &GamePageOptions,
    ) -> Result<Players, DomError> {
        let top_container = doc
            .element("div")
            .id("board-layout-player-top")
            .class("board-layout-player")
            .build();
        doc.insert_before(self.main, top_container, Some(self.board))?;
        let bottom_container = doc
            .element("div")
            .id("board-layout-player-bottom")
            .class("board-layout-player")
            .append_to(self.main)?;

        let players = Players {
            top: render_card(doc, top_container, &options.top, "top")?,
            bottom: render_card(doc, bottom_container, &options.bottom, "bottom")?,
        };
        self.players = Some(players);
        Ok(players)
    }

    /// Simulate the host page rebuilding its layout from scratch: the
    /// sidebar is replaced by a fresh one and brand-new player cards are
    /// rendered into the (emptied, visible) player containers.
    pub fn host_rerender(
        &mut self,
        doc: &MemoryDocument,
        options: &GamePageOptions,
    ) -> Result<(), DomError> {
        let body = doc.body();
        doc.remove(self.sidebar);
        let sidebar = doc
            .element("div")
            .id("board-layout-sidebar")
            .class("board-layout-sidebar")
            .append_to(body)?;
        self.tabs = doc
            .element("div")
            .class("tabs-component")
            .append_to(sidebar)?;
        self.sidebar_content = doc
            .element("div")
            .class("sidebar-content")
            .append_to(sidebar)?;
        self.sidebar = sidebar;

        if let Some(players) = self.players {
            for container in [players.top.container, players.bottom.container] {
                for child in doc.children(container) {
                    doc.remove(child);
                }
                doc.remove_style(container, "display");
            }
            self.players = Some(Players {
                top: render_card(doc, players.top.container, &options.top, "top")?,
                bottom: render_card(doc, players.bottom.container, &options.bottom, "bottom")?,
            });
        }
        Ok(())
    }
}

fn render_card(
    doc: &MemoryDocument,
    container: NodeId,
    fixture: &PlayerFixture,
    position: &str,
) -> Result<PlayerNodes, DomError> {
    let card = doc
        .element("div")
        .class(&format!("player-component player-{}", position))
        .append_to(container)?;
    doc.set_property(card, "playerPosition", position);

    let avatar_wrapper = doc
        .element("div")
        .class("user-avatar-component")
        .append_to(card)?;
    let avatar = doc
        .element("img")
        .class("cc-avatar-img")
        .attr("alt", fixture.username.as_deref().unwrap_or(""))
        .append_to(avatar_wrapper)?;
    doc.set_image_loaded(avatar, fixture.avatar_loaded);

    let tagline = doc
        .element("div")
        .class("user-tagline-component")
        .append_to(card)?;
    let username = doc
        .element("span")
        .class("cc-user-username-component")
        .text(fixture.username.as_deref().unwrap_or(""))
        .append_to(tagline)?;
    let rating = doc
        .element("span")
        .class("user-tagline-rating")
        .text(fixture.rating.as_deref().unwrap_or(""))
        .append_to(tagline)?;

    let captured_pieces = if fixture.captured_pieces {
        Some(doc.element("wc-captured-pieces").append_to(card)?)
    } else {
        None
    };

    let clock = match &fixture.clock {
        Some(time) => {
            let clock = doc
                .element("div")
                .class(&format!("clock-component clock-{}", position))
                .append_to(card)?;
            doc.element("span")
                .class("clock-time-monospace")
                .text(time)
                .append_to(clock)?;
            // the host's ticking timer lives on the clock element
            doc.add_listener(clock, "tick");
            doc.set_property(clock, "remaining", time);
            Some(clock)
        }
        None => None,
    };

    Ok(PlayerNodes {
        container,
        card,
        avatar,
        username,
        rating,
        captured_pieces,
        clock,
    })
}
