//! # Chesskit DOM
//!
//! [`MemoryDocument`] is an in-memory document tree implementing
//! [`chesskit_protocols::DomPort`]. It understands the subset of CSS
//! selectors the layout engine uses, keeps inline styles and attributes,
//! reports mutations to observers and can serialise any subtree to HTML.
//!
//! Listeners and custom-element properties are tracked per node so tests can
//! check that a relocated node is the same live node rather than a copy.
//!
//! [`fixtures`] builds a chess.com game page.

mod document;
mod error;
pub mod fixtures;
mod node;
mod selector;

pub use document::{ElementBuilder, MemoryDocument};
pub use error::SelectorError;
pub use selector::{ElementView, SelectorList};
