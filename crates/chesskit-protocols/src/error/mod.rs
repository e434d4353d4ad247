//! Error types for chesskit protocols.

mod dom;
mod store;

pub use dom::DomError;
pub use store::StoreError;
