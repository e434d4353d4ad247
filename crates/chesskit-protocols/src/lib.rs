//! # Chesskit Protocols
//!
//! Port definitions (traits) and wire types shared by the chesskit crates.
//! Contains only interface definitions - no implementations beyond trivial
//! defaults.
//!
//! ## Core Ports
//!
//! - [`DomPort`] - Access to the host page document
//! - [`FrameClock`] - Animation-frame scheduling
//! - [`LocationSource`] - Current page URL
//! - [`ConfigStore`] - Extension key-value storage
//!
//! ## Wire Types
//!
//! - [`ExtensionMessage`] / [`MessageResponse`] - UI surface <-> content script messages
//! - [`TransformationStatus`] - Status snapshot answered to `getStatus`

pub mod dom;
pub mod error;
pub mod frame;
pub mod location;
pub mod message;
pub mod store;

pub use dom::{DomPort, MutationKind, MutationReceiver, MutationRecord, NodeId};
pub use error::{DomError, StoreError};
pub use frame::{FrameClock, IntervalFrameClock, DEFAULT_FRAME_INTERVAL};
pub use location::{LocationSource, StaticLocation};
pub use message::{ExtensionMessage, MessageResponse, TransformationStatus};
pub use store::ConfigStore;
