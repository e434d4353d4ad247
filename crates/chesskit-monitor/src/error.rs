//! Monitor errors.

use thiserror::Error;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A latency probe failed; the sample is skipped.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// A page-script message did not have the expected shape.
    #[error("Invalid page message: {0}")]
    InvalidMessage(String),

    /// The probe target could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The overlay could not be attached to the page.
    #[error("Overlay error: {0}")]
    Dom(#[from] chesskit_protocols::DomError),
}
