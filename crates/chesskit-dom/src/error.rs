//! Selector errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector in: {0:?}")]
    Empty(String),

    #[error("Unexpected character {found:?} at offset {offset} in {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("Unterminated attribute selector in: {0:?}")]
    UnterminatedAttribute(String),

    #[error("Dangling combinator in: {0:?}")]
    DanglingCombinator(String),
}
