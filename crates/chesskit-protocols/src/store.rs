//! Extension storage protocol.
//!
//! The store is external and shared between UI surfaces; callers must treat
//! it as eventually consistent. Writes are whole-value replacements, so the
//! last writer wins.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Asynchronous key-value storage of JSON values.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
