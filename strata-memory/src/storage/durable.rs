//! Durable Store Trait
//!
//! `TigerStyle`: Abstract interface for the long-term tier.
//!
//! Implementations store opaque bytes. Callers own the encoding.

use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageResult;

/// Key/value store backing long-term memory.
///
/// `TigerStyle`: All operations are async, return explicit errors.
#[async_trait]
pub trait DurableStore: Send + Sync + std::fmt::Debug {
    /// Read a value. Returns `None` if absent or expired.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Write a value, replacing any existing one.
    ///
    /// `ttl` of `None` keeps the value until deleted.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<()>;

    /// Delete a value.
    ///
    /// Returns true if a value existed.
    async fn delete(&self, key: &str) -> StorageResult<bool>;
}
