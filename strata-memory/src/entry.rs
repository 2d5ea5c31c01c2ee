//! Entry - One Cached Value
//!
//! `TigerStyle`: Explicit timestamps from an injected clock, explicit sizes.
//!
//! Sizes are the length of the value's JSON encoding. They feed memory-usage
//! statistics and GC pressure; tier capacity is counted in entries.

use std::mem;

use serde::Serialize;
use tracing::debug;

use crate::constants::KEY_BYTES_MAX;
use crate::error::{CacheError, CacheResult};

// =============================================================================
// Entry
// =============================================================================

/// A stored value with its bookkeeping.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub(crate) value: T,
    pub(crate) created_at_ms: u64,
    pub(crate) last_accessed_at_ms: u64,
    pub(crate) expires_at_ms: Option<u64>,
    pub(crate) access_count: u64,
    pub(crate) size_bytes: usize,
    /// Logical insertion order within the tier
    pub(crate) created_seq: u64,
    /// Logical order of the last read or write within the tier
    pub(crate) touched_seq: u64,
}

impl<T: Serialize> Entry<T> {
    pub(crate) fn new(value: T, now_ms: u64, ttl_ms: Option<u64>, seq: u64) -> Self {
        let size_bytes = size_or_fallback(&value);
        Self {
            value,
            created_at_ms: now_ms,
            last_accessed_at_ms: now_ms,
            expires_at_ms: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
            access_count: 0,
            size_bytes,
            created_seq: seq,
            touched_seq: seq,
        }
    }

    /// Swap in a new value and deadline, keeping access history.
    pub(crate) fn replace(&mut self, value: T, now_ms: u64, ttl_ms: Option<u64>, seq: u64) {
        self.size_bytes = size_or_fallback(&value);
        self.value = value;
        self.expires_at_ms = ttl_ms.map(|ttl| now_ms.saturating_add(ttl));
        self.last_accessed_at_ms = now_ms;
        self.touched_seq = seq;
    }
}

impl<T> Entry<T> {
    /// An entry whose deadline is at or before `now_ms` is expired.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|deadline| deadline <= now_ms)
    }

    pub(crate) fn touch(&mut self, now_ms: u64, seq: u64) {
        self.access_count += 1;
        self.last_accessed_at_ms = now_ms;
        self.touched_seq = seq;
    }

    /// Metadata snapshot.
    #[must_use]
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            created_at_ms: self.created_at_ms,
            last_accessed_at_ms: self.last_accessed_at_ms,
            expires_at_ms: self.expires_at_ms,
            access_count: self.access_count,
            size_bytes: self.size_bytes,
        }
    }
}

/// Read-only view of an entry's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// When the entry was first inserted
    pub created_at_ms: u64,
    /// Last successful read (or write)
    pub last_accessed_at_ms: u64,
    /// Expiry deadline, `None` for no TTL
    pub expires_at_ms: Option<u64>,
    /// Successful reads
    pub access_count: u64,
    /// Estimated size of the value
    pub size_bytes: usize,
}

// =============================================================================
// Sizing and keys
// =============================================================================

/// Size of `value` as its JSON encoding.
///
/// # Errors
/// Returns [`CacheError::Serialization`] if the value cannot be encoded.
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> CacheResult<usize> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(CacheError::from)
}

fn size_or_fallback<T: Serialize>(value: &T) -> usize {
    estimate_size(value).unwrap_or_else(|err| {
        debug!(error = %err, "value not serializable, using in-memory size");
        mem::size_of::<T>()
    })
}

/// Reject empty keys and keys over [`KEY_BYTES_MAX`].
///
/// # Errors
/// Returns [`CacheError::InvalidKey`] describing the problem.
pub fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_key("key must not be empty"));
    }
    if key.len() > KEY_BYTES_MAX {
        return Err(CacheError::invalid_key(format!(
            "key is {} bytes, max is {KEY_BYTES_MAX}",
            key.len()
        )));
    }
    Ok(())
}
