//! Cache Errors
//!
//! `TigerStyle`: Explicit error types with context.
//!
//! Only [`CacheError::InvalidKey`] (and configuration errors at construction)
//! reach callers of data operations. Everything else is local to one tier or
//! item: it is logged, counted in stats, and the surrounding fan-out carries
//! on.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from cache, memory and GC operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// Empty or malformed key
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Operation addressed an unknown tier
    #[error("tier not found: {name}")]
    TierNotFound {
        /// Tier name that was not found
        name: String,
    },

    /// A tier with this name already exists
    #[error("tier already exists: {name}")]
    DuplicateTier {
        /// Conflicting tier name
        name: String,
    },

    /// A prefetch loader returned an error
    #[error("loader failed for key {key}: {message}")]
    LoaderFailure {
        /// Key being loaded
        key: String,
        /// Loader error message
        message: String,
    },

    /// A prefetch loader did not finish in time
    #[error("loader for key {key} timed out after {timeout_ms}ms")]
    LoaderTimeout {
        /// Key being loaded
        key: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// The durable (long-term) store failed or timed out
    #[error("durable store unavailable: {message}")]
    DurableStoreUnavailable {
        /// Underlying failure
        message: String,
    },

    /// A single tracked item could not be evaluated during a GC cycle
    #[error("gc skipped item {key}: {message}")]
    GcItem {
        /// Tracked item key
        key: String,
        /// Failure detail
        message: String,
    },

    /// A value could not be serialized or deserialized
    #[error("serialization error: {message}")]
    Serialization {
        /// Serializer message
        message: String,
    },

    /// Unknown importance class name
    #[error("invalid importance: {value} (expected low, normal, high or critical)")]
    InvalidImportance {
        /// Provided value
        value: String,
    },

    /// Configuration rejected at construction
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong
        message: String,
    },
}

impl CacheError {
    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create a tier not found error.
    #[must_use]
    pub fn tier_not_found(name: impl Into<String>) -> Self {
        Self::TierNotFound { name: name.into() }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a durable store unavailable error.
    #[must_use]
    pub fn durable_unavailable(message: impl Into<String>) -> Self {
        Self::DurableStoreUnavailable {
            message: message.into(),
        }
    }

    /// Whether this error is a caller programming error that propagates.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. } | Self::InvalidImportance { .. } | Self::InvalidConfig { .. }
        )
    }
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        Self::durable_unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
