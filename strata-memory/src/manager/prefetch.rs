//! Single-flight prefetch bookkeeping.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::error::CacheError;

/// Result of a prefetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefetchOutcome {
    /// Loader succeeded and the value was written to every enabled tier
    Loaded,
    /// Another prefetch for the same key is running; nothing was done
    AlreadyInFlight,
    /// Loader returned an error ([`CacheError::LoaderFailure`])
    Failed(CacheError),
    /// Loader exceeded its timeout ([`CacheError::LoaderTimeout`])
    TimedOut(CacheError),
}

impl PrefetchOutcome {
    /// Whether the value was loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Keys with a loader currently running.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    keys: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Claim `key`. `None` if it is already claimed.
    pub(crate) fn claim(&self, key: &str) -> Option<InFlightGuard<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.insert(key.to_string()).then(|| InFlightGuard {
            owner: self,
            key: key.to_string(),
        })
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Releases the claim on drop, including when the prefetch future is
/// cancelled.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    owner: &'a InFlight,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive() {
        let in_flight = InFlight::default();

        let guard = in_flight.claim("k").unwrap();
        assert!(in_flight.claim("k").is_none());
        assert!(in_flight.claim("other").is_some());
        assert!(in_flight.contains("k"));

        drop(guard);
        assert!(!in_flight.contains("k"));
        assert_eq!(in_flight.len(), 0);
    }
}
