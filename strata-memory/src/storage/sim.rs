//! `SimDurableStore` - In-Memory Durable Store for Testing
//!
//! `TigerStyle`: Deterministic testing with fault injection.
//!
//! Faults come from a shared [`FaultInjector`] so one simulation controls
//! every component. TTLs are measured on the injected clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use strata_core::dst::{FaultInjector, FaultType};
use strata_core::{SharedClock, SystemClock};

use super::durable::DurableStore;
use super::error::{StorageError, StorageResult};

/// How long a `DurableLatency` fault stalls a call.
pub const SIM_DURABLE_LATENCY_MS_DEFAULT: u64 = 10_000;

const OP_READ: &str = "durable_read";
const OP_WRITE: &str = "durable_write";
const OP_DELETE: &str = "durable_delete";

#[derive(Debug, Clone)]
struct StoredRecord {
    bytes: Vec<u8>,
    expires_at_ms: Option<u64>,
}

impl StoredRecord {
    fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|deadline| deadline <= now_ms)
    }
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    faults: AtomicU64,
}

/// Operation counts for a [`SimDurableStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimStoreStats {
    /// `get` calls
    pub reads: u64,
    /// `set` calls
    pub writes: u64,
    /// `delete` calls
    pub deletes: u64,
    /// Calls that hit an injected fault
    pub faults: u64,
}

// =============================================================================
// SimDurableStore
// =============================================================================

/// In-memory durable store.
///
/// `TigerStyle`:
/// - Deterministic via the injected clock and `FaultInjector`
/// - Thread-safe with `RwLock`
/// - Clones share the same records
#[derive(Debug, Clone)]
pub struct SimDurableStore {
    records: Arc<RwLock<HashMap<String, StoredRecord>>>,
    faults: Arc<FaultInjector>,
    clock: SharedClock,
    latency: Duration,
    counters: Arc<Counters>,
}

impl SimDurableStore {
    /// Store on the system clock with no faults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(FaultInjector::disabled()),
            clock: SystemClock::shared(),
            latency: Duration::from_millis(SIM_DURABLE_LATENCY_MS_DEFAULT),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Use a shared fault injector.
    #[must_use]
    pub fn with_fault_injector(mut self, faults: Arc<FaultInjector>) -> Self {
        self.faults = faults;
        self
    }

    /// Measure TTLs on `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Stall duration for `DurableLatency` faults.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get fault injector for inspection.
    #[must_use]
    pub fn fault_injector(&self) -> &Arc<FaultInjector> {
        &self.faults
    }

    /// Whether a live record exists, bypassing faults.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let now_ms = self.clock.now_ms();
        self.read()
            .get(key)
            .is_some_and(|record| !record.is_expired(now_ms))
    }

    /// Live record count, bypassing faults.
    #[must_use]
    pub fn len(&self) -> usize {
        let now_ms = self.clock.now_ms();
        self.read()
            .values()
            .filter(|record| !record.is_expired(now_ms))
            .count()
    }

    /// Whether no live records exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Operation counts.
    #[must_use]
    pub fn stats(&self) -> SimStoreStats {
        SimStoreStats {
            reads: self.counters.reads.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            faults: self.counters.faults.load(Ordering::Relaxed),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Roll for a fault. Latency faults stall and then let the call proceed.
    async fn maybe_inject_fault(&self, operation: &str, key: &str) -> Option<FaultType> {
        let fault = self.faults.should_inject_for(operation, key)?;
        self.counters.faults.fetch_add(1, Ordering::Relaxed);
        if fault == FaultType::DurableLatency {
            tokio::time::sleep(self.latency).await;
            return None;
        }
        Some(fault)
    }
}

impl Default for SimDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fault_error(fault: FaultType, operation: &str) -> StorageError {
    StorageError::simulated_fault(format!("{} during {operation}", fault.as_str()))
}

#[async_trait]
impl DurableStore for SimDurableStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        let fault = self.maybe_inject_fault(OP_READ, key).await;
        if let Some(fault) = fault {
            if fault != FaultType::DurableCorruption {
                return Err(fault_error(fault, OP_READ));
            }
        }

        let now_ms = self.clock.now_ms();
        let mut records = self.write();
        let Some(record) = records.get(key) else {
            return Ok(None);
        };
        if record.is_expired(now_ms) {
            records.remove(key);
            return Ok(None);
        }

        if fault == Some(FaultType::DurableCorruption) {
            let mut garbled = record.bytes.clone();
            garbled.reverse();
            garbled.insert(0, 0xFF);
            return Ok(Some(garbled));
        }
        Ok(Some(record.bytes.clone()))
    }

    #[tracing::instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StorageResult<()> {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        if let Some(fault) = self.maybe_inject_fault(OP_WRITE, key).await {
            return Err(fault_error(fault, OP_WRITE));
        }

        let now_ms = self.clock.now_ms();
        let expires_at_ms = ttl.map(|ttl| {
            now_ms.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
        });
        self.write().insert(
            key.to_string(),
            StoredRecord {
                bytes: value,
                expires_at_ms,
            },
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        if let Some(fault) = self.maybe_inject_fault(OP_DELETE, key).await {
            return Err(fault_error(fault, OP_DELETE));
        }

        let now_ms = self.clock.now_ms();
        Ok(self
            .write()
            .remove(key)
            .is_some_and(|record| !record.is_expired(now_ms)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::dst::{DeterministicRng, FaultConfig, FaultInjectorBuilder, SimClock};

    fn store_with(fault: FaultConfig) -> SimDurableStore {
        let faults = FaultInjectorBuilder::new(DeterministicRng::new(42))
            .with_fault(fault)
            .build();
        SimDurableStore::new().with_fault_injector(Arc::new(faults))
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = SimDurableStore::new();

        store.set("a", b"1".to_vec(), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), None);

        let stats = store.stats();
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.deletes, 2);
    }

    #[tokio::test]
    async fn test_ttl_on_sim_clock() {
        let clock = SimClock::new();
        let store = SimDurableStore::new().with_clock(clock.shared());

        store
            .set("a", b"1".to_vec(), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(store.contains_key("a"));

        clock.advance_secs(1);
        assert!(!store.contains_key("a"));
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = SimDurableStore::new();
        let other = store.clone();

        store.set("a", b"1".to_vec(), None).await.unwrap();
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn test_read_fault() {
        let store = store_with(FaultConfig::new(FaultType::DurableReadFail, 1.0));

        store.set("a", b"1".to_vec(), None).await.unwrap();
        let err = store.get("a").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.stats().faults, 1);
    }

    #[tokio::test]
    async fn test_write_fault_leaves_store_unchanged() {
        let store = store_with(FaultConfig::new(FaultType::DurableWriteFail, 1.0));

        assert!(store.set("a", b"1".to_vec(), None).await.is_err());
        assert!(!store.contains_key("a"));
    }

    #[tokio::test]
    async fn test_key_filtered_fault() {
        let store = store_with(
            FaultConfig::new(FaultType::DurableReadFail, 1.0).with_key_filter("secret"),
        );

        store.set("public", b"1".to_vec(), None).await.unwrap();
        store.set("secret", b"2".to_vec(), None).await.unwrap();

        assert!(store.get("public").await.is_ok());
        assert!(store.get("secret").await.is_err());
    }

    #[tokio::test]
    async fn test_corruption_garbles_bytes() {
        let store = store_with(FaultConfig::new(FaultType::DurableCorruption, 1.0));

        store.set("a", b"{\"v\":1}".to_vec(), None).await.unwrap();
        let bytes = store.get("a").await.unwrap().unwrap();
        assert_ne!(bytes, b"{\"v\":1}".to_vec());
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_latency_fault_stalls() {
        let store = store_with(FaultConfig::new(FaultType::DurableLatency, 1.0))
            .with_latency(Duration::from_millis(200));

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            store.set("a", b"1".to_vec(), None),
        )
        .await;
        assert!(result.is_err());
    }
}
