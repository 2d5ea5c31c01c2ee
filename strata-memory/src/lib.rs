//! # Strata Memory
//!
//! Multi-tier caching and hierarchical memory for agent workloads, tested
//! with deterministic simulation.
//!
//! ## Features
//!
//! - **Tiered Cache**: Ordered L1/L2/L3 tiers with per-tier TTL and LRU, LFU or FIFO eviction
//! - **Promotion on Hit**: Reads found in a lower tier are copied into every higher one
//! - **Single-Flight Prefetch**: Concurrent prefetches of one key run the loader once
//! - **Importance Routing**: Working, short-term and durable long-term memory chosen by importance
//! - **Garbage Collection**: Pressure-gated removal of old, irrelevant or idle items
//! - **Deterministic Testing**: Simulated clock and seeded durable-store faults
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use strata_memory::{CacheConfig, CacheManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache: CacheManager<String> = CacheManager::new(CacheConfig::default())?;
//!
//! cache.set("user:42", "Ada".to_string(), Some(Duration::from_secs(30))).await?;
//! assert_eq!(cache.get("user:42").await?, Some("Ada".to_string()));
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hits, 1);
//! cache.destroy().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      CacheManager                        │
//! │   get → L1 → L2 → L3 (promote on hit)   set → all tiers  │
//! ├─────────────────────────────────────────────────────────┤
//! │  Tier (L1, LRU)  │  Tier (L2, LFU)  │  Tier (L3, LRU)   │
//! ├─────────────────────────────────────────────────────────┤
//! │                   HierarchicalMemory                     │
//! │  working (Tier) │ short-term (Tier) │ long-term (Durable)│
//! ├─────────────────────────────────────────────────────────┤
//! │  GarbageCollector        │ age / relevance / activity    │
//! ├─────────────────────────────────────────────────────────┤
//! │  DST Framework           │ SimClock + fault injection    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! - [`Tier`] - One bounded, TTL-aware store with a replacement policy
//! - [`CacheManager`] - Ordered tiers, promotion, prefetch and events
//! - [`HierarchicalMemory`] - Importance-routed memory over a [`DurableStore`]
//! - [`GarbageCollector`] - Periodic policy-driven removal
//!
//! ## Simulation-First Philosophy
//!
//! > "If you're not testing with fault injection, you're not testing."
//!
//! ```rust
//! use strata_memory::dst::{FaultConfig, FaultType, SimConfig, Simulation};
//! use strata_memory::{CacheError, HierarchyConfig, Importance};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! Simulation::new(SimConfig::with_seed(42))
//!     .with_fault(FaultConfig::new(FaultType::DurableWriteFail, 1.0))
//!     .run(|env| async move {
//!         let memory = env.hierarchy::<String>(HierarchyConfig::default())?;
//!         // The durable write fails; the fast tiers still hold the value.
//!         memory.remember("fact", "sky is blue".into(), Importance::Critical).await?;
//!         assert_eq!(memory.recall("fact").await?, Some("sky is blue".into()));
//!         Ok::<(), CacheError>(())
//!     })
//!     .await
//!     .unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod dst;
pub mod entry;
pub mod error;
pub mod events;
pub mod gc;
pub mod hierarchy;
pub mod item;
pub mod manager;
pub mod storage;
pub mod task;
pub mod telemetry;
pub mod tier;

// Re-export common types
pub use constants::*;
pub use entry::{estimate_size, validate_key, Entry, EntryMeta};
pub use error::{CacheError, CacheResult};
pub use events::{CacheEvent, CacheEventKind, EventBus};
pub use item::{Importance, MemoryItem, MemoryTier};
pub use task::BackgroundTask;

// Cache exports
pub use manager::{effective_ttl, CacheConfig, CacheManager, CacheStats, ManagedTierStats, PrefetchOutcome};
pub use tier::{EvictionStrategy, Tier, TierConfig, TierStats};

// Memory exports
pub use gc::{GarbageCollector, GcConfig, GcReport, RemovalReason};
pub use hierarchy::{HierarchicalMemory, HierarchyConfig, HierarchyStats};

// Storage exports
pub use storage::{DurableStore, SimDurableStore, StorageError, StorageResult};

// Clock exports
pub use strata_core::{Clock, SharedClock, SimClock, SystemClock};
