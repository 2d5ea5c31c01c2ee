//! Integration Tests for HierarchicalMemory
//!
//! Importance routing, promotion and durable-store failure handling, run
//! inside the simulation harness so faults and time are reproducible.

use std::sync::Arc;
use std::time::Duration;

use strata_memory::dst::{FaultConfig, FaultType, SimConfig, Simulation};
use strata_memory::{
    CacheError, DurableStore, HierarchicalMemory, HierarchyConfig, Importance, MemoryItem,
    MemoryTier, SimDurableStore,
};

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_importance_routing_table() {
    let sim = Simulation::new(SimConfig::with_seed(42));

    sim.run(|env| async move {
        let memory = env.hierarchy::<String>(HierarchyConfig::default())?;

        memory.remember("c", "critical".into(), Importance::Critical).await?;
        memory.remember("h", "high".into(), Importance::High).await?;
        memory.remember("n", "normal".into(), Importance::Normal).await?;
        memory.remember("l", "low".into(), Importance::Low).await?;

        use MemoryTier::{LongTerm, ShortTerm, Working};
        assert_eq!(memory.tiers_holding("c").await?, vec![Working, ShortTerm, LongTerm]);
        assert_eq!(memory.tiers_holding("h").await?, vec![ShortTerm, LongTerm]);
        assert_eq!(memory.tiers_holding("n").await?, vec![Working, ShortTerm]);
        assert_eq!(memory.tiers_holding("l").await?, vec![Working]);
        assert_eq!(env.store.len(), 2);
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_critical_memory_survives_tier_flush() {
    let sim = Simulation::new(SimConfig::with_seed(11));

    sim.run(|env| async move {
        let memory = env.hierarchy::<String>(HierarchyConfig::default())?;
        memory
            .remember("user:name", "Ada".into(), Importance::Critical)
            .await?;
        memory
            .remember("scratch", "tmp".into(), Importance::Normal)
            .await?;

        assert!(memory.clear_tier(MemoryTier::Working));
        assert!(memory.clear_tier(MemoryTier::ShortTerm));
        assert!(!memory.clear_tier(MemoryTier::LongTerm));

        assert_eq!(memory.recall("user:name").await?, Some("Ada".into()));
        assert_eq!(memory.recall("scratch").await?, None);

        // The long-term hit was copied back into both fast tiers.
        assert!(memory.working().contains("user:name"));
        assert!(memory.short_term().contains("user:name"));
        assert_eq!(memory.stats().promotions, 2);
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_low_importance_expires_first() {
    let sim = Simulation::new(SimConfig::with_seed(5));

    sim.run(|env| async move {
        let config = HierarchyConfig::default();
        let low_ttl_ms = config.low_ttl_ms;
        let memory = env.hierarchy::<u32>(config)?;

        memory.remember("low", 1, Importance::Low).await?;
        memory.remember("normal", 2, Importance::Normal).await?;

        env.advance_time_ms(low_ttl_ms);
        assert_eq!(memory.recall("low").await?, None);
        assert_eq!(memory.recall("normal").await?, Some(2));
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_downgrade_removes_durable_copy() {
    let sim = Simulation::new(SimConfig::with_seed(8));

    sim.run(|env| async move {
        let memory = env.hierarchy::<String>(HierarchyConfig::default())?;

        memory.remember("k", "v1".into(), Importance::High).await?;
        assert_eq!(env.store.len(), 1);

        memory.remember("k", "v2".into(), Importance::Low).await?;
        assert!(env.store.is_empty());
        assert_eq!(memory.tiers_holding("k").await?, vec![MemoryTier::Working]);
        assert_eq!(memory.recall("k").await?, Some("v2".into()));

        // Keys never written durably do not reach the store at all.
        let deletes = env.store.stats().deletes;
        memory.remember("fresh", "v".into(), Importance::Low).await?;
        memory.remember("k", "v3".into(), Importance::Normal).await?;
        assert_eq!(env.store.stats().deletes, deletes);
        assert_eq!(memory.stats().durable_deletes, 1);
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_custom_relevance_round_trips_through_long_term() {
    let sim = Simulation::new(SimConfig::with_seed(21));

    sim.run(|env| async move {
        let memory = env.hierarchy::<String>(HierarchyConfig::default())?;
        let item = MemoryItem::new("fact".to_string(), Importance::High, env.now_ms())
            .with_relevance(0.9);
        memory.remember_item("k", item).await?;

        memory.clear_tier(MemoryTier::ShortTerm);
        let recalled = memory.recall_item("k").await?.ok_or(CacheError::invalid_key("k"))?;
        assert_eq!(recalled.importance, Importance::High);
        assert!((recalled.relevance - 0.9).abs() < f64::EPSILON);
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

// =============================================================================
// Forget
// =============================================================================

#[tokio::test]
async fn test_forget_clears_every_tier() {
    let sim = Simulation::new(SimConfig::with_seed(3));

    sim.run(|env| async move {
        let memory = env.hierarchy::<u8>(HierarchyConfig::default())?;
        memory.remember("k", 1, Importance::Critical).await?;

        assert!(memory.forget("k").await?);
        assert!(memory.tiers_holding("k").await?.is_empty());
        assert!(!memory.forget("k").await?);
        Ok::<(), CacheError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_forget_continues_past_durable_failure() {
    let env = Simulation::new(SimConfig::with_seed(9))
        .with_fault(FaultConfig::new(FaultType::DurableDeleteFail, 1.0))
        .build();
    let memory = env.hierarchy::<u8>(HierarchyConfig::default()).unwrap();
    memory.remember("k", 1, Importance::Normal).await.unwrap();

    assert!(memory.forget("k").await.unwrap());
    assert!(!memory.working().contains("k"));
    assert!(!memory.short_term().contains("k"));
    assert!(memory.stats().durable_failures >= 1);
}

// =============================================================================
// Durable failures
// =============================================================================

#[tokio::test]
async fn test_durable_outage_degrades_to_fast_tiers() {
    let env = Simulation::new(SimConfig::with_seed(77))
        .with_durable_faults(1.0)
        .build();
    let memory = env.hierarchy::<String>(HierarchyConfig::default()).unwrap();

    memory
        .remember("k", "v".into(), Importance::Critical)
        .await
        .unwrap();
    assert!(env.store.is_empty());
    assert_eq!(memory.recall("k").await.unwrap(), Some("v".into()));

    memory.clear_tier(MemoryTier::Working);
    memory.clear_tier(MemoryTier::ShortTerm);
    assert_eq!(memory.recall("k").await.unwrap(), None);
    assert!(memory.stats().durable_failures >= 2);
}

#[tokio::test]
async fn test_corrupted_durable_record_is_a_miss() {
    let env = Simulation::new(SimConfig::with_seed(4))
        .with_fault(FaultConfig::new(FaultType::DurableCorruption, 1.0))
        .build();
    let memory = env.hierarchy::<String>(HierarchyConfig::default()).unwrap();

    memory
        .remember("k", "v".into(), Importance::High)
        .await
        .unwrap();
    assert_eq!(env.store.len(), 1);

    memory.clear_tier(MemoryTier::ShortTerm);
    assert_eq!(memory.recall("k").await.unwrap(), None);
    assert_eq!(memory.stats().durable_failures, 1);
}

#[tokio::test]
async fn test_slow_durable_store_is_bounded_by_timeout() {
    let store = SimDurableStore::new()
        .with_latency(Duration::from_millis(500))
        .with_fault_injector(Arc::new(
            strata_memory::dst::FaultInjectorBuilder::new(
                strata_memory::dst::DeterministicRng::new(1),
            )
            .with_fault(FaultConfig::new(FaultType::DurableLatency, 1.0))
            .build(),
        ));
    let memory: HierarchicalMemory<u8> = HierarchicalMemory::new(
        HierarchyConfig::default().with_durable_timeout(Duration::from_millis(20)),
        Arc::new(store.clone()),
    )
    .unwrap();

    let started = std::time::Instant::now();
    memory.remember("k", 1, Importance::Critical).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(memory.recall("k").await.unwrap(), Some(1));
    assert_eq!(memory.stats().durable_failures, 1);
    assert!(store.get("strata:ltm:k").await.unwrap_or(None).is_none());
}

#[tokio::test]
async fn test_same_seed_same_failures() {
    async fn failures(seed: u64) -> u64 {
        let env = Simulation::new(SimConfig::with_seed(seed))
            .with_durable_faults(0.5)
            .build();
        let memory = env.hierarchy::<u32>(HierarchyConfig::default()).unwrap();
        for i in 0..50u32 {
            memory
                .remember(&format!("k{i}"), i, Importance::Critical)
                .await
                .unwrap();
        }
        memory.stats().durable_failures
    }

    assert_eq!(failures(1234).await, failures(1234).await);
}
