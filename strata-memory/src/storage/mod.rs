//! Storage - Durable Store Trait and Implementations
//!
//! `TigerStyle`: Abstract storage with simulation-first testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │      DurableStore Trait      │
//! └──────────────────────────────┘
//!                ↑
//!                │
//!      ┌─────────┴─────────┐
//!      │  SimDurableStore  │
//!      │     (testing)     │
//!      └───────────────────┘
//! ```
//!
//! Production backends live outside this crate and implement
//! [`DurableStore`] against a real database.

mod durable;
mod error;
mod sim;

pub use durable::DurableStore;
pub use error::{StorageError, StorageResult};
pub use sim::{SimDurableStore, SimStoreStats, SIM_DURABLE_LATENCY_MS_DEFAULT};
