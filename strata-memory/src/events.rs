//! Cache Events
//!
//! A bounded `tokio::sync::broadcast` channel. Slow subscribers lose the
//! oldest events (`RecvError::Lagged`); dropping a receiver unsubscribes.

use std::fmt;

use tokio::sync::broadcast;

use crate::constants::CACHE_EVENT_CHANNEL_CAPACITY_DEFAULT;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEventKind {
    /// Successful lookup
    Hit,
    /// Lookup found nothing (tier-level, or global when `tier` is `None`)
    Miss,
    /// Value written
    Set,
    /// Key removed by a caller
    Delete,
    /// Entry removed because its TTL passed
    Expire,
    /// Entry removed to make room
    Evict,
    /// Tier flushed
    Clear,
}

impl fmt::Display for CacheEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Expire => "expire",
            Self::Evict => "evict",
            Self::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    /// Tier that produced the event; `None` for manager-wide events
    pub tier: Option<String>,
    /// Affected key; `None` for `Clear`
    pub key: Option<String>,
    /// Event kind
    pub kind: CacheEventKind,
}

impl CacheEvent {
    pub(crate) fn tier(tier: &str, key: Option<&str>, kind: CacheEventKind) -> Self {
        Self {
            tier: Some(tier.to_string()),
            key: key.map(str::to_string),
            kind,
        }
    }

    pub(crate) fn global(key: &str, kind: CacheEventKind) -> Self {
        Self {
            tier: None,
            key: Some(key.to_string()),
            kind,
        }
    }
}

/// Sending half shared by every tier of one manager.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    /// Create a bus that buffers `capacity` events per subscriber.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "event capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// New receiver that sees events sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    /// Current subscriber count.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn emit(&self, event: CacheEvent) {
        // No subscribers is the common case.
        if self.sender.receiver_count() > 0 {
            let _ = self.sender.send(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(CACHE_EVENT_CHANNEL_CAPACITY_DEFAULT)
    }
}
