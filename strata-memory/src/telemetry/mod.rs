//! Tracing Setup and Event Logging
//!
//! `TigerStyle`: Optional telemetry with graceful fallback. Never panics if a
//! subscriber is already installed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strata_memory::telemetry::{init_tracing, TelemetryConfig};
//!
//! // Initialize with defaults (reads from env vars)
//! init_tracing(TelemetryConfig::default()).expect("tracing init");
//!
//! // Or configure explicitly
//! let config = TelemetryConfig::builder()
//!     .service_name("agent-cache")
//!     .default_filter("strata_memory=debug")
//!     .with_target(false)
//!     .build();
//! let _ = init_tracing(config);
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG` - Filter directives; overrides the configured default
//! - `STRATA_SERVICE_NAME` - Service name (default: "strata-memory")

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::events::{CacheEvent, CacheEventKind};

/// Default filter when `RUST_LOG` is unset.
pub const TELEMETRY_FILTER_DEFAULT: &str = "info";

/// Service name recorded when tracing is initialized.
pub const TELEMETRY_SERVICE_NAME_DEFAULT: &str = "strata-memory";

/// Telemetry configuration errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber installation failed (usually one is already installed)
    #[error("tracing initialization failed: {reason}")]
    InitFailed {
        /// The reason for the failure
        reason: String,
    },

    /// Filter directives could not be parsed
    #[error("invalid filter: {filter}")]
    InvalidFilter {
        /// The rejected directives
        filter: String,
    },
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Configuration for the `fmt` subscriber
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded at startup
    pub service_name: String,

    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Include the event target (module path)
    pub with_target: bool,

    /// Colored output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("STRATA_SERVICE_NAME")
                .unwrap_or_else(|_| TELEMETRY_SERVICE_NAME_DEFAULT.to_string()),
            default_filter: TELEMETRY_FILTER_DEFAULT.to_string(),
            with_target: true,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create a new builder for `TelemetryConfig`
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Filter from `RUST_LOG`, falling back to `default_filter`.
    fn filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_filter).map_err(|_| TelemetryError::InvalidFilter {
            filter: self.default_filter.clone(),
        })
    }
}

/// Builder for `TelemetryConfig`
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    default_filter: Option<String>,
    with_target: Option<bool>,
    ansi: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Set the service name
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the fallback filter directives
    #[must_use]
    pub fn default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = Some(filter.into());
        self
    }

    /// Include or omit event targets
    #[must_use]
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = Some(with_target);
        self
    }

    /// Enable or disable colors
    #[must_use]
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = Some(ansi);
        self
    }

    /// Build the `TelemetryConfig`
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let default = TelemetryConfig::default();
        TelemetryConfig {
            service_name: self.service_name.unwrap_or(default.service_name),
            default_filter: self.default_filter.unwrap_or(default.default_filter),
            with_target: self.with_target.unwrap_or(default.with_target),
            ansi: self.ansi.unwrap_or(default.ansi),
        }
    }
}

/// Install a global `fmt` subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for unparsable directives and
/// `TelemetryError::InitFailed` if a global subscriber already exists.
pub fn init_tracing(config: TelemetryConfig) -> Result<()> {
    let filter = config.filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| TelemetryError::InitFailed {
            reason: e.to_string(),
        })?;

    tracing::info!(service_name = %config.service_name, "tracing initialized");
    Ok(())
}

/// Forward cache events to `tracing` until the channel closes.
///
/// Evictions and expirations log at `debug`, everything else at `trace`.
/// Lag is reported at `warn`. The task returns the number of events seen.
pub fn spawn_event_logger(mut events: broadcast::Receiver<CacheEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut seen = 0_u64;
        loop {
            match events.recv().await {
                Ok(event) => {
                    seen += 1;
                    log_event(&event);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "cache event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        seen
    })
}

fn log_event(event: &CacheEvent) {
    let tier = event.tier.as_deref().unwrap_or("*");
    let key = event.key.as_deref().unwrap_or("");
    match event.kind {
        CacheEventKind::Evict | CacheEventKind::Expire | CacheEventKind::Clear => {
            tracing::debug!(tier, key, kind = %event.kind, "cache event");
        }
        _ => tracing::trace!(tier, key, kind = %event.kind, "cache event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert!(!config.service_name.is_empty());
        assert_eq!(config.default_filter, TELEMETRY_FILTER_DEFAULT);
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::builder()
            .service_name("test-service")
            .default_filter("debug")
            .with_target(false)
            .ansi(false)
            .build();

        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.default_filter, "debug");
        assert!(!config.with_target);
        assert!(!config.ansi);
    }

    #[test]
    fn test_second_init_does_not_panic() {
        let config = TelemetryConfig::builder().ansi(false).build();
        let _ = init_tracing(config.clone());
        assert!(init_tracing(config).is_err());
    }

    #[tokio::test]
    async fn test_event_logger_counts_until_closed() {
        let bus = EventBus::new(8);
        let logger = spawn_event_logger(bus.subscribe());

        bus.emit(CacheEvent::global("a", CacheEventKind::Miss));
        bus.emit(CacheEvent::tier("l1", Some("b"), CacheEventKind::Evict));
        drop(bus);

        assert_eq!(logger.await.unwrap(), 2);
    }
}
