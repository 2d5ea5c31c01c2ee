//! Background Tasks
//!
//! A periodic tokio task with a `watch` shutdown channel. `stop()` returns
//! once the task has exited; dropping the handle aborts it.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to a periodic task.
#[derive(Debug)]
pub struct BackgroundTask {
    name: String,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundTask {
    /// Run `tick` every `period` on the current tokio runtime.
    ///
    /// The first tick fires one full period after spawning. Returns `None`
    /// (and logs a warning) when called outside a runtime.
    pub fn spawn<F>(name: impl Into<String>, period: Duration, mut tick: F) -> Option<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let Ok(runtime) = Handle::try_current() else {
            warn!(task = %name, "no tokio runtime, background task not started");
            return None;
        };
        debug_assert!(!period.is_zero(), "period must be positive");

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task_name = name.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick(),
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!(task = %task_name, "background task exited");
        });

        debug!(task = %name, period_ms = period.as_millis() as u64, "background task started");
        Some(Self {
            name,
            shutdown,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Signal shutdown and wait for the task to exit. Idempotent.
    pub async fn stop(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        let _ = self.shutdown.send(true);
        if let Err(err) = handle.await {
            if !err.is_cancelled() {
                warn!(task = %self.name, error = %err, "background task ended abnormally");
            }
        }
    }

    /// Whether `stop()` has not been called and the task has not finished.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        let handle = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spawn_without_runtime() {
        assert!(BackgroundTask::spawn("orphan", Duration::from_millis(10), || {}).is_none());
    }

    #[tokio::test]
    async fn test_ticks_and_stops() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);
        let task = BackgroundTask::spawn("ticker", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(task.is_running());
        task.stop().await;
        assert!(!task.is_running());

        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 1);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);

        // Second stop is a no-op.
        task.stop().await;
    }

    #[tokio::test]
    async fn test_drop_aborts() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);
        let task = BackgroundTask::spawn("dropped", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        drop(task);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
