//! Periodic refresh for live project views.
//!
//! A view of a Running project re-reads its data on a fixed interval. The
//! timer only exists while the view is visible and the project is Running;
//! hiding the view cancels it and showing it again re-arms it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::AutomationMode;

/// Work performed on every refresh tick.
///
/// Resolves to the automation mode of the refreshed project; the timer stops
/// itself once that is no longer Running.
pub type RefreshCallback = Arc<dyn Fn() -> BoxFuture<'static, AutomationMode> + Send + Sync>;

/// Cancellable refresh timer.
///
/// Arming and re-arming must happen inside a tokio runtime.
pub struct AutoRefresh {
    interval: Duration,
    callback: RefreshCallback,
    mode: Arc<Mutex<AutomationMode>>,
    visible: bool,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AutoRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRefresh")
            .field("interval", &self.interval)
            .field("mode", &self.mode())
            .field("visible", &self.visible)
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl AutoRefresh {
    /// Create an idle timer. Nothing runs until [`arm`](Self::arm).
    pub fn new(interval: Duration, callback: RefreshCallback) -> Self {
        Self {
            interval,
            callback,
            mode: Arc::new(Mutex::new(AutomationMode::Paused)),
            visible: true,
            task: None,
        }
    }

    /// Mode the timer last saw, from [`arm`](Self::arm) or the latest tick.
    pub fn mode(&self) -> AutomationMode {
        *self.mode.lock()
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restart the timer for a project in `mode`.
    ///
    /// Any existing timer is cancelled first. A new one starts only when the
    /// project is Running and the view is visible.
    pub fn arm(&mut self, mode: AutomationMode) {
        *self.mode.lock() = mode;
        self.cancel();

        if mode != AutomationMode::Running || !self.visible || self.interval.is_zero() {
            tracing::debug!(?mode, visible = self.visible, "Auto-refresh not armed");
            return;
        }

        let interval = self.interval;
        let callback = Arc::clone(&self.callback);
        let shared_mode = Arc::clone(&self.mode);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tracing::debug!("Auto-refresh tick");
                let mode = callback().await;
                *shared_mode.lock() = mode;
                if mode != AutomationMode::Running {
                    tracing::debug!(?mode, "Auto-refresh stopped");
                    break;
                }
            }
        }));
    }

    /// Track view visibility, pausing the timer while hidden.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.arm(self.mode());
        } else {
            self.cancel();
        }
    }

    /// Stop the timer without forgetting the mode.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait until the timer stops by itself. Returns at once when not armed.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
        }
    }

    /// Whether a timer is currently scheduled.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}
