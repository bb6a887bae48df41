//! Motion-sensor arming timers.
//!
//! A sensor that gains power does not arm immediately: a per-sensor
//! single-shot timer runs first, and only when it elapses (with power still
//! present, which the callback re-checks) does the sensor arm. The scheduler
//! owns those timers: at most one per sensor, cancellable when the sensor
//! loses power or leaves the installation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

use homecircuit_domain::id::DeviceId;

/// One single-shot arming timer per sensor.
#[derive(Clone, Default)]
pub struct SensorScheduler {
    pending: Arc<Mutex<HashMap<DeviceId, AbortHandle>>>,
}

impl SensorScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the arming timer for `device`, running `on_elapsed` after
    /// `delay`. A sensor with a timer already running is left alone;
    /// returns whether a new timer was started.
    pub fn schedule<F>(&self, device: DeviceId, delay: Duration, on_elapsed: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.lock();
        if pending.contains_key(&device) {
            return false;
        }
        let registry = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister before the callback so it may schedule again.
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&device);
            on_elapsed.await;
        });
        pending.insert(device, handle.abort_handle());
        true
    }

    /// Abort the pending timer for `device`. Returns whether one existed.
    pub fn cancel(&self, device: DeviceId) -> bool {
        match self.lock().remove(&device) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending timer.
    pub fn cancel_all(&self) {
        for (_, handle) in self.lock().drain() {
            handle.abort();
        }
    }

    /// Whether `device` has a timer running.
    #[must_use]
    pub fn is_pending(&self, device: DeviceId) -> bool {
        self.lock().contains_key(&device)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DeviceId, AbortHandle>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
