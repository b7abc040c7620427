//! Battery change listener management
//!
//! Owns the single platform event subscription. The subscription state is
//! two-valued (Idle/Active) and lives behind one mutex shared with the
//! platform's delivery callback, which may run on a thread the platform
//! owns.

use crate::BatteryError;
use crate::status::{BatteryStatus, normalize};
use battkit_hal::{PowerEvent, PowerPlatform, RegistrationHandle};
use std::sync::{Arc, Mutex, RwLock};

/// Sink receiving normalized status notifications
///
/// Sinks may run under the manager's internal locks and must not call back
/// into the manager.
pub type StatusSink = Box<dyn Fn(&BatteryStatus) + Send + Sync>;

/// Subscription state, guarded by one mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerState {
    Idle,
    Active(RegistrationHandle),
}

/// Core shared between the manager and the platform delivery callback
struct ListenerCore {
    platform: Arc<dyn PowerPlatform>,
    state: Mutex<ListenerState>,
    sinks: RwLock<Vec<StatusSink>>,
}

impl ListenerCore {
    /// Read and normalize the current telemetry
    fn status_once(&self) -> Result<BatteryStatus, BatteryError> {
        let raw = self
            .platform
            .read_telemetry()
            .map_err(BatteryError::Telemetry)?;
        normalize(&raw)
    }

    /// Fan a status out to every registered sink
    fn notify(&self, status: &BatteryStatus) {
        if let Ok(sinks) = self.sinks.read() {
            for sink in sinks.iter() {
                sink(status);
            }
        }
    }

    /// Entry point for platform event delivery
    ///
    /// Every event type triggers a full re-read, not a delta. Events that
    /// race with unsubscription are dropped here without error.
    fn handle_event(&self, event: PowerEvent) {
        let active = self
            .state
            .lock()
            .map(|state| matches!(*state, ListenerState::Active(_)))
            .unwrap_or(false);

        if !active {
            tracing::debug!("Ignoring {:?} delivered while idle", event);
            return;
        }

        match self.status_once() {
            Ok(status) => {
                tracing::debug!("Battery event {:?}: level {}", event, status.level);
                self.notify(&status);
            }
            Err(e) => tracing::warn!("Dropping battery event {:?}: {}", event, e),
        }
    }
}

/// Manages the single battery event subscription
///
/// At most one platform registration exists per manager; `subscribe` is
/// idempotent and `unsubscribe` fails open so a deregistration error can
/// never leave a subscription the caller believes is stopped.
pub struct ListenerManager {
    core: Arc<ListenerCore>,
}

impl ListenerManager {
    pub fn new(platform: Arc<dyn PowerPlatform>) -> Self {
        Self {
            core: Arc::new(ListenerCore {
                platform,
                state: Mutex::new(ListenerState::Idle),
                sinks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a notification sink
    pub fn add_sink(&self, sink: StatusSink) {
        if let Ok(mut sinks) = self.core.sinks.write() {
            sinks.push(sink);
        }
    }

    /// Drop the most recently added sink
    ///
    /// Used to back out a sink whose registration attempt failed.
    pub(crate) fn pop_sink(&self) {
        if let Ok(mut sinks) = self.core.sinks.write() {
            sinks.pop();
        }
    }

    /// Drop all notification sinks
    pub fn clear_sinks(&self) {
        if let Ok(mut sinks) = self.core.sinks.write() {
            sinks.clear();
        }
    }

    /// One-shot status read, independent of subscription state
    pub fn status_once(&self) -> Result<BatteryStatus, BatteryError> {
        self.core.status_once()
    }

    /// Whether a platform registration is currently active
    pub fn is_active(&self) -> bool {
        self.core
            .state
            .lock()
            .map(|state| matches!(*state, ListenerState::Active(_)))
            .unwrap_or(false)
    }

    /// Begin receiving battery events from the platform
    ///
    /// On the Idle -> Active transition one synthetic notification with the
    /// current status is emitted so subscribers get an initial value without
    /// waiting for a real event. Calling while already Active is a no-op:
    /// no second registration, no duplicate initial notification.
    pub fn subscribe(&self) -> Result<(), BatteryError> {
        let mut state = match self.core.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let ListenerState::Active(handle) = *state {
            tracing::debug!("Already subscribed (handle {})", handle.value());
            return Ok(());
        }

        let core = Arc::clone(&self.core);
        let handle = self
            .core
            .platform
            .register(
                PowerEvent::all(),
                Arc::new(move |event| core.handle_event(event)),
            )
            .map_err(BatteryError::RegistrationFailed)?;

        *state = ListenerState::Active(handle);
        tracing::info!("Battery listener active (handle {})", handle.value());

        // Initial synthetic notification; emitted before the state lock is
        // released so no real delivery can get in front of it
        match self.core.status_once() {
            Ok(status) => self.core.notify(&status),
            Err(e) => tracing::warn!("Skipping initial battery notification: {}", e),
        }

        Ok(())
    }

    /// Stop receiving battery events
    ///
    /// Idempotent; calling while Idle does nothing and touches no platform
    /// API. A platform deregistration failure is reported but the logical
    /// state still moves to Idle.
    pub fn unsubscribe(&self) -> Result<(), BatteryError> {
        let handle = {
            let mut state = match self.core.state.lock() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };

            match *state {
                ListenerState::Idle => return Ok(()),
                ListenerState::Active(handle) => {
                    // Fail open: go Idle before asking the platform, so a
                    // deregistration error cannot leave a dangling subscription
                    *state = ListenerState::Idle;
                    handle
                }
            }
        };

        match self.core.platform.deregister(handle) {
            Ok(()) => {
                tracing::info!("Battery listener stopped (handle {})", handle.value());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Deregistration failed, listener forced idle: {}", e);
                Err(BatteryError::DeregistrationFailed(e))
            }
        }
    }
}

impl Drop for ListenerManager {
    fn drop(&mut self) {
        // Teardown must never leak a platform registration
        if let Err(e) = self.unsubscribe() {
            tracing::warn!("Teardown unsubscribe failed: {}", e);
        }
    }
}
