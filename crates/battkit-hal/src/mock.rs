//! Mock platform for testing without real hardware
//!
//! Allows the plugin layer to be exercised on desktop systems with no
//! battery: telemetry is settable, event delivery is driven manually with
//! [`MockPlatform::emit`], and registration failures can be injected.
//!
//! # Usage
//!
//! ```
//! use battkit_hal::mock::MockPlatform;
//! use battkit_hal::{ChargeState, PowerPlatform};
//!
//! let platform = MockPlatform::new();
//! platform.set_telemetry(42, 100, ChargeState::Charging);
//! assert_eq!(platform.read_telemetry().unwrap().level, 42);
//! ```

use crate::platform::{EventSink, PlatformError, PowerEvent, PowerPlatform, RegistrationHandle};
use crate::telemetry::{ChargeState, RawTelemetry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Shared mock state for synchronized access
#[derive(Debug)]
pub struct MockState {
    /// Current raw telemetry
    pub telemetry: RawTelemetry,
    /// Next register() call fails
    pub fail_registration: bool,
    /// Next deregister() call fails
    pub fail_deregistration: bool,
}

impl MockState {
    pub fn new() -> Self {
        Self {
            telemetry: RawTelemetry::new(85, 100, ChargeState::Discharging),
            fail_registration: false,
            fail_deregistration: false,
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

struct MockRegistration {
    events: Vec<PowerEvent>,
    sink: EventSink,
}

/// Mock power platform for testing
pub struct MockPlatform {
    state: Arc<RwLock<MockState>>,
    registrations: Mutex<HashMap<u64, MockRegistration>>,
    next_handle: AtomicU64,
    register_calls: AtomicUsize,
    deregister_calls: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::new())),
            registrations: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            register_calls: AtomicUsize::new(0),
            deregister_calls: AtomicUsize::new(0),
        }
    }

    /// Get shared state for manipulation in tests
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        Arc::clone(&self.state)
    }

    /// Set the raw telemetry returned by subsequent reads
    pub fn set_telemetry(&self, level: i32, scale: i32, state: ChargeState) {
        if let Ok(mut mock) = self.state.write() {
            mock.telemetry = RawTelemetry::new(level, scale, state);
        }
    }

    /// Simulate a charging state flip without changing the level
    pub fn set_charge_state(&self, state: ChargeState) {
        if let Ok(mut mock) = self.state.write() {
            mock.telemetry.state = state;
        }
    }

    /// Make the next register() call fail
    pub fn fail_registration(&self, fail: bool) {
        if let Ok(mut mock) = self.state.write() {
            mock.fail_registration = fail;
        }
    }

    /// Make the next deregister() call fail
    pub fn fail_deregistration(&self, fail: bool) {
        if let Ok(mut mock) = self.state.write() {
            mock.fail_deregistration = fail;
        }
    }

    /// Deliver an event to every registration subscribed to it
    pub fn emit(&self, event: PowerEvent) {
        let sinks: Vec<EventSink> = self
            .registrations
            .lock()
            .map(|registrations| {
                registrations
                    .values()
                    .filter(|r| r.events.contains(&event))
                    .map(|r| Arc::clone(&r.sink))
                    .collect()
            })
            .unwrap_or_default();

        for sink in sinks {
            sink(event);
        }
    }

    /// Number of currently active registrations
    pub fn active_registrations(&self) -> usize {
        self.registrations.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Total register() calls observed
    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::Relaxed)
    }

    /// Total deregister() calls observed
    pub fn deregister_calls(&self) -> usize {
        self.deregister_calls.load(Ordering::Relaxed)
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerPlatform for MockPlatform {
    fn read_telemetry(&self) -> Result<RawTelemetry, PlatformError> {
        self.state
            .read()
            .map(|s| s.telemetry)
            .map_err(|e| PlatformError::Telemetry(e.to_string()))
    }

    fn register(
        &self,
        events: &[PowerEvent],
        sink: EventSink,
    ) -> Result<RegistrationHandle, PlatformError> {
        self.register_calls.fetch_add(1, Ordering::Relaxed);

        let refuse = self.state.read().map(|s| s.fail_registration).unwrap_or(false);
        if refuse {
            return Err(PlatformError::Registration("mock refused".into()));
        }

        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut registrations) = self.registrations.lock() {
            registrations.insert(
                id,
                MockRegistration {
                    events: events.to_vec(),
                    sink,
                },
            );
        }
        tracing::debug!("[MOCK] Registered power events, handle {}", id);

        Ok(RegistrationHandle::new(id))
    }

    fn deregister(&self, handle: RegistrationHandle) -> Result<(), PlatformError> {
        self.deregister_calls.fetch_add(1, Ordering::Relaxed);

        let refuse = self
            .state
            .read()
            .map(|s| s.fail_deregistration)
            .unwrap_or(false);
        if refuse {
            // Registration stays in place so late deliveries can be simulated
            return Err(PlatformError::Deregistration("mock refused".into()));
        }

        let removed = self
            .registrations
            .lock()
            .map(|mut registrations| registrations.remove(&handle.value()).is_some())
            .unwrap_or(false);

        if removed {
            tracing::debug!("[MOCK] Deregistered handle {}", handle.value());
            Ok(())
        } else {
            Err(PlatformError::Deregistration(format!(
                "unknown registration handle {}",
                handle.value()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_mock_default_telemetry() {
        let platform = MockPlatform::new();
        let raw = platform.read_telemetry().unwrap();
        assert_eq!(raw.level, 85);
        assert_eq!(raw.scale, 100);
        assert_eq!(raw.state, ChargeState::Discharging);
    }

    #[test]
    fn test_mock_set_telemetry() {
        let platform = MockPlatform::new();
        platform.set_telemetry(15, 100, ChargeState::NotCharging);

        let raw = platform.read_telemetry().unwrap();
        assert_eq!(raw.level, 15);
        assert_eq!(raw.state, ChargeState::NotCharging);
    }

    #[test]
    fn test_mock_emit_respects_subscription() {
        let platform = MockPlatform::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let sink_hits = Arc::clone(&hits);
        platform
            .register(
                &[PowerEvent::BatteryChanged],
                Arc::new(move |_| {
                    sink_hits.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();

        platform.emit(PowerEvent::BatteryChanged);
        platform.emit(PowerEvent::BatteryLow);

        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_mock_registration_failure() {
        let platform = MockPlatform::new();
        platform.fail_registration(true);

        let result = platform.register(PowerEvent::all(), Arc::new(|_| {}));
        assert!(matches!(result, Err(PlatformError::Registration(_))));
        assert_eq!(platform.register_calls(), 1);
        assert_eq!(platform.active_registrations(), 0);
    }

    #[test]
    fn test_mock_deregistration_failure_keeps_delivery() {
        let platform = MockPlatform::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let sink_hits = Arc::clone(&hits);
        let handle = platform
            .register(
                &[PowerEvent::BatteryChanged],
                Arc::new(move |_| {
                    sink_hits.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();

        platform.fail_deregistration(true);
        assert!(platform.deregister(handle).is_err());

        // Platform still delivers after the failed deregistration
        platform.emit(PowerEvent::BatteryChanged);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_mock_deregister_removes() {
        let platform = MockPlatform::new();
        let handle = platform
            .register(PowerEvent::all(), Arc::new(|_| {}))
            .unwrap();

        assert_eq!(platform.active_registrations(), 1);
        platform.deregister(handle).unwrap();
        assert_eq!(platform.active_registrations(), 0);
        assert!(platform.deregister(handle).is_err());
    }
}
