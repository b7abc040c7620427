//! Power platform abstraction
//!
//! The plugin layer never talks to the operating system directly; it goes
//! through [`PowerPlatform`] so that tests can substitute a mock backend
//! without a live device.

use crate::RawTelemetry;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Event registration failed: {0}")]
    Registration(String),

    #[error("Event deregistration failed: {0}")]
    Deregistration(String),

    #[error("Telemetry read failed: {0}")]
    Telemetry(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Power-related events the platform can deliver
///
/// Events carry no payload; each delivery means "re-read telemetry now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerEvent {
    BatteryChanged,
    PowerConnected,
    PowerDisconnected,
    BatteryLow,
    BatteryOkay,
}

impl PowerEvent {
    /// The full set of deliverable events
    pub fn all() -> &'static [PowerEvent] {
        &[
            PowerEvent::BatteryChanged,
            PowerEvent::PowerConnected,
            PowerEvent::PowerDisconnected,
            PowerEvent::BatteryLow,
            PowerEvent::BatteryOkay,
        ]
    }
}

/// Opaque handle identifying one active event registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(u64);

impl RegistrationHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Callback invoked by the platform when a subscribed event fires
///
/// The platform may invoke this from a thread it owns; implementations must
/// be safe to call concurrently with `register`/`deregister`.
pub type EventSink = Arc<dyn Fn(PowerEvent) + Send + Sync>;

/// Access to the host's power subsystem
///
/// `register` and `deregister` return synchronously; there is no pending
/// state. A failed `register` leaves no delivery active.
pub trait PowerPlatform: Send + Sync {
    /// Read the current raw battery telemetry
    fn read_telemetry(&self) -> Result<RawTelemetry, PlatformError>;

    /// Begin delivering the given events to `sink`
    fn register(
        &self,
        events: &[PowerEvent],
        sink: EventSink,
    ) -> Result<RegistrationHandle, PlatformError>;

    /// Stop delivering events for a previous registration
    fn deregister(&self, handle: RegistrationHandle) -> Result<(), PlatformError>;
}
