//! Outward plugin surface
//!
//! The request/response and subscription API exposed to the application
//! shell: one-shot battery queries plus the batteryChanged notification
//! stream.

use crate::listener::{ListenerManager, StatusSink};
use crate::status::BatteryStatus;
use crate::BatteryError;
use battkit_hal::PowerPlatform;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the notification event carrying a [`BatteryStatus`] payload
pub const BATTERY_CHANGED_EVENT: &str = "batteryChanged";

/// Opaque listener identifier returned by [`BatteryPlugin::add_battery_listener`]
///
/// Timestamp-based; not guaranteed globally unique. Only one subscription
/// is tracked internally regardless of how many tokens were handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerToken(String);

impl ListenerToken {
    fn issue() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self(format!("battery_listener_{}", millis))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Battery status plugin
///
/// Thin adapter between the host platform's power subsystem and the
/// application shell. Dropping the plugin tears down any active
/// subscription.
pub struct BatteryPlugin {
    manager: ListenerManager,
}

impl BatteryPlugin {
    pub fn new(platform: Arc<dyn PowerPlatform>) -> Self {
        Self {
            manager: ListenerManager::new(platform),
        }
    }

    /// Get current battery information
    ///
    /// Reads fresh telemetry on every call, independent of any listener.
    pub fn get_battery_info(&self) -> Result<BatteryStatus, BatteryError> {
        self.manager.status_once()
    }

    /// Begin delivering batteryChanged notifications to `sink`
    ///
    /// The sink receives one notification immediately with the current
    /// status, then one per qualifying platform event. Adding further
    /// sinks reuses the existing platform registration. On a registration
    /// failure the sink is discarded; a caller who got an error never
    /// receives notifications from a later successful add.
    pub fn add_battery_listener(&self, sink: StatusSink) -> Result<ListenerToken, BatteryError> {
        self.manager.add_sink(sink);
        if let Err(e) = self.manager.subscribe() {
            self.manager.pop_sink();
            return Err(e);
        }
        Ok(ListenerToken::issue())
    }

    /// Stop the notification stream and drop all sinks
    pub fn remove_battery_listener(&self) -> Result<(), BatteryError> {
        self.manager.clear_sinks();
        self.manager.unsubscribe()
    }

    /// Access the listener manager, mainly for embedding hosts
    pub fn listener(&self) -> &ListenerManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battkit_hal::mock::MockPlatform;

    #[test]
    fn test_token_format() {
        let token = ListenerToken::issue();
        assert!(token.as_str().starts_with("battery_listener_"));
        assert!(token.to_string().starts_with("battery_listener_"));
    }

    #[test]
    fn test_get_battery_info_without_listener() {
        let platform = Arc::new(MockPlatform::new());
        let plugin = BatteryPlugin::new(platform.clone() as Arc<dyn PowerPlatform>);

        let info = plugin.get_battery_info().unwrap();
        assert_eq!(info.level, 85);
        assert_eq!(platform.register_calls(), 0);
    }

    #[test]
    fn test_event_name_constant() {
        assert_eq!(BATTERY_CHANGED_EVENT, "batteryChanged");
    }
}
