//! Battery status plugin for BattKit
//!
//! Thin adapter that reads the host's battery telemetry and republishes it
//! through a narrow request/response and event-subscription interface:
//!
//! - [`BatteryPlugin::get_battery_info`] — one-shot normalized status.
//! - [`BatteryPlugin::add_battery_listener`] / [`BatteryPlugin::remove_battery_listener`]
//!   — the batteryChanged notification stream.
//!
//! The host's broadcast mechanism is injected through
//! [`battkit_hal::PowerPlatform`], so everything here runs against the mock
//! backend in tests.
//!
//! # Example
//!
//! ```no_run
//! use battkit_hal::SysfsPlatform;
//! use battkit_plugin::BatteryPlugin;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let plugin = BatteryPlugin::new(Arc::new(SysfsPlatform::new()?));
//!     let info = plugin.get_battery_info()?;
//!     println!("{}% ({})", info.level, info.status);
//!     Ok(())
//! }
//! ```

mod listener;
mod plugin;
mod status;

pub use listener::{ListenerManager, StatusSink};
pub use plugin::{BATTERY_CHANGED_EVENT, BatteryPlugin, ListenerToken};
pub use status::{BatteryStatus, LOW_BATTERY_THRESHOLD, StatusText, normalize};

use battkit_hal::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatteryError {
    /// Raw telemetry carried a non-positive scale or the unknown sentinel
    #[error("Invalid battery reading (level {level}, scale {scale})")]
    InvalidReading { level: i32, scale: i32 },

    /// Could not read raw telemetry from the platform
    #[error("Telemetry read failed: {0}")]
    Telemetry(#[source] PlatformError),

    /// Platform refused or failed event-source registration
    #[error("Listener registration failed: {0}")]
    RegistrationFailed(#[source] PlatformError),

    /// Platform failed deregistration; listener state is Idle regardless
    #[error("Listener deregistration failed: {0}")]
    DeregistrationFailed(#[source] PlatformError),
}

/// Plugin Result type
pub type Result<T> = std::result::Result<T, BatteryError>;
