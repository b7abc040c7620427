//! Platform abstraction for BattKit
//!
//! This crate isolates the plugin layer from the operating system's power
//! subsystem. Raw battery telemetry and power events flow in through the
//! [`PowerPlatform`] trait; the rest of the system never touches sysfs or
//! a broadcast mechanism directly.
//!
//! Two backends are provided:
//!
//! - [`SysfsPlatform`] — reads `/sys/class/power_supply` and polls for
//!   change events (Linux).
//! - [`mock::MockPlatform`] — fully scriptable backend for tests.
//!
//! # Example
//!
//! ```no_run
//! use battkit_hal::{PowerPlatform, SysfsPlatform};
//!
//! fn main() -> anyhow::Result<()> {
//!     let platform = SysfsPlatform::new()?;
//!     let raw = platform.read_telemetry()?;
//!     println!("level {} of {}", raw.level, raw.scale);
//!     Ok(())
//! }
//! ```

pub mod mock;
pub mod platform;
pub mod sysfs;
pub mod telemetry;

pub use platform::{
    EventSink, PlatformError, PowerEvent, PowerPlatform, RegistrationHandle,
};
pub use sysfs::{SysfsConfig, SysfsPlatform};
pub use telemetry::{ChargeState, RawTelemetry, UNKNOWN_READING};

/// HAL Result type
pub type Result<T> = std::result::Result<T, PlatformError>;
