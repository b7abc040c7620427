//! Linux sysfs power platform
//!
//! Reads battery telemetry from `/sys/class/power_supply` and delivers
//! power events by polling for changes. Event registrations each own a
//! background thread stopped through a shared flag on deregistration.

use crate::platform::{EventSink, PlatformError, PowerEvent, PowerPlatform, RegistrationHandle};
use crate::telemetry::{ChargeState, RawTelemetry, UNKNOWN_READING};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Sysfs platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysfsConfig {
    pub battery_path: PathBuf,
    pub charger_path: PathBuf,
    /// Poll interval for change detection, in milliseconds
    pub poll_interval_ms: u64,
    /// Percentage below which BatteryLow fires
    pub low_battery_threshold: u8,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            battery_path: PathBuf::from("/sys/class/power_supply/battery"),
            charger_path: PathBuf::from("/sys/class/power_supply/usb"),
            poll_interval_ms: 2000,
            low_battery_threshold: 20,
        }
    }
}

impl SysfsConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, PlatformError> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| PlatformError::Config(e.to_string()))
    }
}

/// Power platform backed by Linux sysfs
pub struct SysfsPlatform {
    config: SysfsConfig,
    battery_path: PathBuf,
    charger_path: PathBuf,
    registrations: Mutex<HashMap<u64, Arc<AtomicBool>>>,
    next_handle: AtomicU64,
}

impl SysfsPlatform {
    /// Create with default configuration
    pub fn new() -> Result<Self, PlatformError> {
        Self::with_config(SysfsConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: SysfsConfig) -> Result<Self, PlatformError> {
        let mut platform = Self {
            battery_path: config.battery_path.clone(),
            charger_path: config.charger_path.clone(),
            config,
            registrations: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        };

        // Auto-detect battery and charger paths
        platform.detect_power_supplies()?;

        Ok(platform)
    }

    /// Detect power supply sysfs paths
    ///
    /// Configured paths that already exist are kept; detection only fills
    /// in paths the configuration got wrong or left at defaults.
    fn detect_power_supplies(&mut self) -> Result<(), PlatformError> {
        if self.battery_path.exists() && self.charger_path.exists() {
            return Ok(());
        }

        let power_supply_dir = Path::new("/sys/class/power_supply");
        if !power_supply_dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(power_supply_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();

            // Read type to determine if it's battery or charger
            let type_path = path.join("type");
            if let Ok(psu_type) = fs::read_to_string(&type_path) {
                let psu_type = psu_type.trim().to_lowercase();

                if psu_type == "battery" && !self.battery_path.exists() {
                    self.battery_path = path.clone();
                    tracing::info!("Found battery at {}", path.display());
                } else if (psu_type == "usb" || psu_type == "mains" || name.contains("charger"))
                    && !self.charger_path.exists()
                {
                    self.charger_path = path.clone();
                    tracing::info!("Found charger at {}", path.display());
                }
            }
        }

        Ok(())
    }

    /// Get configuration
    pub fn config(&self) -> &SysfsConfig {
        &self.config
    }
}

impl PowerPlatform for SysfsPlatform {
    fn read_telemetry(&self) -> Result<RawTelemetry, PlatformError> {
        Ok(read_battery(&self.battery_path))
    }

    fn register(
        &self,
        events: &[PowerEvent],
        sink: EventSink,
    ) -> Result<RegistrationHandle, PlatformError> {
        if !self.battery_path.exists() {
            return Err(PlatformError::Registration(format!(
                "no battery at {}",
                self.battery_path.display()
            )));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);

        let mut registrations = self
            .registrations
            .lock()
            .map_err(|e| PlatformError::Registration(e.to_string()))?;
        registrations.insert(id, Arc::clone(&stop));
        drop(registrations);

        let watch = PollWatch {
            battery_path: self.battery_path.clone(),
            charger_path: self.charger_path.clone(),
            interval: Duration::from_millis(self.config.poll_interval_ms),
            low_threshold: self.config.low_battery_threshold,
            events: events.to_vec(),
            sink,
            stop,
        };

        thread::spawn(move || watch.run());
        tracing::debug!("Registered power event watch {}", id);

        Ok(RegistrationHandle::new(id))
    }

    fn deregister(&self, handle: RegistrationHandle) -> Result<(), PlatformError> {
        let mut registrations = self
            .registrations
            .lock()
            .map_err(|e| PlatformError::Deregistration(e.to_string()))?;

        match registrations.remove(&handle.value()) {
            Some(stop) => {
                stop.store(true, Ordering::Relaxed);
                tracing::debug!("Deregistered power event watch {}", handle.value());
                Ok(())
            }
            None => Err(PlatformError::Deregistration(format!(
                "unknown registration handle {}",
                handle.value()
            ))),
        }
    }
}

impl Drop for SysfsPlatform {
    fn drop(&mut self) {
        if let Ok(registrations) = self.registrations.lock() {
            for stop in registrations.values() {
                stop.store(true, Ordering::Relaxed);
            }
        }
    }
}

/// Read raw telemetry from a battery sysfs directory
///
/// Missing or unparseable values become the `-1` sentinel rather than an
/// error; the normalization layer decides how to surface them.
fn read_battery(battery_path: &Path) -> RawTelemetry {
    // Out-of-range capacity values become the sentinel, never a wrapped number
    let level = read_sysfs_int(&battery_path.join("capacity"))
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(UNKNOWN_READING);

    let state = fs::read_to_string(battery_path.join("status"))
        .map(|s| ChargeState::parse(&s))
        .unwrap_or(ChargeState::Unknown);

    // Sysfs capacity is already a percentage
    RawTelemetry::new(level, 100, state)
}

/// Read integer from sysfs file
fn read_sysfs_int(path: &Path) -> Option<i64> {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Check if charger reports online
fn charger_online(charger_path: &Path) -> Option<bool> {
    fs::read_to_string(charger_path.join("online"))
        .ok()
        .map(|s| s.trim() == "1")
}

/// One polling watch; runs on its own thread until the stop flag is raised
struct PollWatch {
    battery_path: PathBuf,
    charger_path: PathBuf,
    interval: Duration,
    low_threshold: u8,
    events: Vec<PowerEvent>,
    sink: EventSink,
    stop: Arc<AtomicBool>,
}

impl PollWatch {
    fn run(self) {
        tracing::info!(
            "Power event watch started on {}",
            self.battery_path.display()
        );

        let mut prev = self.snapshot();

        while !self.stop.load(Ordering::Relaxed) {
            thread::sleep(self.interval);
            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            let current = self.snapshot();
            for event in diff_events(&prev, &current, self.low_threshold) {
                if self.events.contains(&event) {
                    (self.sink)(event);
                }
            }
            prev = current;
        }

        tracing::info!("Power event watch stopped");
    }

    fn snapshot(&self) -> PowerSnapshot {
        let telemetry = read_battery(&self.battery_path);
        PowerSnapshot {
            telemetry,
            charging: is_charging(&telemetry, charger_online(&self.charger_path)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PowerSnapshot {
    telemetry: RawTelemetry,
    charging: bool,
}

fn is_charging(telemetry: &RawTelemetry, charger_online: Option<bool>) -> bool {
    matches!(telemetry.state, ChargeState::Charging | ChargeState::Full)
        || charger_online == Some(true)
}

/// Events implied by the change between two consecutive snapshots
fn diff_events(prev: &PowerSnapshot, current: &PowerSnapshot, low_threshold: u8) -> Vec<PowerEvent> {
    let mut fired = Vec::new();

    if prev != current {
        fired.push(PowerEvent::BatteryChanged);
    }

    if !prev.charging && current.charging {
        fired.push(PowerEvent::PowerConnected);
    } else if prev.charging && !current.charging {
        fired.push(PowerEvent::PowerDisconnected);
    }

    let low = |snapshot: &PowerSnapshot| {
        snapshot.telemetry.level >= 0 && snapshot.telemetry.level < low_threshold as i32
    };
    if !low(prev) && low(current) {
        fired.push(PowerEvent::BatteryLow);
    } else if low(prev) && !low(current) {
        fired.push(PowerEvent::BatteryOkay);
    }

    fired
}
