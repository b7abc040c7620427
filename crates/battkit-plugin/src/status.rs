//! Battery status normalization
//!
//! Maps raw platform telemetry into the stable-shape [`BatteryStatus`]
//! record handed to application code. Pure and deterministic; an invalid
//! reading surfaces as an error instead of a fabricated percentage.

use crate::BatteryError;
use battkit_hal::{ChargeState, RawTelemetry};
use serde::Serialize;
use std::fmt;

/// Percentage below which the battery counts as low
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Normalized battery status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusText {
    Charging,
    Full,
    Discharging,
    NotCharging,
    Unknown,
}

impl StatusText {
    /// Wire name, as serialized in the batteryChanged payload
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusText::Charging => "charging",
            StatusText::Full => "full",
            StatusText::Discharging => "discharging",
            StatusText::NotCharging => "not_charging",
            StatusText::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized battery status
///
/// Value type, recomputed on every read; two instances with equal fields
/// are interchangeable. Serializes camelCase to match the batteryChanged
/// notification payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    /// Charge percentage, 0-100
    pub level: u8,
    /// True iff the raw status code is charging or full
    pub is_charging: bool,
    /// True iff the rounded percentage is below 20
    pub is_low_battery: bool,
    /// Status text derived from the raw code and percentage
    pub status: StatusText,
}

/// Normalize one raw battery reading
///
/// The percentage uses real division before rounding so 849/1000 becomes
/// 85, not 84. `is_charging` follows the raw code alone: a charging code
/// at 100% still reports charging even though the status text says full.
pub fn normalize(raw: &RawTelemetry) -> Result<BatteryStatus, BatteryError> {
    if raw.scale <= 0 || raw.level < 0 {
        return Err(BatteryError::InvalidReading {
            level: raw.level,
            scale: raw.scale,
        });
    }

    let percentage = (raw.level as f64 * 100.0 / raw.scale as f64).round();
    let level = (percentage as i64).min(100) as u8;

    let status = match raw.state {
        ChargeState::Charging => {
            if level >= 100 {
                StatusText::Full
            } else {
                StatusText::Charging
            }
        }
        ChargeState::Discharging => StatusText::Discharging,
        ChargeState::Full => StatusText::Full,
        ChargeState::NotCharging => StatusText::NotCharging,
        ChargeState::Unknown => StatusText::Unknown,
    };

    Ok(BatteryStatus {
        level,
        is_charging: matches!(raw.state, ChargeState::Charging | ChargeState::Full),
        is_low_battery: level < LOW_BATTERY_THRESHOLD,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(level: i32, scale: i32, state: ChargeState) -> RawTelemetry {
        RawTelemetry::new(level, scale, state)
    }

    #[test]
    fn test_discharging_example() {
        let status = normalize(&raw(85, 100, ChargeState::Discharging)).unwrap();
        assert_eq!(status.level, 85);
        assert!(!status.is_charging);
        assert!(!status.is_low_battery);
        assert_eq!(status.status, StatusText::Discharging);
    }

    #[test]
    fn test_charging_at_full_reports_full_text() {
        let status = normalize(&raw(100, 100, ChargeState::Charging)).unwrap();
        assert_eq!(status.level, 100);
        assert!(status.is_charging);
        assert!(!status.is_low_battery);
        assert_eq!(status.status, StatusText::Full);
    }

    #[test]
    fn test_not_charging_low_example() {
        let status = normalize(&raw(15, 100, ChargeState::NotCharging)).unwrap();
        assert_eq!(status.level, 15);
        assert!(!status.is_charging);
        assert!(status.is_low_battery);
        assert_eq!(status.status, StatusText::NotCharging);
    }

    #[test]
    fn test_zero_scale_is_invalid() {
        let result = normalize(&raw(50, 0, ChargeState::Discharging));
        assert!(matches!(
            result,
            Err(BatteryError::InvalidReading { scale: 0, .. })
        ));
    }

    #[test]
    fn test_sentinel_level_is_invalid() {
        let result = normalize(&raw(-1, 100, ChargeState::Unknown));
        assert!(matches!(result, Err(BatteryError::InvalidReading { .. })));
    }

    #[test]
    fn test_negative_scale_is_invalid() {
        assert!(normalize(&raw(50, -1, ChargeState::Charging)).is_err());
    }

    #[test]
    fn test_real_division_before_rounding() {
        // 849/1000 truncates to 84 with integer math; rounds to 85
        let status = normalize(&raw(849, 1000, ChargeState::Discharging)).unwrap();
        assert_eq!(status.level, 85);

        let status = normalize(&raw(844, 1000, ChargeState::Discharging)).unwrap();
        assert_eq!(status.level, 84);
    }

    #[test]
    fn test_low_battery_boundary() {
        let at_threshold = normalize(&raw(20, 100, ChargeState::Discharging)).unwrap();
        assert!(!at_threshold.is_low_battery);

        let below = normalize(&raw(19, 100, ChargeState::Discharging)).unwrap();
        assert!(below.is_low_battery);
    }

    #[test]
    fn test_low_battery_uses_rounded_level() {
        // 195/1000 rounds to 20, so not low
        let status = normalize(&raw(195, 1000, ChargeState::Discharging)).unwrap();
        assert_eq!(status.level, 20);
        assert!(!status.is_low_battery);
    }

    #[test]
    fn test_charging_below_full_keeps_charging_text() {
        let status = normalize(&raw(99, 100, ChargeState::Charging)).unwrap();
        assert_eq!(status.status, StatusText::Charging);
        assert!(status.is_charging);
    }

    #[test]
    fn test_full_code_at_any_level() {
        let status = normalize(&raw(97, 100, ChargeState::Full)).unwrap();
        assert_eq!(status.status, StatusText::Full);
        assert!(status.is_charging);
    }

    #[test]
    fn test_is_charging_false_for_non_charging_codes() {
        for state in [
            ChargeState::Discharging,
            ChargeState::NotCharging,
            ChargeState::Unknown,
        ] {
            let status = normalize(&raw(100, 100, state)).unwrap();
            assert!(!status.is_charging, "{:?} must not count as charging", state);
        }
    }

    #[test]
    fn test_unknown_code_maps_to_unknown_text() {
        let status = normalize(&raw(50, 100, ChargeState::Unknown)).unwrap();
        assert_eq!(status.status, StatusText::Unknown);
    }

    #[test]
    fn test_level_clamped_at_100() {
        // Some drivers briefly report capacity above scale
        let status = normalize(&raw(102, 100, ChargeState::Full)).unwrap();
        assert_eq!(status.level, 100);
    }

    #[test]
    fn test_status_text_wire_names() {
        assert_eq!(StatusText::Charging.as_str(), "charging");
        assert_eq!(StatusText::NotCharging.as_str(), "not_charging");
        assert_eq!(StatusText::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_rounding_against_reference() {
        for level in 0..=100 {
            let status = normalize(&raw(level, 100, ChargeState::Discharging)).unwrap();
            assert_eq!(status.level as i32, level);
            assert_eq!(status.is_low_battery, level < 20);
        }
    }
}
