//! Raw battery telemetry types
//!
//! Values here are exactly what the operating system's power subsystem
//! reports, before any normalization. `-1` is the platform sentinel for
//! "no reading available".

/// Sentinel value reported by the platform when a reading is unavailable
pub const UNKNOWN_READING: i32 = -1;

/// Battery charging status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Charging,
    Discharging,
    Full,
    NotCharging,
    Unknown,
}

impl ChargeState {
    /// Parse from a sysfs status string
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Charging" => ChargeState::Charging,
            "Discharging" => ChargeState::Discharging,
            "Full" => ChargeState::Full,
            "Not charging" => ChargeState::NotCharging,
            _ => ChargeState::Unknown,
        }
    }

    /// Sysfs name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeState::Charging => "Charging",
            ChargeState::Discharging => "Discharging",
            ChargeState::Full => "Full",
            ChargeState::NotCharging => "Not charging",
            ChargeState::Unknown => "Unknown",
        }
    }
}

/// One unprocessed battery reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTelemetry {
    /// Raw charge level, in platform units (not a percentage)
    pub level: i32,
    /// Maximum value `level` can take; percentage = level / scale
    pub scale: i32,
    /// Charging status code
    pub state: ChargeState,
}

impl RawTelemetry {
    pub fn new(level: i32, scale: i32, state: ChargeState) -> Self {
        Self {
            level,
            scale,
            state,
        }
    }

    /// True when either field carries the "no reading" sentinel
    pub fn is_unknown(&self) -> bool {
        self.level == UNKNOWN_READING || self.scale == UNKNOWN_READING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_state_parse() {
        assert_eq!(ChargeState::parse("Charging"), ChargeState::Charging);
        assert_eq!(ChargeState::parse("Discharging"), ChargeState::Discharging);
        assert_eq!(ChargeState::parse("Full"), ChargeState::Full);
        assert_eq!(ChargeState::parse("Not charging"), ChargeState::NotCharging);
        assert_eq!(ChargeState::parse("garbage"), ChargeState::Unknown);
    }

    #[test]
    fn test_charge_state_parse_trims_whitespace() {
        assert_eq!(ChargeState::parse("Charging\n"), ChargeState::Charging);
        assert_eq!(ChargeState::parse("  Full  "), ChargeState::Full);
    }

    #[test]
    fn test_charge_state_roundtrip() {
        for state in [
            ChargeState::Charging,
            ChargeState::Discharging,
            ChargeState::Full,
            ChargeState::NotCharging,
            ChargeState::Unknown,
        ] {
            assert_eq!(ChargeState::parse(state.as_str()), state);
        }
    }

    #[test]
    fn test_telemetry_unknown_sentinel() {
        assert!(RawTelemetry::new(-1, 100, ChargeState::Unknown).is_unknown());
        assert!(RawTelemetry::new(50, -1, ChargeState::Charging).is_unknown());
        assert!(!RawTelemetry::new(50, 100, ChargeState::Charging).is_unknown());
    }
}
