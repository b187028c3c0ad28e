//! # State Interpretation
//!
//! The wire carries bare numbers; operator surfaces want names. These enums
//! give the MAC state words display names, per firmware family where the
//! encodings differ. Raw values outside the documented range land in an
//! `Unknown(u16)` catch-all so a firmware update can never fail a poll
//! cycle, only render as unknown.

use std::fmt;

use crate::registers::FirmwareFamily;

/// Power state word, v1 firmware (`power`, register 1208)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStateV1 {
    Off,
    ShuttingDown,
    Starting,
    Running,
    Unknown(u16),
}

impl From<u16> for PowerStateV1 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::ShuttingDown,
            2 => Self::Starting,
            3 => Self::Running,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for PowerStateV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::ShuttingDown => write!(f, "Shutting down"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Power state word, v2 firmware (`power`, register 1180)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStateV2 {
    Off,
    On,
    Unknown(u16),
}

impl From<u16> for PowerStateV2 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::On,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for PowerStateV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::On => write!(f, "On"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// User control state, v1 firmware (`control_state`, register 1185)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStateV1 {
    Stop,
    Away,
    Home,
    Boost,
    Overpressure,
    AwayTimer,
    HomeTimer,
    BoostTimer,
    OverpressureTimer,
    Manual,
    Unknown(u16),
}

impl From<u16> for ControlStateV1 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Stop,
            1 => Self::Away,
            2 => Self::Home,
            3 => Self::Boost,
            4 => Self::Overpressure,
            5 => Self::AwayTimer,
            6 => Self::HomeTimer,
            7 => Self::BoostTimer,
            8 => Self::OverpressureTimer,
            9 => Self::Manual,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ControlStateV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "Stop"),
            Self::Away => write!(f, "Away"),
            Self::Home => write!(f, "Home"),
            Self::Boost => write!(f, "Boost"),
            Self::Overpressure => write!(f, "Overpressure"),
            Self::AwayTimer => write!(f, "Away (timer)"),
            Self::HomeTimer => write!(f, "Home (timer)"),
            Self::BoostTimer => write!(f, "Boost (timer)"),
            Self::OverpressureTimer => write!(f, "Overpressure (timer)"),
            Self::Manual => write!(f, "Manual"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// User control state, v2 firmware (`control_state`, register 1181)
///
/// V2 dropped the dedicated state registers; `home_state`, `boost_state`
/// and `overpressure_state` are derived from this word instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStateV2 {
    Off,
    Away,
    Home,
    Boost,
    Sauna,
    Fireplace,
    Unknown(u16),
}

impl ControlStateV2 {
    /// Sauna and fireplace modes both run the unit in overpressure
    #[inline]
    pub fn creates_overpressure(self) -> bool {
        matches!(self, Self::Sauna | Self::Fireplace)
    }
}

impl From<u16> for ControlStateV2 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::Away,
            2 => Self::Home,
            3 => Self::Boost,
            4 => Self::Sauna,
            5 => Self::Fireplace,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ControlStateV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Away => write!(f, "Away"),
            Self::Home => write!(f, "Home"),
            Self::Boost => write!(f, "Boost"),
            Self::Sauna => write!(f, "Sauna"),
            Self::Fireplace => write!(f, "Fireplace"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Heater type word, v1 firmware (`heater_type`, register 1240)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterTypeV1 {
    Water,
    Electric,
    None,
    Unknown(u16),
}

impl From<u16> for HeaterTypeV1 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Water,
            1 => Self::Electric,
            2 => Self::None,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for HeaterTypeV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Water => write!(f, "Water"),
            Self::Electric => write!(f, "Electric"),
            Self::None => write!(f, "None"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Heater type word, v2 firmware (`heater_type`, register 1124)
///
/// The encoding flipped between families: v2 reports electric as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterTypeV2 {
    Electric,
    Water,
    Unknown(u16),
}

impl From<u16> for HeaterTypeV2 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Electric,
            1 => Self::Water,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for HeaterTypeV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Electric => write!(f, "Electric"),
            Self::Water => write!(f, "Water"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Filter state word, v1 firmware (`filter_state`, register 1205)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStateV1 {
    Replace,
    Ok,
    Unknown(u16),
}

impl From<u16> for FilterStateV1 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Replace,
            1 => Self::Ok,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for FilterStateV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "Replace"),
            Self::Ok => write!(f, "Ok"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Filter state word, v2 firmware (`filter_state`, register 1184)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStateV2 {
    Ok,
    AcknowledgeChange,
    ReplaceReminder,
    Unknown(u16),
}

impl From<u16> for FilterStateV2 {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::AcknowledgeChange,
            2 => Self::ReplaceReminder,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for FilterStateV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "Ok"),
            Self::AcknowledgeChange => write!(f, "Acknowledge change"),
            Self::ReplaceReminder => write!(f, "Replace reminder"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Season word, v2 firmware only (`season_state`, register 1189)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonState {
    Winter,
    Transition,
    Summer,
    Unknown(u16),
}

impl From<u16> for SeasonState {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Winter,
            1 => Self::Transition,
            2 => Self::Summer,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for SeasonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winter => write!(f, "Winter"),
            Self::Transition => write!(f, "Transition"),
            Self::Summer => write!(f, "Summer"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Fan speed selector (`speed_control` in v1, speed settings in both)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeedSetting {
    Auto,
    Stop,
    Speed1,
    Speed2,
    Speed3,
    Speed4,
    Speed5,
    Unknown(u16),
}

impl From<u16> for FanSpeedSetting {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Auto,
            1 => Self::Stop,
            2 => Self::Speed1,
            3 => Self::Speed2,
            4 => Self::Speed3,
            5 => Self::Speed4,
            6 => Self::Speed5,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for FanSpeedSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Stop => write!(f, "Stop"),
            Self::Speed1 => write!(f, "Speed 1"),
            Self::Speed2 => write!(f, "Speed 2"),
            Self::Speed3 => write!(f, "Speed 3"),
            Self::Speed4 => write!(f, "Speed 4"),
            Self::Speed5 => write!(f, "Speed 5"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

/// Translate a raw hardware-type word into the marketing model number.
///
/// V2 units report internal type codes for some models; known codes are
/// translated, unrecognized ones pass through.
pub fn hardware_model(family: FirmwareFamily, raw: u16) -> u16 {
    match family {
        FirmwareFamily::V1 => raw,
        FirmwareFamily::V2 => match raw {
            112 => 120,
            other => other,
        },
    }
}

/// Whether an optional sensor's raw word indicates the module is present.
///
/// Absent modules read 0 or 0xFFFF depending on firmware build.
#[inline]
pub fn is_optional_sensor_installed(raw: u16) -> bool {
    raw != 0 && raw != 0xFFFF
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_state_words() {
        assert_eq!(PowerStateV1::from(3), PowerStateV1::Running);
        assert_eq!(PowerStateV1::from(0), PowerStateV1::Off);
        assert_eq!(PowerStateV1::from(7), PowerStateV1::Unknown(7));

        assert_eq!(PowerStateV2::from(1), PowerStateV2::On);
        assert_eq!(PowerStateV2::from(3), PowerStateV2::Unknown(3));
    }

    #[test]
    fn test_control_state_words() {
        assert_eq!(ControlStateV1::from(2), ControlStateV1::Home);
        assert_eq!(ControlStateV1::from(9), ControlStateV1::Manual);
        assert_eq!(ControlStateV1::from(10), ControlStateV1::Unknown(10));

        assert_eq!(ControlStateV2::from(2), ControlStateV2::Home);
        assert_eq!(ControlStateV2::from(5), ControlStateV2::Fireplace);
        assert_eq!(ControlStateV2::from(6), ControlStateV2::Unknown(6));
    }

    #[test]
    fn test_overpressure_modes() {
        assert!(ControlStateV2::Sauna.creates_overpressure());
        assert!(ControlStateV2::Fireplace.creates_overpressure());
        assert!(!ControlStateV2::Home.creates_overpressure());
        assert!(!ControlStateV2::Boost.creates_overpressure());
        assert!(!ControlStateV2::Unknown(9).creates_overpressure());
    }

    #[test]
    fn test_heater_encoding_flipped_between_families() {
        assert_eq!(HeaterTypeV1::from(0), HeaterTypeV1::Water);
        assert_eq!(HeaterTypeV1::from(1), HeaterTypeV1::Electric);
        assert_eq!(HeaterTypeV2::from(0), HeaterTypeV2::Electric);
        assert_eq!(HeaterTypeV2::from(1), HeaterTypeV2::Water);
    }

    #[test]
    fn test_filter_state_words() {
        assert_eq!(FilterStateV1::from(0), FilterStateV1::Replace);
        assert_eq!(FilterStateV1::from(1), FilterStateV1::Ok);
        assert_eq!(FilterStateV2::from(0), FilterStateV2::Ok);
        assert_eq!(FilterStateV2::from(2), FilterStateV2::ReplaceReminder);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(PowerStateV1::ShuttingDown.to_string(), "Shutting down");
        assert_eq!(ControlStateV1::BoostTimer.to_string(), "Boost (timer)");
        assert_eq!(FilterStateV2::AcknowledgeChange.to_string(), "Acknowledge change");
        assert_eq!(SeasonState::Transition.to_string(), "Transition");
        assert_eq!(FanSpeedSetting::Speed3.to_string(), "Speed 3");
        assert_eq!(ControlStateV2::Unknown(42).to_string(), "Unknown (42)");
    }

    #[test]
    fn test_hardware_model_translation() {
        assert_eq!(hardware_model(FirmwareFamily::V2, 112), 120);
        assert_eq!(hardware_model(FirmwareFamily::V2, 80), 80);
        assert_eq!(hardware_model(FirmwareFamily::V1, 112), 112);
    }

    #[test]
    fn test_optional_sensor_sentinel() {
        assert!(!is_optional_sensor_installed(0));
        assert!(!is_optional_sensor_installed(0xFFFF));
        assert!(is_optional_sensor_installed(45));
        assert!(is_optional_sensor_installed(600));
    }
}
