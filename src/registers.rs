//! # Register Catalogs
//!
//! Static tables mapping logical register keys to the MAC controllers'
//! holding-register layout, one table per firmware family.
//!
//! ## Firmware Families
//!
//! The register map was reshuffled between major firmware versions, so the
//! same logical point lives at different addresses depending on what the
//! unit reports as its software version:
//!
//! | Family | Version rule | Example: `supply_temp` |
//! |--------|--------------|------------------------|
//! | V1 | integer major < 2 (and unparseable versions) | address 1023 |
//! | V2 | integer major >= 2 | address 1022 |
//!
//! Key sets differ too: V1-only keys such as `speed_control` simply don't
//! exist in the V2 table and resolve to [`ModbusError::UnknownRegisterKey`],
//! which callers are expected to handle rather than treat as a bug.
//!
//! Catalogs are `&'static` data built into the binary. A
//! [`RegisterCatalog`] is a copyable handle over one family's table.

use std::fmt;

use tracing::debug;

use crate::constants::REGISTER_ID_BASE;
use crate::error::{ModbusError, ModbusResult};

/// One logical point in a firmware family's register layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterDefinition {
    /// Logical name, unique within a catalog
    pub key: &'static str,
    /// Absolute holding-register address
    pub address: u16,
    /// Vendor mnemonic from the MAC register documentation
    pub label: &'static str,
    /// Multiplicative factor applied to the sign-adjusted raw word
    pub scale: f64,
    /// Whether the register accepts FC06 writes
    pub writable: bool,
    /// Whether the point comes from an optional sensor module
    pub optional: bool,
}

impl RegisterDefinition {
    /// Register number as the vendor documentation counts them (1000-based)
    #[inline]
    pub fn register_id(&self) -> u16 {
        self.address - REGISTER_ID_BASE
    }

    /// "LABEL(id)" form used in log messages
    pub fn describe(&self) -> String {
        format!("{}({})", self.label, self.register_id())
    }
}

// Table row constructors. Optional sensors are read-only integer registers
// in both families, so five shapes cover every row.

const fn ro(key: &'static str, address: u16, label: &'static str) -> RegisterDefinition {
    RegisterDefinition { key, address, label, scale: 1.0, writable: false, optional: false }
}

const fn ro_scaled(
    key: &'static str,
    address: u16,
    label: &'static str,
    scale: f64,
) -> RegisterDefinition {
    RegisterDefinition { key, address, label, scale, writable: false, optional: false }
}

const fn rw(key: &'static str, address: u16, label: &'static str) -> RegisterDefinition {
    RegisterDefinition { key, address, label, scale: 1.0, writable: true, optional: false }
}

const fn rw_scaled(
    key: &'static str,
    address: u16,
    label: &'static str,
    scale: f64,
) -> RegisterDefinition {
    RegisterDefinition { key, address, label, scale, writable: true, optional: false }
}

const fn sensor(key: &'static str, address: u16, label: &'static str) -> RegisterDefinition {
    RegisterDefinition { key, address, label, scale: 1.0, writable: false, optional: true }
}

/// V1 layout (software version < 2)
///
/// `filter_state` and `filter_replaced` intentionally share address 1205:
/// reading it reports filter condition, writing it acknowledges a
/// replacement.
pub static V1_REGISTERS: &[RegisterDefinition] = &[
    ro_scaled("software_version", 1018, "MULTI_SW_VER", 0.01),
    ro("hardware_type", 1244, "VENT_MACHINE"),
    rw("power", 1208, "POWER_BTN_FI"),
    rw("control_state", 1185, "IV01_CONTROLSTATE_FO"),
    rw("speed_control", 1187, "IV01_SPEED_FOC"),
    ro_scaled("fresh_air_temp", 1020, "TE01_M", 0.1),
    ro_scaled("supply_after_recovery_temp", 1022, "TE05_M", 0.1),
    ro_scaled("supply_temp", 1023, "TE10_M", 0.1),
    ro_scaled("exhaust_temp", 1024, "TE30_M", 0.1),
    ro_scaled("waste_temp", 1025, "TE31_M", 0.1),
    rw_scaled("exhaust_temp_setpoint", 1060, "TE30_S", 0.1),
    rw_scaled("supply_temp_setpoint", 1065, "TE10_S", 0.1),
    rw("home_speed", 1104, "HOME_SPEED_S"),
    rw("away_speed", 1105, "AWAY_SPEED_S"),
    rw("boost_setting", 1117, "BOOST_SETTING_S"),
    ro("home_state", 1200, "HOME_STATE_FI"),
    ro("boost_state", 1201, "BOOST_STATE_FI"),
    ro("boost_timer", 1202, "BOOST_TIMER_FM"),
    rw("overpressure_timer", 1204, "OVERP_TIMER_FM"),
    sensor("humidity", 1180, "MEXX_FM"),
    sensor("co2", 1031, "QE20_M"),
    ro("alarm_count", 1004, "ALARM_COUNT"),
    ro("sum_alarm", 1005, "SUM_ALARM"),
    ro("alarms_state", 1206, "ALARMS_STATE_FI"),
    rw("summer_mode", 1079, "SUMMER_MODE_S"),
    rw_scaled("summer_mode_temp_limit", 1078, "SUMMER_MODE_TE01_LIMIT", 0.1),
    rw("time_program_enable", 1108, "TP_ENABLE_S"),
    rw("heater_enable", 1109, "HEATER_ENABLE_S"),
    rw("acknowledge_alarms", 1003, "ACK_ALARMS"),
    rw("filter_replaced", 1205, "FILTER_STATE_FI"),
    ro("filter_state", 1205, "FILTER_STATE_FI"),
    rw("filter_interval", 1085, "FILTER_INTERVAL_S"),
    rw("heater_type", 1240, "HEAT_RADIATOR_TYPE"),
    ro_scaled("heat_recovery_efficiency", 1190, "FG50_EA_M", 0.1),
    ro("defrost_state", 1183, "DFRST_FI"),
    ro_scaled("supply_fan_speed", 1040, "TF10_Y", 0.1),
    ro_scaled("exhaust_fan_speed", 1042, "PF30_Y", 0.1),
];

/// V2 layout (software version >= 2)
///
/// `filter_state` and `filter_replaced` share address 1184, same quirk as
/// V1. The user-state flags (`home_state`, `boost_state`,
/// `overpressure_state`) have no registers here; the coordinator derives
/// them from `control_state`.
pub static V2_REGISTERS: &[RegisterDefinition] = &[
    ro_scaled("software_version", 1015, "MULTI_SW_VER", 0.01),
    ro("hardware_type", 1125, "VENT_MACHINE"),
    rw("power", 1180, "UNIT_CONTROL_FO"),
    rw("control_state", 1181, "USERSTATECONTROL_FO"),
    ro_scaled("fresh_air_temp", 1020, "TE01_M", 0.1),
    ro_scaled("supply_after_recovery_temp", 1021, "TE05_M", 0.1),
    ro_scaled("supply_temp", 1022, "TE10_M", 0.1),
    ro_scaled("waste_temp", 1023, "TE31_M", 0.1),
    ro_scaled("exhaust_temp", 1024, "TE30_M", 0.1),
    rw_scaled("exhaust_temp_setpoint", 1073, "TE30_S", 0.1),
    rw("home_speed", 1060, "HOME_SPEED_S"),
    rw("away_speed", 1063, "AWAY_SPEED_S"),
    rw("boost_setting", 1065, "BOOST_SETTING_S"),
    rw("time_program_enable", 1070, "TP_ENABLE_S"),
    rw("summer_mode", 1071, "AUTO_SUMMER_COOL_S"),
    rw("heater_enable", 1074, "AUTO_HEATER_ENABLE_S"),
    rw("heater_type", 1124, "HEATPUMP_RADIATOR_ENABLE"),
    rw("acknowledge_alarms", 1003, "ACK_ALARMS"),
    ro("alarm_count", 1004, "ALARM_COUNT"),
    ro("filter_state", 1184, "FILTER_STATE_FI"),
    rw("filter_replaced", 1184, "FILTER_STATE_FI"),
    rw("filter_interval", 1090, "FILTER_INTERVAL_S"),
    ro("defrost_state", 1182, "DFRST_FI"),
    ro_scaled("heat_recovery_efficiency", 1183, "FG50_EA_M", 0.1),
    ro("season_state", 1189, "SUMMER_MODE_I"),
    sensor("humidity", 1191, "HUMIDITY_FM"),
    sensor("humidity_24h_avg", 1192, "ME05_AVG_FM"),
    sensor("co2", 1030, "QE20_M"),
    sensor("co2_exhaust", 1026, "QE05_M"),
    ro_scaled("supply_fan_speed", 1040, "TF10_Y", 0.1),
    ro_scaled("exhaust_fan_speed", 1042, "PF30_Y", 0.1),
    ro_scaled("post_heater_output", 1044, "TV45_Y", 0.1),
    ro_scaled("lto_heat_recovery_control", 1046, "FG50_Y", 0.1),
    ro_scaled("pre_heater_output", 1048, "EC05_Y", 0.1),
];

/// Keys read once per session; the values never change while a unit runs
pub const STATIC_KEYS: [&str; 3] = ["hardware_type", "software_version", "heater_type"];

/// Write-only command keys, never polled
pub const WRITE_ONLY_KEYS: [&str; 2] = ["acknowledge_alarms", "filter_replaced"];

/// MAC firmware families with distinct register layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirmwareFamily {
    /// Pre-2.x firmware
    V1,
    /// 2.x and later firmware
    V2,
}

impl FirmwareFamily {
    /// Classify a reported software version by its integer major component.
    ///
    /// Majors of 2 and above select [`FirmwareFamily::V2`]; everything else,
    /// including unparseable strings, selects [`FirmwareFamily::V1`].
    pub fn classify(version: &str) -> Self {
        match version.trim().parse::<f64>() {
            Ok(value) if value.trunc() >= 2.0 => Self::V2,
            Ok(_) => Self::V1,
            Err(_) => {
                debug!("Unparseable software version '{version}', assuming v1 layout");
                Self::V1
            }
        }
    }

    /// The family's register catalog
    #[inline]
    pub fn catalog(self) -> RegisterCatalog {
        RegisterCatalog::for_family(self)
    }

    /// Short family name, "1.x" or "2.x"
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::V1 => "1.x",
            Self::V2 => "2.x",
        }
    }
}

impl fmt::Display for FirmwareFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only handle over one family's register table
#[derive(Debug, Clone, Copy)]
pub struct RegisterCatalog {
    family: FirmwareFamily,
    table: &'static [RegisterDefinition],
}

impl RegisterCatalog {
    /// Catalog for a firmware family
    pub fn for_family(family: FirmwareFamily) -> Self {
        let table = match family {
            FirmwareFamily::V1 => V1_REGISTERS,
            FirmwareFamily::V2 => V2_REGISTERS,
        };
        Self { family, table }
    }

    /// Catalog for a reported software version string
    pub fn for_firmware(version: &str) -> Self {
        Self::for_family(FirmwareFamily::classify(version))
    }

    /// The family this catalog describes
    #[inline]
    pub fn family(&self) -> FirmwareFamily {
        self.family
    }

    /// Look up a key; `None` when this family doesn't carry it
    pub fn lookup(&self, key: &str) -> Option<&'static RegisterDefinition> {
        self.table.iter().find(|definition| definition.key == key)
    }

    /// Look up a key, failing with [`ModbusError::UnknownRegisterKey`]
    pub fn get(&self, key: &str) -> ModbusResult<&'static RegisterDefinition> {
        self.lookup(key).ok_or_else(|| ModbusError::unknown_key(key))
    }

    /// Whether this family carries `key`
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of definitions in the table
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// All definitions, in table order
    pub fn definitions(&self) -> impl Iterator<Item = &'static RegisterDefinition> {
        self.table.iter()
    }

    /// All keys, in table order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.table.iter().map(|definition| definition.key)
    }

    /// Definitions polled every cycle: everything except the static and
    /// write-only keys
    pub fn polled(&self) -> impl Iterator<Item = &'static RegisterDefinition> {
        self.table.iter().filter(|definition| {
            !STATIC_KEYS.contains(&definition.key) && !WRITE_ONLY_KEYS.contains(&definition.key)
        })
    }

    /// Definitions read once per session
    pub fn static_definitions(&self) -> impl Iterator<Item = &'static RegisterDefinition> {
        self.table.iter().filter(|definition| STATIC_KEYS.contains(&definition.key))
    }

    /// Keys read once per session
    pub fn static_keys(&self) -> impl Iterator<Item = &'static str> {
        self.static_definitions().map(|definition| definition.key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn both_catalogs() -> [RegisterCatalog; 2] {
        [FirmwareFamily::V1.catalog(), FirmwareFamily::V2.catalog()]
    }

    #[test]
    fn test_keys_are_unique_within_each_catalog() {
        for catalog in both_catalogs() {
            let mut seen = std::collections::HashSet::new();
            for key in catalog.keys() {
                assert!(seen.insert(key), "duplicate key '{key}' in {}", catalog.family());
            }
        }
    }

    #[test]
    fn test_shared_addresses_decode_identically() {
        // Two keys may share a register (filter quirk) only if their decode
        // parameters agree, so both resolve to the same value
        for catalog in both_catalogs() {
            let mut by_address: HashMap<u16, &RegisterDefinition> = HashMap::new();
            for definition in catalog.definitions() {
                if let Some(previous) = by_address.insert(definition.address, definition) {
                    assert_eq!(previous.scale, definition.scale);
                    assert_eq!(previous.optional, definition.optional);
                    assert_eq!(previous.label, definition.label);
                }
            }
        }
    }

    #[test]
    fn test_filter_quirk_addresses() {
        let v1 = FirmwareFamily::V1.catalog();
        assert_eq!(v1.get("filter_state").unwrap().address, 1205);
        assert_eq!(v1.get("filter_replaced").unwrap().address, 1205);

        let v2 = FirmwareFamily::V2.catalog();
        assert_eq!(v2.get("filter_state").unwrap().address, 1184);
        assert_eq!(v2.get("filter_replaced").unwrap().address, 1184);
    }

    #[test]
    fn test_classify_by_integer_major() {
        assert_eq!(FirmwareFamily::classify("1.21"), FirmwareFamily::V1);
        assert_eq!(FirmwareFamily::classify("1.99"), FirmwareFamily::V1);
        assert_eq!(FirmwareFamily::classify("2.0"), FirmwareFamily::V2);
        assert_eq!(FirmwareFamily::classify("2.02"), FirmwareFamily::V2);
        assert_eq!(FirmwareFamily::classify("10.0"), FirmwareFamily::V2);
        assert_eq!(FirmwareFamily::classify(" 2.5 "), FirmwareFamily::V2);
    }

    #[test]
    fn test_unparseable_version_defaults_to_v1() {
        assert_eq!(FirmwareFamily::classify(""), FirmwareFamily::V1);
        assert_eq!(FirmwareFamily::classify("abc"), FirmwareFamily::V1);
        assert_eq!(FirmwareFamily::classify("2.x"), FirmwareFamily::V1);
    }

    #[test]
    fn test_for_firmware_selects_the_layout() {
        let catalog = RegisterCatalog::for_firmware("2.02");
        assert_eq!(catalog.family(), FirmwareFamily::V2);
        assert_eq!(catalog.get("software_version").unwrap().address, 1015);

        let catalog = RegisterCatalog::for_firmware("1.21");
        assert_eq!(catalog.family(), FirmwareFamily::V1);
        assert_eq!(catalog.get("software_version").unwrap().address, 1018);
    }

    #[test]
    fn test_family_specific_keys() {
        let v1 = FirmwareFamily::V1.catalog();
        let v2 = FirmwareFamily::V2.catalog();

        assert!(v1.contains("speed_control"));
        assert!(matches!(
            v2.get("speed_control"),
            Err(ModbusError::UnknownRegisterKey { .. })
        ));

        assert!(v2.contains("season_state"));
        assert!(matches!(
            v1.get("season_state"),
            Err(ModbusError::UnknownRegisterKey { .. })
        ));

        // Derived flags are not catalog rows in v2
        assert!(!v2.contains("home_state"));
        assert!(!v2.contains("boost_state"));
    }

    #[test]
    fn test_register_id_is_thousand_based() {
        let supply = FirmwareFamily::V1.catalog().get("supply_temp").unwrap();
        assert_eq!(supply.register_id(), 23);
        assert_eq!(supply.describe(), "TE10_M(23)");
    }

    #[test]
    fn test_polled_split() {
        for catalog in both_catalogs() {
            let polled: Vec<&str> = catalog.polled().map(|d| d.key).collect();
            assert!(!polled.contains(&"software_version"));
            assert!(!polled.contains(&"hardware_type"));
            assert!(!polled.contains(&"heater_type"));
            assert!(!polled.contains(&"acknowledge_alarms"));
            assert!(!polled.contains(&"filter_replaced"));
            assert!(polled.contains(&"filter_state"));
            assert_eq!(polled.len(), catalog.len() - 5);

            assert_eq!(catalog.static_definitions().count(), 3);
        }
    }

    #[test]
    fn test_static_and_write_only_keys_exist_in_both_families() {
        for catalog in both_catalogs() {
            for key in STATIC_KEYS {
                assert!(catalog.contains(key), "{key} missing from {}", catalog.family());
            }
            for key in WRITE_ONLY_KEYS {
                assert!(catalog.contains(key), "{key} missing from {}", catalog.family());
            }
        }
    }

    #[test]
    fn test_writable_and_optional_flags() {
        let v1 = FirmwareFamily::V1.catalog();
        assert!(v1.get("power").unwrap().writable);
        assert!(!v1.get("supply_temp").unwrap().writable);
        assert!(v1.get("humidity").unwrap().optional);
        assert!(!v1.get("supply_temp").unwrap().optional);

        let v2 = FirmwareFamily::V2.catalog();
        assert!(v2.get("heater_type").unwrap().writable);
        assert!(v2.get("co2_exhaust").unwrap().optional);
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(FirmwareFamily::V1.catalog().len(), 37);
        assert_eq!(FirmwareFamily::V2.catalog().len(), 34);
    }
}
