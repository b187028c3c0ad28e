//! # Firmware Auto-Detection
//!
//! Setup-time probe that works out which register layout a unit speaks,
//! run once while a device is being configured and never during the
//! regular poll cycle.
//!
//! ## Confirmation Rule
//!
//! For each candidate family the detector reads two independent registers
//! at that family's addresses: the software version and the hardware type.
//! A family is confirmed only when *both* reads succeed and the scaled
//! version falls inside the family's expected band. One agreeing register
//! is not enough: an address that happens to exist in the other family's
//! layout can echo a plausible word, and two independent hits make that
//! coincidence unlikely.
//!
//! | Family | Version band |
//! |--------|--------------|
//! | V2 | 2.0 ..= 10.0 |
//! | V1 | 0.5 .. 2.0 |
//!
//! Families are tried V2 first. No confirmation from any family yields
//! [`ModbusError::DetectionFailed`]; the setup flow is expected to fall
//! back to a manual family choice rather than guess.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::ParmairClient;
use crate::codec;
use crate::compat::UnitIdShim;
use crate::constants::{
    DETECT_INTER_READ_DELAY, DETECT_READ_ATTEMPTS, DETECT_RETRY_DELAY, V1_VERSION_MAX,
    V1_VERSION_MIN, V2_VERSION_MAX, V2_VERSION_MIN,
};
use crate::error::{ModbusError, ModbusResult};
use crate::registers::FirmwareFamily;
use crate::states::hardware_model;
use crate::transport::ModbusTransport;

/// Families in probe priority order
const PRIORITY: [FirmwareFamily; 2] = [FirmwareFamily::V2, FirmwareFamily::V1];

/// Result of a successful firmware probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedFirmware {
    /// Confirmed register layout family
    pub family: FirmwareFamily,
    /// Scaled software version, e.g. 2.02
    pub software_version: f64,
    /// Raw hardware-type word
    pub hardware_type: u16,
}

impl DetectedFirmware {
    /// Marketing model string, e.g. "MAC 120"
    pub fn model(&self) -> String {
        format!("MAC {}", hardware_model(self.family, self.hardware_type))
    }

    /// Software version formatted the way the vendor prints it
    pub fn version_string(&self) -> String {
        format!("{:.2}", self.software_version)
    }
}

/// Probe the device for its firmware family.
pub async fn detect_firmware<T: ModbusTransport>(
    client: &mut ParmairClient<T>,
    shim: &UnitIdShim,
) -> ModbusResult<DetectedFirmware> {
    for family in PRIORITY {
        if let Some(detected) = probe_family(client, shim, family).await {
            info!(
                "Detected {} firmware: version {}, hardware type {}",
                detected.family,
                detected.version_string(),
                detected.hardware_type
            );
            return Ok(detected);
        }
    }

    let tried: Vec<&str> = PRIORITY.iter().map(|family| family.name()).collect();
    let tried = tried.join(", ");
    warn!("Firmware detection exhausted all families ({tried})");
    Err(ModbusError::detection_failed(tried))
}

fn version_in_band(family: FirmwareFamily, version: f64) -> bool {
    match family {
        FirmwareFamily::V1 => (V1_VERSION_MIN..V1_VERSION_MAX).contains(&version),
        FirmwareFamily::V2 => (V2_VERSION_MIN..=V2_VERSION_MAX).contains(&version),
    }
}

async fn probe_family<T: ModbusTransport>(
    client: &mut ParmairClient<T>,
    shim: &UnitIdShim,
    family: FirmwareFamily,
) -> Option<DetectedFirmware> {
    let catalog = family.catalog();
    let version_def = catalog.lookup("software_version")?;
    let hardware_def = catalog.lookup("hardware_type")?;

    let version_raw = read_register(client, shim, version_def.address).await?;
    let software_version = codec::decode_value(version_def, version_raw)?;
    if !version_in_band(family, software_version) {
        debug!(
            "Family {family}: version {software_version:.2} outside the expected band, rejecting"
        );
        return None;
    }

    sleep(DETECT_INTER_READ_DELAY).await;

    let hardware_type = read_register(client, shim, hardware_def.address).await?;
    debug!("Family {family} confirmed: version {software_version:.2}, hardware {hardware_type}");
    Some(DetectedFirmware { family, software_version, hardware_type })
}

async fn read_register<T: ModbusTransport>(
    client: &mut ParmairClient<T>,
    shim: &UnitIdShim,
    address: u16,
) -> Option<u16> {
    for attempt in 1..=DETECT_READ_ATTEMPTS {
        match shim.read_block(client, address, 1).await {
            Ok(values) => {
                if let Some(&raw) = values.first() {
                    return Some(raw);
                }
            }
            Err(err) => {
                debug!(
                    "Detection read at {address} failed (attempt {attempt}/{DETECT_READ_ATTEMPTS}): {err}"
                );
            }
        }
        if attempt < DETECT_READ_ATTEMPTS {
            sleep(DETECT_RETRY_DELAY).await;
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
