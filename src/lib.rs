//! # Parmair Modbus - MAC Ventilation Unit Poller
//!
//! **Version:** 0.4.2
//! **License:** MIT
//!
//! An async Modbus-TCP client for Parmair MAC heat-recovery ventilation
//! units, built on Tokio. It knows the two register layouts the MAC
//! firmware line has shipped with, detects which one a unit speaks, and
//! polls it on a schedule tuned to the controller's single-connection
//! Modbus server.
//!
//! ## Features
//!
//! - **Firmware detection**: Probes the unit and resolves its register
//!   layout from the version and hardware-type registers
//! - **Register catalogs**: Named, scaled access to both the 1.x and 2.x
//!   layouts; no raw addresses in application code
//! - **Batched polling**: Contiguous registers are merged into block reads,
//!   with per-span retries and a paced request schedule
//! - **Unit-id shim**: Probes the configured/0x00/0xFF unit-id conventions
//!   once and caches the one the device answers under
//! - **Gentle writes**: Setpoint writes run on a separate long-lived
//!   connection and degrade to `Ok(false)` instead of erroring
//!
//! ## Firmware Families
//!
//! | Family | Version band | Version register | Hardware register |
//! |--------|--------------|------------------|-------------------|
//! | 1.x    | [0.5, 2.0)   | 1018             | 1244              |
//! | 2.x    | [2.0, 10.0]  | 1015             | 1125              |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parmair_modbus::{
//!     detect_firmware, DeviceConfig, ParmairTcpClient, PollCoordinator, UnitIdShim,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> parmair_modbus::ModbusResult<()> {
//!     let config = DeviceConfig::new("192.168.1.50").with_timeout(Duration::from_secs(5));
//!
//!     // Short-lived connection to find out which layout the unit speaks
//!     let mut client = ParmairTcpClient::connect(config.socket_addr(), config.timeout).await?;
//!     let shim = UnitIdShim::new(config.normalized_unit_id());
//!     let detected = detect_firmware(&mut client, &shim).await?;
//!     client.close().await?;
//!     println!("Found {} ({})", detected.model(), detected.version_string());
//!
//!     // Poll it
//!     let config = config.with_family(detected.family);
//!     let coordinator = PollCoordinator::from_config(&config)?;
//!     coordinator.poll_once().await?;
//!     println!("Supply air: {:?} °C", coordinator.get_value("supply_temp"));
//!
//!     coordinator.write("home_speed", 3.0).await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Protocol constants and MAC timing parameters
pub mod constants;

/// Modbus PDU encoding and parsing for FC03/FC06
pub mod pdu;

/// Modbus-TCP transport: MBAP framing, transaction ids, timeouts
pub mod transport;

/// Holding-register client over a transport
pub mod client;

/// Unit-id convention probing and caching
pub mod compat;

// ============================================================================
// Device modules
// ============================================================================

/// Read planning: merging register addresses into block reads
pub mod batcher;

/// Raw word <-> engineering value conversion
pub mod codec;

/// Register catalogs for the 1.x and 2.x firmware layouts
pub mod registers;

/// Decoded state enums for mode, heater, filter and fan registers
pub mod states;

/// Device connection configuration
pub mod config;

/// Firmware family detection
pub mod detect;

/// Scheduled polling and the write path
pub mod coordinator;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use parmair_modbus::tokio) ===
pub use tokio;

// === Error handling ===
pub use error::{ModbusError, ModbusResult};

// === Client API ===
pub use client::{ParmairClient, ParmairTcpClient};
pub use compat::{UnitIdConvention, UnitIdShim};
pub use transport::{
    ModbusConnector, ModbusTransport, TcpConnector, TcpTransport, TransportStats,
};

// === Device model ===
pub use config::DeviceConfig;
pub use detect::{detect_firmware, DetectedFirmware};
pub use registers::{FirmwareFamily, RegisterCatalog, RegisterDefinition};

// === Polling ===
pub use coordinator::{PollCoordinator, RegisterMetadata};

// === Decoded states ===
pub use states::{
    ControlStateV1, ControlStateV2, FanSpeedSetting, FilterStateV1, FilterStateV2, HeaterTypeV1,
    HeaterTypeV2, PowerStateV1, PowerStateV2, SeasonState,
};

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    DEFAULT_SCAN_INTERVAL, DEFAULT_TCP_PORT, DEFAULT_TIMEOUT, MAX_READ_REGISTERS, PARMAIR_UNIT_ID,
};

// === PDU (advanced usage) ===
pub use pdu::ModbusPdu;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("Parmair Modbus v{} - MAC ventilation unit poller", VERSION)
}
