//! # Device Configuration
//!
//! Connection and polling parameters for one MAC unit. The setup flow that
//! produces these values (UI, config file, discovery) lives outside this
//! crate; the coordinator consumes the finished struct.

use std::time::Duration;

use tracing::warn;

use crate::constants::{DEFAULT_SCAN_INTERVAL, DEFAULT_TCP_PORT, DEFAULT_TIMEOUT, PARMAIR_UNIT_ID};
use crate::error::{ModbusError, ModbusResult};
use crate::registers::FirmwareFamily;

/// Connection and polling parameters for one device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Hostname or IP address
    pub host: String,
    /// TCP port, normally 502
    pub port: u16,
    /// Configured unit id; see [`DeviceConfig::normalized_unit_id`]
    pub unit_id: u8,
    /// Pause between poll cycles
    pub scan_interval: Duration,
    /// Per-request transport deadline
    pub timeout: Duration,
    /// Manually chosen firmware family; `None` means auto-detect at setup
    pub family: Option<FirmwareFamily>,
}

impl DeviceConfig {
    /// Configuration with defaults for everything but the host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_TCP_PORT,
            unit_id: PARMAIR_UNIT_ID,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            family: None,
        }
    }

    /// Set the TCP port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the configured unit id
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Set the poll interval
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pin the firmware family instead of auto-detecting
    pub fn with_family(mut self, family: FirmwareFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// "host:port" address for the TCP connector
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The unit id actually used on the wire.
    ///
    /// Old setups carried unit_id 1 from a stale default, but Parmair field
    /// units answer on unit 0; a configured 1 is coerced with a warning.
    pub fn normalized_unit_id(&self) -> u8 {
        if self.unit_id == 1 {
            warn!("Config has unit_id=1 but Parmair units answer on unit 0; using 0");
            return PARMAIR_UNIT_ID;
        }
        self.unit_id
    }

    /// Reject configurations that cannot work before any I/O is attempted
    pub fn validate(&self) -> ModbusResult<()> {
        if self.host.trim().is_empty() {
            return Err(ModbusError::configuration("Device host is empty"));
        }
        if self.scan_interval.is_zero() {
            return Err(ModbusError::configuration("Scan interval must be non-zero"));
        }
        if self.timeout.is_zero() {
            return Err(ModbusError::configuration("Request timeout must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
