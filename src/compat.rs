//! Unit-id convention shim
//!
//! Modbus-TCP server stacks disagree about the unit identifier. Controllers
//! wired straight to the network usually answer on their configured id, but
//! Parmair units have been observed behind gateway firmwares that only
//! answer unit 0x00 (addressing ignored) and TCP-only stacks that insist on
//! 0xFF per the Modbus implementation guide.
//!
//! Rather than hardcoding one convention, [`UnitIdShim`] probes the
//! candidates in a fixed order on the first real request, caches the first
//! convention the device answers under, and uses it for every call after
//! that. The probe runs once per shim instance: the cache survives the
//! per-cycle reconnects of the poll coordinator because the coordinator owns
//! one shim for its whole lifetime.
//!
//! A Modbus exception response settles the probe too: the device parsed the
//! request and answered, so the convention is right even though that
//! particular operation failed. If no candidate gets any answer, the shim
//! caches [`UnitIdConvention::Configured`] and surfaces the failure
//! normally, so a dead device degrades into ordinary transport errors
//! instead of a probe loop.

use std::sync::OnceLock;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::ParmairClient;
use crate::error::{ModbusError, ModbusResult};
use crate::transport::ModbusTransport;

/// Unit-identifier conventions observed across Modbus-TCP server stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitIdConvention {
    /// Use the configured unit id as-is
    Configured,
    /// Address unit 0x00; gateways that ignore unit addressing
    Zero,
    /// Address unit 0xFF; TCP-only servers per the implementation guide
    Broadcast,
}

impl UnitIdConvention {
    /// Candidate conventions in probe order
    pub const CANDIDATES: [UnitIdConvention; 3] = [Self::Configured, Self::Zero, Self::Broadcast];

    /// The wire unit id this convention selects
    #[inline]
    pub fn unit_id(self, configured: u8) -> u8 {
        match self {
            Self::Configured => configured,
            Self::Zero => 0x00,
            Self::Broadcast => 0xFF,
        }
    }
}

/// Probe-once-and-cache unit-id selection
///
/// Owns its verdict as instance state; two shims never share a cache, which
/// keeps tests and multi-device setups independent of each other.
pub struct UnitIdShim {
    configured_unit_id: u8,
    convention: OnceLock<UnitIdConvention>,
    /// Serializes the probe so concurrent first-calls don't race
    probe_guard: Mutex<()>,
}

impl UnitIdShim {
    /// Create a shim for a device configured with `configured_unit_id`
    pub fn new(configured_unit_id: u8) -> Self {
        Self {
            configured_unit_id,
            convention: OnceLock::new(),
            probe_guard: Mutex::new(()),
        }
    }

    /// The unit id from the device configuration
    #[inline]
    pub fn configured_unit_id(&self) -> u8 {
        self.configured_unit_id
    }

    /// The settled convention, if the probe has run
    #[inline]
    pub fn convention(&self) -> Option<UnitIdConvention> {
        self.convention.get().copied()
    }

    /// Read `count` holding registers through the settled convention
    pub async fn read_block<T: ModbusTransport>(
        &self,
        client: &mut ParmairClient<T>,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        if let Some(convention) = self.convention.get() {
            let unit_id = convention.unit_id(self.configured_unit_id);
            return client.read_holding_registers(unit_id, address, count).await;
        }
        self.probe_read(client, address, count).await
    }

    /// Write one holding register through the settled convention
    pub async fn write_single<T: ModbusTransport>(
        &self,
        client: &mut ParmairClient<T>,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        if let Some(convention) = self.convention.get() {
            let unit_id = convention.unit_id(self.configured_unit_id);
            return client.write_single_register(unit_id, address, value).await;
        }
        self.probe_write(client, address, value).await
    }

    async fn probe_read<T: ModbusTransport>(
        &self,
        client: &mut ParmairClient<T>,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        let _guard = self.probe_guard.lock().await;

        // Another task may have settled the probe while we waited
        if let Some(convention) = self.convention.get() {
            let unit_id = convention.unit_id(self.configured_unit_id);
            return client.read_holding_registers(unit_id, address, count).await;
        }

        let mut last_err = None;
        for candidate in UnitIdConvention::CANDIDATES {
            let unit_id = candidate.unit_id(self.configured_unit_id);
            match client.read_holding_registers(unit_id, address, count).await {
                Ok(values) => {
                    self.settle(candidate, unit_id);
                    return Ok(values);
                }
                Err(err) if err.is_exception() => {
                    self.settle(candidate, unit_id);
                    return Err(err);
                }
                Err(err) => {
                    debug!("Unit-id convention {candidate:?} (unit {unit_id}) got no answer: {err}");
                    last_err = Some(err);
                }
            }
        }

        self.settle_default();
        Err(last_err.unwrap_or_else(|| ModbusError::connection("No unit-id convention accepted")))
    }

    async fn probe_write<T: ModbusTransport>(
        &self,
        client: &mut ParmairClient<T>,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        let _guard = self.probe_guard.lock().await;

        if let Some(convention) = self.convention.get() {
            let unit_id = convention.unit_id(self.configured_unit_id);
            return client.write_single_register(unit_id, address, value).await;
        }

        let mut last_err = None;
        for candidate in UnitIdConvention::CANDIDATES {
            let unit_id = candidate.unit_id(self.configured_unit_id);
            match client.write_single_register(unit_id, address, value).await {
                Ok(()) => {
                    self.settle(candidate, unit_id);
                    return Ok(());
                }
                Err(err) if err.is_exception() => {
                    self.settle(candidate, unit_id);
                    return Err(err);
                }
                Err(err) => {
                    debug!("Unit-id convention {candidate:?} (unit {unit_id}) got no answer: {err}");
                    last_err = Some(err);
                }
            }
        }

        self.settle_default();
        Err(last_err.unwrap_or_else(|| ModbusError::connection("No unit-id convention accepted")))
    }

    fn settle(&self, convention: UnitIdConvention, unit_id: u8) {
        debug!("Unit-id convention settled: {convention:?} (unit {unit_id})");
        let _ = self.convention.set(convention);
    }

    fn settle_default(&self) {
        warn!(
            "No unit-id convention accepted; defaulting to Configured (unit {})",
            self.configured_unit_id
        );
        let _ = self.convention.set(UnitIdConvention::Configured);
    }
}

// ============================================================================
// Tests
// ============================================================================
