//! Modbus client for Parmair MAC controllers
//!
//! Thin application layer over a [`ModbusTransport`]: builds requests,
//! matches responses, and maps exception frames to errors. The controller is
//! driven with exactly two operations:
//!
//! | Function Code | Method |
//! |---------------|--------|
//! | 0x03 | [`ParmairClient::read_holding_registers`] |
//! | 0x06 | [`ParmairClient::write_single_register`] |
//!
//! Unit-id selection is deliberately explicit here; the convention shim in
//! [`crate::compat`] decides which unit id actually goes on the wire.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parmair_modbus::{ParmairTcpClient, ModbusResult};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let mut client = ParmairTcpClient::connect(
//!         "192.168.1.50:502",
//!         Duration::from_secs(5),
//!     ).await?;
//!
//!     // Outdoor temperature on a v2 unit: register 1020, scale 0.1
//!     let raw = client.read_holding_registers(0, 1020, 1).await?;
//!     println!("TE01_M raw: {}", raw[0]);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::time::Duration;

use crate::constants::MAX_READ_REGISTERS;
use crate::error::{ModbusError, ModbusResult};
use crate::transport::{
    ModbusRequest, ModbusTransport, TcpTransport, TransportStats,
};

/// Modbus client over any transport
pub struct ParmairClient<T: ModbusTransport> {
    transport: T,
}

/// TCP-backed client, the configuration used against real hardware
pub type ParmairTcpClient = ParmairClient<TcpTransport>;

impl ParmairTcpClient {
    /// Connect to a controller at `addr` (e.g. `"192.168.1.50:502"`)
    pub async fn connect<A>(addr: A, timeout: Duration) -> ModbusResult<Self>
    where
        A: tokio::net::ToSocketAddrs + fmt::Debug,
    {
        Ok(Self::new(TcpTransport::connect(addr, timeout).await?))
    }
}

impl<T: ModbusTransport> ParmairClient<T> {
    /// Wrap an already-connected transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read `count` holding registers starting at `address` (FC03)
    pub async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        if count == 0 || count as usize > MAX_READ_REGISTERS {
            return Err(ModbusError::invalid_data(format!(
                "Invalid register count: {count}"
            )));
        }

        let request = ModbusRequest::read_holding(unit_id, address, count);
        let response = self.transport.request(&request).await?;
        response.pdu().parse_read_registers(count)
    }

    /// Write one holding register (FC06)
    ///
    /// Success means the device echoed the write back; the controller does
    /// that only after committing the value to its own process image.
    pub async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        let request = ModbusRequest::write_single(unit_id, address, value);
        let response = self.transport.request(&request).await?;
        response.pdu().parse_write_echo(address, value)
    }

    /// Whether the underlying transport is connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the underlying transport
    pub async fn close(&mut self) -> ModbusResult<()> {
        self.transport.close().await
    }

    /// Transport statistics
    pub fn stats(&self) -> TransportStats {
        self.transport.stats()
    }
}

// ============================================================================
// Tests
// ============================================================================
