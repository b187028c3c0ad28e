//! Modbus PDU construction and parsing
//!
//! Uses a fixed-size stack array to avoid heap allocation on the request
//! path. Only the two function codes the Parmair controller is driven with
//! are supported: FC03 (Read Holding Registers) and FC06 (Write Single
//! Register).

use tracing::debug;

use crate::constants::{FC_READ_HOLDING_REGISTERS, FC_WRITE_SINGLE_REGISTER, MAX_PDU_SIZE, MAX_READ_REGISTERS};
use crate::error::{ModbusError, ModbusResult};

/// PDU with stack-allocated fixed buffer
#[derive(Debug, Clone)]
pub struct ModbusPdu {
    /// Fixed-size buffer (stack)
    data: [u8; MAX_PDU_SIZE],
    /// Actual data length
    len: usize,
}

impl ModbusPdu {
    /// Create an empty PDU
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0; MAX_PDU_SIZE],
            len: 0,
        }
    }

    /// Create a PDU from a received byte slice
    pub fn from_slice(data: &[u8]) -> ModbusResult<Self> {
        if data.len() > MAX_PDU_SIZE {
            return Err(ModbusError::protocol(format!(
                "PDU too large: {} bytes (max {})",
                data.len(),
                MAX_PDU_SIZE
            )));
        }

        let mut pdu = Self::new();
        pdu.data[..data.len()].copy_from_slice(data);
        pdu.len = data.len();

        if let Some(fc) = pdu.function_code() {
            if pdu.is_exception() {
                debug!(
                    "PDU parsed: FC={:02X} exception, code={:02X}",
                    fc,
                    pdu.exception_code().unwrap_or(0)
                );
            } else {
                debug!(
                    "PDU parsed: FC={:02X} ({}), data_len={}",
                    fc,
                    Self::function_code_description(fc),
                    pdu.len - 1
                );
            }
        }

        Ok(pdu)
    }

    /// Build an FC03 request PDU
    ///
    /// `count` must be 1..=125 (the protocol's per-request register limit).
    pub fn read_holding(address: u16, count: u16) -> ModbusResult<Self> {
        if count == 0 || count as usize > MAX_READ_REGISTERS {
            return Err(ModbusError::invalid_data(format!(
                "Invalid register count: {} (must be 1-{})",
                count, MAX_READ_REGISTERS
            )));
        }

        let mut pdu = Self::new();
        pdu.push(FC_READ_HOLDING_REGISTERS)?;
        pdu.push_u16(address)?;
        pdu.push_u16(count)?;
        Ok(pdu)
    }

    /// Build an FC06 request PDU
    pub fn write_single(address: u16, value: u16) -> ModbusResult<Self> {
        let mut pdu = Self::new();
        pdu.push(FC_WRITE_SINGLE_REGISTER)?;
        pdu.push_u16(address)?;
        pdu.push_u16(value)?;
        Ok(pdu)
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) -> ModbusResult<()> {
        if self.len >= MAX_PDU_SIZE {
            return Err(ModbusError::protocol("PDU buffer full"));
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Push u16 in big-endian
    #[inline]
    pub fn push_u16(&mut self, value: u16) -> ModbusResult<()> {
        self.push((value >> 8) as u8)?;
        self.push((value & 0xFF) as u8)?;
        Ok(())
    }

    /// Get immutable data slice
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Get current length
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get function code (first byte)
    #[inline]
    pub fn function_code(&self) -> Option<u8> {
        if self.len > 0 {
            Some(self.data[0])
        } else {
            None
        }
    }

    /// Check if exception response
    #[inline]
    pub fn is_exception(&self) -> bool {
        self.function_code()
            .map(|fc| fc & 0x80 != 0)
            .unwrap_or(false)
    }

    /// Get exception code
    #[inline]
    pub fn exception_code(&self) -> Option<u8> {
        if self.is_exception() && self.len > 1 {
            Some(self.data[1])
        } else {
            None
        }
    }

    /// Parse an FC03 response into register values
    ///
    /// Validates that the device returned exactly `expected_count`
    /// registers; the controller answers short blocks when a span touches an
    /// unmapped address and those blocks must not be trusted.
    pub fn parse_read_registers(&self, expected_count: u16) -> ModbusResult<Vec<u16>> {
        self.check_response(FC_READ_HOLDING_REGISTERS)?;

        let data = self.as_slice();
        if data.len() < 2 {
            return Err(ModbusError::protocol("FC03 response shorter than header"));
        }

        let byte_count = data[1] as usize;
        let payload = &data[2..];
        if payload.len() != byte_count || byte_count != expected_count as usize * 2 {
            return Err(ModbusError::invalid_data(format!(
                "FC03 response length mismatch: expected {} registers, got {} bytes (declared {})",
                expected_count,
                payload.len(),
                byte_count
            )));
        }

        let mut registers = Vec::with_capacity(expected_count as usize);
        for pair in payload.chunks_exact(2) {
            registers.push(u16::from_be_bytes([pair[0], pair[1]]));
        }
        Ok(registers)
    }

    /// Parse an FC06 response, verifying the device echoed the request
    pub fn parse_write_echo(&self, address: u16, value: u16) -> ModbusResult<()> {
        self.check_response(FC_WRITE_SINGLE_REGISTER)?;

        let data = self.as_slice();
        if data.len() < 5 {
            return Err(ModbusError::protocol("FC06 response too short"));
        }

        let echo_address = u16::from_be_bytes([data[1], data[2]]);
        let echo_value = u16::from_be_bytes([data[3], data[4]]);
        if echo_address != address || echo_value != value {
            return Err(ModbusError::invalid_data(format!(
                "FC06 echo mismatch: wrote {value} to {address}, device echoed {echo_value} at {echo_address}"
            )));
        }
        Ok(())
    }

    /// Reject exception responses and function-code mismatches
    fn check_response(&self, expected_fc: u8) -> ModbusResult<()> {
        let fc = self
            .function_code()
            .ok_or_else(|| ModbusError::protocol("Empty response PDU"))?;

        if self.is_exception() {
            return Err(ModbusError::exception(
                fc & 0x7F,
                self.exception_code().unwrap_or(0),
            ));
        }

        if fc != expected_fc {
            return Err(ModbusError::protocol(format!(
                "Function code mismatch: expected {:02X}, got {:02X}",
                expected_fc, fc
            )));
        }
        Ok(())
    }

    /// Get human-readable function code description
    pub fn function_code_description(fc: u8) -> &'static str {
        match fc & 0x7F {
            FC_READ_HOLDING_REGISTERS => "Read Holding Registers",
            FC_WRITE_SINGLE_REGISTER => "Write Single Register",
            _ => "Unsupported Function",
        }
    }
}

impl Default for ModbusPdu {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_holding_request_bytes() {
        let pdu = ModbusPdu::read_holding(1020, 3).unwrap();
        // 1020 = 0x03FC
        assert_eq!(pdu.as_slice(), &[0x03, 0x03, 0xFC, 0x00, 0x03]);
        assert_eq!(pdu.function_code(), Some(0x03));
        assert!(!pdu.is_exception());
    }

    #[test]
    fn test_write_single_request_bytes() {
        let pdu = ModbusPdu::write_single(1208, 1).unwrap();
        // 1208 = 0x04B8
        assert_eq!(pdu.as_slice(), &[0x06, 0x04, 0xB8, 0x00, 0x01]);
    }

    #[test]
    fn test_read_holding_rejects_bad_counts() {
        assert!(ModbusPdu::read_holding(1000, 0).is_err());
        assert!(ModbusPdu::read_holding(1000, 126).is_err());
        assert!(ModbusPdu::read_holding(1000, 125).is_ok());
    }

    #[test]
    fn test_parse_read_registers() {
        let pdu = ModbusPdu::from_slice(&[0x03, 0x04, 0x00, 0xAE, 0xFF, 0xDC]).unwrap();
        let registers = pdu.parse_read_registers(2).unwrap();
        assert_eq!(registers, vec![174, 65500]);
    }

    #[test]
    fn test_parse_read_registers_rejects_short_block() {
        // Device answered one register where three were requested
        let pdu = ModbusPdu::from_slice(&[0x03, 0x02, 0x00, 0x01]).unwrap();
        let err = pdu.parse_read_registers(3).unwrap_err();
        assert!(matches!(err, ModbusError::InvalidData { .. }));
    }

    #[test]
    fn test_parse_read_registers_rejects_declared_length_lie() {
        // byte_count says 4 but only 2 payload bytes follow
        let pdu = ModbusPdu::from_slice(&[0x03, 0x04, 0x00, 0x01]).unwrap();
        assert!(pdu.parse_read_registers(2).is_err());
    }

    #[test]
    fn test_exception_response() {
        let pdu = ModbusPdu::from_slice(&[0x83, 0x02]).unwrap();
        assert!(pdu.is_exception());
        assert_eq!(pdu.exception_code(), Some(0x02));

        let err = pdu.parse_read_registers(1).unwrap_err();
        match err {
            ModbusError::Exception { function, code, .. } => {
                assert_eq!(function, 0x03);
                assert_eq!(code, 0x02);
            }
            other => panic!("Expected Exception, got {other:?}"),
        }
    }

    #[test]
    fn test_write_echo_accepted() {
        let pdu = ModbusPdu::from_slice(&[0x06, 0x04, 0xB8, 0x00, 0x01]).unwrap();
        assert!(pdu.parse_write_echo(1208, 1).is_ok());
    }

    #[test]
    fn test_write_echo_mismatch_rejected() {
        let pdu = ModbusPdu::from_slice(&[0x06, 0x04, 0xB8, 0x00, 0x02]).unwrap();
        assert!(pdu.parse_write_echo(1208, 1).is_err());
    }

    #[test]
    fn test_function_code_mismatch_rejected() {
        let pdu = ModbusPdu::from_slice(&[0x06, 0x04, 0xB8, 0x00, 0x01]).unwrap();
        let err = pdu.parse_read_registers(1).unwrap_err();
        assert!(matches!(err, ModbusError::Protocol { .. }));
    }
}
