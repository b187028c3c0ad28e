//! Modbus protocol constants and Parmair device parameters
//!
//! Protocol constants are derived from the official Modbus specification:
//! - Maximum PDU size: 253 bytes (inherited from RS485 ADU limit of 256 bytes)
//! - Register limits are calculated to fit within the PDU size constraint
//!
//! Device parameters (addresses, delays, retry counts) match the behavior of
//! Parmair MAC series ventilation units observed in the field.

use std::time::Duration;

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Fixed MBAP prefix length for TCP
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2) = 6 bytes
/// The unit id that follows is counted by the Length field, not here
pub const MBAP_HEADER_LEN: usize = 6;

/// Maximum PDU (Protocol Data Unit) size per Modbus specification
/// This is the fundamental limit inherited from RS485 implementation:
/// RS485 ADU (256 bytes) - Slave Address (1 byte) - CRC (2 bytes) = 253 bytes
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum MBAP length field value (Unit ID + PDU)
/// Used for validating the Length field in MBAP header
/// = 1 (Unit ID) + 253 (Max PDU) = 254 bytes
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// On-the-wire length of FC03 and FC06 requests
///
/// Both carry MBAP (7 bytes incl. unit id) + function code (1) + two u16
/// fields (4) = 12 bytes exactly.
pub const REQUEST_FRAME_LEN: usize = 12;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03 (Read Holding Registers)
///
/// Calculation for response PDU:
/// - Function Code: 1 byte
/// - Byte Count: 1 byte
/// - Register Data: N × 2 bytes
/// - Total: 1 + 1 + (N × 2) ≤ 253
/// - Therefore: N ≤ (253 - 2) / 2 = 125.5 → 125 registers
pub const MAX_READ_REGISTERS: usize = 125;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Write Single Register (FC06)
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal Data Value
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Server Device Failure
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;

/// Acknowledge
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;

/// Server Device Busy
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;

/// Gateway Path Unavailable
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;

/// Gateway Target Device Failed to Respond
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;

// ============================================================================
// Device Defaults
// ============================================================================

/// Standard Modbus-TCP port
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Unit identifier Parmair controllers answer on
///
/// Field units respond on unit 0 regardless of the id printed on the
/// commissioning sheet; see [`crate::config::DeviceConfig`] for the legacy
/// unit-id-1 coercion.
pub const PARMAIR_UNIT_ID: u8 = 0;

/// Default poll interval between dynamic register cycles
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Default per-request transport timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Base the vendor documentation numbers registers from
///
/// The printed register id is `address - 1000` (e.g. holding register 1208
/// is documented as register 208).
pub const REGISTER_ID_BASE: u16 = 1000;

// ============================================================================
// Poll Cycle Timing
// ============================================================================

/// Always-present holding register used for the warm-up read
///
/// The controller's Modbus stack drops the first request after a new TCP
/// connection while its scan task catches up; reading this register absorbs
/// the loss before any data-bearing read.
pub const WARMUP_REGISTER_ADDRESS: u16 = 1001;

/// Warm-up read attempts per cycle
pub const WARMUP_ATTEMPTS: u32 = 3;

/// Fixed settle delay after opening the per-cycle connection
pub const CONNECT_SETTLE: Duration = Duration::from_millis(500);

/// Bounds of the uniform random jitter added to the settle delay
///
/// Staggers cycles when several pollers share one controller.
pub const CONNECT_JITTER_MIN: Duration = Duration::from_millis(200);
pub const CONNECT_JITTER_MAX: Duration = Duration::from_millis(700);

/// Pause between consecutive span reads (and after warm-up)
pub const INTER_READ_DELAY: Duration = Duration::from_millis(300);

/// Retries per span after the initial read fails
pub const SPAN_RETRIES: u32 = 3;

/// Backoff between span read attempts
pub const SPAN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Settle delay after a register write before releasing the device lock
pub const WRITE_SETTLE: Duration = Duration::from_millis(300);

// ============================================================================
// Firmware Detection
// ============================================================================

/// Read attempts per detection register
pub const DETECT_READ_ATTEMPTS: u32 = 3;

/// Backoff between detection read attempts
pub const DETECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Pause between the version read and the identity read
pub const DETECT_INTER_READ_DELAY: Duration = Duration::from_millis(250);

/// Scaled software-version band for the v1 firmware family: [0.5, 2.0)
pub const V1_VERSION_MIN: f64 = 0.5;
pub const V1_VERSION_MAX: f64 = 2.0;

/// Scaled software-version band for the v2 firmware family: [2.0, 10.0]
pub const V2_VERSION_MIN: f64 = 2.0;
pub const V2_VERSION_MAX: f64 = 10.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(MBAP_HEADER_LEN, 6);
        assert_eq!(MAX_PDU_SIZE, 253);
        assert_eq!(MAX_MBAP_LENGTH, 254);
    }

    #[test]
    fn test_register_limits() {
        // Verify read register limit calculation
        let read_pdu_size = 1 + 1 + (MAX_READ_REGISTERS * 2);
        assert!(read_pdu_size <= MAX_PDU_SIZE);
        assert_eq!(MAX_READ_REGISTERS, 125);
    }

    #[test]
    fn test_request_frame_len() {
        // MBAP header (6) + unit id (1) + FC (1) + address (2) + count/value (2)
        assert_eq!(REQUEST_FRAME_LEN, MBAP_HEADER_LEN + 1 + 1 + 2 + 2);
    }

    #[test]
    fn test_version_bands_are_disjoint() {
        assert!(V1_VERSION_MAX <= V2_VERSION_MIN);
        assert!(V1_VERSION_MIN < V1_VERSION_MAX);
        assert!(V2_VERSION_MIN < V2_VERSION_MAX);
    }
}
