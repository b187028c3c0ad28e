//! Error types for Modbus operations and the polling layer
//!
//! All fallible operations in this crate return [`ModbusResult`]. Transport
//! and protocol failures are recoverable by design (the poll coordinator
//! retries them within a cycle); [`ModbusError::UnknownRegisterKey`] is a
//! programmer error and is never retried.

use thiserror::Error;

/// Result type for all Modbus operations
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Errors produced by the transport, protocol, and polling layers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModbusError {
    /// TCP-level failure: refused, reset, closed mid-frame
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A request did not complete within the transport deadline
    #[error("Timeout after {timeout_ms}ms during {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Well-formed TCP stream carrying a frame that violates the protocol
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Device answered with a Modbus exception response
    #[error("Modbus exception for function {function:#04x}: {message} (code {code:#04x})")]
    Exception {
        function: u8,
        code: u8,
        message: String,
    },

    /// Response payload present but semantically unusable
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Function code outside the supported set
    #[error("Invalid function code: {code:#04x}")]
    InvalidFunction { code: u8 },

    /// Bad caller-supplied configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Register key not present in the active firmware catalog
    #[error("Unknown register key: {key:?}")]
    UnknownRegisterKey { key: String },

    /// No firmware family confirmed during setup-time detection
    #[error("Firmware detection failed: no family confirmed (tried {tried})")]
    DetectionFailed { tried: String },

    /// A whole poll cycle produced no data
    #[error("Poll cycle failed: {message}")]
    UpdateFailed { message: String },
}

impl ModbusError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an exception error with the standard description for `code`
    pub fn exception(function: u8, code: u8) -> Self {
        Self::Exception {
            function,
            code,
            message: exception_description(code).to_string(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid function code error
    pub fn invalid_function(code: u8) -> Self {
        Self::InvalidFunction { code }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown register key error
    pub fn unknown_key<S: Into<String>>(key: S) -> Self {
        Self::UnknownRegisterKey { key: key.into() }
    }

    /// Create a detection failure naming the families tried
    pub fn detection_failed<S: Into<String>>(tried: S) -> Self {
        Self::DetectionFailed {
            tried: tried.into(),
        }
    }

    /// Create an update failed error
    pub fn update_failed<S: Into<String>>(message: S) -> Self {
        Self::UpdateFailed {
            message: message.into(),
        }
    }

    /// Whether this error is a device exception response
    ///
    /// An exception means the request crossed the wire and the device parsed
    /// it; the unit-id convention shim treats that as a confirmed convention
    /// even though the operation itself failed.
    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        Self::Connection {
            message: err.to_string(),
        }
    }
}

/// Standard description for a Modbus exception code
pub fn exception_description(code: u8) -> &'static str {
    use crate::constants::*;

    match code {
        EXCEPTION_ILLEGAL_FUNCTION => "Illegal Function",
        EXCEPTION_ILLEGAL_DATA_ADDRESS => "Illegal Data Address",
        EXCEPTION_ILLEGAL_DATA_VALUE => "Illegal Data Value",
        EXCEPTION_SERVER_DEVICE_FAILURE => "Server Device Failure",
        EXCEPTION_ACKNOWLEDGE => "Acknowledge",
        EXCEPTION_SERVER_DEVICE_BUSY => "Server Device Busy",
        EXCEPTION_GATEWAY_PATH_UNAVAILABLE => "Gateway Path Unavailable",
        EXCEPTION_GATEWAY_TARGET_FAILED => "Gateway Target Device Failed to Respond",
        _ => "Unknown Exception",
    }
}

// ============================================================================
// Tests
// ============================================================================
