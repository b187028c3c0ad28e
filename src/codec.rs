//! # Register Value Codec
//!
//! Converts between raw 16-bit holding-register words and the scaled `f64`
//! values the rest of the crate works with.
//!
//! ## Decode Rules
//!
//! The MAC firmware stores every point as one 16-bit word, with negative
//! quantities in two's complement and missing optional sensors reported as
//! small negative readings (typically 0xFFFF, decoding to -1):
//!
//! | Step | Rule |
//! |------|------|
//! | Sign | raw > 32767 decodes as raw - 65536 |
//! | Optional | optional register with a negative reading decodes to absent |
//! | Scale | scale 1 passes the integer through; otherwise value × scale |
//!
//! Encoding runs the same path backwards: divide by scale and round (or
//! truncate for integer registers), then wrap negatives back into the
//! 16-bit word. Values whose raw form cannot fit a register are rejected
//! before any I/O happens.

use crate::error::{ModbusError, ModbusResult};
use crate::registers::RegisterDefinition;

/// Reinterpret a raw register word as a signed reading.
#[inline]
pub fn decode_raw(raw: u16) -> i32 {
    if raw > 32767 {
        i32::from(raw) - 65536
    } else {
        i32::from(raw)
    }
}

/// Decode a raw word through a register definition.
///
/// Returns `None` when an optional sensor reports a negative reading, which
/// is how the firmware flags a sensor that is not installed.
pub fn decode_value(definition: &RegisterDefinition, raw: u16) -> Option<f64> {
    let adjusted = decode_raw(raw);
    if definition.optional && adjusted < 0 {
        return None;
    }
    if definition.scale == 1.0 {
        Some(f64::from(adjusted))
    } else {
        Some(f64::from(adjusted) * definition.scale)
    }
}

/// Encode a value into the raw word for a register definition.
///
/// Scaled registers round to the nearest step; integer registers truncate.
/// Negative values wrap into two's complement. Values outside what a 16-bit
/// register can hold are rejected.
pub fn encode_value(definition: &RegisterDefinition, value: f64) -> ModbusResult<u16> {
    if !value.is_finite() {
        return Err(ModbusError::invalid_data(format!(
            "Cannot encode non-finite value {value} for '{}'",
            definition.key
        )));
    }

    let raw = if definition.scale == 1.0 {
        value as i64
    } else {
        (value / definition.scale).round() as i64
    };

    if !(-32768..=65535).contains(&raw) {
        return Err(ModbusError::invalid_data(format!(
            "Value {value} for '{}' does not fit a 16-bit register (raw {raw})",
            definition.key
        )));
    }

    Ok(if raw < 0 { (raw + 65536) as u16 } else { raw as u16 })
}

// ============================================================================
// Tests
// ============================================================================
