//! # Read Batching
//!
//! Groups register addresses into contiguous spans so a poll cycle spends
//! one round trip per block instead of one per register.
//!
//! ## How It Works
//!
//! [`plan_read_spans`] sorts the requested addresses, drops duplicates and
//! greedily extends each span while the next address is exactly one past the
//! previous and the span is still under the per-request cap (125 registers
//! for FC03). A gap or a full span starts a new one.
//!
//! The plan only depends on the address set, so the coordinator computes it
//! once per firmware family and reuses it every cycle.
//!
//! ## Example
//!
//! ```rust
//! use parmair_modbus::batcher::plan_read_spans;
//!
//! let spans = plan_read_spans(&[1020, 1021, 1022, 1024], 125);
//! assert_eq!(spans.len(), 2);
//! assert_eq!((spans[0].start, spans[0].count), (1020, 3));
//! assert_eq!((spans[1].start, spans[1].count), (1024, 1));
//! ```

use std::fmt;

/// A contiguous block of holding registers, read with a single FC03 request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSpan {
    /// First register address in the span
    pub start: u16,
    /// Number of registers, always 1..=max_per_read
    pub count: u16,
}

impl ReadSpan {
    /// Last register address in the span, inclusive
    #[inline]
    pub fn last(&self) -> u16 {
        self.start + (self.count - 1)
    }

    /// Whether `address` falls inside the span
    #[inline]
    pub fn contains(&self, address: u16) -> bool {
        address >= self.start && address <= self.last()
    }

    /// Iterate the addresses the span covers, in order
    pub fn addresses(&self) -> impl Iterator<Item = u16> {
        let start = u32::from(self.start);
        (start..start + u32::from(self.count)).map(|address| address as u16)
    }
}

impl fmt::Display for ReadSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.start, self.count)
    }
}

/// Plan the minimal set of FC03 requests covering `addresses`.
///
/// Duplicates are dropped and the result is sorted by start address. No span
/// exceeds `max_per_read` registers.
pub fn plan_read_spans(addresses: &[u16], max_per_read: u16) -> Vec<ReadSpan> {
    let max_per_read = max_per_read.max(1);

    let mut sorted = addresses.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut spans = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return spans;
    };

    let mut current = ReadSpan { start: first, count: 1 };
    for address in iter {
        let next_in_span = u32::from(current.start) + u32::from(current.count);
        if u32::from(address) == next_in_span && current.count < max_per_read {
            current.count += 1;
        } else {
            spans.push(current);
            current = ReadSpan { start: address, count: 1 };
        }
    }
    spans.push(current);
    spans
}

/// Total register count across a span plan, for logging.
#[inline]
pub fn total_registers(spans: &[ReadSpan]) -> u32 {
    spans.iter().map(|span| u32::from(span.count)).sum()
}

// ============================================================================
// Tests
// ============================================================================
