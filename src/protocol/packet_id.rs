//! Cyclic packet identifiers.
//!
//! PID increments by one for every packet a sender emits and wraps from
//! 65535 back to 0. Receivers compare identifiers on the 16-bit ring with
//! serial-number arithmetic to spot duplicates and retransmissions.

use std::sync::atomic::{AtomicU16, Ordering};

/// Half the identifier space; distances at or beyond this are ambiguous.
pub const HALF_RANGE: u16 = 0x8000;

/// Sender-side PID counter.
///
/// Lock-free, so one counter can be shared by every task writing to the
/// same connection.
///
/// # Example
///
/// ```
/// use egts_transport::protocol::PacketIdCounter;
///
/// let counter = PacketIdCounter::with_start(u16::MAX);
/// assert_eq!(counter.next(), 65535);
/// assert_eq!(counter.next(), 0);
/// ```
#[derive(Debug, Default)]
pub struct PacketIdCounter {
    next: AtomicU16,
}

impl PacketIdCounter {
    /// Counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter whose first identifier is `start`.
    pub fn with_start(start: u16) -> Self {
        Self {
            next: AtomicU16::new(start),
        }
    }

    /// Take the current identifier and advance, wrapping at 65535.
    #[inline]
    pub fn next(&self) -> u16 {
        // fetch_add on atomics wraps on overflow
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The identifier the next call to [`next`](Self::next) will return.
    #[inline]
    pub fn peek(&self) -> u16 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Identifier following `id` on the ring.
#[inline]
pub fn successor(id: u16) -> u16 {
    id.wrapping_add(1)
}

/// Forward distance from `from` to `to` on the ring.
#[inline]
pub fn distance(from: u16, to: u16) -> u16 {
    to.wrapping_sub(from)
}

/// Whether `candidate` was sent after `reference`.
///
/// True when the forward distance is in `1..HALF_RANGE`, so 0 is newer
/// than 65535.
#[inline]
pub fn is_newer(candidate: u16, reference: u16) -> bool {
    let d = distance(reference, candidate);
    d != 0 && d < HALF_RANGE
}
