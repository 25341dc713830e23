//! Sub-byte field packing.
//!
//! Maps a sequence of `(value, width)` pairs whose widths total exactly
//! 8 bits onto one byte, most-significant field first:
//!
//! ```text
//! widths [2, 1, 2, 1, 2]
//!  bit:  7 6 | 5 | 4 3 | 2 | 1 0
//!        f0  | f1|  f2 | f3|  f4
//! ```
//!
//! # Example
//!
//! ```
//! use egts_transport::protocol::bitfield;
//!
//! let byte = bitfield::pack(&[(0, 2), (1, 1), (0, 2), (0, 1), (3, 2)]).unwrap();
//! assert_eq!(byte, 0b00_1_00_0_11);
//!
//! let fields = bitfield::unpack(byte, [2, 1, 2, 1, 2]).unwrap();
//! assert_eq!(fields, [0, 1, 0, 0, 3]);
//! ```

use crate::error::BitFieldError;

/// Largest value representable in `width` bits.
#[inline]
pub const fn max_value(width: u8) -> u8 {
    if width >= 8 {
        u8::MAX
    } else {
        (1u8 << width) - 1
    }
}

/// Whether `value` fits in `width` bits.
#[inline]
pub const fn fits(value: u8, width: u8) -> bool {
    value <= max_value(width)
}

fn check_widths(widths: impl Iterator<Item = u8>) -> Result<(), BitFieldError> {
    let total: u32 = widths.map(u32::from).sum();
    if total != 8 {
        return Err(BitFieldError::WidthMismatch { total });
    }
    Ok(())
}

/// Pack `(value, width)` pairs into a byte, first pair in the highest bits.
///
/// Every value is range-checked before any bit is written; nothing is
/// masked off silently.
pub fn pack(fields: &[(u8, u8)]) -> Result<u8, BitFieldError> {
    check_widths(fields.iter().map(|&(_, width)| width))?;

    for (index, &(value, width)) in fields.iter().enumerate() {
        if !fits(value, width) {
            return Err(BitFieldError::Overflow {
                index,
                value,
                width,
            });
        }
    }

    let mut byte = 0u8;
    let mut shift = 8u32;
    for &(value, width) in fields {
        shift -= u32::from(width);
        if width > 0 {
            byte |= value << shift;
        }
    }
    Ok(byte)
}

/// Split a byte into fields of the given widths, highest bits first.
pub fn unpack<const N: usize>(byte: u8, widths: [u8; N]) -> Result<[u8; N], BitFieldError> {
    check_widths(widths.iter().copied())?;

    let mut out = [0u8; N];
    let mut shift = 8u32;
    for (slot, &width) in out.iter_mut().zip(widths.iter()) {
        shift -= u32::from(width);
        if width > 0 {
            *slot = (byte >> shift) & max_value(width);
        }
    }
    Ok(out)
}
