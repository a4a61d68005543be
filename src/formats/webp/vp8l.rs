//! VP8L (lossless) header
//!
//! The header is packed least significant bit first: an 8-bit signature
//! (0x2f), 14 bits of width - 1, 14 bits of height - 1, an alpha hint bit
//! and a 3-bit version that must be zero.

use crate::error::{Result, SizeError};
use crate::types::Size;

use super::riff::ByteSource;

pub const SIGNATURE: u8 = 0x2f;

/// Largest value of a 14-bit dimension field.
pub const MAX_DIMENSION_FIELD: u32 = 0x3fff;

const FORMAT: &str = "vp8l";

/// Least significant bit first reader
pub struct BitReader<S> {
    src: S,
    bits: u32,
    n_bits: u32,
}

impl<S: ByteSource> BitReader<S> {
    pub fn new(src: S) -> Self {
        Self {
            src,
            bits: 0,
            n_bits: 0,
        }
    }

    /// Reads `n` bits, `n` at most 24.
    pub fn read(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 24);
        while self.n_bits < n {
            let byte = self.src.read_u8()?;
            self.bits |= (byte as u32) << self.n_bits;
            self.n_bits += 8;
        }
        let value = self.bits & ((1 << n) - 1);
        self.bits >>= n;
        self.n_bits -= n;
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vp8lHeader {
    pub size: Size,
    /// Set by encoders when some pixel is not fully opaque. Advisory only.
    pub alpha_hint: bool,
}

pub fn decode_header<S: ByteSource>(src: S) -> Result<Vp8lHeader> {
    let mut bits = BitReader::new(src);
    if bits.read(8)? != SIGNATURE as u32 {
        return Err(SizeError::format(FORMAT, "invalid signature"));
    }
    let width = bits.read(14)? + 1;
    let height = bits.read(14)? + 1;
    let alpha_hint = bits.read(1)? == 1;
    if bits.read(3)? != 0 {
        return Err(SizeError::format(FORMAT, "invalid version"));
    }
    Ok(Vp8lHeader {
        size: Size::new(width, height),
        alpha_hint,
    })
}

/// Builds the 5-byte header of a VP8L stream with the given dimensions
/// minus one, no alpha hint and version 0. Both fields must fit 14 bits.
pub fn synthesize_header(width_minus_one: u32, height_minus_one: u32) -> [u8; 5] {
    debug_assert!(width_minus_one <= MAX_DIMENSION_FIELD);
    debug_assert!(height_minus_one <= MAX_DIMENSION_FIELD);
    [
        SIGNATURE,
        width_minus_one as u8,
        ((width_minus_one >> 8) as u8) | ((height_minus_one << 6) as u8),
        (height_minus_one >> 2) as u8,
        (height_minus_one >> 10) as u8,
    ]
}
