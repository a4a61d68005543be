//! ALPH chunk decoding
//!
//! The first body byte holds the compression method in bits 0-1, the
//! prediction filter in bits 2-3 and a preprocessing hint in bits 4-5.
//! The rest is either `width * height` raw alpha bytes or a headerless
//! VP8L stream whose green channel carries the alpha values.

use std::io::{Cursor, Read};

use image_webp::WebPDecoder;
use tracing::trace;

use crate::error::{Result, SizeError};

use super::riff::{ByteSource, Chunk};
use super::vp8l::{MAX_DIMENSION_FIELD, synthesize_header};

const FORMAT: &str = "alph";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaCompression {
    None,
    Lossless,
}

/// Prediction filter applied to the alpha plane before compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaFilter {
    None,
    Horizontal,
    Vertical,
    Gradient,
}

impl AlphaFilter {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::None,
            1 => Self::Horizontal,
            2 => Self::Vertical,
            _ => Self::Gradient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaHeader {
    pub compression: AlphaCompression,
    pub filter: AlphaFilter,
    pub preprocessing: u8,
}

impl AlphaHeader {
    pub fn from_byte(control: u8) -> Result<Self> {
        let compression = match control & 0x03 {
            0 => AlphaCompression::None,
            1 => AlphaCompression::Lossless,
            _ => return Err(SizeError::format(FORMAT, "unknown compression method")),
        };
        Ok(Self {
            compression,
            filter: AlphaFilter::from_bits(control >> 2),
            preprocessing: (control >> 4) & 0x03,
        })
    }
}

/// Reads and unfilters the alpha plane of an image whose dimensions minus
/// one are given.
pub fn read_alpha<R: Read>(
    chunk: &mut Chunk<'_, R>,
    width_minus_one: u32,
    height_minus_one: u32,
    max_chunk: usize,
) -> Result<Vec<u8>> {
    if chunk.remaining() == 0 {
        return Err(SizeError::format(FORMAT, "empty chunk"));
    }
    let header = AlphaHeader::from_byte(chunk.read_u8()?)?;
    let width = width_minus_one as u64 + 1;
    let height = height_minus_one as u64 + 1;
    trace!(?header, width, height, "alpha plane");

    let mut alpha = match header.compression {
        AlphaCompression::None => chunk.read_vec(width * height, max_chunk)?,
        AlphaCompression::Lossless => {
            if width_minus_one > MAX_DIMENSION_FIELD || height_minus_one > MAX_DIMENSION_FIELD {
                return Err(SizeError::format(FORMAT, "lossless plane larger than 16384"));
            }
            let body = chunk.read_remaining(max_chunk)?;
            let header = synthesize_header(width_minus_one, height_minus_one);
            decode_lossless_green(&header, &body)?
        }
    };
    if alpha.len() as u64 != width * height {
        return Err(SizeError::format(FORMAT, "plane size does not match the canvas"));
    }
    unfilter(&mut alpha, width as usize, header.filter);
    Ok(alpha)
}

/// Decodes a VP8L stream and returns its green channel.
fn decode_lossless_green(header: &[u8; 5], body: &[u8]) -> Result<Vec<u8>> {
    let payload_len = u32::try_from(header.len() + body.len())
        .map_err(|_| SizeError::format(FORMAT, "chunk too large"))?;
    let pad = payload_len & 1;
    let riff_len = payload_len
        .checked_add(12 + pad)
        .ok_or(SizeError::format(FORMAT, "chunk too large"))?;

    let mut stream = Vec::with_capacity(riff_len as usize + 8);
    stream.extend_from_slice(b"RIFF");
    stream.extend_from_slice(&riff_len.to_le_bytes());
    stream.extend_from_slice(b"WEBPVP8L");
    stream.extend_from_slice(&payload_len.to_le_bytes());
    stream.extend_from_slice(header);
    stream.extend_from_slice(body);
    if pad == 1 {
        stream.push(0);
    }

    let mut decoder = WebPDecoder::new(Cursor::new(stream))?;
    let len = decoder
        .output_buffer_size()
        .ok_or(SizeError::format(FORMAT, "plane too large"))?;
    let mut pixels = vec![0u8; len];
    decoder.read_image(&mut pixels)?;
    let channels = if decoder.has_alpha() { 4 } else { 3 };
    Ok(pixels.chunks_exact(channels).map(|px| px[1]).collect())
}

/// Reverses the prediction filter in place. `alpha` holds rows of `stride`
/// bytes; arithmetic wraps modulo 256.
pub fn unfilter(alpha: &mut [u8], stride: usize, filter: AlphaFilter) {
    if stride == 0 || alpha.is_empty() || filter == AlphaFilter::None {
        return;
    }

    let (first, _) = alpha.split_at_mut(stride.min(alpha.len()));
    for x in 1..first.len() {
        first[x] = first[x].wrapping_add(first[x - 1]);
    }

    for start in (stride..alpha.len()).step_by(stride) {
        let (above, rest) = alpha.split_at_mut(start);
        let above = &above[start - stride..];
        let row_len = stride.min(rest.len());
        let row = &mut rest[..row_len];

        row[0] = row[0].wrapping_add(above[0]);
        match filter {
            AlphaFilter::Horizontal => {
                for x in 1..row_len {
                    row[x] = row[x].wrapping_add(row[x - 1]);
                }
            }
            AlphaFilter::Vertical => {
                for x in 1..row_len {
                    row[x] = row[x].wrapping_add(above[x]);
                }
            }
            AlphaFilter::Gradient => {
                for x in 1..row_len {
                    let predicted = row[x - 1] as i16 + above[x] as i16 - above[x - 1] as i16;
                    row[x] = row[x].wrapping_add(predicted.clamp(0, 255) as u8);
                }
            }
            AlphaFilter::None => {}
        }
    }
}

/// Body of a VP8L stream (header excluded) whose every pixel has the
/// given green value, using single-symbol prefix codes.
#[cfg(test)]
pub(crate) fn single_color_lossless_body(green: u8) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc = 0u64;
    let mut n = 0u32;
    let mut put = |value: u32, bits: u32| {
        acc |= (value as u64) << n;
        n += bits;
        while n >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            n -= 8;
        }
    };
    // No transform, no color cache, no meta prefix codes.
    put(0, 3);
    for symbol in [green, 0, 0, 0xff] {
        put(0b101, 3);
        put(symbol as u32, 8);
    }
    // Distance code: one 1-bit symbol.
    put(0b0001, 4);
    put(0, 8);
    out.extend_from_slice(&[0; 4]);
    out
}
