//! BMP header decoder
//!
//! Reads the 14-byte file header and a `BITMAPINFOHEADER` (40 bytes),
//! `BITMAPV4HEADER` (108) or `BITMAPV5HEADER` (124). Only uncompressed,
//! single-plane 8, 24 and 32 bit images are accepted, and the pixel data
//! must start right after the headers (and palette).

use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::registry::SizeDecoder;
use crate::types::Size;

pub const MAGIC: &[u8] = b"BM????\x00\x00\x00\x00";

const FORMAT: &str = "bmp";

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const V4_INFO_HEADER_LEN: u32 = 108;
const V5_INFO_HEADER_LEN: u32 = 124;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// Red, green, blue and alpha masks equivalent to plain 32-bit BGRA.
const DEFAULT_RGBA_MASKS: [u32; 4] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000];

const MAX_PALETTE_LEN: u32 = 256;

#[inline]
fn le_u16(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

#[inline]
fn le_u32(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// Converts `BGRX` palette entries to opaque `RGBA`.
fn read_palette(raw: &[u8]) -> Vec<[u8; 4]> {
    raw.chunks_exact(4)
        .map(|bgrx| [bgrx[2], bgrx[1], bgrx[0], 0xFF])
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BmpDecoder;

impl SizeDecoder for BmpDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        decode_bmp(reader)
    }
}

pub fn decode_bmp<R: Read + ?Sized>(reader: &mut R) -> Result<Size> {
    let mut b = [0u8; 1024];
    let head = (FILE_HEADER_LEN + 4) as usize;
    reader.read_exact(&mut b[..head])?;
    if &b[..2] != b"BM" {
        return Err(SizeError::format(FORMAT, "missing BM signature"));
    }

    let offset = le_u32(&b, 10);
    let info_len = le_u32(&b, 14);
    if !matches!(info_len, INFO_HEADER_LEN | V4_INFO_HEADER_LEN | V5_INFO_HEADER_LEN) {
        return Err(SizeError::unsupported(FORMAT, "DIB header length"));
    }
    let headers_end = (FILE_HEADER_LEN + info_len) as usize;
    reader.read_exact(&mut b[head..headers_end])?;

    let width = le_u32(&b, 18) as i32;
    let height = le_u32(&b, 22) as i32;
    // A negative height only flips the row order.
    if width < 0 {
        return Err(SizeError::unsupported(FORMAT, "negative width"));
    }
    let size = Size::new(width as u32, height.unsigned_abs());

    let planes = le_u16(&b, 26);
    let bpp = le_u16(&b, 28);
    let mut compression = le_u32(&b, 30);
    if compression == BI_BITFIELDS
        && info_len > INFO_HEADER_LEN
        && [le_u32(&b, 54), le_u32(&b, 58), le_u32(&b, 62), le_u32(&b, 66)] == DEFAULT_RGBA_MASKS
    {
        compression = BI_RGB;
    }
    if planes != 1 || compression != BI_RGB {
        return Err(SizeError::unsupported(FORMAT, "compression or plane count"));
    }
    trace!(%size, bpp, info_len, offset, "bmp headers");

    match bpp {
        8 => {
            let colors_used = match le_u32(&b, 46) {
                0 => MAX_PALETTE_LEN,
                n if n > MAX_PALETTE_LEN => {
                    return Err(SizeError::unsupported(FORMAT, "palette larger than 256 entries"));
                }
                n => n,
            };
            if offset != FILE_HEADER_LEN + info_len + colors_used * 4 {
                return Err(SizeError::unsupported(FORMAT, "pixel data offset"));
            }
            let raw = &mut b[..(colors_used * 4) as usize];
            reader.read_exact(raw)?;
            let palette = read_palette(raw);
            trace!(colors = palette.len(), "bmp palette");
            Ok(size)
        }
        // 32-bit alpha is not trusted; pixels are treated as opaque, so only
        // the offset needs checking.
        24 | 32 => {
            if offset != FILE_HEADER_LEN + info_len {
                return Err(SizeError::unsupported(FORMAT, "pixel data offset"));
            }
            Ok(size)
        }
        _ => Err(SizeError::unsupported(FORMAT, "bits per pixel")),
    }
}

/// Builds the file and DIB headers of a BMP with the given layout.
#[cfg(test)]
pub(crate) fn build_header(
    info_len: u32,
    width: i32,
    height: i32,
    bpp: u16,
    compression: u32,
    colors_used: u32,
) -> Vec<u8> {
    let palette_len = if bpp == 8 {
        if colors_used == 0 { 256 } else { colors_used }
    } else {
        0
    };
    let offset = FILE_HEADER_LEN + info_len + palette_len * 4;

    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(offset + 16).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&info_len.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.resize((FILE_HEADER_LEN + 32) as usize, 0);
    out.extend_from_slice(&colors_used.to_le_bytes());
    out.resize((FILE_HEADER_LEN + info_len) as usize, 0);
    if info_len > INFO_HEADER_LEN {
        for (i, mask) in DEFAULT_RGBA_MASKS.iter().enumerate() {
            let at = 54 + i * 4;
            out[at..at + 4].copy_from_slice(&mask.to_le_bytes());
        }
    }
    for i in 0..palette_len {
        out.extend_from_slice(&[i as u8, 0x80, 0xFF - i as u8, 0x00]);
    }
    out
}
