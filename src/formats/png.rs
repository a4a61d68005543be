use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::registry::SizeDecoder;
use crate::types::Size;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const MAGIC: &[u8] = &PNG_SIGNATURE;

const FORMAT: &str = "png";

/// Signature, IHDR length and type, 13-byte payload and CRC.
const HEADER_LEN: usize = 33;
const IHDR_LEN: u32 = 13;

#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl SizeDecoder for PngDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        decode_png(reader)
    }
}

pub fn decode_png<R: Read + ?Sized>(reader: &mut R) -> Result<Size> {
    let mut data = [0u8; HEADER_LEN];
    reader.read_exact(&mut data)?;
    validate_png_header(&data)
}

/// Checks the signature and IHDR chunk of `data` and returns the image
/// dimensions.
pub fn validate_png_header(data: &[u8; HEADER_LEN]) -> Result<Size> {
    if data[..8] != PNG_SIGNATURE {
        return Err(SizeError::format(FORMAT, "not a PNG file"));
    }

    let ihdr_len = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    if &data[12..16] != b"IHDR" || ihdr_len != IHDR_LEN {
        return Err(SizeError::format(FORMAT, "missing IHDR chunk"));
    }

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&data[12..29]);
    let calculated = hasher.finalize();
    let stored = u32::from_be_bytes([data[29], data[30], data[31], data[32]]);
    if calculated != stored {
        return Err(SizeError::format(FORMAT, "invalid checksum"));
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(SizeError::format(FORMAT, "invalid dimension"));
    }
    trace!(width, height, bit_depth = data[24], color_type = data[25], "png header");
    Ok(Size::new(width, height))
}

#[cfg(test)]
pub(crate) fn build_header(width: u32, height: u32) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    out.extend_from_slice(&IHDR_LEN.to_be_bytes());
    out.extend_from_slice(b"IHDR");
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&[8, 6, 0, 0, 0]);
    let crc = crc32fast::hash(&out[12..29]);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_header() {
        let data = build_header(670, 717);
        assert_eq!(decode_png(&mut &data[..]).unwrap(), Size::new(670, 717));
    }

    #[test]
    fn test_bad_crc() {
        let mut data = build_header(670, 717);
        data[32] ^= 0xFF;
        assert!(decode_png(&mut &data[..]).unwrap_err().is_format());
    }

    #[test]
    fn test_ihdr_not_first() {
        let mut data = build_header(1, 1);
        data[12..16].copy_from_slice(b"gAMA");
        assert!(decode_png(&mut &data[..]).unwrap_err().is_format());
    }

    #[test]
    fn test_zero_and_huge_dimensions() {
        for (w, h) in [(0, 1), (1, 0), (1 << 31, 1)] {
            let data = build_header(w, h);
            assert!(decode_png(&mut &data[..]).unwrap_err().is_format());
        }
    }

    #[test]
    fn test_truncated() {
        let data = build_header(1, 1);
        assert!(matches!(
            decode_png(&mut &data[..20]),
            Err(SizeError::UnexpectedEof)
        ));
    }
}
