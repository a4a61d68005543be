//! VP8 (lossy) frame header
//!
//! A frame starts with a 3-byte tag whose lowest bit is clear for key
//! frames. Only key frames carry the 3-byte start code and the 14-bit
//! width and height (the top two bits of each are a scaling factor).

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::types::Size;

use super::riff::ByteSource;

pub const START_CODE: [u8; 3] = [0x9d, 0x01, 0x2a];

const FORMAT: &str = "vp8";

pub fn decode_frame_header<S: ByteSource>(mut src: S) -> Result<Size> {
    let mut tag = [0u8; 3];
    src.read_exact(&mut tag)?;
    if tag[0] & 1 != 0 {
        return Err(SizeError::unsupported(FORMAT, "dimensions from non-key frame"));
    }

    let mut b = [0u8; 7];
    src.read_exact(&mut b)?;
    if b[..3] != START_CODE {
        return Err(SizeError::format(FORMAT, "invalid start code"));
    }
    let width = u16::from_le_bytes([b[3], b[4] & 0x3f]);
    let height = u16::from_le_bytes([b[5], b[6] & 0x3f]);
    trace!(
        width,
        height,
        x_scale = b[4] >> 6,
        y_scale = b[6] >> 6,
        "vp8 key frame"
    );
    Ok(Size::new(width as u32, height as u32))
}

#[cfg(test)]
pub(crate) fn key_frame(width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0x10, 0x02, 0x00];
    out.extend_from_slice(&START_CODE);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out
}
