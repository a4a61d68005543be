use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::registry::SizeDecoder;
use crate::types::Size;

pub const MAGIC: &[u8] = b"GIF8?a";

const FORMAT: &str = "gif";

/// Header and logical screen descriptor.
const HEADER_LEN: usize = 13;

const FLAG_GLOBAL_COLOR_TABLE: u8 = 0x80;
const MASK_COLOR_TABLE_SIZE: u8 = 0x07;

#[derive(Debug, Clone, Copy, Default)]
pub struct GifDecoder;

impl SizeDecoder for GifDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        decode_gif(reader)
    }
}

/// Reads the header and logical screen descriptor, and the global color
/// table when one is flagged.
pub fn decode_gif<R: Read + ?Sized>(reader: &mut R) -> Result<Size> {
    let mut b = [0u8; HEADER_LEN];
    reader.read_exact(&mut b)?;
    if &b[..6] != b"GIF87a" && &b[..6] != b"GIF89a" {
        return Err(SizeError::format(FORMAT, "can't recognize format"));
    }
    let width = u16::from_le_bytes([b[6], b[7]]);
    let height = u16::from_le_bytes([b[8], b[9]]);

    let flags = b[10];
    if flags & FLAG_GLOBAL_COLOR_TABLE != 0 {
        let entries = 1usize << (1 + (flags & MASK_COLOR_TABLE_SIZE));
        let mut table = [0u8; 3 * 256];
        reader.read_exact(&mut table[..3 * entries])?;
        trace!(entries, background = b[11], "gif global color table");
    }
    Ok(Size::new(width as u32, height as u32))
}
