use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::registry::SizeDecoder;
use crate::types::Size;

pub const MAGIC: &[u8] = &JPEG_SOI;

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

const FORMAT: &str = "jpeg";

const MARKER_TEM: u8 = 0x01;
const MARKER_DHT: u8 = 0xC4;
const MARKER_JPG: u8 = 0xC8;
const MARKER_DAC: u8 = 0xCC;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;

/// Start-of-frame markers, which carry the frame dimensions.
#[inline]
pub fn is_sof_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, MARKER_DHT | MARKER_JPG | MARKER_DAC)
}

/// Markers without a length field.
#[inline]
fn is_standalone(marker: u8) -> bool {
    matches!(marker, MARKER_TEM | 0xD0..=0xD7)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JpegDecoder;

impl SizeDecoder for JpegDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        decode_jpeg(reader)
    }
}

fn read_u8<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b)?;
    Ok(b[0])
}

fn skip<R: Read + ?Sized>(reader: &mut R, len: u64) -> Result<()> {
    let skipped = std::io::copy(&mut reader.take(len), &mut std::io::sink())?;
    if skipped != len {
        return Err(SizeError::UnexpectedEof);
    }
    Ok(())
}

/// Walks the marker segments up to the first frame header.
pub fn decode_jpeg<R: Read + ?Sized>(reader: &mut R) -> Result<Size> {
    let mut soi = [0u8; 2];
    reader.read_exact(&mut soi)?;
    if soi != JPEG_SOI {
        return Err(SizeError::format(FORMAT, "missing SOI marker"));
    }

    loop {
        if read_u8(reader)? != 0xFF {
            return Err(SizeError::format(FORMAT, "missing 0xff marker start"));
        }
        let mut marker = read_u8(reader)?;
        while marker == 0xFF {
            marker = read_u8(reader)?;
        }
        if marker == 0x00 {
            return Err(SizeError::format(FORMAT, "stuffed byte outside scan data"));
        }
        if is_standalone(marker) {
            continue;
        }
        if matches!(marker, MARKER_SOS | MARKER_EOI) {
            return Err(SizeError::format(FORMAT, "missing SOF marker"));
        }

        let mut len = [0u8; 2];
        reader.read_exact(&mut len)?;
        let len = u16::from_be_bytes(len);
        if len < 2 {
            return Err(SizeError::format(FORMAT, "short segment length"));
        }

        if is_sof_marker(marker) {
            if len < 8 {
                return Err(SizeError::format(FORMAT, "short SOF segment"));
            }
            let mut b = [0u8; 5];
            reader.read_exact(&mut b)?;
            let height = u16::from_be_bytes([b[1], b[2]]);
            let width = u16::from_be_bytes([b[3], b[4]]);
            trace!(marker, precision = b[0], width, height, "jpeg frame header");
            return Ok(Size::new(width as u32, height as u32));
        }

        trace!(marker, len, "jpeg segment");
        skip(reader, len as u64 - 2)?;
    }
}
