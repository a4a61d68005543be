//! WebP decoder
//!
//! Walks the chunks of a `RIFF`/`WEBP` container until one of them gives
//! the canvas size:
//!
//! - `VP8 `: lossy key frame header
//! - `VP8L`: lossless header
//! - `VP8X`: extended header with flags and a 24-bit canvas size
//!
//! With alpha verification enabled, an extended header that announces
//! alpha on a still image is followed through its `ALPH` chunk, which is
//! decoded and unfiltered, and the lossy frame that must come after it.

pub mod alpha;
pub mod riff;
pub mod vp8;
pub mod vp8l;

use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::options::DecodeOptions;
use crate::registry::SizeDecoder;
use crate::types::Size;

use riff::{ByteSource, FourCc};

pub const MAGIC: &[u8] = b"RIFF????WEBPVP8";

pub const FORM_WEBP: FourCc = *b"WEBP";
pub const FCC_ALPH: FourCc = *b"ALPH";
pub const FCC_VP8: FourCc = *b"VP8 ";
pub const FCC_VP8L: FourCc = *b"VP8L";
pub const FCC_VP8X: FourCc = *b"VP8X";

const VP8X_LEN: u32 = 10;

const FORMAT: &str = "webp";

/// `VP8X` feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vp8xFlags(pub u8);

impl Vp8xFlags {
    pub const ANIMATION: u8 = 1 << 1;
    pub const XMP: u8 = 1 << 2;
    pub const EXIF: u8 = 1 << 3;
    pub const ALPHA: u8 = 1 << 4;
    pub const ICC: u8 = 1 << 5;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

#[derive(Debug, Clone)]
pub struct WebpDecoder {
    options: DecodeOptions,
}

impl WebpDecoder {
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Default for WebpDecoder {
    fn default() -> Self {
        Self::new(&DecodeOptions::default())
    }
}

impl SizeDecoder for WebpDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        decode_webp(reader, &self.options)
    }
}

/// Canvas announced by a `VP8X` chunk whose alpha plane is still expected.
struct PendingAlpha {
    canvas: Size,
    width_minus_one: u32,
    height_minus_one: u32,
}

pub fn decode_webp<R: Read>(reader: R, options: &DecodeOptions) -> Result<Size> {
    let (form, mut riff) = riff::open(reader)?;
    if form != FORM_WEBP {
        return Err(SizeError::format(FORMAT, "form type is not WEBP"));
    }

    let mut pending: Option<PendingAlpha> = None;
    let mut canvas: Option<Size> = None;
    let mut alpha_seen = false;

    while let Some(mut chunk) = riff.next_chunk()? {
        let id = chunk.id();
        trace!(id = %String::from_utf8_lossy(&id), len = chunk.len(), "webp chunk");
        match id {
            FCC_ALPH => {
                let Some(want) = pending.take() else {
                    return Err(SizeError::format(FORMAT, "unexpected ALPH chunk"));
                };
                let plane = alpha::read_alpha(
                    &mut chunk,
                    want.width_minus_one,
                    want.height_minus_one,
                    options.max_chunk_size,
                )?;
                trace!(bytes = plane.len(), "alpha plane decoded");
                canvas = Some(want.canvas);
                alpha_seen = true;
            }
            FCC_VP8 => {
                if pending.is_some() {
                    return Err(SizeError::format(FORMAT, "missing ALPH chunk"));
                }
                if chunk.len() > i32::MAX as u32 {
                    return Err(SizeError::format(FORMAT, "VP8 chunk too large"));
                }
                let frame = vp8::decode_frame_header(&mut chunk)?;
                return Ok(canvas.unwrap_or(frame));
            }
            FCC_VP8L => {
                if pending.is_some() || alpha_seen {
                    return Err(SizeError::format(FORMAT, "lossless image with ALPH chunk"));
                }
                return Ok(vp8l::decode_header(&mut chunk)?.size);
            }
            FCC_VP8X => {
                if chunk.len() != VP8X_LEN {
                    return Err(SizeError::format(FORMAT, "VP8X chunk is not 10 bytes"));
                }
                let mut b = [0u8; VP8X_LEN as usize];
                chunk.read_exact(&mut b)?;
                let flags = Vp8xFlags(b[0]);
                let width_minus_one = u32::from_le_bytes([b[4], b[5], b[6], 0]);
                let height_minus_one = u32::from_le_bytes([b[7], b[8], b[9], 0]);
                let size = Size::new(width_minus_one + 1, height_minus_one + 1);
                trace!(?flags, %size, "webp extended header");

                if options.verify_alpha
                    && flags.contains(Vp8xFlags::ALPHA)
                    && !flags.contains(Vp8xFlags::ANIMATION)
                {
                    pending = Some(PendingAlpha {
                        canvas: size,
                        width_minus_one,
                        height_minus_one,
                    });
                    continue;
                }
                return Ok(size);
            }
            _ => {}
        }
    }
    Err(SizeError::format(FORMAT, "no image data chunk"))
}
