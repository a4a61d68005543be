//! Byte-level builders for minimal image headers.

#![allow(dead_code)]

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    out.extend_from_slice(&13u32.to_be_bytes());
    out.extend_from_slice(b"IHDR");
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&[8, 2, 0, 0, 0]);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&out[12..29]);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

pub fn gif(width: u16, height: u16) -> Vec<u8> {
    let mut out = b"GIF89a".to_vec();
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&[0, 0, 0]);
    out
}

pub fn jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&[1, 1, 0x11, 0]);
    out
}

/// BITMAPINFOHEADER file with the given depth. 8-bit files get a palette
/// of `colors_used` entries, 256 when zero.
pub fn bmp(width: i32, height: i32, bpp: u16, colors_used: u32) -> Vec<u8> {
    let palette_len = match (bpp, colors_used) {
        (8, 0) => 256,
        (8, n) => n,
        _ => 0,
    };
    let offset = 14 + 40 + palette_len * 4;

    let mut out = b"BM".to_vec();
    out.extend_from_slice(&(offset + 4).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&[0; 16]);
    out.extend_from_slice(&colors_used.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend(std::iter::repeat_n(0x40, (palette_len * 4) as usize));
    out.extend_from_slice(&[0; 4]);
    out
}

/// One IFD entry: tag, data type and values.
pub type Entry<'a> = (u16, u16, &'a [u32]);

/// TIFF with a single IFD at offset 8 holding `entries` in the given
/// order. Values that do not fit the entry are stored after the IFD.
pub fn tiff(little_endian: bool, entries: &[Entry<'_>]) -> Vec<u8> {
    let u16b = |v: u16| if little_endian { v.to_le_bytes() } else { v.to_be_bytes() };
    let u32b = |v: u32| if little_endian { v.to_le_bytes() } else { v.to_be_bytes() };
    let size_of = |ty: u16| match ty {
        1 | 2 => 1,
        3 => 2,
        4 => 4,
        _ => 8,
    };

    let mut out = if little_endian {
        b"II\x2A\x00".to_vec()
    } else {
        b"MM\x00\x2A".to_vec()
    };
    out.extend_from_slice(&u32b(8));
    out.extend_from_slice(&u16b(entries.len() as u16));

    let mut overflow = Vec::new();
    let overflow_start = 8 + 2 + entries.len() * 12 + 4;
    for &(tag, ty, values) in entries {
        let mut raw = Vec::new();
        for &v in values {
            match size_of(ty) {
                1 => raw.push(v as u8),
                2 => raw.extend_from_slice(&u16b(v as u16)),
                4 => raw.extend_from_slice(&u32b(v)),
                _ => {
                    raw.extend_from_slice(&u32b(v));
                    raw.extend_from_slice(&u32b(1));
                }
            }
        }
        out.extend_from_slice(&u16b(tag));
        out.extend_from_slice(&u16b(ty));
        out.extend_from_slice(&u32b(values.len() as u32));
        if raw.len() <= 4 {
            raw.resize(4, 0);
            out.extend_from_slice(&raw);
        } else {
            out.extend_from_slice(&u32b((overflow_start + overflow.len()) as u32));
            overflow.extend_from_slice(&raw);
        }
    }
    out.extend_from_slice(&u32b(0));
    out.extend_from_slice(&overflow);
    out
}

pub fn riff_chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

pub fn webp(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body = chunks.concat();
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(&body);
    out
}

pub fn vp8_key_frame(width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a];
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out
}

pub fn vp8x(flags: u8, width: u32, height: u32) -> Vec<u8> {
    let mut body = vec![flags, 0, 0, 0];
    body.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    body.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    riff_chunk(b"VP8X", &body)
}
