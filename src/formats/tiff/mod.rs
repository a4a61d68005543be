//! TIFF directory decoder
//!
//! Walks the first Image File Directory and keeps the fields that describe
//! the image layout. Width and height come from `ImageWidth` and
//! `ImageLength`; a missing tag reads as 0.

pub mod tags;

pub use tags::{BE_HEADER, DataType, IFD_ENTRY_LEN, LE_HEADER};

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Read;

use tracing::trace;

use crate::error::{Result, SizeError};
use crate::io::{ReadAtBuffer, safe_read_at};
use crate::options::DecodeOptions;
use crate::registry::SizeDecoder;
use crate::types::{ByteOrder, Size};

const FORMAT: &str = "tiff";

const MAX_COLORS: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct TiffDecoder {
    max_chunk_size: usize,
}

impl TiffDecoder {
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            max_chunk_size: options.max_chunk_size,
        }
    }
}

impl Default for TiffDecoder {
    fn default() -> Self {
        Self::new(&DecodeOptions::default())
    }
}

impl SizeDecoder for TiffDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        let directory = Directory::read(reader, self.max_chunk_size)?;
        Ok(directory.size())
    }
}

/// Reads the dimensions of a TIFF stream.
pub fn decode_tiff<R: Read>(reader: R, options: &DecodeOptions) -> Result<Size> {
    Ok(Directory::read(reader, options.max_chunk_size)?.size())
}

/// The retained fields of the first IFD
#[derive(Debug, Default)]
pub struct Directory {
    byte_order: Option<ByteOrder>,
    features: BTreeMap<u16, Vec<u32>>,
    palette: Vec<[u16; 4]>,
}

impl Directory {
    pub fn read<R: Read>(reader: R, max_chunk_size: usize) -> Result<Self> {
        let mut walker = IfdWalker {
            reader: ReadAtBuffer::new(reader, max_chunk_size),
            byte_order: ByteOrder::LittleEndian,
            max_chunk_size,
            directory: Directory::default(),
        };
        walker.walk()?;
        Ok(walker.directory)
    }

    pub fn byte_order(&self) -> Option<ByteOrder> {
        self.byte_order
    }

    /// Values stored for `tag`, if it was present and retained.
    pub fn values(&self, tag: u16) -> Option<&[u32]> {
        self.features.get(&tag).map(Vec::as_slice)
    }

    /// First value of `tag`, or 0 if the tag is absent.
    pub fn first_value(&self, tag: u16) -> u32 {
        self.values(tag).and_then(|v| v.first().copied()).unwrap_or(0)
    }

    /// Color map entries as 16-bit RGBA.
    pub fn palette(&self) -> &[[u16; 4]] {
        &self.palette
    }

    pub fn size(&self) -> Size {
        Size::new(
            self.first_value(tags::IMAGE_WIDTH),
            self.first_value(tags::IMAGE_LENGTH),
        )
    }
}

struct IfdWalker<R> {
    reader: ReadAtBuffer<R>,
    byte_order: ByteOrder,
    max_chunk_size: usize,
    directory: Directory,
}

impl<R: Read> IfdWalker<R> {
    fn walk(&mut self) -> Result<()> {
        let mut p = [0u8; 8];
        self.reader.read_at(&mut p, 0)?;
        self.byte_order = match &p[..4] {
            LE_HEADER => ByteOrder::LittleEndian,
            BE_HEADER => ByteOrder::BigEndian,
            _ => return Err(SizeError::format(FORMAT, "malformed header")),
        };
        self.directory.byte_order = Some(self.byte_order);

        let ifd_offset = self.byte_order.u32(&p[4..8]) as u64;
        self.reader.read_at(&mut p[..2], ifd_offset)?;
        let entry_count = self.byte_order.u16(&p[..2]) as u64;
        trace!(ifd_offset, entry_count, "tiff directory");

        let entries = safe_read_at(
            &mut self.reader,
            IFD_ENTRY_LEN as u64 * entry_count,
            ifd_offset + 2,
            self.max_chunk_size,
        )?;

        let mut prev_tag: Option<u16> = None;
        for entry in entries.chunks_exact(IFD_ENTRY_LEN) {
            let tag = self.parse_entry(entry)?;
            if prev_tag.is_some_and(|prev| tag <= prev) {
                return Err(SizeError::format(FORMAT, "tags are not sorted in ascending order"));
            }
            prev_tag = Some(tag);
        }
        Ok(())
    }

    /// Stores the entry if it is one of the retained tags and returns its tag.
    fn parse_entry(&mut self, p: &[u8]) -> Result<u16> {
        let tag = self.byte_order.u16(&p[0..2]);
        match tag {
            t if tags::RETAINED.contains(&t) => {
                let values = self.values(p)?;
                trace!(tag, count = values.len(), "tiff field");
                self.directory.features.insert(tag, values);
            }
            tags::COLOR_MAP => {
                let values = self.values(p)?;
                let colors = values.len() / 3;
                if values.len() % 3 != 0 || colors == 0 || colors > MAX_COLORS {
                    return Err(SizeError::format(FORMAT, "bad ColorMap length"));
                }
                self.directory.palette = (0..colors)
                    .map(|i| {
                        [
                            values[i] as u16,
                            values[i + colors] as u16,
                            values[i + 2 * colors] as u16,
                            0xFFFF,
                        ]
                    })
                    .collect();
            }
            // Readers that cannot handle a SampleFormat other than unsigned
            // integers must stop instead of misreading the samples.
            tags::SAMPLE_FORMAT => {
                let values = self.values(p)?;
                if values.iter().any(|&v| v != tags::SAMPLE_FORMAT_UINT) {
                    return Err(SizeError::unsupported(FORMAT, "sample format"));
                }
            }
            _ => {}
        }
        Ok(tag)
    }

    /// Decodes the values of a Byte, Short or Long entry, following the
    /// offset when they do not fit inline.
    fn values(&mut self, p: &[u8]) -> Result<Vec<u32>> {
        let order = self.byte_order;
        let datatype = DataType::from_u16(order.u16(&p[2..4]))
            .ok_or(SizeError::unsupported(FORMAT, "IFD entry datatype"))?;

        let count = order.u32(&p[4..8]);
        if count > i32::MAX as u32 / datatype.size() {
            return Err(SizeError::format(FORMAT, "IFD data too large"));
        }
        let data_len = datatype.size() * count;
        let raw: Cow<'_, [u8]> = if data_len > 4 {
            let offset = order.u32(&p[8..12]) as u64;
            Cow::Owned(safe_read_at(
                &mut self.reader,
                data_len as u64,
                offset,
                self.max_chunk_size,
            )?)
        } else {
            Cow::Borrowed(&p[8..8 + data_len as usize])
        };

        let values: Vec<u32> = match datatype {
            DataType::Byte => raw.iter().map(|&b| b as u32).collect(),
            DataType::Short => raw.chunks_exact(2).map(|c| order.u16(c) as u32).collect(),
            DataType::Long => raw.chunks_exact(4).map(|c| order.u32(c)).collect(),
            DataType::Ascii | DataType::Rational => {
                return Err(SizeError::unsupported(FORMAT, "data type"));
            }
        };
        Ok(values)
    }
}
