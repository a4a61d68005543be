//! TIFF constants
//!
//! An Image File Directory is a 16-bit entry count followed by 12-byte
//! entries: a tag, a data type, a value count and either the value itself
//! or, when it does not fit in 4 bytes, an absolute offset to it.

pub const LE_HEADER: &[u8] = b"II\x2A\x00";
pub const BE_HEADER: &[u8] = b"MM\x00\x2A";

/// Length of one IFD entry in bytes.
pub const IFD_ENTRY_LEN: usize = 12;

/// Field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DataType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
}

impl DataType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Byte),
            2 => Some(Self::Ascii),
            3 => Some(Self::Short),
            4 => Some(Self::Long),
            5 => Some(Self::Rational),
            _ => None,
        }
    }

    /// Size of one value in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Byte | Self::Ascii => 1,
            Self::Short => 2,
            Self::Long => 4,
            Self::Rational => 8,
        }
    }
}

pub const IMAGE_WIDTH: u16 = 256;
pub const IMAGE_LENGTH: u16 = 257;
pub const BITS_PER_SAMPLE: u16 = 258;
pub const COMPRESSION: u16 = 259;
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
pub const FILL_ORDER: u16 = 266;
pub const STRIP_OFFSETS: u16 = 273;
pub const ROWS_PER_STRIP: u16 = 278;
pub const STRIP_BYTE_COUNTS: u16 = 279;
/// CCITT Group 3 options, 32 flag bits.
pub const T4_OPTIONS: u16 = 292;
/// CCITT Group 4 options, 32 flag bits.
pub const T6_OPTIONS: u16 = 293;
pub const PREDICTOR: u16 = 317;
pub const COLOR_MAP: u16 = 320;
pub const TILE_WIDTH: u16 = 322;
pub const TILE_LENGTH: u16 = 323;
pub const TILE_OFFSETS: u16 = 324;
pub const TILE_BYTE_COUNTS: u16 = 325;
pub const EXTRA_SAMPLES: u16 = 338;
pub const SAMPLE_FORMAT: u16 = 339;

/// Tags whose values are kept in the feature map.
pub const RETAINED: [u16; 17] = [
    IMAGE_WIDTH,
    IMAGE_LENGTH,
    BITS_PER_SAMPLE,
    COMPRESSION,
    PHOTOMETRIC_INTERPRETATION,
    FILL_ORDER,
    STRIP_OFFSETS,
    ROWS_PER_STRIP,
    STRIP_BYTE_COUNTS,
    T4_OPTIONS,
    T6_OPTIONS,
    PREDICTOR,
    TILE_WIDTH,
    TILE_LENGTH,
    TILE_OFFSETS,
    TILE_BYTE_COUNTS,
    EXTRA_SAMPLES,
];

/// SampleFormat value for unsigned integer data.
pub const SAMPLE_FORMAT_UINT: u32 = 1;
