//! Decode options

/// Default cap on a single allocation driven by an untrusted length field.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10 << 20;

/// Options shared by the built-in decoders
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Largest contiguous buffer allocated for a length read from the stream.
    /// Longer values are fetched in pieces of this size.
    pub max_chunk_size: usize,
    /// Walk past an alpha-flagged WebP extended header and decode the
    /// alpha plane and key frame before reporting the size.
    pub verify_alpha: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            verify_alpha: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allocation cap; zero is raised to one byte.
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size.max(1);
        self
    }

    pub fn with_verify_alpha(mut self, verify: bool) -> Self {
        self.verify_alpha = verify;
        self
    }
}
