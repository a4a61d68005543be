//! Format registry
//!
//! Holds the ordered list of known formats, each a name, a magic pattern
//! and a decoder. The registry is assembled once through
//! [`RegistryBuilder`] and is read-only afterwards, so it can be shared
//! between threads without locking.

use std::fmt;
use std::io::{Cursor, Read};

use tracing::{debug, trace};

use crate::error::{Result, SizeError};
use crate::formats::{bmp, gif, jpeg, png, tiff, webp};
use crate::io::read_up_to;
use crate::options::DecodeOptions;
use crate::signature::MagicPattern;
use crate::types::Size;

/// Reads the dimensions of one image format from a stream positioned at
/// the start of the file.
///
/// Implementations must consume only what they need, return
/// [`SizeError::Format`] for malformed input and [`SizeError::Unsupported`]
/// for well-formed variants they do not handle.
pub trait SizeDecoder: Send + Sync {
    fn decode(&self, reader: &mut dyn Read) -> Result<Size>;
}

impl<F> SizeDecoder for F
where
    F: Fn(&mut dyn Read) -> Result<Size> + Send + Sync,
{
    fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        self(reader)
    }
}

/// A registered format
pub struct FormatEntry {
    name: String,
    pattern: MagicPattern,
    decoder: Box<dyn SizeDecoder>,
}

impl FormatEntry {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<MagicPattern>,
        decoder: impl SizeDecoder + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            decoder: Box::new(decoder),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &MagicPattern {
        &self.pattern
    }

    pub fn decode(&self, reader: &mut dyn Read) -> Result<Size> {
        self.decoder.decode(reader)
    }
}

impl fmt::Debug for FormatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatEntry")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Collects format entries in registration order
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<FormatEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a format. Names may repeat; entries are tried in the order
    /// they were registered.
    pub fn register(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<MagicPattern>,
        decoder: impl SizeDecoder + 'static,
    ) -> Self {
        self.entries.push(FormatEntry::new(name, pattern, decoder));
        self
    }

    /// Appends JPEG, PNG, GIF, WebP, BMP and both TIFF byte orders.
    pub fn with_builtin_formats(self, options: &DecodeOptions) -> Self {
        self.register("jpeg", jpeg::MAGIC, jpeg::JpegDecoder)
            .register("png", png::MAGIC, png::PngDecoder)
            .register("gif", gif::MAGIC, gif::GifDecoder)
            .register("webp", webp::MAGIC, webp::WebpDecoder::new(options))
            .register("bmp", bmp::MAGIC, bmp::BmpDecoder)
            .register("tiff", tiff::LE_HEADER, tiff::TiffDecoder::new(options))
            .register("tiff", tiff::BE_HEADER, tiff::TiffDecoder::new(options))
    }

    /// Freezes the entries into a registry. An empty magic pattern would
    /// match every stream and is rejected.
    pub fn build(self) -> Result<FormatRegistry> {
        if self.entries.iter().any(|e| e.pattern.is_empty()) {
            return Err(SizeError::Usage("format registered with an empty magic pattern"));
        }
        Ok(FormatRegistry::from_entries(self.entries))
    }
}

/// Ordered, immutable set of formats used to sniff and decode streams
#[derive(Debug)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
    lookahead: usize,
}

impl FormatRegistry {
    fn from_entries(entries: Vec<FormatEntry>) -> Self {
        let lookahead = entries.iter().map(|e| e.pattern.len()).max().unwrap_or(0);
        Self { entries, lookahead }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Creates a registry with the built-in formats and default options
    pub fn builtin() -> Self {
        Self::with_options(&DecodeOptions::default())
    }

    /// Creates a registry with the built-in formats
    pub fn with_options(options: &DecodeOptions) -> Self {
        Self::from_entries(RegistryBuilder::new().with_builtin_formats(options).entries)
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    /// Length of the longest pattern, which is how many bytes are buffered
    /// before matching.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Returns the first entry whose pattern matches `prefix`.
    pub fn sniff(&self, prefix: &[u8]) -> Option<&FormatEntry> {
        self.entries.iter().find(|e| e.pattern.matches(prefix))
    }

    /// Identifies the format of `reader` and reads its dimensions.
    ///
    /// The leading bytes used for matching are replayed to the decoder, so
    /// it sees the stream from its first byte. When the stream ends before
    /// the longest pattern could be read and nothing matched the shorter
    /// prefix, the result is [`SizeError::UnexpectedEof`] rather than
    /// [`SizeError::NoMatch`].
    pub fn decode_size<R: Read>(&self, mut reader: R) -> Result<(Size, &str)> {
        let mut prefix = vec![0u8; self.lookahead];
        let available = read_up_to(&mut reader, &mut prefix)?;
        prefix.truncate(available);

        let Some(entry) = self.sniff(&prefix) else {
            if available < self.lookahead {
                return Err(SizeError::UnexpectedEof);
            }
            return Err(SizeError::NoMatch);
        };
        trace!(format = entry.name(), prefix_len = available, "magic pattern matched");

        let mut replay = Cursor::new(prefix).chain(reader);
        let size = entry.decode(&mut replay)?;
        debug!(format = entry.name(), %size, "decoded image size");
        Ok((size, entry.name()))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
