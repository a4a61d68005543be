//! Image format sniffing and dimension extraction.
//!
//! A [`FormatRegistry`] matches the leading bytes of a stream against the
//! magic patterns of the registered formats and hands the stream to the
//! matching decoder, which reads just enough of the header to report the
//! pixel dimensions.
//!
//! ```no_run
//! let (size, format) = dimsniff::decode_file("photo.webp")?;
//! println!("{format}: {size}");
//! # Ok::<(), dimsniff::SizeError>(())
//! ```

pub mod error;
pub mod formats;
pub mod io;
pub mod options;
pub mod registry;
pub mod signature;
pub mod types;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

pub use error::{Result, SizeError};
pub use options::DecodeOptions;
pub use registry::{FormatEntry, FormatRegistry, RegistryBuilder, SizeDecoder};
pub use signature::MagicPattern;
pub use types::{ByteOrder, Size};

static DEFAULT_REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();

/// The built-in registry with default options, built on first use.
pub fn default_registry() -> &'static FormatRegistry {
    DEFAULT_REGISTRY.get_or_init(FormatRegistry::builtin)
}

/// Sniffs `reader` with the default registry and returns its dimensions
/// and format name.
pub fn decode_size<R: Read>(reader: R) -> Result<(Size, &'static str)> {
    default_registry().decode_size(reader)
}

pub fn decode_bytes(data: &[u8]) -> Result<(Size, &'static str)> {
    decode_size(data)
}

pub fn decode_file(path: impl AsRef<Path>) -> Result<(Size, &'static str)> {
    let file = File::open(path)?;
    decode_size(BufReader::new(file))
}
