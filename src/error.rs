use std::io;
use thiserror::Error;

/// Errors that can occur while sniffing a stream or reading its dimensions
#[derive(Error, Debug)]
pub enum SizeError {
    /// The stream does not follow the grammar of the format it claims to be
    #[error("{format}: invalid format: {reason}")]
    Format {
        format: &'static str,
        reason: &'static str,
    },

    /// The stream is well-formed but uses a variant this crate does not read
    #[error("{format}: unsupported feature: {feature}")]
    Unsupported {
        format: &'static str,
        feature: &'static str,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("I/O error: {0}")]
    Io(io::Error),

    /// A programming-contract violation by the caller
    #[error("usage error: {0}")]
    Usage(&'static str),

    #[error("unknown image format")]
    NoMatch,

    #[error("lossless alpha decode failed: {0}")]
    Lossless(#[from] image_webp::DecodingError),
}

impl SizeError {
    pub(crate) fn format(format: &'static str, reason: &'static str) -> Self {
        Self::Format { format, reason }
    }

    pub(crate) fn unsupported(format: &'static str, feature: &'static str) -> Self {
        Self::Unsupported { format, feature }
    }

    /// Returns true if the stream was judged corrupt.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns true if the stream was valid but not handled.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl From<io::Error> for SizeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::Io(err),
        }
    }
}

pub type Result<T, E = SizeError> = std::result::Result<T, E>;
