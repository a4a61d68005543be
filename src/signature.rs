//! Magic byte patterns
//!
//! A pattern is a sequence of literal bytes and single-byte wildcards. It
//! lets one signature describe a format whose header carries variable
//! fields at fixed offsets, such as the BMP file size or the RIFF length.

use std::fmt;

/// Byte that stands for "any byte" in [`MagicPattern::new`].
pub const WILDCARD: u8 = b'?';

/// A magic-number pattern matched against the first bytes of a stream
#[derive(Clone, PartialEq, Eq)]
pub struct MagicPattern {
    bytes: Vec<Option<u8>>,
}

impl MagicPattern {
    /// Builds a pattern in which every `?` byte is a wildcard.
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            bytes: pattern
                .iter()
                .map(|&b| (b != WILDCARD).then_some(b))
                .collect(),
        }
    }

    /// Builds a pattern from explicit positions, for signatures that need a
    /// literal `?`.
    pub fn from_parts(bytes: Vec<Option<u8>>) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Tests `prefix` against the pattern. A prefix shorter than the pattern
    /// never matches.
    pub fn matches(&self, prefix: &[u8]) -> bool {
        if prefix.len() < self.bytes.len() {
            return false;
        }
        self.bytes
            .iter()
            .zip(prefix)
            .all(|(want, got)| want.is_none_or(|b| b == *got))
    }
}

impl fmt::Debug for MagicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MagicPattern(")?;
        for b in &self.bytes {
            match b {
                Some(b) => write!(f, "{b:02x}")?,
                None => f.write_str("??")?,
            }
        }
        f.write_str(")")
    }
}

impl From<&[u8]> for MagicPattern {
    fn from(pattern: &[u8]) -> Self {
        Self::new(pattern)
    }
}

impl<const N: usize> From<&[u8; N]> for MagicPattern {
    fn from(pattern: &[u8; N]) -> Self {
        Self::new(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = MagicPattern::new(b"\xff\xd8");
        assert!(pattern.matches(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!pattern.matches(&[0xFF, 0xD9]));
    }

    #[test]
    fn test_wildcards_match_any_byte() {
        let pattern = MagicPattern::new(b"GIF8?a");
        assert!(pattern.matches(b"GIF87a"));
        assert!(pattern.matches(b"GIF89a"));
        assert!(!pattern.matches(b"GIF89b"));
    }

    #[test]
    fn test_short_prefix_never_matches() {
        let pattern = MagicPattern::new(b"RIFF????WEBPVP8");
        assert!(!pattern.matches(b"RIFF"));
    }

    #[test]
    fn test_literal_question_mark() {
        let pattern = MagicPattern::from_parts(vec![Some(b'?'), None]);
        assert!(pattern.matches(b"?x"));
        assert!(!pattern.matches(b"!x"));
    }

    #[test]
    fn test_debug_shows_wildcards() {
        let pattern = MagicPattern::new(b"BM??");
        assert_eq!(format!("{pattern:?}"), "MagicPattern(424d????)");
    }
}
