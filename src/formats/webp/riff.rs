//! RIFF chunk reader
//!
//! A RIFF stream is `RIFF`, a 32-bit little-endian length and a form type,
//! followed by chunks of `id`, `length`, body and a pad byte when the
//! length is odd. [`RiffReader::next_chunk`] hands out a [`Chunk`] that
//! mutably borrows the reader, so a chunk can no longer be read once the
//! next one has been requested.

use std::io::{self, Read};

use crate::error::{Result, SizeError};

/// Four character code
pub type FourCc = [u8; 4];

pub const CHUNK_HEADER_SIZE: u32 = 8;

const FORMAT: &str = "riff";

/// Exact-length byte reads, implemented by chunks and by in-memory slices.
pub trait ByteSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }
}

impl ByteSource for &[u8] {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        Read::read_exact(self, buf).map_err(SizeError::from)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Maps a short read to the given framing error.
fn short_as(err: io::Error, reason: &'static str) -> SizeError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => SizeError::format(FORMAT, reason),
        _ => SizeError::from(err),
    }
}

/// Reads the chunks of one RIFF list
#[derive(Debug)]
pub struct RiffReader<R> {
    inner: R,
    /// Bytes left in the list.
    total_len: u32,
    /// Unread bytes of the current chunk.
    chunk_len: u32,
    padded: bool,
    failed: bool,
}

/// Reads the RIFF header and returns the form type and a reader over the
/// top-level chunks.
pub fn open<R: Read>(mut inner: R) -> Result<(FourCc, RiffReader<R>)> {
    let mut buf = [0u8; CHUNK_HEADER_SIZE as usize];
    inner
        .read_exact(&mut buf)
        .map_err(|e| short_as(e, "missing RIFF chunk header"))?;
    if &buf[..4] != b"RIFF" {
        return Err(SizeError::format(FORMAT, "missing RIFF chunk header"));
    }
    let list_len = le_u32(&buf[4..]);
    if list_len < 4 {
        return Err(SizeError::format(FORMAT, "short chunk data"));
    }
    let mut form_type = [0u8; 4];
    inner
        .read_exact(&mut form_type)
        .map_err(|e| short_as(e, "short chunk data"))?;

    let reader = RiffReader {
        inner,
        total_len: list_len - 4,
        chunk_len: 0,
        padded: false,
        failed: false,
    };
    Ok((form_type, reader))
}

impl<R: Read> RiffReader<R> {
    fn fail(&mut self, err: SizeError) -> SizeError {
        self.failed = true;
        err
    }

    /// Bytes of the list not yet consumed.
    pub fn remaining(&self) -> u32 {
        self.total_len
    }

    /// Advances to the next chunk, skipping whatever is left of the current
    /// one and its pad byte. Returns `None` once the list is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk<'_, R>>> {
        if self.failed {
            return Err(SizeError::Usage("riff: reader used after a failed read"));
        }

        if self.chunk_len != 0 {
            let want = self.chunk_len as u64;
            let got = match io::copy(&mut (&mut self.inner).take(want), &mut io::sink()) {
                Ok(got) => got,
                Err(e) => return Err(self.fail(e.into())),
            };
            self.total_len -= got as u32;
            self.chunk_len -= got as u32;
            if got != want {
                return Err(self.fail(SizeError::format(FORMAT, "short chunk data")));
            }
        }

        if self.padded {
            if self.total_len == 0 {
                return Err(self.fail(SizeError::format(FORMAT, "list subchunk too long")));
            }
            self.total_len -= 1;
            let mut pad = [0u8; 1];
            if let Err(e) = self.inner.read_exact(&mut pad) {
                return Err(self.fail(short_as(e, "missing padding byte")));
            }
            self.padded = false;
        }

        if self.total_len == 0 {
            return Ok(None);
        }

        if self.total_len < CHUNK_HEADER_SIZE {
            return Err(self.fail(SizeError::format(FORMAT, "short chunk header")));
        }
        self.total_len -= CHUNK_HEADER_SIZE;
        let mut header = [0u8; CHUNK_HEADER_SIZE as usize];
        if let Err(e) = self.inner.read_exact(&mut header) {
            return Err(self.fail(short_as(e, "short chunk header")));
        }
        let id = [header[0], header[1], header[2], header[3]];
        let len = le_u32(&header[4..]);
        if len > self.total_len {
            return Err(self.fail(SizeError::format(FORMAT, "list subchunk too long")));
        }
        self.chunk_len = len;
        self.padded = len & 1 == 1;
        Ok(Some(Chunk {
            riff: self,
            id,
            len,
        }))
    }
}

/// The body of one chunk, valid until the next chunk is requested
pub struct Chunk<'a, R> {
    riff: &'a mut RiffReader<R>,
    id: FourCc,
    len: u32,
}

impl<R: Read> Chunk<'_, R> {
    pub fn id(&self) -> FourCc {
        self.id
    }

    /// Declared body length.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unread body bytes.
    pub fn remaining(&self) -> u32 {
        self.riff.chunk_len
    }

    /// Reads the rest of the body in pieces of at most `max_chunk` bytes.
    pub fn read_remaining(&mut self, max_chunk: usize) -> Result<Vec<u8>> {
        let len = self.riff.chunk_len as u64;
        self.read_vec(len, max_chunk)
    }

    /// Reads `len` body bytes. Fails without allocating when the body is
    /// shorter than `len`.
    pub fn read_vec(&mut self, len: u64, max_chunk: usize) -> Result<Vec<u8>> {
        if self.riff.failed {
            return Err(SizeError::Usage("riff: chunk read after the reader failed"));
        }
        if len > self.riff.chunk_len as u64 {
            return Err(SizeError::UnexpectedEof);
        }
        match crate::io::read_bounded(&mut self.riff.inner, len, max_chunk) {
            Ok(buf) => {
                self.riff.chunk_len -= len as u32;
                self.riff.total_len -= len as u32;
                Ok(buf)
            }
            Err(e) => Err(self.riff.fail(e)),
        }
    }
}

impl<R: Read> ByteSource for Chunk<'_, R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.riff.failed {
            return Err(SizeError::Usage("riff: chunk read after the reader failed"));
        }
        if buf.len() as u64 > self.riff.chunk_len as u64 {
            return Err(SizeError::UnexpectedEof);
        }
        if let Err(e) = self.riff.inner.read_exact(buf) {
            return Err(self.riff.fail(e.into()));
        }
        self.riff.chunk_len -= buf.len() as u32;
        self.riff.total_len -= buf.len() as u32;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(id);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

#[cfg(test)]
pub(crate) fn container(form: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = chunks.concat();
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(form);
    out.extend_from_slice(&body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_chunks_with_padding() {
        let data = container(
            b"TEST",
            &[chunk(b"ONE ", b"abc"), chunk(b"TWO ", b"wxyz")],
        );
        let (form, mut riff) = open(&data[..]).unwrap();
        assert_eq!(&form, b"TEST");

        let mut one = riff.next_chunk().unwrap().unwrap();
        assert_eq!(&one.id(), b"ONE ");
        assert_eq!(one.len(), 3);
        assert_eq!(one.read_u8().unwrap(), b'a');

        // The unread body and pad byte are skipped.
        let mut two = riff.next_chunk().unwrap().unwrap();
        assert_eq!(&two.id(), b"TWO ");
        assert_eq!(two.read_remaining(2).unwrap(), b"wxyz");

        assert!(riff.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_read_past_chunk_end() {
        let data = container(b"TEST", &[chunk(b"ONE ", b"ab")]);
        let (_, mut riff) = open(&data[..]).unwrap();
        let mut one = riff.next_chunk().unwrap().unwrap();
        let mut buf = [0u8; 3];
        assert!(matches!(
            ByteSource::read_exact(&mut one, &mut buf),
            Err(SizeError::UnexpectedEof)
        ));
        assert!(matches!(
            one.read_vec(u32::MAX as u64, 16),
            Err(SizeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_missing_header() {
        assert!(open(&b"RIF"[..]).unwrap_err().is_format());
        assert!(open(&b"RIFX\x04\x00\x00\x00WEBP"[..]).unwrap_err().is_format());
        assert!(open(&b"RIFF\x02\x00\x00\x00WEBP"[..]).unwrap_err().is_format());
    }

    #[test]
    fn test_chunk_longer_than_list() {
        let mut data = container(b"TEST", &[chunk(b"ONE ", b"ab")]);
        data[16..20].copy_from_slice(&100u32.to_le_bytes());
        let (_, mut riff) = open(&data[..]).unwrap();
        assert!(riff.next_chunk().err().unwrap().is_format());
        assert!(matches!(riff.next_chunk(), Err(SizeError::Usage(_))));
    }

    #[test]
    fn test_short_chunk_header() {
        let mut data = container(b"TEST", &[chunk(b"ONE ", b"ab")]);
        data.extend_from_slice(b"XY");
        let len = data.len() as u32 - 8;
        data[4..8].copy_from_slice(&len.to_le_bytes());
        let (_, mut riff) = open(&data[..]).unwrap();
        riff.next_chunk().unwrap().unwrap();
        assert!(riff.next_chunk().err().unwrap().is_format());
    }

    #[test]
    fn test_missing_padding_byte() {
        let mut data = container(b"TEST", &[chunk(b"ONE ", b"abc")]);
        data.pop();
        let (_, mut riff) = open(&data[..]).unwrap();
        riff.next_chunk().unwrap().unwrap();
        assert!(riff.next_chunk().err().unwrap().is_format());
    }

    #[test]
    fn test_truncated_body() {
        let mut data = container(b"TEST", &[chunk(b"ONE ", b"abcd"), chunk(b"TWO ", b"")]);
        data.truncate(12 + 8 + 2);
        let (_, mut riff) = open(&data[..]).unwrap();
        riff.next_chunk().unwrap().unwrap();
        assert!(riff.next_chunk().err().unwrap().is_format());
    }
}
