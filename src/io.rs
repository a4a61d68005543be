//! Bounded reads over untrusted streams.

use std::io::{self, Read};

use crate::error::{Result, SizeError};

/// Reads until `buf` is full or the stream ends, returning the number of
/// bytes read. Unlike `read_exact`, a short stream is not an error.
pub fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Random-access view over a forward-only stream.
///
/// Bytes are pulled from the inner reader on demand and kept, so earlier
/// offsets can be read again. Memory use is bounded by how far into the
/// stream a caller actually reads, never by a requested length alone.
pub struct ReadAtBuffer<R> {
    inner: R,
    buf: Vec<u8>,
    eof: bool,
    fill_step: usize,
}

impl<R: Read> ReadAtBuffer<R> {
    pub fn new(inner: R, fill_step: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            eof: false,
            fill_step: fill_step.max(1),
        }
    }

    /// Number of bytes pulled from the inner reader so far.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn fill_to(&mut self, end: u64) -> Result<()> {
        while (self.buf.len() as u64) < end && !self.eof {
            let want = (end - self.buf.len() as u64).min(self.fill_step as u64);
            let got = (&mut self.inner).take(want).read_to_end(&mut self.buf)?;
            if got == 0 {
                self.eof = true;
            }
        }
        Ok(())
    }

    /// Fills `dst` with the bytes at `offset`. Fails with
    /// [`SizeError::UnexpectedEof`] if the stream ends first.
    pub fn read_at(&mut self, dst: &mut [u8], offset: u64) -> Result<()> {
        let end = offset
            .checked_add(dst.len() as u64)
            .ok_or(SizeError::UnexpectedEof)?;
        self.fill_to(end)?;
        if (self.buf.len() as u64) < end {
            return Err(SizeError::UnexpectedEof);
        }
        let start = offset as usize;
        dst.copy_from_slice(&self.buf[start..start + dst.len()]);
        Ok(())
    }
}

/// Reads `len` bytes at `offset`, where `len` comes from untrusted data.
///
/// Lengths below `max_chunk` are read in one allocation. Longer ones are
/// read `max_chunk` bytes at a time, so a hostile length fails on the first
/// missing piece instead of forcing a huge allocation up front.
pub fn safe_read_at<R: Read>(
    reader: &mut ReadAtBuffer<R>,
    len: u64,
    offset: u64,
    max_chunk: usize,
) -> Result<Vec<u8>> {
    let Ok(mut remaining) = usize::try_from(len) else {
        return Err(SizeError::UnexpectedEof);
    };
    let max_chunk = max_chunk.max(1);

    if remaining < max_chunk {
        let mut buf = vec![0u8; remaining];
        reader.read_at(&mut buf, offset)?;
        return Ok(buf);
    }

    let mut buf = Vec::new();
    let mut piece = vec![0u8; max_chunk];
    let mut offset = offset;
    while remaining > 0 {
        let next = remaining.min(max_chunk);
        reader.read_at(&mut piece[..next], offset)?;
        buf.extend_from_slice(&piece[..next]);
        remaining -= next;
        offset += next as u64;
    }
    Ok(buf)
}

/// Reads exactly `len` bytes from a forward-only stream in capped pieces.
pub fn read_bounded<R: Read + ?Sized>(reader: &mut R, len: u64, max_chunk: usize) -> Result<Vec<u8>> {
    let max_chunk = max_chunk.max(1) as u64;
    let mut buf = Vec::new();
    let mut remaining = len;
    while remaining > 0 {
        let next = remaining.min(max_chunk);
        let got = (&mut *reader).take(next).read_to_end(&mut buf)? as u64;
        if got != next {
            return Err(SizeError::UnexpectedEof);
        }
        remaining -= next;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most one byte per call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_read_up_to_short_stream() {
        let mut buf = [0u8; 8];
        let n = read_up_to(&mut Trickle(b"abc"), &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_read_at_replays_earlier_bytes() {
        let mut reader = ReadAtBuffer::new(Cursor::new(b"0123456789".to_vec()), 4);
        let mut dst = [0u8; 3];
        reader.read_at(&mut dst, 6).unwrap();
        assert_eq!(&dst, b"678");
        reader.read_at(&mut dst, 1).unwrap();
        assert_eq!(&dst, b"123");
    }

    #[test]
    fn test_read_at_past_end() {
        let mut reader = ReadAtBuffer::new(Cursor::new(b"0123".to_vec()), 16);
        let mut dst = [0u8; 2];
        assert!(matches!(
            reader.read_at(&mut dst, 3),
            Err(SizeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_safe_read_at_in_pieces() {
        let data: Vec<u8> = (0..100).collect();
        let mut reader = ReadAtBuffer::new(Cursor::new(data), 7);
        let got = safe_read_at(&mut reader, 50, 10, 8).unwrap();
        assert_eq!(got, (10..60).collect::<Vec<u8>>());
    }

    #[test]
    fn test_safe_read_at_huge_length_fails_without_allocating() {
        let mut reader = ReadAtBuffer::new(Cursor::new(vec![0u8; 64]), 16);
        let err = safe_read_at(&mut reader, u32::MAX as u64, 0, 16).unwrap_err();
        assert!(matches!(err, SizeError::UnexpectedEof));
        assert_eq!(reader.buffered(), 64);
    }

    #[test]
    fn test_safe_read_at_zero_length() {
        let mut reader = ReadAtBuffer::new(Cursor::new(Vec::new()), 16);
        assert!(safe_read_at(&mut reader, 0, 0, 16).unwrap().is_empty());
    }

    #[test]
    fn test_read_bounded() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        assert_eq!(read_bounded(&mut cursor, 5, 2).unwrap(), b"abcde");
        assert!(matches!(
            read_bounded(&mut cursor, 5, 2),
            Err(SizeError::UnexpectedEof)
        ));
    }
}
