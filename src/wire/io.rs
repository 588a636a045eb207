//! Low-level readers shared by every opcode parser.

use std::io::{self, Read, Write};

use super::header::{MAX_DOCUMENT_SIZE, get_i32, get_i64, read_header, set_i32};
use crate::error::{DecodeError, Result};

/// Read into `buf` until it is full or the stream ends, returning the count.
fn fill<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Fill `buf` completely.
///
/// Zero bytes available is [`DecodeError::EndOfStream`], anything between
/// zero and `buf.len()` is a [`DecodeError::ShortRead`].
pub fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let n = fill(r, buf)?;
    if n == 0 && !buf.is_empty() {
        return Err(DecodeError::EndOfStream.into());
    }
    if n < buf.len() {
        return Err(DecodeError::ShortRead {
            expected: buf.len(),
            actual: n,
        }
        .into());
    }
    Ok(())
}

/// Fill `buf` completely; any shortfall, including an empty stream, is a short read.
pub fn read_exact<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let n = fill(r, buf)?;
    if n < buf.len() {
        return Err(DecodeError::ShortRead {
            expected: buf.len(),
            actual: n,
        }
        .into());
    }
    Ok(())
}

pub fn read_i32<R: Read + ?Sized>(r: &mut R) -> Result<i32> {
    let mut b = [0u8; 4];
    read_exact(r, &mut b)?;
    Ok(get_i32(&b, 0))
}

pub fn read_i64<R: Read + ?Sized>(r: &mut R) -> Result<i64> {
    let mut b = [0u8; 8];
    read_exact(r, &mut b)?;
    Ok(get_i64(&b, 0))
}

/// Read one length-prefixed BSON document as raw bytes.
///
/// The size is validated against `[5, MAX_DOCUMENT_SIZE]` before anything
/// is allocated. The returned buffer is exactly `size` bytes long with the
/// length prefix written back into its first four bytes.
pub fn read_document<R: Read + ?Sized>(r: &mut R) -> Result<Vec<u8>> {
    let size = read_i32(r)?;
    if !(5..=MAX_DOCUMENT_SIZE).contains(&size) {
        return Err(DecodeError::InvalidDocumentSize(size).into());
    }
    let mut doc = vec![0u8; size as usize];
    set_i32(&mut doc, 0, size);
    read_exact(r, &mut doc[4..])?;
    Ok(doc)
}

/// Read a NUL-terminated UTF-8 string, one byte at a time.
pub fn read_cstring<R: Read + ?Sized>(r: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut b = [0u8; 1];
    loop {
        if fill(r, &mut b)? == 0 {
            return Err(DecodeError::ShortRead {
                expected: bytes.len() + 1,
                actual: bytes.len(),
            }
            .into());
        }
        if b[0] == 0 {
            break;
        }
        bytes.push(b[0]);
    }
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidCString.into())
}

/// Append `s` plus its terminator.
pub fn write_cstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

pub fn write_i32(buf: &mut Vec<u8>, i: i32) {
    buf.extend_from_slice(&i.to_le_bytes());
}

pub fn write_i64(buf: &mut Vec<u8>, i: i64) {
    buf.extend_from_slice(&i.to_le_bytes());
}

/// Copy one whole message from `r` to `w`.
///
/// The header is written verbatim, followed by exactly
/// `message_length - 16` body bytes.
pub fn copy_message<W: Write + ?Sized, R: Read + ?Sized>(w: &mut W, r: &mut R) -> Result<()> {
    let header = read_header(r)?;
    header.validate()?;
    header.write_to(w)?;
    let expected = header.body_len();
    let copied = io::copy(&mut r.take(expected as u64), w)? as usize;
    if copied < expected {
        return Err(DecodeError::ShortRead {
            expected,
            actual: copied,
        }
        .into());
    }
    Ok(())
}

/// A reader confined to one message body.
///
/// Reads beyond the declared body length see end-of-stream, so a parser
/// that over-consumes fails with a short read instead of eating the next
/// message.
pub struct BodyReader<R: Read> {
    inner: io::Take<R>,
    declared: usize,
}

impl<R: Read> BodyReader<R> {
    /// Bound `inner` to `declared` bytes.
    pub fn new(inner: R, declared: usize) -> Self {
        Self {
            inner: inner.take(declared as u64),
            declared,
        }
    }

    /// Declared body length.
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// Bytes left before the boundary.
    pub fn remaining(&self) -> usize {
        self.inner.limit() as usize
    }

    /// Bytes read so far.
    pub fn consumed(&self) -> usize {
        self.declared - self.remaining()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Discard whatever is left of the body, returning how many bytes were skipped.
    pub fn drain(&mut self) -> Result<usize> {
        Ok(io::copy(&mut self.inner, &mut io::sink())? as usize)
    }

    /// Require that the parser stopped exactly at the boundary.
    ///
    /// Leftover bytes are drained first so the underlying stream stays
    /// aligned on the next header.
    pub fn finish(mut self) -> Result<()> {
        if self.is_exhausted() {
            return Ok(());
        }
        let consumed = self.consumed();
        self.drain()?;
        Err(DecodeError::LengthMismatch {
            declared: self.declared,
            consumed,
        }
        .into())
    }
}

impl<R: Read> Read for BodyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolsError;
    use crate::wire::header::{MAX_MESSAGE_SIZE, MsgHeader, OpCode};
    use std::io::Cursor;

    fn doc_bytes(size: i32) -> Vec<u8> {
        let mut b = vec![0u8; size.max(4) as usize];
        set_i32(&mut b, 0, size);
        b
    }

    #[test]
    fn test_document_size_floor() {
        for size in [-1, 0, 1, 2, 3, 4] {
            let err = read_document(&mut Cursor::new(doc_bytes(size))).unwrap_err();
            assert!(
                matches!(err, ToolsError::Decode(DecodeError::InvalidDocumentSize(s)) if s == size)
            );
        }
        let doc = read_document(&mut Cursor::new(doc_bytes(5))).unwrap();
        assert_eq!(doc, vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_document_size_ceiling_checked_before_allocation() {
        let bytes = (MAX_DOCUMENT_SIZE + 1).to_le_bytes().to_vec();
        let err = read_document(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::InvalidDocumentSize(_))
        ));
    }

    #[test]
    fn test_document_at_ceiling_is_accepted() {
        let bytes = doc_bytes(MAX_DOCUMENT_SIZE);
        let doc = read_document(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(doc.len(), MAX_DOCUMENT_SIZE as usize);
    }

    #[test]
    fn test_truncated_document() {
        let mut bytes = doc_bytes(10);
        bytes.truncate(7);
        let err = read_document(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::ShortRead {
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_read_cstring() {
        let mut r = Cursor::new(b"test.foo\0rest".to_vec());
        assert_eq!(read_cstring(&mut r).unwrap(), "test.foo");
        assert!(read_cstring(&mut Cursor::new(b"abc".to_vec())).is_err());
        assert!(matches!(
            read_cstring(&mut Cursor::new(vec![0xff, 0xfe, 0])).unwrap_err(),
            ToolsError::Decode(DecodeError::InvalidCString)
        ));
    }

    #[test]
    fn test_body_reader_bounds() {
        let data = vec![1u8, 2, 3, 4, 5, 6];
        let mut cursor = Cursor::new(data);
        let mut body = BodyReader::new(&mut cursor, 4);
        let mut b = [0u8; 2];
        read_exact(&mut body, &mut b).unwrap();
        assert_eq!(body.consumed(), 2);
        assert_eq!(body.remaining(), 2);
        let mut big = [0u8; 3];
        assert!(read_exact(&mut body, &mut big).is_err());
        assert!(body.is_exhausted());
        body.finish().unwrap();
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_body_reader_finish_drains_leftover() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        let mut body = BodyReader::new(&mut cursor, 8);
        let mut b = [0u8; 3];
        read_exact(&mut body, &mut b).unwrap();
        let err = body.finish().unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::LengthMismatch {
                declared: 8,
                consumed: 3
            })
        ));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_copy_message() {
        let header = MsgHeader::new(OpCode::Unknown(42), 3, 0, 4);
        let mut input = header.to_bytes().to_vec();
        input.extend_from_slice(&[9, 8, 7, 6]);
        input.extend_from_slice(&[0xaa; 5]);
        let mut out = Vec::new();
        copy_message(&mut out, &mut Cursor::new(&input)).unwrap();
        assert_eq!(out, input[..20]);
    }

    #[test]
    fn test_copy_message_short_body() {
        let header = MsgHeader::new(OpCode::Query, 3, 0, 10);
        let mut input = header.to_bytes().to_vec();
        input.extend_from_slice(&[1, 2, 3]);
        let mut out = Vec::new();
        let err = copy_message(&mut out, &mut Cursor::new(input)).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::ShortRead {
                expected: 10,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_copy_message_rejects_oversized_header() {
        let mut header = MsgHeader::new(OpCode::Query, 3, 0, 0);
        header.message_length = MAX_MESSAGE_SIZE + 1;
        let mut out = Vec::new();
        let err = copy_message(&mut out, &mut Cursor::new(header.to_bytes())).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::InvalidMessageSize(_))
        ));
        assert!(out.is_empty());
    }
}
