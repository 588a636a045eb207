//! Reading `.bson` dump files: documents laid end to end with no framing
//! besides their own length prefix.

use std::io::Read;

use bson::RawDocumentBuf;
use tracing::{debug, trace};

use crate::error::{DecodeError, Result, ToolsError};
use crate::wire::io::{read_exact, read_full};

/// Largest document the server accepts.
pub const MAX_BSON_SIZE: usize = 16 * 1024 * 1024;

/// Largest document accepted in a dump, leaving room for internal fields
/// the server may add on top of [`MAX_BSON_SIZE`].
pub const MAX_DUMP_DOCUMENT_SIZE: usize = MAX_BSON_SIZE + 16 * 1024;

const MIN_DOCUMENT_SIZE: i32 = 5;

/// A stream of raw documents read from concatenated BSON.
///
/// Iteration stops at a clean end of input. Any other failure is yielded
/// once and ends the iteration, since the stream is no longer aligned.
pub struct BsonSource<R> {
    reader: R,
    max_size: usize,
    objcheck: bool,
    count: u64,
    failed: bool,
}

impl<R: Read> BsonSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_size: MAX_DUMP_DOCUMENT_SIZE,
            objcheck: false,
            count: 0,
            failed: false,
        }
    }

    /// Fully decode every document before handing it out.
    pub fn with_objcheck(mut self, objcheck: bool) -> Self {
        self.objcheck = objcheck;
        self
    }

    /// Number of documents returned so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Read the next document.
    ///
    /// # Returns
    /// * `Result<Option<RawDocumentBuf>>` - The document, `None` at a clean
    ///   end of input, or the size/read/validation error
    pub fn next_raw(&mut self) -> Result<Option<RawDocumentBuf>> {
        let mut size_buf = [0u8; 4];
        match read_full(&mut self.reader, &mut size_buf) {
            Ok(()) => {}
            Err(e) if e.is_end_of_stream() => return Ok(None),
            Err(e) => return Err(e),
        }

        let size = i32::from_le_bytes(size_buf);
        if size < MIN_DOCUMENT_SIZE {
            return Err(DecodeError::InvalidDocumentSize(size).into());
        }
        let size = size as usize;
        if size > self.max_size {
            return Err(DecodeError::DocumentTooLarge {
                size,
                max: self.max_size,
            }
            .into());
        }

        let mut bytes = vec![0u8; size];
        bytes[..4].copy_from_slice(&size_buf);
        read_exact(&mut self.reader, &mut bytes[4..])?;

        let raw = RawDocumentBuf::from_bytes(bytes)
            .map_err(|e| DecodeError::InvalidBson(e.to_string()))?;
        if self.objcheck {
            raw.to_document()
                .map_err(|e| DecodeError::InvalidBson(e.to_string()))?;
        }

        self.count += 1;
        trace!(size, index = self.count, "read document");
        Ok(Some(raw))
    }
}

impl<R: Read> Iterator for BsonSource<R> {
    type Item = Result<RawDocumentBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_raw() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                debug!(documents = self.count, "end of BSON stream");
                None
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Short description of a dump error for the per-document warning line.
pub fn describe_error(e: &ToolsError) -> String {
    match e {
        ToolsError::Decode(DecodeError::ShortRead { expected, actual }) => {
            format!("truncated document: wanted {expected} bytes, got {actual}")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::io::Cursor;

    /// `{"a": BinData(0, n1 bytes), "b": BinData(0, n2 bytes)}`, built by hand
    /// so that neither element exceeds the per-value limit of the bson crate.
    fn two_binaries(n1: usize, n2: usize) -> Vec<u8> {
        let total = 21 + n1 + n2;
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&(total as i32).to_le_bytes());
        for (name, n) in [(b'a', n1), (b'b', n2)] {
            out.extend_from_slice(&[0x05, name, 0]);
            out.extend_from_slice(&(n as i32).to_le_bytes());
            out.push(0);
            out.resize(out.len() + n, 0xAB);
        }
        out.push(0);
        assert_eq!(out.len(), total);
        out
    }

    fn concat(docs: &[bson::Document]) -> Vec<u8> {
        let mut out = Vec::new();
        for d in docs {
            out.extend_from_slice(&bson::to_vec(d).unwrap());
        }
        out
    }

    #[test]
    fn test_reads_every_document() {
        let docs = [doc! { "a": 1 }, doc! { "b": "two" }, doc! {}];
        let source = BsonSource::new(Cursor::new(concat(&docs)));
        let read: Vec<_> = source
            .map(|r| r.unwrap().to_document().unwrap())
            .collect();
        assert_eq!(read, docs.to_vec());
    }

    #[test]
    fn test_empty_input() {
        let mut source = BsonSource::new(Cursor::new(Vec::new()));
        assert!(source.next_raw().unwrap().is_none());
        assert_eq!(source.count(), 0);
    }

    #[test]
    fn test_size_floor() {
        for size in [-1i32, 0, 4] {
            let mut source = BsonSource::new(Cursor::new(size.to_le_bytes().to_vec()));
            let err = source.next_raw().unwrap_err();
            assert!(matches!(
                err,
                ToolsError::Decode(DecodeError::InvalidDocumentSize(s)) if s == size
            ));
        }
    }

    #[test]
    fn test_document_at_ceiling_is_accepted() {
        let bytes = two_binaries(8_000_000, MAX_DUMP_DOCUMENT_SIZE - 21 - 8_000_000);
        assert_eq!(bytes.len(), 16_793_600);
        let mut source = BsonSource::new(Cursor::new(bytes)).with_objcheck(true);
        let doc = source.next_raw().unwrap().unwrap();
        assert_eq!(doc.as_bytes().len(), MAX_DUMP_DOCUMENT_SIZE);
        assert!(source.next_raw().unwrap().is_none());
    }

    #[test]
    fn test_document_above_ceiling_is_rejected() {
        let size = (MAX_DUMP_DOCUMENT_SIZE + 1) as i32;
        let mut source = BsonSource::new(Cursor::new(size.to_le_bytes().to_vec()));
        let ToolsError::Decode(err) = source.next_raw().unwrap_err() else {
            panic!("expected a decode error")
        };
        assert_eq!(
            err.to_string(),
            "invalid BSONSize: 16793601 bytes is larger than maximum of 16793600 bytes"
        );
    }

    #[test]
    fn test_truncated_document() {
        let mut bytes = concat(&[doc! { "a": "hello" }]);
        bytes.truncate(bytes.len() - 3);
        let mut source = BsonSource::new(Cursor::new(bytes));
        let err = source.next().unwrap().unwrap_err();
        assert!(describe_error(&err).starts_with("truncated document"));
        assert!(source.next().is_none());
    }

    #[test]
    fn test_objcheck_rejects_bad_element() {
        // Element type 0x02 (string) with a length running past the document.
        let bytes = vec![
            14, 0, 0, 0, 0x02, b'a', 0, 0x40, 0, 0, 0, b'x', 0, 0,
        ];
        let mut source = BsonSource::new(Cursor::new(bytes.clone()));
        assert!(source.next_raw().unwrap().is_some());

        let mut checked = BsonSource::new(Cursor::new(bytes)).with_objcheck(true);
        assert!(matches!(
            checked.next_raw().unwrap_err(),
            ToolsError::Decode(DecodeError::InvalidBson(_))
        ));
    }
}
