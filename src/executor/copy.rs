//! `copy`: pass whole messages from one stream to another.

use std::io::{Read, Write};

use tracing::trace;

use super::result::ExecutionStats;
use crate::error::Result;
use crate::wire::copy_message;

/// Copy messages until `input` ends cleanly.
///
/// Headers are validated on the way through; bodies are not decoded.
pub fn copy_stream<R: Read + ?Sized, W: Write + ?Sized>(
    input: &mut R,
    output: &mut W,
) -> Result<ExecutionStats> {
    let mut stats = ExecutionStats::default();
    loop {
        let mut counter = CountingWriter::new(&mut *output);
        match copy_message(&mut counter, input) {
            Ok(()) => {
                trace!(bytes = counter.written, "copied message");
                stats.record_written(counter.written);
                stats.record_processed();
            }
            Err(e) if e.is_end_of_stream() => break,
            Err(e) => return Err(e),
        }
    }
    output.flush()?;
    Ok(stats)
}

struct CountingWriter<W> {
    inner: W,
    written: usize,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ToolsError};
    use crate::wire::header::OpCode;
    use crate::wire::test_support::{message, query_body};
    use bson::doc;
    use std::io::Cursor;

    #[test]
    fn test_copy_is_byte_identical() {
        let mut bytes = message(OpCode::Query, &query_body("test.foo", &doc! { "x": 1 }));
        bytes.extend(message(OpCode::Unknown(9999), b"opaque"));
        let mut out = Vec::new();
        let stats = copy_stream(&mut Cursor::new(bytes.clone()), &mut out).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.bytes_written, bytes.len() as u64);
    }

    #[test]
    fn test_copy_truncated_body() {
        let mut bytes = message(OpCode::Query, &query_body("test.foo", &doc! {}));
        bytes.truncate(bytes.len() - 2);
        let err = copy_stream(&mut Cursor::new(bytes), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ToolsError::Decode(DecodeError::ShortRead { .. })));
    }
}
