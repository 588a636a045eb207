//! Undecoded messages for passthrough and deferred parsing.

use std::fmt;
use std::io::{self, Cursor, Read, Write};

use chrono::{DateTime, Utc};

use super::header::{HEADER_LEN, MAX_MESSAGE_SIZE, MsgHeader, read_header};
use super::io::read_exact;
use super::op::{Op, parse_body};
use super::reply::REPLY_PREFIX_LEN;
use crate::error::{DecodeError, Result};

/// A message whose body has not been interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOp {
    pub header: MsgHeader,
    pub body: Vec<u8>,
    /// When the last chunk of the message was read, if the source tracks it.
    pub seen: Option<DateTime<Utc>>,
}

impl RawOp {
    /// Read the body that follows `header`.
    ///
    /// A declared length above [`MAX_MESSAGE_SIZE`] fails before anything is
    /// allocated. A declared length shorter than a header gives an empty body.
    pub fn from_reader<R: Read + ?Sized>(header: MsgHeader, r: &mut R) -> Result<Self> {
        if header.message_length > MAX_MESSAGE_SIZE {
            return Err(DecodeError::InvalidMessageSize(header.message_length).into());
        }
        let mut body = vec![0u8; header.body_len()];
        read_exact(r, &mut body)?;
        Ok(Self {
            header,
            body,
            seen: None,
        })
    }

    /// Read a reply keeping only its 20-byte prefix.
    ///
    /// The documents are skipped, which is enough to track cursor ids
    /// without buffering large batches.
    pub fn short_reply_from_reader<R: Read + ?Sized>(header: MsgHeader, r: &mut R) -> Result<Self> {
        if header.message_length > MAX_MESSAGE_SIZE {
            return Err(DecodeError::InvalidMessageSize(header.message_length).into());
        }
        let total = header.body_len();
        let keep = total.min(REPLY_PREFIX_LEN);
        let mut body = vec![0u8; keep];
        read_exact(r, &mut body)?;

        let rest = (total - keep) as u64;
        let skipped = io::copy(&mut r.take(rest), &mut io::sink())?;
        if skipped < rest {
            return Err(DecodeError::ShortRead {
                expected: total,
                actual: keep + skipped as usize,
            }
            .into());
        }
        Ok(Self {
            header,
            body,
            seen: None,
        })
    }

    /// Decode the stored body into a typed op.
    pub fn parse(&self) -> Result<Op> {
        self.header.validate()?;
        parse_body(self.header, &mut Cursor::new(&self.body))
    }

    /// Header followed by the body, verbatim.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_wire())?;
        Ok(())
    }
}

impl fmt::Display for RawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} body:{}b", self.header, self.body.len())?;
        if let Some(seen) = self.seen {
            write!(f, " seen:{}", seen.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Read a header and its body without decoding.
pub fn read_raw_op<R: Read + ?Sized>(r: &mut R) -> Result<RawOp> {
    let header = read_header(r)?;
    RawOp::from_reader(header, r)
}

/// A source that knows when its most recent chunk was observed.
pub trait SeenTime {
    fn seen_time(&self) -> Option<DateTime<Utc>>;
}

/// Reader adapter stamping the wall-clock time of every non-empty read.
pub struct StampedReader<R> {
    inner: R,
    last: Option<DateTime<Utc>>,
}

impl<R: Read> StampedReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, last: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for StampedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last = Some(Utc::now());
        }
        Ok(n)
    }
}

impl<R> SeenTime for StampedReader<R> {
    fn seen_time(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}

/// [`read_raw_op`] that records when the message finished arriving.
pub fn read_raw_op_timed<R: Read + SeenTime>(r: &mut R) -> Result<RawOp> {
    let mut op = read_raw_op(r)?;
    op.seen = r.seen_time();
    Ok(op)
}
