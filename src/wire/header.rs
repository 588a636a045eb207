//! Message header and opcode definitions for the legacy wire protocol.
//!
//! All integers on the wire are little-endian. The helpers at the bottom
//! of this module decode and encode them with explicit shifts so the
//! byte layout is visible at the call site.

use std::fmt;
use std::io::{Read, Write};

use super::io::read_full;
use crate::error::{DecodeError, Result};

/// Length of the fixed message header in bytes.
pub const HEADER_LEN: usize = 16;

/// Largest message length accepted before any body is read.
pub const MAX_MESSAGE_SIZE: i32 = 48 * 1024 * 1024;

/// Largest single document accepted by [`read_document`](super::io::read_document).
pub const MAX_DOCUMENT_SIZE: i32 = 49 * 1024 * 1024;

/// Operation code carried in every message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Reply,
    Msg,
    Update,
    Insert,
    Query,
    GetMore,
    Delete,
    KillCursors,
    /// Any other value, kept bit-exactly.
    Unknown(i32),
}

impl OpCode {
    /// Map a raw header value to an opcode.
    pub fn from_i32(code: i32) -> Self {
        match code {
            1 => OpCode::Reply,
            1000 => OpCode::Msg,
            2001 => OpCode::Update,
            2002 => OpCode::Insert,
            2004 => OpCode::Query,
            2005 => OpCode::GetMore,
            2006 => OpCode::Delete,
            2007 => OpCode::KillCursors,
            other => OpCode::Unknown(other),
        }
    }

    /// Raw header value of this opcode.
    pub fn as_i32(self) -> i32 {
        match self {
            OpCode::Reply => 1,
            OpCode::Msg => 1000,
            OpCode::Update => 2001,
            OpCode::Insert => 2002,
            OpCode::Query => 2004,
            OpCode::GetMore => 2005,
            OpCode::Delete => 2006,
            OpCode::KillCursors => 2007,
            OpCode::Unknown(code) => code,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpCode::Reply => write!(f, "op_reply"),
            OpCode::Msg => write!(f, "op_msg"),
            OpCode::Update => write!(f, "op_update"),
            OpCode::Insert => write!(f, "op_insert"),
            OpCode::Query => write!(f, "op_query"),
            OpCode::GetMore => write!(f, "op_get_more"),
            OpCode::Delete => write!(f, "op_delete"),
            OpCode::KillCursors => write!(f, "op_kill_cursors"),
            OpCode::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// The 16-byte header that prefixes every wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    /// Total message size in bytes, header included.
    pub message_length: i32,
    /// Identifier chosen by the sender.
    pub request_id: i32,
    /// Request id this message answers, zero for requests.
    pub response_to: i32,
    pub op_code: OpCode,
}

impl MsgHeader {
    /// Build a header for a body of `body_len` bytes.
    pub fn new(op_code: OpCode, request_id: i32, response_to: i32, body_len: usize) -> Self {
        Self {
            message_length: (HEADER_LEN + body_len) as i32,
            request_id,
            response_to,
            op_code,
        }
    }

    /// Decode a header from exactly 16 bytes.
    pub fn from_bytes(b: &[u8; HEADER_LEN]) -> Self {
        Self {
            message_length: get_i32(b, 0),
            request_id: get_i32(b, 4),
            response_to: get_i32(b, 8),
            op_code: OpCode::from_i32(get_i32(b, 12)),
        }
    }

    /// Encode the header into its 16-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        set_i32(&mut b, 0, self.message_length);
        set_i32(&mut b, 4, self.request_id);
        set_i32(&mut b, 8, self.response_to);
        set_i32(&mut b, 12, self.op_code.as_i32());
        b
    }

    /// Write the header verbatim.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Reject lengths that cannot frame a message.
    ///
    /// Checked before any body byte is read or allocated.
    pub fn validate(&self) -> Result<()> {
        if self.message_length < HEADER_LEN as i32 || self.message_length > MAX_MESSAGE_SIZE {
            return Err(DecodeError::InvalidMessageSize(self.message_length).into());
        }
        Ok(())
    }

    /// Declared body length, zero when the declared length is below a header.
    pub fn body_len(&self) -> usize {
        (self.message_length.max(0) as usize).saturating_sub(HEADER_LEN)
    }
}

impl fmt::Display for MsgHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} len:{} id:{} responseTo:{}",
            self.op_code, self.message_length, self.request_id, self.response_to
        )
    }
}

/// Read a message header.
///
/// A stream that is exhausted before the first byte yields
/// [`DecodeError::EndOfStream`]; a stream that ends inside the header is a
/// short read.
pub fn read_header<R: Read + ?Sized>(r: &mut R) -> Result<MsgHeader> {
    let mut b = [0u8; HEADER_LEN];
    read_full(r, &mut b)?;
    Ok(MsgHeader::from_bytes(&b))
}

pub fn get_i32(b: &[u8], pos: usize) -> i32 {
    (b[pos] as i32)
        | ((b[pos + 1] as i32) << 8)
        | ((b[pos + 2] as i32) << 16)
        | ((b[pos + 3] as i32) << 24)
}

pub fn set_i32(b: &mut [u8], pos: usize, i: i32) {
    b[pos] = i as u8;
    b[pos + 1] = (i >> 8) as u8;
    b[pos + 2] = (i >> 16) as u8;
    b[pos + 3] = (i >> 24) as u8;
}

pub fn get_i64(b: &[u8], pos: usize) -> i64 {
    (b[pos] as i64)
        | ((b[pos + 1] as i64) << 8)
        | ((b[pos + 2] as i64) << 16)
        | ((b[pos + 3] as i64) << 24)
        | ((b[pos + 4] as i64) << 32)
        | ((b[pos + 5] as i64) << 40)
        | ((b[pos + 6] as i64) << 48)
        | ((b[pos + 7] as i64) << 56)
}

pub fn set_i64(b: &mut [u8], pos: usize, i: i64) {
    b[pos] = i as u8;
    b[pos + 1] = (i >> 8) as u8;
    b[pos + 2] = (i >> 16) as u8;
    b[pos + 3] = (i >> 24) as u8;
    b[pos + 4] = (i >> 32) as u8;
    b[pos + 5] = (i >> 40) as u8;
    b[pos + 6] = (i >> 48) as u8;
    b[pos + 7] = (i >> 56) as u8;
}
