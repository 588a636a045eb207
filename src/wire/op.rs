//! The decoded operation model and opcode dispatch.

use std::fmt;
use std::io::{Read, Write};

use bson::{RawDocument, RawDocumentBuf};
use tracing::debug;

use super::delete::DeleteOp;
use super::get_more::GetMoreOp;
use super::header::{HEADER_LEN, MsgHeader, OpCode, read_header};
use super::insert::InsertOp;
use super::io::{BodyReader, read_document};
use super::kill_cursors::KillCursorsOp;
use super::msg::MsgOp;
use super::query::QueryOp;
use super::reply::ReplyOp;
use super::unknown::UnknownOp;
use super::update::UpdateOp;
use crate::bsonutil::format_raw_document;
use crate::error::Result;
use crate::utils::abbreviate;

/// Behaviour shared by every per-opcode record.
pub trait WireOp: Sized + fmt::Display {
    /// Parse the body that follows `header`.
    ///
    /// `body` is bounded to the declared body length; the caller checks
    /// that the boundary was hit exactly.
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self>;

    /// Header this op was decoded with.
    fn header(&self) -> &MsgHeader;

    /// Append the encoded body (everything after the header) to `buf`.
    fn write_body(&self, buf: &mut Vec<u8>);

    /// Traffic-analysis summary.
    fn meta(&self) -> OpMetadata;

    /// Rendering with every document shortened to at most `max` characters.
    fn abbreviated(&self, _max: usize) -> String {
        self.to_string()
    }
}

/// What an operation does, independent of how it was framed.
///
/// `op` accounts for write commands, so a query against `db.$cmd` carrying
/// an `insert` command reports `"insert"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpMetadata {
    pub op: String,
    /// Namespace the op targets, empty when not applicable.
    pub ns: String,
    /// Command name when `op` is `"command"`.
    pub command: String,
}

impl OpMetadata {
    pub fn new(op: &str, ns: &str, command: &str) -> Self {
        Self {
            op: op.to_string(),
            ns: ns.to_string(),
            command: command.to_string(),
        }
    }
}

/// One decoded wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Query(QueryOp),
    Reply(ReplyOp),
    Insert(InsertOp),
    Update(UpdateOp),
    Delete(DeleteOp),
    GetMore(GetMoreOp),
    KillCursors(KillCursorsOp),
    Msg(MsgOp),
    Unknown(UnknownOp),
}

macro_rules! each_op {
    ($op:expr, $inner:ident => $body:expr) => {
        match $op {
            Op::Query($inner) => $body,
            Op::Reply($inner) => $body,
            Op::Insert($inner) => $body,
            Op::Update($inner) => $body,
            Op::Delete($inner) => $body,
            Op::GetMore($inner) => $body,
            Op::KillCursors($inner) => $body,
            Op::Msg($inner) => $body,
            Op::Unknown($inner) => $body,
        }
    };
}

impl Op {
    pub fn header(&self) -> &MsgHeader {
        each_op!(self, op => op.header())
    }

    pub fn op_code(&self) -> OpCode {
        self.header().op_code
    }

    pub fn meta(&self) -> OpMetadata {
        each_op!(self, op => op.meta())
    }

    /// Rendering with long documents shortened around a middle ellipsis.
    pub fn abbreviated(&self, max: usize) -> String {
        each_op!(self, op => op.abbreviated(max))
    }

    /// Encode the op back to wire bytes.
    ///
    /// Header fields are kept; `message_length` is recomputed from the
    /// encoded body and matches the original for decoded ops.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut body = Vec::new();
        each_op!(self, op => op.write_body(&mut body));
        let mut header = *self.header();
        header.message_length = (HEADER_LEN + body.len()) as i32;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        out
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_wire())?;
        Ok(())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each_op!(self, op => fmt::Display::fmt(op, f))
    }
}

/// Read one complete message and decode it into a typed [`Op`].
///
/// The header is validated before the body is touched. Unknown opcodes
/// are not errors; they come back as [`Op::Unknown`] with the raw body.
pub fn op_from_reader<R: Read + ?Sized>(r: &mut R) -> Result<Op> {
    let header = read_header(r)?;
    header.validate()?;
    parse_body(header, r)
}

/// Decode the body of a message whose header has already been read and validated.
///
/// Exactly `header.body_len()` bytes are taken from `r` whether parsing
/// succeeds or not, so a caller can keep reading messages after a
/// structural error.
pub fn parse_body<R: Read + ?Sized>(header: MsgHeader, r: &mut R) -> Result<Op> {
    let mut body = BodyReader::new(r, header.body_len());
    let parsed = match header.op_code {
        OpCode::Query => QueryOp::read_body(header, &mut body).map(Op::Query),
        OpCode::Reply => ReplyOp::read_body(header, &mut body).map(Op::Reply),
        OpCode::Insert => InsertOp::read_body(header, &mut body).map(Op::Insert),
        OpCode::Update => UpdateOp::read_body(header, &mut body).map(Op::Update),
        OpCode::Delete => DeleteOp::read_body(header, &mut body).map(Op::Delete),
        OpCode::GetMore => GetMoreOp::read_body(header, &mut body).map(Op::GetMore),
        OpCode::KillCursors => KillCursorsOp::read_body(header, &mut body).map(Op::KillCursors),
        OpCode::Msg => MsgOp::read_body(header, &mut body).map(Op::Msg),
        OpCode::Unknown(_) => UnknownOp::read_body(header, &mut body).map(Op::Unknown),
    };

    match parsed {
        Ok(op) => {
            body.finish()?;
            debug!(request_id = header.request_id, "decoded {}", header);
            Ok(op)
        }
        Err(e) => {
            if let Err(drain_err) = body.drain() {
                debug!("failed to skip rest of message body: {}", drain_err);
            }
            Err(e)
        }
    }
}

/// Read a document from a message body and wrap it without unmarshalling it.
pub(crate) fn read_raw_document<R: Read + ?Sized>(r: &mut R) -> Result<RawDocumentBuf> {
    let bytes = read_document(r)?;
    Ok(RawDocumentBuf::from_bytes(bytes)?)
}

/// Read documents until the body boundary.
pub(crate) fn read_documents_to_end<R: Read>(
    body: &mut BodyReader<R>,
) -> Result<Vec<RawDocumentBuf>> {
    let mut docs = Vec::new();
    while !body.is_exhausted() {
        docs.push(read_raw_document(body)?);
    }
    Ok(docs)
}

/// `[doc, doc]` rendering used by the multi-document ops.
pub(crate) fn format_documents(docs: &[RawDocumentBuf], max: Option<usize>) -> String {
    let rendered: Vec<String> = docs
        .iter()
        .map(|d| format_document(d, max))
        .collect();
    format!("[{}]", rendered.join(", "))
}

pub(crate) fn format_document(doc: &RawDocument, max: Option<usize>) -> String {
    let s = format_raw_document(doc);
    match max {
        Some(max) => abbreviate(&s, max),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ToolsError};
    use crate::wire::io::{write_cstring, write_i32, write_i64};
    use crate::wire::test_support::{message, query_body};
    use bson::doc;
    use std::io::Cursor;

    #[test]
    fn test_query_end_to_end() {
        let bytes = message(OpCode::Query, &query_body("test.foo", &doc! {}));
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        let rendered = op.to_string();
        assert!(rendered.contains("test.foo"));
        assert!(rendered.contains("{}"));
        assert_eq!(op.op_code(), OpCode::Query);
    }

    #[test]
    fn test_to_wire_is_byte_identical() {
        let bytes = message(
            OpCode::Query,
            &query_body("db.coll", &doc! { "a": 1, "b": "two" }),
        );
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(op.to_wire(), bytes);
    }

    #[test]
    fn test_unknown_opcode_passthrough() {
        let bytes = message(OpCode::Unknown(2013), &[1, 2, 3, 4, 5]);
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        match &op {
            Op::Unknown(u) => assert_eq!(u.body, vec![1, 2, 3, 4, 5]),
            other => panic!("unexpected op {other:?}"),
        }
        assert_eq!(op.to_wire(), bytes);
    }

    #[test]
    fn test_oversized_message_rejected_before_body() {
        let mut header = MsgHeader::new(OpCode::Query, 1, 0, 0);
        header.message_length = crate::wire::MAX_MESSAGE_SIZE + 1;
        let err = op_from_reader(&mut Cursor::new(header.to_bytes())).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::InvalidMessageSize(_))
        ));
    }

    #[test]
    fn test_structural_error_keeps_stream_aligned() {
        // GetMore body truncated by its own header: cstring never terminates.
        let mut bad = Vec::new();
        write_i32(&mut bad, 0);
        bad.extend_from_slice(b"abc");
        let mut stream = message(OpCode::GetMore, &bad);

        let mut good = Vec::new();
        write_i32(&mut good, 0);
        write_cstring(&mut good, "test.c");
        write_i32(&mut good, 10);
        write_i64(&mut good, 42);
        stream.extend_from_slice(&message(OpCode::GetMore, &good));

        let mut r = Cursor::new(stream);
        assert!(op_from_reader(&mut r).is_err());
        let op = op_from_reader(&mut r).unwrap();
        assert_eq!(op.meta(), OpMetadata::new("getmore", "test.c", ""));
        assert!(op_from_reader(&mut r).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_trailing_bytes_are_length_mismatch() {
        let mut body = Vec::new();
        write_i32(&mut body, 0);
        write_cstring(&mut body, "test.c");
        write_i32(&mut body, 10);
        write_i64(&mut body, 42);
        body.push(0xff);
        let mut r = Cursor::new(message(OpCode::GetMore, &body));
        let err = op_from_reader(&mut r).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::LengthMismatch { .. })
        ));
        assert!(op_from_reader(&mut r).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_command_metadata() {
        let bytes = message(
            OpCode::Query,
            &query_body("admin.$cmd", &doc! { "serverStatus": 1 }),
        );
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            op.meta(),
            OpMetadata::new("command", "admin.$cmd", "serverStatus")
        );

        let bytes = message(
            OpCode::Query,
            &query_body("test.$cmd", &doc! { "insert": "foo", "documents": [] }),
        );
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(op.meta(), OpMetadata::new("insert", "test.$cmd", ""));
    }

    #[test]
    fn test_abbreviated_query() {
        let long = "x".repeat(200);
        let bytes = message(OpCode::Query, &query_body("test.foo", &doc! { "s": long }));
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        let short = op.abbreviated(40);
        assert!(short.contains("..."));
        assert!(short.len() < op.to_string().len());
    }
}
