//! OP_REPLY: the server's answer to a query or getMore.

use std::fmt;
use std::io::Read;

use bson::{Document, RawDocumentBuf};
use tracing::warn;

use super::flags::ReplyFlags;
use super::header::{MsgHeader, get_i32, get_i64};
use super::io::{BodyReader, read_exact, write_i32, write_i64};
use super::op::{OpMetadata, WireOp, format_documents, read_documents_to_end};
use crate::error::Result;

/// Size of the fixed fields that precede the reply documents.
pub const REPLY_PREFIX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOp {
    pub header: MsgHeader,
    pub flags: ReplyFlags,
    /// Cursor to continue with getMore, zero when exhausted.
    pub cursor_id: i64,
    /// Position of the first returned document in the cursor.
    pub starting_from: i32,
    pub number_returned: i32,
    pub documents: Vec<RawDocumentBuf>,
}

impl ReplyOp {
    /// Decode the 20-byte prefix of a reply without any documents.
    pub fn from_prefix(header: MsgHeader, b: &[u8; REPLY_PREFIX_LEN]) -> Self {
        Self {
            header,
            flags: ReplyFlags(get_i32(b, 0)),
            cursor_id: get_i64(b, 4),
            starting_from: get_i32(b, 12),
            number_returned: get_i32(b, 16),
            documents: Vec::new(),
        }
    }

    pub fn documents(&self) -> Result<Vec<Document>> {
        self.documents
            .iter()
            .map(|raw| Ok(raw.to_document()?))
            .collect()
    }

    fn render(&self, max: Option<usize>) -> String {
        let mut out = format!(
            "OpReply cursorId:{} startingFrom:{} numberReturned:{}",
            self.cursor_id, self.starting_from, self.number_returned
        );
        if self.flags.0 != 0 {
            out.push_str(&format!(" flags:{}", self.flags));
        }
        out.push(' ');
        out.push_str(&format_documents(&self.documents, max));
        out
    }
}

impl WireOp for ReplyOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let mut prefix = [0u8; REPLY_PREFIX_LEN];
        read_exact(body, &mut prefix)?;
        let mut op = Self::from_prefix(header, &prefix);
        op.documents = read_documents_to_end(body)?;

        if op.documents.len() != op.number_returned.max(0) as usize {
            warn!(
                request_id = header.request_id,
                "reply declares {} documents but carries {}",
                op.number_returned,
                op.documents.len()
            );
        }
        Ok(op)
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.flags.0);
        write_i64(buf, self.cursor_id);
        write_i32(buf, self.starting_from);
        write_i32(buf, self.number_returned);
        for doc in &self.documents {
            buf.extend_from_slice(doc.as_bytes());
        }
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::default()
    }

    fn abbreviated(&self, max: usize) -> String {
        self.render(Some(max))
    }
}

impl fmt::Display for ReplyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::header::OpCode;
    use crate::wire::op::{Op, op_from_reader};
    use crate::wire::test_support::{doc_bytes, message};
    use bson::doc;
    use std::io::Cursor;

    fn reply_body(flags: i32, cursor_id: i64, docs: &[Document]) -> Vec<u8> {
        let mut body = Vec::new();
        write_i32(&mut body, flags);
        write_i64(&mut body, cursor_id);
        write_i32(&mut body, 0);
        write_i32(&mut body, docs.len() as i32);
        for d in docs {
            body.extend_from_slice(&doc_bytes(d));
        }
        body
    }

    #[test]
    fn test_reply_decode() {
        let docs = [doc! { "ok": 1.0 }, doc! { "n": 2 }];
        let bytes = message(
            OpCode::Reply,
            &reply_body(ReplyFlags::AWAIT_CAPABLE, 1234567890123, &docs),
        );
        let op = match op_from_reader(&mut Cursor::new(bytes.clone())).unwrap() {
            Op::Reply(r) => r,
            other => panic!("expected reply, got {other:?}"),
        };
        assert_eq!(op.cursor_id, 1234567890123);
        assert_eq!(op.number_returned, 2);
        assert!(op.flags.contains(ReplyFlags::AWAIT_CAPABLE));
        assert_eq!(op.documents().unwrap(), docs.to_vec());
        assert!(op.to_string().contains("{\"n\":2}"));
        assert_eq!(Op::Reply(op).to_wire(), bytes);
    }

    #[test]
    fn test_reply_with_no_documents() {
        let bytes = message(
            OpCode::Reply,
            &reply_body(ReplyFlags::CURSOR_NOT_FOUND, 0, &[]),
        );
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        let Op::Reply(reply) = op else {
            panic!("expected reply")
        };
        assert!(reply.documents.is_empty());
        assert!(reply.flags.contains(ReplyFlags::CURSOR_NOT_FOUND));
    }

    #[test]
    fn test_reply_prefix_shorter_than_twenty_bytes() {
        let bytes = message(OpCode::Reply, &[0u8; 12]);
        assert!(op_from_reader(&mut Cursor::new(bytes)).is_err());
    }
}
