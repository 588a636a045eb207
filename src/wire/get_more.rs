//! OP_GET_MORE: fetch the next batch from an open cursor.

use std::fmt;
use std::io::Read;

use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, read_i32, read_i64, write_cstring, write_i32, write_i64};
use super::op::{OpMetadata, WireOp};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMoreOp {
    pub header: MsgHeader,
    pub reserved: i32,
    pub full_collection_name: String,
    pub number_to_return: i32,
    pub cursor_id: i64,
}

impl WireOp for GetMoreOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let reserved = read_i32(body)?;
        let full_collection_name = read_cstring(body)?;
        let number_to_return = read_i32(body)?;
        let cursor_id = read_i64(body)?;
        Ok(Self {
            header,
            reserved,
            full_collection_name,
            number_to_return,
            cursor_id,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.reserved);
        write_cstring(buf, &self.full_collection_name);
        write_i32(buf, self.number_to_return);
        write_i64(buf, self.cursor_id);
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("getmore", &self.full_collection_name, "")
    }
}

impl fmt::Display for GetMoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GetMore ns:{} limit:{} cursorId:{}",
            self.full_collection_name, self.number_to_return, self.cursor_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::header::OpCode;
    use crate::wire::op::op_from_reader;
    use crate::wire::test_support::message;
    use std::io::Cursor;

    #[test]
    fn test_get_more_display() {
        let mut body = Vec::new();
        write_i32(&mut body, 0);
        write_cstring(&mut body, "test.big");
        write_i32(&mut body, 100);
        write_i64(&mut body, -7);
        let bytes = message(OpCode::GetMore, &body);
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(op.to_string(), "GetMore ns:test.big limit:100 cursorId:-7");
        assert_eq!(op.abbreviated(10), op.to_string());
        assert_eq!(op.to_wire(), bytes);
    }

    #[test]
    fn test_get_more_keeps_reserved_field() {
        let mut body = Vec::new();
        write_i32(&mut body, 0x0102_0304);
        write_cstring(&mut body, "test.big");
        write_i32(&mut body, 0);
        write_i64(&mut body, 9);
        let bytes = message(OpCode::GetMore, &body);
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(op.to_wire(), bytes);
    }
}
