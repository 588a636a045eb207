//! OP_MSG in its legacy form: a single diagnostic string.

use std::fmt;
use std::io::Read;

use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, write_cstring};
use super::op::{OpMetadata, WireOp};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgOp {
    pub header: MsgHeader,
    pub message: String,
}

impl WireOp for MsgOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let message = read_cstring(body)?;
        Ok(Self { header, message })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_cstring(buf, &self.message);
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("msg", "", "")
    }
}

impl fmt::Display for MsgOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpMsg {}", self.message)
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
    fn test_msg_decode() {
        let mut body = Vec::new();
        write_cstring(&mut body, "hello");
        let bytes = message(OpCode::Msg, &body);
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(op.to_string(), "OpMsg hello");
        assert_eq!(op.to_wire(), bytes);
    }
}
