//! Opcodes this decoder has no layout for; the body is kept verbatim.

use std::fmt;
use std::io::Read;

use super::header::MsgHeader;
use super::io::{BodyReader, read_exact};
use super::op::{OpMetadata, WireOp};
use crate::error::Result;
use crate::utils::abbreviate_bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOp {
    pub header: MsgHeader,
    pub body: Vec<u8>,
}

impl WireOp for UnknownOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let mut bytes = vec![0u8; body.remaining()];
        read_exact(body, &mut bytes)?;
        Ok(Self {
            header,
            body: bytes,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.body);
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::default()
    }

    /// Opcode and a hex preview of the body.
    fn abbreviated(&self, max: usize) -> String {
        format!("{} {}", self, abbreviate_bytes(&self.body, max))
    }
}

impl fmt::Display for UnknownOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpUnknown: {}", self.header.op_code.as_i32())
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
    fn test_unknown_display_and_meta() {
        let op = op_from_reader(&mut Cursor::new(message(OpCode::Unknown(2013), &[0xab; 9]))).unwrap();
        assert_eq!(op.to_string(), "OpUnknown: 2013");
        assert_eq!(op.meta(), OpMetadata::default());
        assert_eq!(op.abbreviated(11), "OpUnknown: 2013 abab...abab");
    }

    #[test]
    fn test_unknown_empty_body() {
        let op = op_from_reader(&mut Cursor::new(message(OpCode::Unknown(9), &[]))).unwrap();
        assert_eq!(op.to_wire().len(), 16);
    }
}
