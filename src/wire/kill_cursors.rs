//! OP_KILL_CURSORS: close server-side cursors.

use std::fmt;
use std::io::Read;

use super::header::MsgHeader;
use super::io::{BodyReader, read_i32, read_i64, write_i32, write_i64};
use super::op::{OpMetadata, WireOp};
use crate::error::{DecodeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillCursorsOp {
    pub header: MsgHeader,
    pub reserved: i32,
    pub cursor_ids: Vec<i64>,
}

impl WireOp for KillCursorsOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let reserved = read_i32(body)?;
        let count = read_i32(body)?;
        let needed = (count as i64).saturating_mul(8);
        if count < 0 || needed != body.remaining() as i64 {
            return Err(DecodeError::LengthMismatch {
                declared: body.declared(),
                consumed: body.consumed().saturating_add(needed.max(0) as usize),
            }
            .into());
        }

        let mut cursor_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            cursor_ids.push(read_i64(body)?);
        }
        Ok(Self {
            header,
            reserved,
            cursor_ids,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.reserved);
        write_i32(buf, self.cursor_ids.len() as i32);
        for id in &self.cursor_ids {
            write_i64(buf, *id);
        }
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("killcursors", "", "")
    }
}

impl fmt::Display for KillCursorsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.cursor_ids.iter().map(|id| id.to_string()).collect();
        write!(f, "KillCursorsOp [{}]", ids.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolsError;
    use crate::wire::header::OpCode;
    use crate::wire::op::{Op, op_from_reader};
    use crate::wire::test_support::{message, message_with_length};
    use std::io::Cursor;

    fn kill_body(ids: &[i64]) -> Vec<u8> {
        let mut body = Vec::new();
        write_i32(&mut body, 0);
        write_i32(&mut body, ids.len() as i32);
        for id in ids {
            write_i64(&mut body, *id);
        }
        body
    }

    #[test]
    fn test_kill_cursors_decode() {
        let bytes = message(OpCode::KillCursors, &kill_body(&[11, 22, 33]));
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        let Op::KillCursors(kill) = &op else {
            panic!("expected killCursors")
        };
        assert_eq!(kill.cursor_ids, vec![11, 22, 33]);
        assert_eq!(op.to_string(), "KillCursorsOp [11 22 33]");
        assert_eq!(op.meta(), OpMetadata::new("killcursors", "", ""));
        assert_eq!(op.to_wire(), bytes);
    }

    #[test]
    fn test_kill_cursors_keeps_reserved_field() {
        let mut body = kill_body(&[4]);
        body[..4].copy_from_slice(&42_i32.to_le_bytes());
        let bytes = message(OpCode::KillCursors, &body);
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert!(matches!(&op, Op::KillCursors(k) if k.reserved == 42));
        assert_eq!(op.to_wire(), bytes);
    }

    #[test]
    fn test_kill_cursors_count_disagrees_with_length() {
        let mut body = kill_body(&[1, 2]);
        body[4] = 3;
        let mut r = Cursor::new(message(OpCode::KillCursors, &body));
        let err = op_from_reader(&mut r).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::LengthMismatch { .. })
        ));
        assert!(op_from_reader(&mut r).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_kill_cursors_declared_length_off_by_one() {
        let body = kill_body(&[5, 6]);
        let short = message_with_length(OpCode::KillCursors, &body, body.len() - 1);
        assert!(op_from_reader(&mut Cursor::new(short)).is_err());

        let mut long = message_with_length(OpCode::KillCursors, &body, body.len() + 1);
        long.push(0);
        assert!(op_from_reader(&mut Cursor::new(long)).is_err());
    }

    #[test]
    fn test_negative_count() {
        let mut body = Vec::new();
        write_i32(&mut body, 0);
        write_i32(&mut body, -1);
        let err = op_from_reader(&mut Cursor::new(message(OpCode::KillCursors, &body))).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::LengthMismatch { .. })
        ));
    }
}
