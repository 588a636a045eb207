//! OP_DELETE: remove documents matching a selector.

use std::fmt;
use std::io::Read;

use bson::{Document, RawDocumentBuf};

use super::flags::DeleteFlags;
use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, read_i32, write_cstring, write_i32};
use super::op::{OpMetadata, WireOp, format_document, read_raw_document};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOp {
    pub header: MsgHeader,
    /// Reserved int32 ahead of the namespace; zero on the wire.
    pub reserved: i32,
    pub full_collection_name: String,
    pub flags: DeleteFlags,
    pub selector: RawDocumentBuf,
}

impl DeleteOp {
    /// Only the first matching document is removed.
    pub fn is_single_remove(&self) -> bool {
        self.flags.contains(DeleteFlags::SINGLE_REMOVE)
    }

    pub fn selector_document(&self) -> Result<Document> {
        Ok(self.selector.to_document()?)
    }

    fn render(&self, max: Option<usize>) -> String {
        let mut out = format!(
            "OpDelete {} {}",
            self.full_collection_name,
            format_document(&self.selector, max)
        );
        if self.flags.0 != 0 {
            out.push_str(&format!(" flags:{}", self.flags));
        }
        out
    }
}

impl WireOp for DeleteOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let reserved = read_i32(body)?;
        let full_collection_name = read_cstring(body)?;
        let flags = DeleteFlags(read_i32(body)?);
        let selector = read_raw_document(body)?;
        Ok(Self {
            header,
            reserved,
            full_collection_name,
            flags,
            selector,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.reserved);
        write_cstring(buf, &self.full_collection_name);
        write_i32(buf, self.flags.0);
        buf.extend_from_slice(self.selector.as_bytes());
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("delete", &self.full_collection_name, "")
    }

    fn abbreviated(&self, max: usize) -> String {
        self.render(Some(max))
    }
}

impl fmt::Display for DeleteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(None))
    }
}
