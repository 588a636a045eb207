//! OP_UPDATE: modify documents matching a selector.

use std::fmt;
use std::io::Read;

use bson::{Document, RawDocumentBuf};

use super::flags::UpdateFlags;
use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, read_i32, write_cstring, write_i32};
use super::op::{OpMetadata, WireOp, format_document, read_raw_document};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOp {
    pub header: MsgHeader,
    /// Reserved int32 ahead of the namespace; zero on the wire.
    pub reserved: i32,
    pub full_collection_name: String,
    pub flags: UpdateFlags,
    pub selector: RawDocumentBuf,
    pub update: RawDocumentBuf,
}

impl UpdateOp {
    pub fn is_upsert(&self) -> bool {
        self.flags.contains(UpdateFlags::UPSERT)
    }

    pub fn is_multi(&self) -> bool {
        self.flags.contains(UpdateFlags::MULTI_UPDATE)
    }

    pub fn selector_document(&self) -> Result<Document> {
        Ok(self.selector.to_document()?)
    }

    pub fn update_document(&self) -> Result<Document> {
        Ok(self.update.to_document()?)
    }

    fn render(&self, max: Option<usize>) -> String {
        let mut out = format!(
            "OpUpdate {} selector:{} update:{}",
            self.full_collection_name,
            format_document(&self.selector, max),
            format_document(&self.update, max)
        );
        if self.flags.0 != 0 {
            out.push_str(&format!(" flags:{}", self.flags));
        }
        out
    }
}

impl WireOp for UpdateOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let reserved = read_i32(body)?;
        let full_collection_name = read_cstring(body)?;
        let flags = UpdateFlags(read_i32(body)?);
        let selector = read_raw_document(body)?;
        let update = read_raw_document(body)?;
        Ok(Self {
            header,
            reserved,
            full_collection_name,
            flags,
            selector,
            update,
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
        buf.extend_from_slice(self.update.as_bytes());
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("update", &self.full_collection_name, "")
    }

    fn abbreviated(&self, max: usize) -> String {
        self.render(Some(max))
    }
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(None))
    }
}
