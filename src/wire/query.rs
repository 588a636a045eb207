//! OP_QUERY: a query against a collection, or a command against `db.$cmd`.

use std::fmt;
use std::io::Read;

use bson::{Document, RawDocumentBuf};

use super::flags::QueryFlags;
use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, read_i32, write_cstring, write_i32};
use super::op::{OpMetadata, WireOp, format_document, read_raw_document};
use crate::error::Result;

const WRITE_COMMANDS: [&str; 3] = ["insert", "update", "delete"];

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOp {
    pub header: MsgHeader,
    pub flags: QueryFlags,
    /// `database.collection`
    pub full_collection_name: String,
    pub number_to_skip: i32,
    pub number_to_return: i32,
    pub query: RawDocumentBuf,
    /// Projection, present only when the body has bytes left after `query`.
    pub return_fields_selector: Option<RawDocumentBuf>,
}

impl QueryOp {
    /// The query document, unmarshalled.
    pub fn query_document(&self) -> Result<Document> {
        Ok(self.query.to_document()?)
    }

    pub fn selector_document(&self) -> Result<Option<Document>> {
        match &self.return_fields_selector {
            Some(raw) => Ok(Some(raw.to_document()?)),
            None => Ok(None),
        }
    }

    /// True for queries addressed to a database's `$cmd` pseudo-collection.
    pub fn is_command(&self) -> bool {
        self.full_collection_name.ends_with("$cmd")
    }

    fn render(&self, max: Option<usize>) -> String {
        let mut out = format!(
            "OpQuery {} {}",
            self.full_collection_name,
            format_document(&self.query, max)
        );
        if let Some(selector) = &self.return_fields_selector {
            out.push_str(" fields:");
            out.push_str(&format_document(selector, max));
        }
        if self.number_to_skip != 0 || self.number_to_return != 0 {
            out.push_str(&format!(
                " skip:{} limit:{}",
                self.number_to_skip, self.number_to_return
            ));
        }
        if self.flags.0 != 0 {
            out.push_str(&format!(" flags:{}", self.flags));
        }
        out
    }
}

impl WireOp for QueryOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let flags = QueryFlags(read_i32(body)?);
        let full_collection_name = read_cstring(body)?;
        let number_to_skip = read_i32(body)?;
        let number_to_return = read_i32(body)?;
        let query = read_raw_document(body)?;
        let return_fields_selector = if body.is_exhausted() {
            None
        } else {
            Some(read_raw_document(body)?)
        };

        Ok(Self {
            header,
            flags,
            full_collection_name,
            number_to_skip,
            number_to_return,
            query,
            return_fields_selector,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.flags.0);
        write_cstring(buf, &self.full_collection_name);
        write_i32(buf, self.number_to_skip);
        write_i32(buf, self.number_to_return);
        buf.extend_from_slice(self.query.as_bytes());
        if let Some(selector) = &self.return_fields_selector {
            buf.extend_from_slice(selector.as_bytes());
        }
    }

    fn meta(&self) -> OpMetadata {
        if !self.is_command() {
            return OpMetadata::new("query", &self.full_collection_name, "");
        }

        let mut command_name = "";
        for (i, element) in self.query.iter().enumerate() {
            let Ok((key, _)) = element else { break };
            if WRITE_COMMANDS.contains(&key) {
                return OpMetadata::new(key, &self.full_collection_name, "");
            }
            if i == 0 {
                command_name = key;
            }
        }
        OpMetadata::new("command", &self.full_collection_name, command_name)
    }

    fn abbreviated(&self, max: usize) -> String {
        self.render(Some(max))
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(None))
    }
}
