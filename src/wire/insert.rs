//! OP_INSERT: one or more documents for a single collection.

use std::fmt;
use std::io::Read;

use bson::{Document, RawDocumentBuf};

use super::flags::InsertFlags;
use super::header::MsgHeader;
use super::io::{BodyReader, read_cstring, read_i32, write_cstring, write_i32};
use super::op::{OpMetadata, WireOp, format_documents, read_documents_to_end};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOp {
    pub header: MsgHeader,
    pub flags: InsertFlags,
    pub full_collection_name: String,
    /// Every document up to the declared message length.
    pub documents: Vec<RawDocumentBuf>,
}

impl InsertOp {
    pub fn documents(&self) -> Result<Vec<Document>> {
        self.documents
            .iter()
            .map(|raw| Ok(raw.to_document()?))
            .collect()
    }
}

impl WireOp for InsertOp {
    fn read_body<R: Read>(header: MsgHeader, body: &mut BodyReader<R>) -> Result<Self> {
        let flags = InsertFlags(read_i32(body)?);
        let full_collection_name = read_cstring(body)?;
        let documents = read_documents_to_end(body)?;
        Ok(Self {
            header,
            flags,
            full_collection_name,
            documents,
        })
    }

    fn header(&self) -> &MsgHeader {
        &self.header
    }

    fn write_body(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.flags.0);
        write_cstring(buf, &self.full_collection_name);
        for doc in &self.documents {
            buf.extend_from_slice(doc.as_bytes());
        }
    }

    fn meta(&self) -> OpMetadata {
        OpMetadata::new("insert", &self.full_collection_name, "")
    }

    fn abbreviated(&self, max: usize) -> String {
        format!(
            "InsertOp {} {}",
            self.full_collection_name,
            format_documents(&self.documents, Some(max))
        )
    }
}

impl fmt::Display for InsertOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InsertOp {} {}",
            self.full_collection_name,
            format_documents(&self.documents, None)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ToolsError};
    use crate::wire::header::OpCode;
    use crate::wire::op::{Op, op_from_reader};
    use crate::wire::test_support::{doc_bytes, message, message_with_length};
    use bson::doc;
    use std::io::Cursor;

    fn insert_body(docs: &[Document]) -> Vec<u8> {
        let mut body = Vec::new();
        write_i32(&mut body, 0);
        write_cstring(&mut body, "test.people");
        for d in docs {
            body.extend_from_slice(&doc_bytes(d));
        }
        body
    }

    fn sample_docs(n: usize) -> Vec<Document> {
        (0..n).map(|i| doc! { "i": i as i32, "name": format!("p{i}") }).collect()
    }

    #[test]
    fn test_insert_decodes_every_document() {
        for n in [1usize, 2, 5] {
            let docs = sample_docs(n);
            let bytes = message(OpCode::Insert, &insert_body(&docs));
            let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
            let Op::Insert(insert) = op else {
                panic!("expected insert")
            };
            assert_eq!(insert.documents.len(), n);
            assert_eq!(insert.documents().unwrap(), docs);
            assert_eq!(insert.meta(), OpMetadata::new("insert", "test.people", ""));
        }
    }

    #[test]
    fn test_insert_declared_length_one_byte_short() {
        let body = insert_body(&sample_docs(3));
        let bytes = message_with_length(OpCode::Insert, &body, body.len() - 1);
        let err = op_from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ToolsError::Decode(DecodeError::ShortRead { .. })));
    }

    #[test]
    fn test_insert_declared_length_one_byte_long() {
        let body = insert_body(&sample_docs(3));
        let mut bytes = message_with_length(OpCode::Insert, &body, body.len() + 1);
        bytes.push(0);
        let err = op_from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ToolsError::Decode(DecodeError::ShortRead { .. })));
    }

    #[test]
    fn test_insert_display_lists_documents() {
        let bytes = message(OpCode::Insert, &insert_body(&sample_docs(2)));
        let op = op_from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            op.to_string(),
            "InsertOp test.people [{\"i\":0,\"name\":\"p0\"}, {\"i\":1,\"name\":\"p1\"}]"
        );
    }

    #[test]
    fn test_insert_reencodes_identically() {
        let bytes = message(OpCode::Insert, &insert_body(&sample_docs(4)));
        let op = op_from_reader(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(op.to_wire(), bytes);
    }
}
