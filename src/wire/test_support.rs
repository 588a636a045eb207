//! Message builders shared by the decoder tests.

use bson::Document;

use super::header::{MsgHeader, OpCode};
use super::io::{write_cstring, write_i32};

/// Frame `body` behind a header whose length matches it exactly.
pub(crate) fn message(op_code: OpCode, body: &[u8]) -> Vec<u8> {
    let header = MsgHeader::new(op_code, 7, 0, body.len());
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

/// Frame `body` behind a header that declares `declared` body bytes.
pub(crate) fn message_with_length(op_code: OpCode, body: &[u8], declared: usize) -> Vec<u8> {
    let header = MsgHeader::new(op_code, 7, 0, declared);
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

pub(crate) fn doc_bytes(doc: &Document) -> Vec<u8> {
    bson::to_vec(doc).unwrap()
}

/// OP_QUERY body with zero flags, skip and limit.
pub(crate) fn query_body(ns: &str, query: &Document) -> Vec<u8> {
    let mut body = Vec::new();
    write_i32(&mut body, 0);
    write_cstring(&mut body, ns);
    write_i32(&mut body, 0);
    write_i32(&mut body, 0);
    body.extend_from_slice(&doc_bytes(query));
    body
}
