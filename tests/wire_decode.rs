//! Decoding captures through the public API.

use std::io::Cursor;

use bson::{Document, doc};
use mongotools::bsonutil::ExtJsonMode;
use mongotools::error::{DecodeError, ToolsError};
use mongotools::executor::{DecodeOptions, copy_stream, decode_stream};
use mongotools::formatter::Formatter;
use mongotools::wire::io::{write_cstring, write_i32, write_i64};
use mongotools::wire::{MsgHeader, Op, OpCode, RawOp, op_from_reader, read_raw_op};

fn message(op_code: OpCode, request_id: i32, body: &[u8]) -> Vec<u8> {
    let mut out = MsgHeader::new(op_code, request_id, 0, body.len()).to_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

fn query(ns: &str, filter: &Document) -> Vec<u8> {
    let mut body = Vec::new();
    write_i32(&mut body, 0);
    write_cstring(&mut body, ns);
    write_i32(&mut body, 0);
    write_i32(&mut body, 0);
    body.extend(bson::to_vec(filter).unwrap());
    body
}

fn kill_cursors(ids: &[i64], declared_count: i32) -> Vec<u8> {
    let mut body = Vec::new();
    write_i32(&mut body, 0);
    write_i32(&mut body, declared_count);
    for id in ids {
        write_i64(&mut body, *id);
    }
    body
}

#[test]
fn query_for_test_foo_end_to_end() {
    let capture = message(OpCode::Query, 7, &query("test.foo", &doc! {}));
    let op = op_from_reader(&mut Cursor::new(capture)).unwrap();

    let Op::Query(query) = &op else {
        panic!("expected a query, got {op:?}")
    };
    assert_eq!(query.full_collection_name, "test.foo");
    assert_eq!(query.query_document().unwrap(), Document::new());
    assert!(query.return_fields_selector.is_none());

    let rendered = op.to_string();
    assert!(rendered.contains("test.foo"));
    assert!(rendered.contains("{}"));
}

#[test]
fn kill_cursors_count_must_match_body() {
    let ok = message(OpCode::KillCursors, 1, &kill_cursors(&[1, 2, 3], 3));
    let Op::KillCursors(op) = op_from_reader(&mut Cursor::new(ok)).unwrap() else {
        panic!("expected killCursors")
    };
    assert_eq!(op.cursor_ids, vec![1, 2, 3]);

    for declared in [2, 4] {
        let bad = message(OpCode::KillCursors, 1, &kill_cursors(&[1, 2, 3], declared));
        let err = op_from_reader(&mut Cursor::new(bad)).unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::LengthMismatch { .. })
        ));
    }
}

#[test]
fn raw_read_defers_parsing() {
    let mut capture = message(OpCode::Query, 1, &query("test.a", &doc! { "x": 1 }));
    capture.extend(message(OpCode::Unknown(4242), 2, b"\x01\x02\x03"));

    let mut reader = Cursor::new(capture.clone());
    let first: RawOp = read_raw_op(&mut reader).unwrap();
    let second = read_raw_op(&mut reader).unwrap();
    assert!(read_raw_op(&mut reader).unwrap_err().is_end_of_stream());

    assert_eq!(first.parse().unwrap().meta().ns, "test.a");
    assert_eq!(second.body, vec![1, 2, 3]);
    assert!(matches!(second.parse().unwrap(), Op::Unknown(_)));

    let mut rewritten = first.to_wire();
    rewritten.extend(second.to_wire());
    assert_eq!(rewritten, capture);
}

#[test]
fn decode_and_copy_a_capture_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("capture.bin");
    let output = dir.path().join("copy.bin");

    let mut capture = message(OpCode::Query, 1, &query("test.foo", &doc! { "n": 1_i64 }));
    capture.extend(message(OpCode::KillCursors, 2, &kill_cursors(&[99], 1)));
    std::fs::write(&input, &capture).unwrap();

    let mut reader = std::fs::File::open(&input).unwrap();
    let mut writer = std::fs::File::create(&output).unwrap();
    let stats = copy_stream(&mut reader, &mut writer).unwrap();
    drop(writer);
    assert_eq!(stats.processed, 2);
    assert_eq!(std::fs::read(&output).unwrap(), capture);

    let formatter = Formatter::new(ExtJsonMode::Canonical, None, false);
    let mut out = Vec::new();
    decode_stream(
        std::fs::File::open(&output).unwrap(),
        &mut out,
        &formatter,
        DecodeOptions::default(),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("#1 "));
    // Op lines always use the legacy rendering.
    assert!(lines[0].ends_with("OpQuery test.foo {\"n\":NumberLong(1)}"));
    assert!(lines[1].ends_with("KillCursorsOp [99]"));
}
