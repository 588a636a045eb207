//! `bsondump`: print the documents of a `.bson` file.

use std::io::{Read, Write};

use tracing::info;

use super::result::ExecutionStats;
use crate::dump::BsonSource;
use crate::error::Result;
use crate::formatter::{Formatter, debug_document};

/// Output style for dumped documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DumpType {
    /// One Extended JSON document per line
    #[default]
    Json,
    /// Element types and sizes
    Debug,
}

/// Dump every document in `input`.
///
/// # Arguments
/// * `input` - Concatenated BSON documents
/// * `out` - Destination for the rendered documents
/// * `formatter` - Extended JSON formatter for [`DumpType::Json`]
/// * `dump_type` - Output style
/// * `objcheck` - Validate each document fully before printing it
///
/// # Returns
/// * `Result<ExecutionStats>` - Document count, or the first error
pub fn dump_stream<R: Read, W: Write + ?Sized>(
    input: R,
    out: &mut W,
    formatter: &Formatter,
    dump_type: DumpType,
    objcheck: bool,
) -> Result<ExecutionStats> {
    let mut stats = ExecutionStats::default();
    let source = BsonSource::new(input).with_objcheck(objcheck);

    for doc in source {
        let doc = doc?;
        match dump_type {
            DumpType::Json => writeln!(out, "{}", formatter.format_raw_document(&doc)?)?,
            DumpType::Debug => write!(out, "{}", debug_document(&doc)?)?,
        }
        stats.record_processed();
    }

    out.flush()?;
    info!("{} objects found", stats.processed);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsonutil::ExtJsonMode;
    use crate::error::{DecodeError, ToolsError};
    use bson::doc;
    use std::io::Cursor;

    fn dump_bytes() -> Vec<u8> {
        let mut bytes = bson::to_vec(&doc! { "a": 1_i64 }).unwrap();
        bytes.extend(bson::to_vec(&doc! { "b": [true] }).unwrap());
        bytes
    }

    #[test]
    fn test_json_dump() {
        let formatter = Formatter::new(ExtJsonMode::Canonical, None, false);
        let mut out = Vec::new();
        let stats = dump_stream(
            Cursor::new(dump_bytes()),
            &mut out,
            &formatter,
            DumpType::Json,
            true,
        )
        .unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"a\":{\"$numberLong\":\"1\"}}\n{\"b\":[true]}\n"
        );
    }

    #[test]
    fn test_debug_dump() {
        let formatter = Formatter::default();
        let mut out = Vec::new();
        dump_stream(
            Cursor::new(dump_bytes()),
            &mut out,
            &formatter,
            DumpType::Debug,
            false,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("--- new object ---").count(), 3);
    }

    #[test]
    fn test_dump_stops_on_oversized_document() {
        let mut bytes = dump_bytes();
        bytes.extend(20_000_000_i32.to_le_bytes());
        let mut out = Vec::new();
        let err = dump_stream(
            Cursor::new(bytes),
            &mut out,
            &Formatter::default(),
            DumpType::Json,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ToolsError::Decode(DecodeError::DocumentTooLarge { size: 20_000_000, .. })
        ));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}
