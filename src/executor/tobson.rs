//! `tobson`: turn Extended JSON lines back into a `.bson` file.

use std::io::{BufRead, Write};

use tracing::debug;

use super::result::ExecutionStats;
use crate::bsonutil::ext_json_to_document;
use crate::error::{Result, ToolsError};

/// Convert one document per line of `input` into concatenated BSON.
///
/// Blank lines are skipped. Both legacy and canonical forms are accepted,
/// mixed freely. The first line that fails to parse stops the run with
/// its line number in the error.
pub fn to_bson_stream<R: BufRead, W: Write + ?Sized>(
    input: R,
    out: &mut W,
) -> Result<ExecutionStats> {
    let mut stats = ExecutionStats::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let doc = ext_json_to_document(text)
            .map_err(|e| ToolsError::Generic(format!("line {}: {e}", index + 1)))?;
        let bytes = bson::to_vec(&doc)?;
        out.write_all(&bytes)?;

        debug!(line = index + 1, size = bytes.len(), "converted document");
        stats.record_written(bytes.len());
        stats.record_processed();
    }

    out.flush()?;
    Ok(stats)
}
