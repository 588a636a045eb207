//! `decode`: print one line per message of a wire capture.

use std::io::{Read, Write};

use tracing::{debug, warn};

use super::result::ExecutionStats;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::wire::{StampedReader, op_from_reader, read_raw_op, read_raw_op_timed};

/// How to walk the capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Print headers and body sizes without decoding bodies
    pub raw: bool,

    /// Log and skip messages whose bodies do not decode
    pub continue_on_error: bool,
}

/// Decode every message in `input`, writing one line each to `out`.
///
/// Stops at a clean end of input. Framing errors always stop the run;
/// body errors stop it unless `continue_on_error` is set.
///
/// # Arguments
/// * `input` - Concatenated wire messages
/// * `out` - Destination for the formatted lines
/// * `formatter` - Line formatter
/// * `options` - Decode options
///
/// # Returns
/// * `Result<ExecutionStats>` - Message counts or the first fatal error
pub fn decode_stream<R: Read, W: Write + ?Sized>(
    input: R,
    out: &mut W,
    formatter: &Formatter,
    options: DecodeOptions,
) -> Result<ExecutionStats> {
    let mut stats = ExecutionStats::default();

    if options.raw {
        let mut reader = StampedReader::new(input);
        loop {
            let op = match read_raw_op_timed(&mut reader) {
                Ok(op) => op,
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => return Err(e),
            };
            writeln!(out, "{}", formatter.format_raw_op(&op))?;
            stats.record_processed();
        }
        out.flush()?;
        return Ok(stats);
    }

    let mut reader = input;
    loop {
        let decoded = if options.continue_on_error {
            let raw = match read_raw_op(&mut reader) {
                Ok(raw) => raw,
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => return Err(e),
            };
            match raw.parse() {
                Ok(op) => op,
                Err(e) => {
                    warn!(
                        request_id = raw.header.request_id,
                        op_code = %raw.header.op_code,
                        "skipping message: {e}"
                    );
                    stats.record_skipped();
                    continue;
                }
            }
        } else {
            match op_from_reader(&mut reader) {
                Ok(op) => op,
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => return Err(e),
            }
        };

        debug!(request_id = decoded.header().request_id, op = %decoded.op_code(), "decoded");
        writeln!(out, "{}", formatter.format_op(&decoded))?;
        stats.record_processed();
    }

    out.flush()?;
    Ok(stats)
}
