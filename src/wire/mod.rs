//! Decoder for the legacy MongoDB wire protocol.
//!
//! Messages are read from any [`std::io::Read`] as a 16-byte header followed
//! by an opcode-specific body. Documents inside a body stay as raw BSON
//! until something asks for them.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use mongotools::wire::op_from_reader;
//!
//! let mut capture = File::open("capture.bin")?;
//! loop {
//!     match op_from_reader(&mut capture) {
//!         Ok(op) => println!("{op}"),
//!         Err(e) if e.is_end_of_stream() => break,
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod delete;
pub mod flags;
pub mod get_more;
pub mod header;
pub mod insert;
pub mod io;
pub mod kill_cursors;
pub mod msg;
pub mod op;
pub mod query;
pub mod raw;
pub mod reply;
pub mod unknown;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;

pub use delete::DeleteOp;
pub use flags::{DeleteFlags, InsertFlags, QueryFlags, ReplyFlags, UpdateFlags};
pub use get_more::GetMoreOp;
pub use header::{HEADER_LEN, MAX_DOCUMENT_SIZE, MAX_MESSAGE_SIZE, MsgHeader, OpCode, read_header};
pub use insert::InsertOp;
pub use io::{copy_message, read_cstring, read_document};
pub use kill_cursors::KillCursorsOp;
pub use msg::MsgOp;
pub use op::{Op, OpMetadata, WireOp, op_from_reader, parse_body};
pub use query::QueryOp;
pub use raw::{RawOp, SeenTime, StampedReader, read_raw_op, read_raw_op_timed};
pub use reply::ReplyOp;
pub use unknown::UnknownOp;
pub use update::UpdateOp;
