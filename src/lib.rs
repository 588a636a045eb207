//! mongotools library
//!
//! Decoding of the legacy MongoDB wire protocol and conversion between BSON
//! and Extended JSON, as used by the `mongotools` binary.
//!
//! # Modules
//!
//! - `wire`: legacy wire message decoder
//! - `bsonutil`: BSON ⇄ Extended JSON conversion and index-key normalization
//! - `parser`: Extended JSON text parser (legacy and canonical forms)
//! - `dump`: reading concatenated `.bson` files
//! - `formatter`: output formatting and display
//! - `executor`: the `decode`, `copy`, `bsondump` and `tobson` subcommands
//! - `cli`: command-line interface and argument parsing
//! - `config`: configuration management
//! - `error`: error types and handling
//! - `utils`: utility functions and helpers
//!
//! # Example
//!
//! ```
//! use mongotools::bsonutil::{ExtJsonMode, ext_json_to_document, marshal_ext_json_reversible};
//!
//! let doc = ext_json_to_document(r#"{"n": NumberLong(5), "at": new Date(0)}"#)?;
//! let text = marshal_ext_json_reversible(&doc, ExtJsonMode::Canonical)?;
//! assert_eq!(
//!     text,
//!     r#"{"n":{"$numberLong":"5"},"at":{"$date":{"$numberLong":"0"}}}"#
//! );
//! # Ok::<(), mongotools::error::ToolsError>(())
//! ```

pub mod bsonutil;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod parser;
pub mod utils;
pub mod wire;

// Re-export commonly used types
pub use bsonutil::{ExtJsonMode, ExtJsonValue, MarshalD};
pub use config::Config;
pub use error::{Result, ToolsError};
pub use formatter::Formatter;
pub use wire::{Op, op_from_reader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
