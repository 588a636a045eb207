//! Error handling module for mongotools.
//!
//! Every fallible operation in the crate returns [`Result`], whose error is
//! the top-level [`ToolsError`]. Each area (wire decoding, value conversion,
//! Extended JSON parsing, configuration) has its own error kind which
//! converts into `ToolsError` with `?` or `.into()`.
//!
//! # Example
//!
//! ```rust
//! use mongotools::error::{DecodeError, Result, ToolsError};
//!
//! fn check_size(size: i32) -> Result<()> {
//!     if size < 5 {
//!         return Err(DecodeError::InvalidDocumentSize(size).into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(
//!     check_size(4),
//!     Err(ToolsError::Decode(DecodeError::InvalidDocumentSize(4)))
//! ));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ConversionError, DecodeError, ParseError, Result, ToolsError};
