//! Extended JSON text parsing.
//!
//! The parser is split in three layers, each usable on its own:
//!
//! - [`lexer`]: characters to tokens, never fails
//! - [`parser`]: tokens to a syntax tree with spans
//! - [`converter`]: syntax tree to [`ExtJsonValue`]
//!
//! # Example
//!
//! ```rust
//! use mongotools::bsonutil::ExtJsonValue;
//! use mongotools::parser::parse_ext_json;
//!
//! let value = parse_ext_json(r#"{n: NumberLong(5), "id": {"$oid": "552ffe9f5739878e73d116a9"}}"#)?;
//! let ExtJsonValue::Document(doc) = value else { unreachable!() };
//! assert_eq!(doc.get("n"), Some(&ExtJsonValue::NumberLong(5)));
//! # Ok::<(), mongotools::error::ToolsError>(())
//! ```

pub mod ast;
pub mod converter;
pub mod lexer;
pub mod parser;

pub use converter::ValueConverter;
pub use parser::ExtJsonParser;

use crate::bsonutil::ExtJsonValue;
use crate::error::Result;

/// Parse one Extended-JSON value, legacy or canonical.
///
/// Canonical wrappers such as `{"$numberLong": "5"}` come back as plain
/// documents; [`crate::bsonutil::convert_ext_json_to_bson`] gives them
/// their BSON type.
pub fn parse_ext_json(text: &str) -> Result<ExtJsonValue> {
    let expr = ExtJsonParser::parse(text)?;
    ValueConverter::expr_to_ext_json(&expr)
}
