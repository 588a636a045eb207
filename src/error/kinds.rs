use std::{fmt, io};

/// Crate-wide `Result` type using [`ToolsError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ToolsError>;

/// Top-level error type for mongotools operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ToolsError {
    /// Wire-protocol framing and payload errors.
    Decode(DecodeError),

    /// BSON to Extended JSON (and back) conversion errors.
    Conversion(ConversionError),

    /// Extended JSON text parsing errors.
    Parse(ParseError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// BSON encoding or decoding errors reported by the `bson` crate.
    Bson(String),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised while decoding wire messages or BSON streams.
#[derive(Debug)]
pub enum DecodeError {
    /// The stream ended cleanly before the first byte of a new unit.
    EndOfStream,

    /// The stream ended in the middle of a unit.
    ShortRead { expected: usize, actual: usize },

    /// A document length prefix outside `[5, MAX_DOCUMENT_SIZE]`.
    InvalidDocumentSize(i32),

    /// A message length prefix below the header size or above `MAX_MESSAGE_SIZE`.
    InvalidMessageSize(i32),

    /// The body parser did not consume exactly the declared length.
    LengthMismatch { declared: usize, consumed: usize },

    /// A C-string that is not valid UTF-8.
    InvalidCString,

    /// Document bytes that are not well-formed BSON.
    InvalidBson(String),

    /// A document in a BSON dump larger than the dump ceiling.
    DocumentTooLarge { size: usize, max: usize },
}

/// Errors raised by the BSON / Extended JSON value converter.
#[derive(Debug)]
pub enum ConversionError {
    /// A BSON kind with no Extended JSON counterpart.
    UnsupportedBsonType { type_name: String, value: String },

    /// A recognised `$` wrapper whose shape does not match.
    MalformedWrapper { wrapper: String, reason: String },

    /// A value that cannot be represented in the target universe.
    InvalidValue(String),

    /// Rendering then reparsing a document did not reproduce it.
    Irreversible { json: String },
}

/// Extended JSON text parsing errors.
#[derive(Debug)]
pub enum ParseError {
    /// Unexpected token while parsing.
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    /// Call of a constructor that has no BSON counterpart.
    UnknownConstructor(String),

    /// Constructor argument of the wrong kind or value.
    InvalidArgument { constructor: String, reason: String },

    /// Input left over after a complete value.
    TrailingInput(usize),

    /// Objects, arrays or calls nested past the parser's limit.
    TooDeep { limit: usize, position: usize },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Anything else the CLI layer reports as a configuration problem.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ToolsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolsError::Decode(e) => write!(f, "Decode error: {e}"),
            ToolsError::Conversion(e) => write!(f, "Conversion error: {e}"),
            ToolsError::Parse(e) => write!(f, "{e}"),
            ToolsError::Config(e) => write!(f, "Configuration error: {e}"),
            ToolsError::Io(e) => write!(f, "I/O error: {e}"),
            ToolsError::Bson(msg) => write!(f, "BSON error: {msg}"),
            ToolsError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::EndOfStream => write!(f, "end of stream"),
            DecodeError::ShortRead { expected, actual } => {
                write!(f, "short read: expected {expected} bytes, got {actual}")
            }
            DecodeError::InvalidDocumentSize(size) => {
                write!(f, "invalid document size {size}")
            }
            DecodeError::InvalidMessageSize(size) => {
                write!(f, "invalid message size {size}")
            }
            DecodeError::LengthMismatch { declared, consumed } => write!(
                f,
                "message body length mismatch: declared {declared} bytes, parsed {consumed}"
            ),
            DecodeError::InvalidCString => write!(f, "c-string is not valid UTF-8"),
            DecodeError::InvalidBson(msg) => write!(f, "invalid BSON: {msg}"),
            DecodeError::DocumentTooLarge { size, max } => write!(
                f,
                "invalid BSONSize: {size} bytes is larger than maximum of {max} bytes"
            ),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::UnsupportedBsonType { type_name, value } => write!(
                f,
                "conversion of BSON value '{value}' of type '{type_name}' not supported"
            ),
            ConversionError::MalformedWrapper { wrapper, reason } => {
                write!(f, "malformed {wrapper} value: {reason}")
            }
            ConversionError::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            ConversionError::Irreversible { json } => {
                write!(f, "document does not survive an Extended JSON round trip: {json}")
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                position,
            } => write!(f, "Expected {expected}, found '{found}' at position {position}"),
            ParseError::UnknownConstructor(name) => write!(f, "Unknown constructor: {name}"),
            ParseError::InvalidArgument {
                constructor,
                reason,
            } => write!(f, "Invalid argument to {constructor}: {reason}"),
            ParseError::TrailingInput(pos) => {
                write!(f, "Unexpected trailing input at position {pos}")
            }
            ParseError::TooDeep { limit, position } => {
                write!(f, "Nesting exceeds {limit} levels at position {position}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ToolsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolsError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for DecodeError {}
impl std::error::Error for ConversionError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ToolsError ========================= */

impl From<io::Error> for ToolsError {
    fn from(err: io::Error) -> Self {
        ToolsError::Io(err)
    }
}

impl From<DecodeError> for ToolsError {
    fn from(err: DecodeError) -> Self {
        ToolsError::Decode(err)
    }
}

impl From<ConversionError> for ToolsError {
    fn from(err: ConversionError) -> Self {
        ToolsError::Conversion(err)
    }
}

impl From<ParseError> for ToolsError {
    fn from(err: ParseError) -> Self {
        ToolsError::Parse(err)
    }
}

impl From<ConfigError> for ToolsError {
    fn from(err: ConfigError) -> Self {
        ToolsError::Config(err)
    }
}

impl From<bson::de::Error> for ToolsError {
    fn from(err: bson::de::Error) -> Self {
        ToolsError::Bson(err.to_string())
    }
}

impl From<bson::ser::Error> for ToolsError {
    fn from(err: bson::ser::Error) -> Self {
        ToolsError::Bson(err.to_string())
    }
}

impl From<bson::raw::Error> for ToolsError {
    fn from(err: bson::raw::Error) -> Self {
        ToolsError::Decode(DecodeError::InvalidBson(err.to_string()))
    }
}

impl From<serde_json::Error> for ToolsError {
    fn from(err: serde_json::Error) -> Self {
        ToolsError::Generic(format!("JSON error: {err}"))
    }
}

impl From<String> for ToolsError {
    fn from(msg: String) -> Self {
        ToolsError::Generic(msg)
    }
}

impl From<&str> for ToolsError {
    fn from(msg: &str) -> Self {
        ToolsError::Generic(msg.to_owned())
    }
}

impl ToolsError {
    /// True when the error is a clean end of input rather than a failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ToolsError::Decode(DecodeError::EndOfStream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_message() {
        let err: ToolsError = ConversionError::UnsupportedBsonType {
            type_name: "Symbol".to_string(),
            value: "abc".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Conversion error: conversion of BSON value 'abc' of type 'Symbol' not supported"
        );
    }

    #[test]
    fn test_document_too_large_message() {
        let err = DecodeError::DocumentTooLarge {
            size: 16_793_601,
            max: 16_793_600,
        };
        assert!(
            err.to_string()
                .contains("is larger than maximum of 16793600 bytes")
        );
    }

    #[test]
    fn test_end_of_stream_detection() {
        let err: ToolsError = DecodeError::EndOfStream.into();
        assert!(err.is_end_of_stream());
        let err: ToolsError = DecodeError::ShortRead {
            expected: 16,
            actual: 3,
        }
        .into();
        assert!(!err.is_end_of_stream());
    }
}
