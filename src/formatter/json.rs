//! Extended JSON formatting for documents
//!
//! - Legacy or canonical flavor
//! - Compact or indented output
//! - Optional color highlighting of canonical output

use bson::{Document, RawDocument};
use colored_json::prelude::*;

use crate::bsonutil::{ExtJsonMode, ExtJsonValue, convert_document_to_ext_json};
use crate::error::{DecodeError, Result};

/// Extended JSON formatter with pretty printing support
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    /// Output flavor
    mode: ExtJsonMode,

    /// Spaces per level when pretty printing, `None` for compact output
    indent: Option<usize>,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `mode` - Legacy or canonical Extended JSON
    /// * `indent` - Spaces per nesting level, `None` for one line per document
    /// * `use_colors` - Enable colored output
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(mode: ExtJsonMode, indent: Option<usize>, use_colors: bool) -> Self {
        Self {
            mode,
            indent,
            use_colors,
        }
    }

    pub fn mode(&self) -> ExtJsonMode {
        self.mode
    }

    /// Format one Extended JSON value
    ///
    /// # Arguments
    /// * `value` - Value to render
    ///
    /// # Returns
    /// * `Result<String>` - Rendered text or serialization error
    pub fn format_value(&self, value: &ExtJsonValue) -> Result<String> {
        let text = value.render(self.mode, self.indent)?;

        // Only canonical output is valid JSON, and compact lines stay
        // uncolored for piping.
        if self.use_colors && self.indent.is_some() && self.mode == ExtJsonMode::Canonical {
            Ok(text.to_colored_json_auto().unwrap_or(text))
        } else {
            Ok(text)
        }
    }

    /// Format a BSON document
    pub fn format_document(&self, doc: &Document) -> Result<String> {
        let value = ExtJsonValue::Document(convert_document_to_ext_json(doc)?);
        self.format_value(&value)
    }

    /// Format a raw BSON document, decoding it first
    pub fn format_raw_document(&self, doc: &RawDocument) -> Result<String> {
        let parsed = Document::try_from(doc)
            .map_err(|e| DecodeError::InvalidBson(e.to_string()))?;
        self.format_document(&parsed)
    }
}
