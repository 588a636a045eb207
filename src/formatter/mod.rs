//! Output formatting and colorization for mongotools
//!
//! - Extended JSON rendering of documents (legacy or canonical, compact or pretty)
//! - One-line rendering of decoded wire messages
//! - The bsondump debug structure view
//! - Color highlighting for terminal output

pub mod colorizer;
pub mod debug;
pub mod json;

use bson::{Document, RawDocument};

use crate::bsonutil::{ExtJsonMode, ExtJsonValue};
use crate::config::DisplayConfig;
use crate::error::{Result, ToolsError};
use crate::wire::{MsgHeader, Op, RawOp};

pub use colorizer::{AnsiColors, Colorizer};
pub use debug::debug_document;
pub use json::JsonFormatter;

/// Main formatter for documents and decoded messages
pub struct Formatter {
    /// Extended JSON renderer
    json: JsonFormatter,

    /// Colorizer for output highlighting
    colorizer: Colorizer,

    /// Shorten message renderings to this many characters
    abbreviate: Option<usize>,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `mode` - Extended JSON flavor
    /// * `indent` - Spaces per level for pretty output, `None` for compact
    /// * `use_colors` - Enable colored output
    ///
    /// # Returns
    /// * `Self` - New formatter instance
    pub fn new(mode: ExtJsonMode, indent: Option<usize>, use_colors: bool) -> Self {
        Self {
            json: JsonFormatter::new(mode, indent, use_colors),
            colorizer: Colorizer::new(use_colors),
            abbreviate: None,
        }
    }

    /// Create a formatter from the `[display]` configuration section
    pub fn from_config(display: &DisplayConfig) -> Self {
        let indent = display.pretty.then_some(display.indent);
        Self::new(display.format, indent, display.color_output).with_abbreviate(display.abbreviate)
    }

    /// Shorten message renderings to `max` characters
    pub fn with_abbreviate(mut self, max: Option<usize>) -> Self {
        self.abbreviate = max;
        self
    }

    pub fn mode(&self) -> ExtJsonMode {
        self.json.mode()
    }

    pub fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    /// Format a BSON document as Extended JSON
    ///
    /// # Arguments
    /// * `doc` - Document to format
    ///
    /// # Returns
    /// * `Result<String>` - Rendered document or conversion error
    pub fn format_document(&self, doc: &Document) -> Result<String> {
        self.json.format_document(doc)
    }

    /// Format a raw BSON document as Extended JSON
    pub fn format_raw_document(&self, doc: &RawDocument) -> Result<String> {
        self.json.format_raw_document(doc)
    }

    pub fn format_value(&self, value: &ExtJsonValue) -> Result<String> {
        self.json.format_value(value)
    }

    /// Format a decoded message on one line
    ///
    /// The line starts with the request id (and the id being answered,
    /// for replies), followed by the op rendering with its name highlighted.
    ///
    /// # Arguments
    /// * `op` - Decoded message
    ///
    /// # Returns
    /// * `String` - Formatted line
    pub fn format_op(&self, op: &Op) -> String {
        let text = match self.abbreviate {
            Some(max) => op.abbreviated(max),
            None => op.to_string(),
        };
        let body = match text.split_once(' ') {
            Some((name, rest)) => format!("{} {rest}", self.colorizer.op_name(name)),
            None => self.colorizer.op_name(&text),
        };
        format!("{} {body}", self.format_ids(op.header()))
    }

    /// Format an undecoded message
    pub fn format_raw_op(&self, op: &RawOp) -> String {
        format!(
            "{} {}",
            self.format_ids(&op.header),
            self.colorizer.op_name(&op.to_string())
        )
    }

    fn format_ids(&self, header: &MsgHeader) -> String {
        let ids = if header.response_to != 0 {
            format!("#{} ->{}", header.request_id, header.response_to)
        } else {
            format!("#{}", header.request_id)
        };
        self.colorizer.header(&ids)
    }

    /// Format an error message
    pub fn format_error(&self, error: &ToolsError) -> String {
        self.colorizer.error(&error.to_string())
    }

    /// Format a success message
    pub fn format_success(&self, message: &str) -> String {
        self.colorizer.success(message)
    }

    /// Format a warning message
    pub fn format_warning(&self, message: &str) -> String {
        self.colorizer.warning(message)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}
