//! Color output support for terminal formatting
//!
//! Decoded messages get a highlighted op name and dimmed header details.
//! Status lines from the subcommands use the success/error/warning colors.

/// ANSI color codes for terminal output
pub struct AnsiColors;

impl AnsiColors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Color scheme for output highlighting
#[derive(Debug, Clone, Copy)]
pub struct Colorizer {
    /// Enable colors
    enabled: bool,
}

impl Colorizer {
    /// Create a new colorizer
    ///
    /// # Arguments
    /// * `enabled` - Enable color output
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, codes: &str, text: &str) -> String {
        if self.enabled {
            format!("{codes}{text}{}", AnsiColors::RESET)
        } else {
            text.to_string()
        }
    }

    /// Colorize text as success (green)
    pub fn success(&self, text: &str) -> String {
        self.paint(AnsiColors::GREEN, text)
    }

    /// Colorize text as error (red), prefixed with `Error: `
    ///
    /// # Arguments
    /// * `text` - Error message
    ///
    /// # Returns
    /// * `String` - Colorized text
    pub fn error(&self, text: &str) -> String {
        self.paint(AnsiColors::RED, &format!("Error: {text}"))
    }

    /// Colorize text as warning (yellow)
    pub fn warning(&self, text: &str) -> String {
        self.paint(AnsiColors::YELLOW, text)
    }

    /// Op name at the start of a decoded message line (bold cyan)
    pub fn op_name(&self, text: &str) -> String {
        let codes = format!("{}{}", AnsiColors::BOLD, AnsiColors::CYAN);
        self.paint(&codes, text)
    }

    /// Header details such as request ids (dim)
    pub fn header(&self, text: &str) -> String {
        self.paint(AnsiColors::DIM, text)
    }

    /// Enable or disable colors
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
