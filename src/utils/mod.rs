//! Small helpers shared by the decoder, the converter and the subcommands.
//!
//! - String shortening for long document renderings
//! - Input/output stream opening for file-or-stdio arguments

pub use string::{abbreviate, abbreviate_bytes};

/// String utilities
pub mod string {
    /// Shorten `s` to at most `max` characters by cutting out its middle.
    ///
    /// Strings that already fit are returned unchanged. Otherwise the result
    /// keeps `(max - 3) / 2` characters from each end around `"..."`.
    ///
    /// # Arguments
    /// * `s` - String to shorten
    /// * `max` - Maximum length in characters
    ///
    /// # Returns
    /// * `String` - `s` itself or `prefix...suffix`
    pub fn abbreviate(s: &str, max: usize) -> String {
        let len = s.chars().count();
        if len <= max {
            return s.to_string();
        }
        let window = max.saturating_sub(3) / 2;
        let prefix: String = s.chars().take(window).collect();
        let suffix: String = s.chars().skip(len - window).collect();
        format!("{prefix}...{suffix}")
    }

    /// Byte-slice variant of [`abbreviate`], for hex dumps of raw bodies.
    ///
    /// # Returns
    /// * `String` - lowercase hex, shortened to `max` characters
    pub fn abbreviate_bytes(b: &[u8], max: usize) -> String {
        abbreviate(&hex::encode(b), max)
    }
}

/// Stream helpers for arguments that are either a path or stdio.
pub mod fs {
    use std::fs::File;
    use std::io::{self, BufReader, BufWriter, Read, Write};
    use std::path::{Path, PathBuf};

    use crate::error::Result;

    /// The real file behind `path`, `None` for stdio (`None` or `-`).
    fn file_path(path: Option<&PathBuf>) -> Option<&Path> {
        path.map(PathBuf::as_path).filter(|p| p.as_os_str() != "-")
    }

    /// Open a buffered input: the named file, or stdin for `None` and `-`.
    ///
    /// # Arguments
    /// * `path` - Optional input path
    ///
    /// # Returns
    /// * `Result<Box<dyn Read>>` - Readable stream or I/O error
    pub fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn Read>> {
        match file_path(path) {
            Some(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
            None => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }

    /// Create a buffered output, creating missing parent directories.
    pub fn create_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
        let Some(path) = file_path(path) else {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}
