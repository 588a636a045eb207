//! Execution result types
//!
//! Every subcommand reports how many units it handled and how many it had
//! to skip, so that the binary can print a summary line.

use std::fmt;

/// Statistics about one subcommand run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Messages or documents handled successfully
    pub processed: u64,

    /// Messages or documents skipped after an error
    pub skipped: u64,

    /// Bytes written to the output, when the output is binary
    pub bytes_written: u64,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl ExecutionStats {
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_written(&mut self, bytes: usize) {
        self.bytes_written += bytes as u64;
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} processed", self.processed)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.bytes_written > 0 {
            write!(f, ", {} bytes written", self.bytes_written)?;
        }
        write!(f, " in {}ms", self.execution_time_ms)
    }
}
