//! Subcommand execution for mongotools
//!
//! - `decode`: wire capture to one line per message
//! - `copy`: message-by-message passthrough
//! - `bsondump`: `.bson` file to Extended JSON or the debug view
//! - `tobson`: Extended JSON lines to a `.bson` file
//!
//! The [`Executor`] opens the streams a [`Task`] names and dispatches to
//! the stream functions, which take any reader and writer.

pub mod bsondump;
pub mod copy;
pub mod decode;
pub mod result;
pub mod tobson;

use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::utils::fs::{create_output, open_input};

pub use bsondump::{DumpType, dump_stream};
pub use copy::copy_stream;
pub use decode::{DecodeOptions, decode_stream};
pub use result::ExecutionStats;
pub use tobson::to_bson_stream;

/// One unit of work selected on the command line.
///
/// `None` paths (and `-`) mean stdin or stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Decode {
        input: Option<PathBuf>,
        options: DecodeOptions,
    },
    Copy {
        input: PathBuf,
        output: PathBuf,
    },
    BsonDump {
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        dump_type: DumpType,
        objcheck: bool,
    },
    ToBson {
        input: Option<PathBuf>,
        output: PathBuf,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Decode { .. } => "decode",
            Task::Copy { .. } => "copy",
            Task::BsonDump { .. } => "bsondump",
            Task::ToBson { .. } => "tobson",
        }
    }
}

/// Runs tasks with the effective configuration
pub struct Executor {
    formatter: Formatter,
}

impl Executor {
    /// Create an executor
    ///
    /// # Arguments
    /// * `config` - Effective configuration after command-line overrides
    pub fn new(config: &Config) -> Self {
        Self {
            formatter: Formatter::from_config(&config.display),
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Run `task` to completion
    ///
    /// # Arguments
    /// * `task` - Task to run
    ///
    /// # Returns
    /// * `Result<ExecutionStats>` - Counts and timing, or the error that stopped the task
    pub fn execute(&self, task: &Task) -> Result<ExecutionStats> {
        debug!("Executing task: {:?}", task);
        let start = Instant::now();

        let mut stats = match task {
            Task::Decode { input, options } => {
                let reader = open_input(input.as_ref())?;
                let mut out = create_output(None)?;
                decode_stream(reader, &mut out, &self.formatter, *options)?
            }
            Task::Copy { input, output } => {
                let mut reader = open_input(Some(input))?;
                let mut writer = create_output(Some(output))?;
                copy_stream(&mut reader, &mut writer)?
            }
            Task::BsonDump {
                input,
                output,
                dump_type,
                objcheck,
            } => {
                let reader = open_input(input.as_ref())?;
                let mut out = create_output(output.as_ref())?;
                dump_stream(reader, &mut out, &self.formatter, *dump_type, *objcheck)?
            }
            Task::ToBson { input, output } => {
                let reader = BufReader::new(open_input(input.as_ref())?);
                let mut out = create_output(Some(output))?;
                to_bson_stream(reader, &mut out)?
            }
        };

        stats.execution_time_ms = start.elapsed().as_millis() as u64;
        debug!("{} finished: {}", task.name(), stats);
        Ok(stats)
    }
}
