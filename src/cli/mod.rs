//! Command-line interface for mongotools
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Merging command-line overrides into the configuration
//! - Dispatch of informational subcommands and tasks

pub mod completion;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::bsonutil::ExtJsonMode;
use crate::config::{Config, LogLevel};
use crate::error::Result;
use crate::executor::{DecodeOptions, DumpType, Executor, Task};
use crate::formatter::Formatter;

/// Legacy MongoDB wire protocol and BSON tooling
#[derive(Parser, Debug)]
#[command(
    name = "mongotools",
    version,
    about = "Decode legacy MongoDB wire captures and convert BSON to and from Extended JSON",
    long_about = "Decode captures of the legacy MongoDB wire protocol, copy them message by
message, dump .bson files as Extended JSON and build .bson files from Extended JSON."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Extended JSON flavor (legacy, canonical)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// Indent documents over several lines
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongotools
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a wire capture, one line per message
    Decode {
        /// Capture file, stdin when omitted or `-`
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print headers and body sizes without decoding
        #[arg(long)]
        raw: bool,

        /// Skip messages whose bodies fail to decode
        #[arg(long)]
        continue_on_error: bool,

        /// Shorten each document to N characters
        #[arg(long, value_name = "N")]
        abbreviate: Option<usize>,
    },

    /// Copy a wire capture message by message
    Copy {
        /// Source capture
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Destination file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Print the documents of a .bson file
    Bsondump {
        /// BSON file, stdin when omitted or `-`
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output style
        #[arg(long = "type", value_enum, default_value_t = DumpType::Json)]
        dump_type: DumpType,

        /// Write to FILE instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Validate every document before printing it
        #[arg(long)]
        objcheck: bool,
    },

    /// Build a .bson file from Extended JSON lines
    Tobson {
        /// Extended JSON file, stdin when omitted or `-`
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Destination .bson file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_display_args(config, args);
        Self::apply_logging_args(config, args);
        Self::apply_decode_args(config, args);
    }

    /// Apply display-related CLI arguments to configuration
    fn apply_display_args(config: &mut Config, args: &CliArgs) {
        if let Some(format_str) = &args.format {
            config.display.format = Self::parse_output_format(format_str);
        }

        if args.pretty {
            config.display.pretty = true;
        }

        if args.no_color {
            config.display.color_output = false;
        }

        if let Commands::Decode {
            abbreviate: Some(width),
            ..
        } = &args.command
        {
            config.display.abbreviate = Some(*width);
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Apply decode-related CLI arguments to configuration
    fn apply_decode_args(config: &mut Config, args: &CliArgs) {
        if let Commands::Decode {
            continue_on_error: true,
            ..
        } = &args.command
        {
            config.decode.continue_on_error = true;
        }
    }

    /// Parse output format string
    fn parse_output_format(format_str: &str) -> ExtJsonMode {
        match format_str.to_lowercase().as_str() {
            "legacy" | "shell" => ExtJsonMode::Legacy,
            "canonical" | "json" => ExtJsonMode::Canonical,
            _ => {
                eprintln!("Warning: Unknown format '{}', using default", format_str);
                ExtJsonMode::default()
            }
        }
    }

    /// The task selected on the command line, `None` for informational subcommands
    pub fn task(&self) -> Option<Task> {
        match &self.args.command {
            Commands::Decode { file, raw, .. } => Some(Task::Decode {
                input: file.clone(),
                options: DecodeOptions {
                    raw: *raw,
                    continue_on_error: self.config.decode.continue_on_error,
                },
            }),
            Commands::Copy { input, output } => Some(Task::Copy {
                input: input.clone(),
                output: output.clone(),
            }),
            Commands::Bsondump {
                file,
                dump_type,
                out,
                objcheck,
            } => Some(Task::BsonDump {
                input: file.clone(),
                output: out.clone(),
                dump_type: *dump_type,
                objcheck: *objcheck,
            }),
            Commands::Tobson { file, out } => Some(Task::ToBson {
                input: file.clone(),
                output: out.clone(),
            }),
            Commands::Version | Commands::Completion { .. } | Commands::Config { .. } => None,
        }
    }

    /// Run the selected subcommand
    ///
    /// # Returns
    /// * `Result<()>` - Success or the error that stopped the subcommand
    pub fn run(&self) -> Result<()> {
        if self.handle_subcommand()? {
            return Ok(());
        }

        if let Some(task) = self.task() {
            let executor = Executor::new(&self.config);
            let stats = executor.execute(&task)?;
            info!("{}: {}", task.name(), stats);
        }
        Ok(())
    }

    /// Handle informational subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to continue
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Commands::Version => {
                self.show_version();
                Ok(true)
            }
            Commands::Completion { shell } => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            Commands::Config { show, validate } => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("mongotools version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let formatter = Formatter::from_config(&self.config.display);
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("{}", formatter.format_warning("❌ Configuration file does not exist"));
            return;
        }

        let outcome = Config::load_from_file(Some(&path)).and_then(|config| config.validate());
        match outcome {
            Ok(()) => println!("{}", formatter.format_success("✅ Configuration is valid")),
            Err(e) => println!(
                "{}",
                formatter.format_warning(&format!("❌ Configuration is invalid: {}", e))
            ),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();
        println!("{}", self.config.to_toml_string()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }
}
