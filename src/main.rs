//! mongotools - legacy MongoDB wire protocol and BSON tooling
//!
//! # Usage
//!
//! ```bash
//! # Decode a capture of legacy wire traffic
//! mongotools decode capture.bin --abbreviate 200
//!
//! # Dump a .bson file as canonical Extended JSON
//! mongotools bsondump users.bson --format canonical
//!
//! # And back
//! mongotools tobson users.json --out users.bson
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use mongotools::cli::CliInterface;
use mongotools::error::Result;

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);
    cli.run()
}

/// Initialize logging on stderr
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Arguments
/// * `cli` - CLI interface with the effective logging settings
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
