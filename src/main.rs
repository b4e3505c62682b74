//! mrz-scanner - MRZ diagnostics from the command line
//!
//! Decodes and verifies MRZ text captured by any OCR tool, and shows the
//! effective scanner configuration. No OCR engine is bundled.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mrz_scanner::{config, MrzParser, PassportInformation, ValidationReport};

/// mrz-scanner - passport MRZ decoding and verification
#[derive(Parser, Debug)]
#[command(name = "mrz-scanner")]
#[command(about = "Decode and verify passport machine readable zones")]
struct Args {
    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode two-line MRZ text from a file, or stdin, and print it as JSON
    Decode {
        /// File holding the OCR text
        file: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    passport: &'a PassportInformation,
    validation: ValidationReport,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Decode { file } => run_decode(file.as_deref()),
        Command::Config => run_config(args.config.as_deref()),
    }
}

/// Decode MRZ text and report the validation verdict
fn run_decode(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read MRZ text from {:?}", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read MRZ text from stdin")?;
            buffer
        }
    };
    debug!("Decoding {} bytes of MRZ text", text.len());

    let parser = MrzParser::parse(&text)?;
    let validation = parser.validate();
    let output = DecodeOutput {
        passport: parser.passport(),
        validation,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(check) = validation.failed {
        anyhow::bail!("MRZ failed validation: {}", check);
    }
    info!("MRZ is valid");
    Ok(())
}

/// Print the configuration that a scanner would use
fn run_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_or_default(path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
