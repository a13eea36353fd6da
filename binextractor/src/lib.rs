// SPDX-License-Identifier: MIT

//! Extract data from binary files based on structure information provided.
//!
//! The tool dumps binary files in the canonical hex dump layout and
//! resolves the interpretation metadata of structure fields (byte size,
//! type keyword and byte order) from a structure description file:
//!
//! ```text
//! $ binextractor hexdump --infile firmware.bin
//! 00000000: 7F 45 4C 46 02 01 01 00  00 00 00 00 00 00 00 00  .ELF............
//! *
//! ```
use anyhow::{Context, Result};
use binextractor_core::{
    hex_dump::DEFAULT_GROUP_WIDTH, ConfigRegistry, DumpEngine, DumpError, DumpInput, WriteSink,
};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

/// Default filename of the structure description
pub const DEFAULT_CONFIG_FILE: &str = "default.conf";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "binextractor")]
#[command(version, about, long_about=None, arg_required_else_help=true)]
pub struct CliArguments {
    /// Turn on more detailed information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Turn on debugging information (-v is ignored if set)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Binary data config file
    #[arg(long = "conf", value_name = "BININFO", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub conf: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Application commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Hexdump binary file
    Hexdump {
        /// Input file to process
        #[arg(short, long, value_name = "INFILE")]
        infile: PathBuf,
        /// Number of hex digits per group (2 - byte, 4 - half word, 8 - word)
        #[arg(short, long, value_name = "SIZE", default_value_t = DEFAULT_GROUP_WIDTH)]
        size: usize,
        /// Number of bytes to dump, decimal or hex with 0x prefix (whole file if absent)
        #[arg(short, long, value_name = "LENGTH", value_parser = parse_length)]
        length: Option<u64>,
    },
    /// Print out the loaded structure description as JSON
    Config,
    /// Print out size, type keyword and byte order of a structure field
    Field {
        /// Name of the field
        name: String,
    },
}

/// Parse byte counts given as decimal or hex digits.
fn parse_length(s: &str) -> std::result::Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|err| format!("expected hex digits: {err}"))
    } else {
        s.parse::<u64>()
            .map_err(|err| format!("expected decimal digits: {err}"))
    }
}

/// Determines the logging threshold.
///
/// The logging level of the structure description is used unless
/// `--debug` or `--verbose` ask for more output.
pub fn log_filter(cli_args: &CliArguments, registry: &ConfigRegistry) -> Result<LevelFilter> {
    let configured = registry
        .log_level()
        .context("Reading the logging level failed.")?
        .level_filter();

    Ok(if cli_args.debug {
        LevelFilter::Debug
    } else if cli_args.verbose {
        configured.max(LevelFilter::Info)
    } else {
        configured
    })
}

/// Builds the dump engine for the hexdump options.
fn dump_engine(size: usize, length: Option<u64>) -> Result<DumpEngine> {
    let engine = DumpEngine::new(size).context("Invalid hex group size.")?;

    Ok(match length {
        Some(length) => engine.with_limit(length),
        None => engine,
    })
}

/// Dumps the given file to the writer.
fn hexdump<W: Write>(infile: &Path, size: usize, length: Option<u64>, out: W) -> Result<()> {
    if !infile.exists() {
        return Err(DumpError::SourceNotFound(infile.to_path_buf()).into());
    }

    let engine = dump_engine(size, length)?;

    let file = File::open(infile)
        .with_context(|| format!("Opening {} failed.", infile.display()))?;

    let mut sink = WriteSink(out);
    let count = engine
        .emit(DumpInput::stream(BufReader::new(file)), &mut sink)
        .with_context(|| format!("Dumping {} failed.", infile.display()))?;
    sink.0.flush().context("Flushing the dump failed.")?;

    log::info!("Dumped {count} lines of {}.", infile.display());

    Ok(())
}

/// Prints the structure description as pretty JSON.
fn config<W: Write>(registry: &ConfigRegistry, mut out: W) -> Result<()> {
    let json =
        serde_json::to_string_pretty(registry).context("Serializing the config failed.")?;
    writeln!(out, "{json}").context("Printing the config failed.")
}

/// Prints the resolved description of a single field.
fn field<W: Write>(registry: &ConfigRegistry, name: &str, mut out: W) -> Result<()> {
    let field = registry
        .field(name)
        .with_context(|| format!("Resolving field {name} failed."))?;

    log::debug!("Resolved field {field:?}.");

    writeln!(out, "{field}").context("Printing the field failed.")
}

/// Runs the selected command with an already loaded structure description.
pub fn run<W: Write>(cli_args: &CliArguments, registry: &ConfigRegistry, out: W) -> Result<()> {
    match &cli_args.command {
        Commands::Hexdump {
            infile,
            size,
            length,
        } => hexdump(infile, *size, *length, out),
        Commands::Config => config(registry, out),
        Commands::Field { name } => field(registry, name, out),
    }
}

/// Main application function
///
/// Loads the structure description, applies its logging threshold and
/// runs the selected command, writing to stdout. This function is
/// separated from the binary in order to allow testing the final
/// application.
pub fn app(cli_args: CliArguments) -> Result<()> {
    let registry = ConfigRegistry::load(&cli_args.conf)?;
    log::set_max_level(log_filter(&cli_args, &registry)?);

    let stdout = io::stdout();

    run(&cli_args, &registry, stdout.lock())
}
