//! Device Log Parser CLI Application
//!
//! This is the command-line interface for the binary device log decoder.
//! It uses the device-log-decoder library and adds:
//! - Manifest and error code directory loading
//! - Optional TOML configuration
//! - Parallel decoding of several dump files
//! - Text or JSON output

use anyhow::{bail, Context, Result};
use clap::Parser;
use device_log_decoder::{DecodedLine, Decoder, ManifestCatalog};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod error_codes;
mod output;

use config::{AppConfig, OutputFormat};
use error_codes::{parse_error_code, ErrorCodeMap};

/// Device Log Parser - Decode binary device log dumps into readable text
#[derive(Parser, Debug)]
#[command(name = "parse-devicelog")]
#[command(about = "Parse binary device log into human-readable format", long_about = None)]
#[command(version)]
struct Args {
    /// Manifest directory of the OS release, e.g. manifests/22.07
    #[arg(short = 'd', long, value_name = "DIR")]
    manifests: Option<PathBuf>,

    /// Binary device log file(s) to decode (can be repeated)
    #[arg(short = 'f', long = "binaryfilename", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory with common error code definitions (*.yml)
    #[arg(short, long, value_name = "DIR")]
    errors: Option<PathBuf>,

    /// Output file for decoded lines (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the storage bank size in bytes
    #[arg(long, value_name = "BYTES")]
    bank_size: Option<usize>,

    /// Print the bank footers of each file instead of decoding
    #[arg(long)]
    banks: bool,

    /// Translate a common error code ("category:id", decimal or 0x hex) and exit
    #[arg(long, value_name = "CODE")]
    explain_error: Option<String>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Device Log Parser CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", device_log_decoder::VERSION);

    let config = resolve_config(&args)?;

    let error_map = match &config.input.error_code_dir {
        Some(dir) => ErrorCodeMap::load_dir(dir)?,
        None => ErrorCodeMap::new(),
    };

    if let Some(code) = &args.explain_error {
        let code = parse_error_code(code)?;
        let resolved = error_map.lookup(code);
        println!("0x{:08x}: {} ({})", code, resolved, resolved.message);
        return Ok(());
    }

    if config.input.files.is_empty() {
        println!("Device Log Parser - No input specified");
        println!("\nQuick Start:");
        println!("  parse-devicelog -d manifests/22.07 -f AzureSphere_DeviceLog_113.bin");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let mut out: Box<dyn Write> = match &config.output.file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if args.banks {
        let decoder = Decoder::with_config(ManifestCatalog::new(), config.layout.clone())?;
        for path in &config.input.files {
            let buffer = read_dump(path)?;
            let start = decoder.locate_start(&buffer).ok();
            output::write_banks(&mut out, path, &decoder.bank_counters(&buffer), start)?;
        }
        out.flush()?;
        return Ok(());
    }

    let manifest_dir = config
        .input
        .manifest_dir
        .as_deref()
        .context("No manifest directory given (use -d/--manifests or [input] manifest_dir)")?;
    let mut decoder = Decoder::with_config(ManifestCatalog::new(), config.layout.clone())?;
    decoder
        .add_manifest_dir(manifest_dir)
        .with_context(|| format!("Failed to load manifests from {:?}", manifest_dir))?;
    if decoder.catalog().is_empty() {
        log::warn!("No manifest files found in {:?}", manifest_dir);
    }

    let stats = decoder.catalog_stats();
    log::info!(
        "Manifests: {} categories, {} messages",
        stats.num_categories,
        stats.num_messages
    );

    let results: Vec<(&PathBuf, Result<Vec<DecodedLine>>)> = config
        .input
        .files
        .par_iter()
        .map(|path| (path, decode_file(&decoder, &error_map, path)))
        .collect();

    let banner = results.len() > 1;
    let mut failures = 0;
    for (path, result) in &results {
        match result {
            Ok(lines) => {
                output::write_lines(&mut out, path, lines, config.output.format, banner)?;
            }
            Err(e) => {
                log::error!("Failed to decode {:?}: {:#}", path, e);
                failures += 1;
            }
        }
    }
    out.flush()?;

    if failures > 0 {
        bail!(
            "{} of {} log files could not be decoded",
            failures,
            results.len()
        );
    }

    Ok(())
}

/// Merge the optional config file with command line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(dir) = &args.manifests {
        config.input.manifest_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.errors {
        config.input.error_code_dir = Some(dir.clone());
    }
    if !args.files.is_empty() {
        config.input.files = args.files.clone();
    }
    if let Some(path) = &args.output {
        config.output.file = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(bank_size) = args.bank_size {
        config.layout.bank_size = bank_size;
    }

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn read_dump(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Device log file could not be read: {:?}", path))
}

fn decode_file(decoder: &Decoder, error_map: &ErrorCodeMap, path: &Path) -> Result<Vec<DecodedLine>> {
    let buffer = read_dump(path)?;
    log::debug!("Read {} bytes from {:?}", buffer.len(), path);
    let lines = decoder.decode(&buffer, error_map)?;
    Ok(lines)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
