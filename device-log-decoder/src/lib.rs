//! Device Log Decoder Library
//!
//! A stateless, reusable library for decoding binary device log dumps taken
//! from a circular log buffer, using per-category message manifests.
//!
//! # Architecture
//!
//! The library reconstructs the chronological sequence of log records:
//! - Locates the oldest bank of the circular buffer from the footer counters
//! - Walks each bank, extracting length-prefixed records
//! - Decodes typed parameters (integers, IP addresses, UUIDs, error codes, strings)
//! - Renders each record through its manifest template
//!
//! The library does NOT:
//! - Read dump files or parse command lines
//! - Translate common error codes (callers supply an [`ErrorTranslator`])
//! - Capture live logs or write to the buffer
//!
//! All higher-level functionality is in the application layer (device-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use device_log_decoder::{load_manifest_dir, Decoder, HexErrorTranslator};
//! use std::path::Path;
//!
//! // Load the manifests of one OS release
//! let catalog = load_manifest_dir(Path::new("manifests/22.07")).unwrap();
//! let decoder = Decoder::new(catalog);
//!
//! // Decode a raw dump
//! let dump = std::fs::read("AzureSphere_DeviceLog_113.bin").unwrap();
//! match decoder.decode(&dump, &HexErrorTranslator) {
//!     Ok(lines) => {
//!         for line in lines {
//!             println!("{}", line);
//!         }
//!     }
//!     Err(e) => eprintln!("Decode error: {}", e),
//! }
//! ```

// Public modules
pub mod bank;
pub mod config;
pub mod decoder;
pub mod manifest;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, DEFAULT_BANK_SIZE, RECORD_HEADER_SIZE, SENTINEL_LENGTH};
pub use decoder::{decode, Decoder, DecodingIterator};
pub use manifest::{
    load_manifest_dir, load_manifest_file, parse_manifest, CatalogStats, CategoryDescriptor,
    ManifestCatalog, MessageTemplate, ParameterDescriptor, ParameterType,
};
pub use params::{ParameterDecoder, ParameterOverrun};
pub use render::MessageRenderer;
pub use translator::{ErrorTranslator, HexErrorTranslator};
pub use types::{DecodedLine, DecoderError, Priority, RawRecord, RecordHeader, Result};

// Internal modules (re-exported above)
mod params;
mod render;
mod translator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
