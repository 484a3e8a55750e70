//! Manifest catalog and manifest file loader
//!
//! A manifest describes one log category: its name and the message templates
//! (format string plus typed parameters) keyed by message id. The catalog is
//! built once and only queried during decoding.

pub mod catalog;
pub mod loader;

// Re-export key types for convenience
pub use catalog::{
    CatalogStats, CategoryDescriptor, ManifestCatalog, MessageTemplate, ParameterDescriptor,
    ParameterType,
};
pub use loader::{load_manifest_dir, load_manifest_file, parse_manifest};
