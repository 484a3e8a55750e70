//! Manifest file loader
//!
//! Reads JSON manifest files (one category per file) and builds a
//! [`ManifestCatalog`]. A directory of manifests corresponds to one OS
//! release.

use crate::manifest::catalog::{CategoryDescriptor, ManifestCatalog, MessageTemplate};
use crate::types::{DecoderError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk manifest layout
#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(rename = "categoryId")]
    category_id: u16,
    #[serde(rename = "categoryName")]
    category_name: String,
    #[serde(rename = "msgIds", default)]
    messages: Vec<MessageTemplate>,
}

impl From<ManifestFile> for CategoryDescriptor {
    fn from(file: ManifestFile) -> Self {
        let mut category = CategoryDescriptor::new(file.category_id, file.category_name);
        for message in file.messages {
            category.add_message(message);
        }
        category
    }
}

/// Parse manifest JSON text into a category descriptor
pub fn parse_manifest(content: &str) -> Result<CategoryDescriptor> {
    let file: ManifestFile = serde_json::from_str(content)
        .map_err(|e| DecoderError::ManifestError(e.to_string()))?;
    Ok(file.into())
}

/// Load a single manifest file
pub fn load_manifest_file(path: &Path) -> Result<CategoryDescriptor> {
    log::debug!("Loading manifest file: {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| {
        DecoderError::ManifestError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    parse_manifest(&content).map_err(|e| match e {
        DecoderError::ManifestError(msg) => {
            DecoderError::ManifestError(format!("Failed to parse {:?}: {}", path, msg))
        }
        other => other,
    })
}

/// Load every `*.json` manifest below a directory (recursively)
pub fn load_manifest_dir(path: &Path) -> Result<ManifestCatalog> {
    log::info!("Loading manifests from: {:?}", path);

    if !path.is_dir() {
        return Err(DecoderError::ManifestError(format!(
            "Manifest directory not found: {:?}",
            path
        )));
    }

    let mut files = Vec::new();
    collect_json_files(path, &mut files)?;
    files.sort();

    let mut catalog = ManifestCatalog::new();
    for file in &files {
        let category = load_manifest_file(file)?;
        log::trace!(
            "Category {} '{}' with {} messages",
            category.id,
            category.name,
            category.num_messages()
        );
        catalog.add_category(category)?;
    }

    let stats = catalog.stats();
    log::info!(
        "Loaded {} categories ({} messages) from {} manifest files",
        stats.num_categories,
        stats.num_messages,
        files.len()
    );

    Ok(catalog)
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}
