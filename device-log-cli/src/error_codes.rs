//! Common error code translation
//!
//! A full error code packs a category id in the upper bits and a
//! category-relative id in the lower 20 bits. Category definitions are read
//! from `*.yml` files, one category per file:
//!
//! ```yaml
//! name: Networking
//! category_id: 3
//! codes:
//!   - id: 1
//!     name: NotReady
//!     msg: The network is not ready
//! ```

use anyhow::{bail, Context, Result};
use device_log_decoder::ErrorTranslator;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const ERROR_CATEGORY_SHIFT: u32 = 20;
pub const ERROR_CODE_MASK: u32 = (1 << ERROR_CATEGORY_SHIFT) - 1;

/// Category part of a full error code
pub fn category_of(code: u32) -> u32 {
    code >> ERROR_CATEGORY_SHIFT
}

/// Category-relative id of a full error code
pub fn id_of(code: u32) -> u32 {
    code & ERROR_CODE_MASK
}

/// Build a full error code from category and id
pub fn full_code(category: u32, id: u32) -> u32 {
    (category << ERROR_CATEGORY_SHIFT) | (id & ERROR_CODE_MASK)
}

/// Parse `"category:id"` or a plain decimal / `0x` hex code
pub fn parse_error_code(text: &str) -> Result<u32> {
    let text = text.trim();
    if let Some((category, id)) = text.split_once(':') {
        return Ok(full_code(parse_number(category)?, parse_number(id)?));
    }
    parse_number(text)
}

fn parse_number(text: &str) -> Result<u32> {
    let text = text.trim();
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    value.with_context(|| format!("Invalid error code: {:?}", text))
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    name: String,
    category_id: u32,
    #[serde(default)]
    codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
struct CodeEntry {
    id: u32,
    name: String,
    msg: String,
}

/// A resolved error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: u32,
    /// `Category::Name`, `Category::id` or `UnknownError`
    pub name: String,
    pub message: String,
    pub untranslated: bool,
}

impl ErrorCode {
    fn success() -> Self {
        Self {
            code: 0,
            name: "CommonError::Success".to_string(),
            message: "Success".to_string(),
            untranslated: false,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.untranslated {
            write!(f, "0x{:x}", self.code)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Error code definitions by full code, plus category names
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeMap {
    codes: HashMap<u32, ErrorCode>,
    categories: HashMap<u32, String>,
}

impl ErrorCodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yml` category file in a directory
    pub fn load_dir(path: &Path) -> Result<Self> {
        log::info!("Loading error code definitions from: {:?}", path);

        if !path.is_dir() {
            bail!("Error code directory not found: {:?}", path);
        }

        let mut files: Vec<_> = fs::read_dir(path)
            .with_context(|| format!("Failed to list {:?}", path))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("yml"))
            .collect();
        files.sort();

        let mut map = Self::new();
        for file in &files {
            let content = fs::read_to_string(file)
                .with_context(|| format!("Failed to read error code file: {:?}", file))?;
            map.add_category_yaml(&content)
                .with_context(|| format!("Failed to parse error code file: {:?}", file))?;
        }

        log::info!(
            "Loaded {} error codes in {} categories",
            map.codes.len(),
            map.categories.len()
        );
        Ok(map)
    }

    /// Add the category described by one YAML document
    pub fn add_category_yaml(&mut self, content: &str) -> Result<()> {
        let file: CategoryFile = serde_yaml::from_str(content)?;
        for entry in &file.codes {
            let code = full_code(file.category_id, entry.id);
            self.codes.insert(
                code,
                ErrorCode {
                    code,
                    name: format!("{}::{}", file.name, entry.name),
                    message: entry.msg.clone(),
                    untranslated: false,
                },
            );
        }
        self.categories.insert(file.category_id, file.name);
        Ok(())
    }

    /// Resolve a full error code
    pub fn lookup(&self, code: u32) -> ErrorCode {
        if code == 0 {
            return ErrorCode::success();
        }
        if let Some(known) = self.codes.get(&code) {
            return known.clone();
        }
        if let Some(category) = self.categories.get(&category_of(code)) {
            let id = id_of(code);
            return ErrorCode {
                code,
                name: format!("{}::{}", category, id),
                message: format!("{} error code: {}", category, id),
                untranslated: false,
            };
        }
        ErrorCode {
            code,
            name: "UnknownError".to_string(),
            message: "<Error Translation failed>".to_string(),
            untranslated: true,
        }
    }
}

impl ErrorTranslator for ErrorCodeMap {
    fn translate(&self, code: u32) -> String {
        self.lookup(code).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORKING: &str = "\
name: Networking
category_id: 3
codes:
  - id: 1
    name: NotReady
    msg: The network is not ready
";

    #[test]
    fn test_code_packing() {
        let code = full_code(3, 1);
        assert_eq!(code, 0x0030_0001);
        assert_eq!(category_of(code), 3);
        assert_eq!(id_of(code), 1);
    }

    #[test]
    fn test_lookup_order() {
        let mut map = ErrorCodeMap::new();
        map.add_category_yaml(NETWORKING).unwrap();

        assert_eq!(map.translate(0), "CommonError::Success");
        assert_eq!(map.translate(full_code(3, 1)), "Networking::NotReady");
        assert_eq!(map.translate(full_code(3, 42)), "Networking::42");
        assert_eq!(map.translate(full_code(9, 1)), "0x900001");

        let unknown = map.lookup(full_code(9, 1));
        assert!(unknown.untranslated);
        assert_eq!(unknown.name, "UnknownError");
    }

    #[test]
    fn test_parse_error_code() {
        assert_eq!(parse_error_code("3:1").unwrap(), full_code(3, 1));
        assert_eq!(parse_error_code("0x300001").unwrap(), 0x300001);
        assert_eq!(parse_error_code("42").unwrap(), 42);
        assert!(parse_error_code("abc").is_err());
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("networking.yml"), NETWORKING).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::write(
            dir.path().join("storage.yml"),
            "name: Storage\ncategory_id: 4\n",
        )
        .unwrap();

        let map = ErrorCodeMap::load_dir(dir.path()).unwrap();
        assert_eq!(map.lookup(full_code(3, 1)).message, "The network is not ready");
        assert_eq!(map.translate(full_code(4, 9)), "Storage::9");
    }

    #[test]
    fn test_malformed_category_file() {
        let mut map = ErrorCodeMap::new();
        assert!(map.add_category_yaml("name: Broken\n").is_err());
    }

    #[test]
    fn test_load_missing_dir() {
        assert!(ErrorCodeMap::load_dir(Path::new("/nonexistent/errors")).is_err());
    }
}
