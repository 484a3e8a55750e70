//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct holds the manifest catalog and buffer geometry and is
//! the entry point for decoding raw log dumps.

use crate::bank::{self, BankFooter, RecordIter};
use crate::config::DecoderConfig;
use crate::manifest::{CatalogStats, ManifestCatalog};
use crate::render::MessageRenderer;
use crate::translator::ErrorTranslator;
use crate::types::{DecodedLine, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// Holds only read-only state, so one decoder can be shared across threads
/// to decode several buffers against the same manifests.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    /// Manifest catalog (category id -> messages)
    catalog: ManifestCatalog,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the default buffer geometry
    pub fn new(catalog: ManifestCatalog) -> Self {
        Self {
            catalog,
            config: DecoderConfig::default(),
        }
    }

    /// Create a decoder with a custom buffer geometry
    pub fn with_config(catalog: ManifestCatalog, config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// Load a directory of manifest files and add its categories
    ///
    /// # Example
    /// ```no_run
    /// use device_log_decoder::{Decoder, ManifestCatalog};
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new(ManifestCatalog::new());
    /// decoder.add_manifest_dir(Path::new("manifests/22.07")).unwrap();
    /// ```
    pub fn add_manifest_dir(&mut self, path: &Path) -> Result<()> {
        let loaded = crate::manifest::load_manifest_dir(path)?;
        for id in loaded.category_ids() {
            if let Some(category) = loaded.category(id) {
                self.catalog.add_category(category.clone())?;
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> &ManifestCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Get statistics about the loaded manifests
    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// Offset of the bank holding the oldest records
    pub fn locate_start(&self, buffer: &[u8]) -> Result<usize> {
        bank::locate_start(buffer, &self.config)
    }

    /// Footer of every whole bank, in buffer order
    pub fn bank_counters(&self, buffer: &[u8]) -> Vec<BankFooter> {
        bank::bank_footers(buffer, &self.config).collect()
    }

    /// Lazily decode a buffer into lines in chronological order
    ///
    /// Fails up front with `NoLogFound`; later failures are yielded as the
    /// final item of the iterator.
    pub fn lines<'a>(
        &'a self,
        buffer: &'a [u8],
        translator: &'a dyn ErrorTranslator,
    ) -> Result<DecodingIterator<'a>> {
        let remainder = buffer.len() % self.config.bank_size;
        if remainder != 0 {
            log::warn!(
                "Ignoring {} trailing bytes (buffer is not a whole number of {}-byte banks)",
                remainder,
                self.config.bank_size
            );
        }

        let start = self.locate_start(buffer)?;
        log::debug!(
            "Reading [{}, {}) then wrapping to [0, {})",
            start,
            bank::usable_len(buffer, &self.config),
            start
        );
        Ok(DecodingIterator {
            records: bank::chronological_records(buffer, &self.config, start),
            catalog: &self.catalog,
            translator,
            failed: false,
        })
    }

    /// Decode a buffer into lines in chronological order
    ///
    /// Any malformed record aborts the whole decode; no partial output is
    /// returned.
    ///
    /// # Example
    /// ```no_run
    /// use device_log_decoder::{Decoder, HexErrorTranslator, ManifestCatalog};
    ///
    /// let decoder = Decoder::new(ManifestCatalog::new());
    /// let dump = std::fs::read("AzureSphere_DeviceLog.bin").unwrap();
    /// for line in decoder.decode(&dump, &HexErrorTranslator).unwrap() {
    ///     println!("{}", line);
    /// }
    /// ```
    pub fn decode(
        &self,
        buffer: &[u8],
        translator: &dyn ErrorTranslator,
    ) -> Result<Vec<DecodedLine>> {
        log::info!("Decoding {} bytes of device log", buffer.len());

        let lines = self
            .lines(buffer, translator)?
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                log::warn!("Decode aborted: {}", e);
                e
            })?;

        log::info!("Decoded {} log records", lines.len());
        Ok(lines)
    }
}

/// Decode a buffer with the default geometry
pub fn decode(
    buffer: &[u8],
    catalog: &ManifestCatalog,
    translator: &dyn ErrorTranslator,
) -> Result<Vec<DecodedLine>> {
    let config = DecoderConfig::default();
    let start = bank::locate_start(buffer, &config)?;
    bank::chronological_records(buffer, &config, start)
        .map(|record| MessageRenderer::render(&record?, catalog, translator))
        .collect()
}

/// Iterator that renders records into decoded lines
///
/// Yields at most one error, after which it is exhausted.
pub struct DecodingIterator<'a> {
    records: std::iter::Chain<RecordIter<'a>, RecordIter<'a>>,
    catalog: &'a ManifestCatalog,
    translator: &'a dyn ErrorTranslator,
    failed: bool,
}

impl<'a> Iterator for DecodingIterator<'a> {
    type Item = Result<DecodedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self
            .records
            .next()?
            .and_then(|record| MessageRenderer::render(&record, self.catalog, self.translator));

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::HexErrorTranslator;
    use crate::types::DecoderError;

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new(ManifestCatalog::new());
        let stats = decoder.catalog_stats();
        assert_eq!(stats.num_categories, 0);
        assert_eq!(decoder.config().bank_size, 4096);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DecoderConfig::new().with_bank_size(8);
        assert!(Decoder::with_config(ManifestCatalog::new(), config).is_err());

        let config = DecoderConfig::new().with_bank_size(0);
        assert!(matches!(
            Decoder::with_config(ManifestCatalog::new(), config),
            Err(DecoderError::InvalidConfig(_))
        ));

        let config = DecoderConfig {
            counter_size: 4,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            Decoder::with_config(ManifestCatalog::new(), config),
            Err(DecoderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_add_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("boot.json"),
            r#"{ "categoryId": 1, "categoryName": "Boot",
                 "msgIds": [ { "msgId": 2, "msgString": "Booted" } ] }"#,
        )
        .unwrap();

        let mut decoder = Decoder::new(ManifestCatalog::new());
        decoder.add_manifest_dir(dir.path()).unwrap();
        assert_eq!(decoder.catalog().category_name(1), Some("Boot"));
        assert_eq!(decoder.catalog_stats().num_messages, 1);

        // Loading the same categories twice is rejected
        assert!(matches!(
            decoder.add_manifest_dir(dir.path()),
            Err(DecoderError::DuplicateCategory(1))
        ));
    }

    #[test]
    fn test_empty_buffer() {
        let decoder = Decoder::new(ManifestCatalog::new());
        let result = decoder.decode(&[], &HexErrorTranslator);
        assert!(matches!(result, Err(DecoderError::NoLogFound)));
    }

    #[test]
    fn test_empty_banks_decode_to_nothing() {
        let config = DecoderConfig::new().with_bank_size(32);
        let decoder = Decoder::with_config(ManifestCatalog::new(), config).unwrap();

        let mut buffer = vec![0xFF; 64];
        buffer[28..30].copy_from_slice(&1u16.to_le_bytes());
        buffer[60..62].copy_from_slice(&0u16.to_le_bytes());

        assert_eq!(decoder.locate_start(&buffer).unwrap(), 32);
        assert!(decoder.decode(&buffer, &HexErrorTranslator).unwrap().is_empty());

        let counters: Vec<u16> = decoder
            .bank_counters(&buffer)
            .iter()
            .map(|f| f.counter)
            .collect();
        assert_eq!(counters, vec![1, 0]);
    }
}
