//! Decoder configuration types
//!
//! This module defines the buffer geometry needed by the decoder library.
//! The record header is a fixed 12-byte contract; the bank size and the sizes
//! of the footer fields are configurable so that dumps from other storage
//! layouts can be decoded.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Size of the fixed record header in bytes
pub const RECORD_HEADER_SIZE: usize = 12;

/// Header length value marking "no further records in this bank"
pub const SENTINEL_LENGTH: u16 = 0xFFFF;

/// Conventional bank size of the device log storage
pub const DEFAULT_BANK_SIZE: usize = 4096;

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Size of one storage bank in bytes
    #[serde(default = "default_bank_size")]
    pub bank_size: usize,

    /// Size of the wrap counter in the bank footer
    #[serde(default = "default_counter_size")]
    pub counter_size: usize,

    /// Size of the status field in the bank footer
    #[serde(default = "default_status_size")]
    pub status_size: usize,
}

fn default_bank_size() -> usize {
    DEFAULT_BANK_SIZE
}

fn default_counter_size() -> usize {
    2
}

fn default_status_size() -> usize {
    2
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            bank_size: default_bank_size(),
            counter_size: default_counter_size(),
            status_size: default_status_size(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the bank size
    pub fn with_bank_size(mut self, bank_size: usize) -> Self {
        self.bank_size = bank_size;
        self
    }

    /// Bytes at the end of every bank holding counter and status
    pub fn footer_size(&self) -> usize {
        self.counter_size + self.status_size
    }

    /// Bytes at the end of a bank in which no record header can start
    pub fn reserved_tail(&self) -> usize {
        RECORD_HEADER_SIZE + self.footer_size()
    }

    /// Offset (relative to the bank start) where the footer begins
    pub fn footer_offset(&self) -> usize {
        self.bank_size - self.footer_size()
    }

    /// Check that the geometry can hold at least one record
    pub fn validate(&self) -> Result<()> {
        if self.counter_size != 2 {
            return Err(DecoderError::InvalidConfig(format!(
                "counter size must be 2 bytes, got {}",
                self.counter_size
            )));
        }
        if self.status_size > 8 {
            return Err(DecoderError::InvalidConfig(format!(
                "status size must be at most 8 bytes, got {}",
                self.status_size
            )));
        }
        if self.bank_size <= self.reserved_tail() {
            return Err(DecoderError::InvalidConfig(format!(
                "bank size {} leaves no room for records (reserved tail is {} bytes)",
                self.bank_size,
                self.reserved_tail()
            )));
        }
        Ok(())
    }
}
