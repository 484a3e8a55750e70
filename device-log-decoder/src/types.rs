//! Core types for the device log decoder library
//!
//! This module defines the record header read from the raw dump, the priority
//! enumeration, the rendered output line and the error taxonomy. All values
//! produced here are transient: they live for a single decode pass.

use serde::Serialize;
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Unable to find first log message")]
    NoLogFound,

    #[error("Truncated record at offset {offset}: needs {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid record length {length} at offset {offset}")]
    InvalidRecordLength { offset: usize, length: u16 },

    #[error(
        "Invalid parameter '{parameter}' for message id: {message_id}, category id: {category_id} (record at offset {offset})"
    )]
    ParameterOverrun {
        offset: usize,
        category_id: u16,
        message_id: u16,
        parameter: String,
    },

    #[error("Unknown priority {priority} in record at offset {offset}")]
    UnknownPriority { offset: usize, priority: u8 },

    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load manifest: {0}")]
    ManifestError(String),

    #[error("Duplicate manifest for category id {0}")]
    DuplicateCategory(u16),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Message priority as stored in the record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    None,
    Fatal,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl Priority {
    /// Map the raw header byte (0-6) to a priority
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Priority::None),
            1 => Some(Priority::Fatal),
            2 => Some(Priority::Error),
            3 => Some(Priority::Warning),
            4 => Some(Priority::Info),
            5 => Some(Priority::Debug),
            6 => Some(Priority::Trace),
            _ => None,
        }
    }

    /// Display name used in rendered lines
    pub fn name(&self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Fatal => "Fatal",
            Priority::Error => "Error",
            Priority::Warning => "Warning",
            Priority::Info => "Info",
            Priority::Debug => "Debug",
            Priority::Trace => "Trace",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed 12-byte record header
///
/// Layout (little-endian):
/// ```text
/// ┌────────────┬──────────┬──────────┬─────────────┬────────────┬───────────────┐
/// │ length u16 │ rsvd u8  │ prio u8  │ category u16│ message u16│ timestamp u32 │
/// └────────────┴──────────┴──────────┴─────────────┴────────────┴───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Total record length including this header
    pub length: u16,
    pub reserved: u8,
    /// Raw priority byte, validated when the record is rendered
    pub priority: u8,
    pub category_id: u16,
    pub message_id: u16,
    /// Milliseconds since boot
    pub timestamp_ms: u32,
}

impl RecordHeader {
    /// Length of the parameter payload that follows the header
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(crate::config::RECORD_HEADER_SIZE)
    }
}

/// A record span extracted from the raw buffer
///
/// Borrows the buffer; the payload slice is bounded by the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Absolute offset of the header in the buffer
    pub offset: usize,
    pub header: RecordHeader,
    /// Parameter bytes (`length - 12` of them)
    pub payload: &'a [u8],
}

/// A fully rendered log record - the primary output of the decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedLine {
    /// Offset of the record in the raw buffer
    pub offset: usize,
    pub timestamp_ms: u32,
    pub priority: Priority,
    pub category_id: u16,
    /// Category name from the manifest, or a placeholder for unknown ids
    pub category_name: String,
    pub message_id: u16,
    /// Template text, or a placeholder for unknown messages
    pub text: String,
    /// Parenthesised parameter suffix; empty when there are no parameters
    pub parameters: String,
}

impl fmt::Display for DecodedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = format!("{:.6}", self.timestamp_ms as f64 / 1000.0);
        write!(
            f,
            "[{:>12}] {} {}({}): {} {}",
            seconds,
            self.priority,
            self.category_name,
            self.message_id,
            self.text,
            self.parameters
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_mapping() {
        assert_eq!(Priority::from_raw(0), Some(Priority::None));
        assert_eq!(Priority::from_raw(4), Some(Priority::Info));
        assert_eq!(Priority::from_raw(6), Some(Priority::Trace));
        assert_eq!(Priority::from_raw(7), None);
        assert_eq!(Priority::Warning.to_string(), "Warning");
    }

    #[test]
    fn test_line_display() {
        let line = DecodedLine {
            offset: 0,
            timestamp_ms: 1234,
            priority: Priority::Info,
            category_id: 3,
            category_name: "Networking".to_string(),
            message_id: 7,
            text: "Link up".to_string(),
            parameters: "(ifIndex: 2)".to_string(),
        };
        assert_eq!(
            line.to_string(),
            "[    1.234000] Info Networking(7): Link up (ifIndex: 2)"
        );
    }

    #[test]
    fn test_line_display_without_parameters() {
        let line = DecodedLine {
            offset: 0,
            timestamp_ms: 0,
            priority: Priority::Error,
            category_id: 1,
            category_name: "Boot".to_string(),
            message_id: 1,
            text: "Started".to_string(),
            parameters: String::new(),
        };
        assert_eq!(line.to_string(), "[    0.000000] Error Boot(1): Started ");
    }

    #[test]
    fn test_payload_len() {
        let header = RecordHeader {
            length: 20,
            reserved: 0,
            priority: 4,
            category_id: 1,
            message_id: 1,
            timestamp_ms: 0,
        };
        assert_eq!(header.payload_len(), 8);
    }
}
