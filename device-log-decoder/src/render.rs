//! Message rendering
//!
//! Turns one raw record into a [`DecodedLine`] by resolving its category and
//! message template in the manifest catalog and decoding its parameters.

use crate::manifest::ManifestCatalog;
use crate::params::ParameterDecoder;
use crate::translator::ErrorTranslator;
use crate::types::{DecodedLine, DecoderError, Priority, RawRecord, Result};

/// Message renderer - resolves templates and builds output lines
pub struct MessageRenderer;

impl MessageRenderer {
    /// Render a record into a decoded line
    ///
    /// Resolution order:
    /// 1. Category by id, or the placeholder `Unknown category id {id}`
    /// 2. Message template by id; if unresolved, the placeholder
    ///    `Unknown message ID {id}` plus a hex dump of any payload bytes
    /// 3. Parameters decoded from the payload and appended as `(a, b, ...)`
    ///
    /// Fails with `UnknownPriority` for a priority outside 0-6 and with
    /// `ParameterOverrun` if the template needs more bytes than the record has.
    pub fn render(
        record: &RawRecord<'_>,
        catalog: &ManifestCatalog,
        translator: &dyn ErrorTranslator,
    ) -> Result<DecodedLine> {
        let header = &record.header;

        let priority =
            Priority::from_raw(header.priority).ok_or(DecoderError::UnknownPriority {
                offset: record.offset,
                priority: header.priority,
            })?;

        let category_name = catalog
            .category_name(header.category_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown category id {}", header.category_id));

        let (text, parameters) = match catalog.message(header.category_id, header.message_id) {
            Some(template) => {
                let (rendered, _) = ParameterDecoder::decode_parameters(
                    &template.params,
                    record.payload,
                    0,
                    translator,
                )
                .map_err(|overrun| {
                    log::warn!(
                        "Invalid parameter for message id: {}, category id: {}",
                        header.message_id,
                        header.category_id
                    );
                    DecoderError::ParameterOverrun {
                        offset: record.offset,
                        category_id: header.category_id,
                        message_id: header.message_id,
                        parameter: overrun.parameter,
                    }
                })?;
                (template.format.clone(), Self::format_parameters(&rendered))
            }
            None => {
                log::trace!(
                    "No template for category {} message {}",
                    header.category_id,
                    header.message_id
                );
                (
                    format!("Unknown message ID {}", header.message_id),
                    Self::hex_dump(record.payload),
                )
            }
        };

        Ok(DecodedLine {
            offset: record.offset,
            timestamp_ms: header.timestamp_ms,
            priority,
            category_id: header.category_id,
            category_name,
            message_id: header.message_id,
            text,
            parameters,
        })
    }

    /// Join rendered parameters as `(a, b, ...)`; empty input gives an empty string
    pub fn format_parameters(rendered: &[String]) -> String {
        if rendered.is_empty() {
            String::new()
        } else {
            format!("({})", rendered.join(", "))
        }
    }

    /// Raw payload as `(Params: 0x0a 0xff ...)`; empty payload gives an empty string
    pub fn hex_dump(payload: &[u8]) -> String {
        if payload.is_empty() {
            return String::new();
        }
        let bytes: Vec<String> = payload.iter().map(|b| format!("0x{:02x}", b)).collect();
        format!("(Params: {})", bytes.join(" "))
    }
}
