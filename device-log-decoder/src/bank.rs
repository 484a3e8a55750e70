//! Circular log buffer layout
//!
//! The raw dump is a sequence of fixed-size banks. Each bank holds
//! variable-length records followed by unusable padding and a footer:
//!
//! ```text
//! ┌──────────┬──────────┬─────┬──────────────┬───────────┬──────────┐
//! │ record 0 │ record 1 │ ... │ padding/0xFF │ counter   │ status   │
//! │ (hdr+pl) │          │     │              │ (2B LE)   │ (2B LE)  │
//! └──────────┴──────────┴─────┴──────────────┴───────────┴──────────┘
//! ```
//!
//! The footer counter increases each time a bank is (re)filled, so the bank
//! with the smallest counter holds the oldest records. A record never spans
//! a bank boundary.

use crate::config::{DecoderConfig, RECORD_HEADER_SIZE, SENTINEL_LENGTH};
use crate::types::{DecoderError, RawRecord, RecordHeader, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Counter value of an erased bank; never treated as a log start
const ERASED_COUNTER: u16 = 0xFFFF;

/// Footer fields of one bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankFooter {
    /// Offset of the bank start in the buffer
    pub offset: usize,
    /// Wrap counter
    pub counter: u16,
    pub status: u64,
}

/// Length of the buffer covered by whole banks
pub(crate) fn usable_len(buffer: &[u8], config: &DecoderConfig) -> usize {
    buffer.len() - buffer.len() % config.bank_size
}

/// Read the footer of every whole bank, in buffer order
pub(crate) fn bank_footers<'a>(
    buffer: &'a [u8],
    config: &DecoderConfig,
) -> impl Iterator<Item = BankFooter> + 'a {
    let config = config.clone();
    buffer
        .chunks_exact(config.bank_size)
        .enumerate()
        .map(move |(i, bank)| {
            let footer = &bank[config.footer_offset()..];
            let (counter, status) = footer.split_at(config.counter_size);
            BankFooter {
                offset: i * config.bank_size,
                counter: LittleEndian::read_u16(counter),
                status: if status.is_empty() {
                    0
                } else {
                    LittleEndian::read_uint(status, status.len())
                },
            }
        })
}

/// Find the offset of the bank holding the oldest records
///
/// Picks the first bank (in buffer order) with the smallest wrap counter.
/// Counter rollover is not taken into account.
pub(crate) fn locate_start(buffer: &[u8], config: &DecoderConfig) -> Result<usize> {
    let mut smallest = ERASED_COUNTER;
    let mut start = None;

    for footer in bank_footers(buffer, config) {
        if footer.counter < smallest {
            smallest = footer.counter;
            start = Some(footer.offset);
        }
    }

    match start {
        Some(offset) => {
            log::debug!("Log starts at bank offset {} (counter {})", offset, smallest);
            Ok(offset)
        }
        None => Err(DecoderError::NoLogFound),
    }
}

/// Parse a 12-byte record header
pub(crate) fn parse_header(bytes: &[u8]) -> RecordHeader {
    RecordHeader {
        length: LittleEndian::read_u16(&bytes[0..2]),
        reserved: bytes[2],
        priority: bytes[3],
        category_id: LittleEndian::read_u16(&bytes[4..6]),
        message_id: LittleEndian::read_u16(&bytes[6..8]),
        timestamp_ms: LittleEndian::read_u32(&bytes[8..12]),
    }
}

/// Iterator over the records in `[start, stop)` of the buffer
///
/// Restartable by cloning. Yields at most one error, after which it is
/// exhausted.
#[derive(Debug, Clone)]
pub(crate) struct RecordIter<'a> {
    buffer: &'a [u8],
    config: DecoderConfig,
    index: usize,
    stop: usize,
    failed: bool,
}

/// Extract the records in `[start, stop)`
pub(crate) fn extract_records<'a>(
    buffer: &'a [u8],
    config: &DecoderConfig,
    start: usize,
    stop: usize,
) -> RecordIter<'a> {
    RecordIter {
        buffer,
        config: config.clone(),
        index: start,
        stop: stop.min(buffer.len()),
        failed: false,
    }
}

/// Records in chronological order: `[start, end)` followed by `[0, start)`
pub(crate) fn chronological_records<'a>(
    buffer: &'a [u8],
    config: &DecoderConfig,
    start: usize,
) -> std::iter::Chain<RecordIter<'a>, RecordIter<'a>> {
    let end = usable_len(buffer, config);
    extract_records(buffer, config, start, end).chain(extract_records(buffer, config, 0, start))
}

impl<'a> RecordIter<'a> {
    fn next_bank(&self) -> usize {
        (self.index / self.config.bank_size + 1) * self.config.bank_size
    }

    fn fail(&mut self, error: DecoderError) -> Option<Result<RawRecord<'a>>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<RawRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if self.index >= self.stop {
                return None;
            }

            let bank_size = self.config.bank_size;
            let in_bank = self.index % bank_size;

            // No room for a header plus the footer: padding up to the next bank
            if in_bank >= bank_size - self.config.reserved_tail() {
                self.index = self.next_bank();
                continue;
            }

            let offset = self.index;
            if offset + RECORD_HEADER_SIZE > self.buffer.len() {
                return self.fail(DecoderError::Truncated {
                    offset,
                    needed: RECORD_HEADER_SIZE,
                    available: self.buffer.len() - offset,
                });
            }

            let header = parse_header(&self.buffer[offset..offset + RECORD_HEADER_SIZE]);

            if header.length == SENTINEL_LENGTH {
                log::trace!("Bank exhausted at offset {}", offset);
                self.index = self.next_bank();
                continue;
            }

            let length = header.length as usize;
            if length < RECORD_HEADER_SIZE {
                return self.fail(DecoderError::InvalidRecordLength {
                    offset,
                    length: header.length,
                });
            }

            let limit = (offset - in_bank + self.config.footer_offset()).min(self.buffer.len());
            if offset + length > limit {
                return self.fail(DecoderError::Truncated {
                    offset,
                    needed: length,
                    available: limit - offset,
                });
            }

            log::trace!(
                "Record at {}: length {}, category {}, message {}",
                offset,
                length,
                header.category_id,
                header.message_id
            );

            self.index = offset + length;
            let payload_start = offset + RECORD_HEADER_SIZE;
            return Some(Ok(RawRecord {
                offset,
                header,
                payload: &self.buffer[payload_start..payload_start + header.payload_len()],
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: usize = 64;

    fn config() -> DecoderConfig {
        DecoderConfig::new().with_bank_size(BANK)
    }

    /// Erased banks with the given wrap counters
    fn banks(counters: &[u16]) -> Vec<u8> {
        let mut buffer = vec![0xFF; counters.len() * BANK];
        for (i, counter) in counters.iter().enumerate() {
            let footer = (i + 1) * BANK - 4;
            buffer[footer..footer + 2].copy_from_slice(&counter.to_le_bytes());
            buffer[footer + 2..footer + 4].copy_from_slice(&0u16.to_le_bytes());
        }
        buffer
    }

    fn put_record(buffer: &mut [u8], at: usize, length: u16, category: u16, message: u16) {
        buffer[at..at + 2].copy_from_slice(&length.to_le_bytes());
        buffer[at + 2] = 0;
        buffer[at + 3] = 4;
        buffer[at + 4..at + 6].copy_from_slice(&category.to_le_bytes());
        buffer[at + 6..at + 8].copy_from_slice(&message.to_le_bytes());
        buffer[at + 8..at + 12].copy_from_slice(&1000u32.to_le_bytes());
        for b in &mut buffer[at + 12..at + length as usize] {
            *b = 0xAB;
        }
    }

    #[test]
    fn test_locate_smallest_counter() {
        let buffer = banks(&[2, 0, 1]);
        assert_eq!(locate_start(&buffer, &config()).unwrap(), BANK);
    }

    #[test]
    fn test_locate_tie_takes_first() {
        let buffer = banks(&[3, 1, 1]);
        assert_eq!(locate_start(&buffer, &config()).unwrap(), BANK);
    }

    #[test]
    fn test_locate_empty_buffer() {
        assert!(matches!(
            locate_start(&[], &config()),
            Err(DecoderError::NoLogFound)
        ));
    }

    #[test]
    fn test_locate_all_erased() {
        let buffer = banks(&[0xFFFF, 0xFFFF]);
        assert!(matches!(
            locate_start(&buffer, &config()),
            Err(DecoderError::NoLogFound)
        ));
    }

    #[test]
    fn test_locate_ignores_partial_bank() {
        let mut buffer = banks(&[5]);
        buffer.extend_from_slice(&[0u8; 10]);
        assert_eq!(locate_start(&buffer, &config()).unwrap(), 0);
        assert_eq!(usable_len(&buffer, &config()), BANK);
    }

    #[test]
    fn test_bank_footers() {
        let buffer = banks(&[7, 8]);
        let footers: Vec<_> = bank_footers(&buffer, &config()).collect();
        assert_eq!(footers.len(), 2);
        assert_eq!(footers[1].offset, BANK);
        assert_eq!(footers[1].counter, 8);
        assert_eq!(footers[1].status, 0);
    }

    #[test]
    fn test_parse_header() {
        let bytes = [
            0x14, 0x00, 0x00, 0x05, 0x03, 0x00, 0x07, 0x00, 0xE8, 0x03, 0x00, 0x00,
        ];
        let header = parse_header(&bytes);
        assert_eq!(header.length, 20);
        assert_eq!(header.priority, 5);
        assert_eq!(header.category_id, 3);
        assert_eq!(header.message_id, 7);
        assert_eq!(header.timestamp_ms, 1000);
    }

    #[test]
    fn test_extract_records_in_bank() {
        let mut buffer = banks(&[0]);
        put_record(&mut buffer, 0, 16, 1, 1);
        put_record(&mut buffer, 16, 12, 1, 2);

        let records: Vec<_> = extract_records(&buffer, &config(), 0, BANK)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 0);
        assert_eq!(records[0].payload, &[0xAB; 4]);
        assert_eq!(records[1].offset, 16);
        assert!(records[1].payload.is_empty());
    }

    #[test]
    fn test_sentinel_skips_to_next_bank() {
        let mut buffer = banks(&[0, 1]);
        // Bank 0 starts with a sentinel header (erased 0xFF bytes)
        put_record(&mut buffer, BANK, 12, 2, 1);

        let records: Vec<_> = extract_records(&buffer, &config(), 0, 2 * BANK)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].offset, BANK);
    }

    #[test]
    fn test_padding_region_not_parsed() {
        let mut buffer = banks(&[0, 1]);
        // Record ends at BANK - 11: only 7 bytes before the footer
        put_record(&mut buffer, 0, (BANK - 11) as u16, 1, 1);
        // Garbage where a header would be; must not be read
        buffer[BANK - 11..BANK - 9].copy_from_slice(&3u16.to_le_bytes());
        put_record(&mut buffer, BANK, 12, 1, 2);

        let records: Vec<_> = extract_records(&buffer, &config(), 0, 2 * BANK)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].offset, BANK);
    }

    #[test]
    fn test_record_past_footer_is_truncated() {
        let mut buffer = banks(&[0]);
        buffer[0..2].copy_from_slice(&(BANK as u16).to_le_bytes());

        let mut iter = extract_records(&buffer, &config(), 0, BANK);
        assert!(matches!(
            iter.next(),
            Some(Err(DecoderError::Truncated { offset: 0, .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_short_length_rejected() {
        let mut buffer = banks(&[0]);
        buffer[0..2].copy_from_slice(&0u16.to_le_bytes());

        let mut iter = extract_records(&buffer, &config(), 0, BANK);
        assert!(matches!(
            iter.next(),
            Some(Err(DecoderError::InvalidRecordLength { offset: 0, length: 0 }))
        ));
    }

    #[test]
    fn test_chronological_order() {
        let mut buffer = banks(&[2, 0, 1]);
        put_record(&mut buffer, 0, 12, 10, 0);
        put_record(&mut buffer, BANK, 12, 11, 0);
        put_record(&mut buffer, 2 * BANK, 12, 12, 0);

        let start = locate_start(&buffer, &config()).unwrap();
        let order: Vec<u16> = chronological_records(&buffer, &config(), start)
            .map(|r| r.unwrap().header.category_id)
            .collect();
        assert_eq!(order, vec![11, 12, 10]);
    }
}
