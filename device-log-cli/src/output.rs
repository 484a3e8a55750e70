//! Writing decoded lines and bank summaries

use crate::config::OutputFormat;
use anyhow::Result;
use device_log_decoder::bank::BankFooter;
use device_log_decoder::DecodedLine;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One JSON output object: the source file plus the decoded record
#[derive(Serialize)]
struct JsonLine<'a> {
    file: &'a Path,
    #[serde(flatten)]
    line: &'a DecodedLine,
    rendered: String,
}

/// Write the decoded lines of one dump
///
/// In text mode a `==> file <==` banner precedes the lines when `banner` is set.
pub fn write_lines<W: Write>(
    out: &mut W,
    file: &Path,
    lines: &[DecodedLine],
    format: OutputFormat,
    banner: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if banner {
                writeln!(out, "==> {} <==", file.display())?;
            }
            for line in lines {
                writeln!(out, "{}", line)?;
            }
        }
        OutputFormat::Json => {
            for line in lines {
                let record = JsonLine {
                    file,
                    line,
                    rendered: line.to_string(),
                };
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Write the footer of every bank, marking the oldest one
pub fn write_banks<W: Write>(
    out: &mut W,
    file: &Path,
    banks: &[BankFooter],
    start: Option<usize>,
) -> Result<()> {
    writeln!(out, "==> {} <==", file.display())?;
    writeln!(out, "{:>10}  {:>7}  {:>6}", "offset", "counter", "status")?;
    for bank in banks {
        let marker = if Some(bank.offset) == start { "  <- start" } else { "" };
        writeln!(
            out,
            "{:>10}  {:>7}  0x{:04x}{}",
            bank.offset, bank.counter, bank.status, marker
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_log_decoder::Priority;

    fn line() -> DecodedLine {
        DecodedLine {
            offset: 4096,
            timestamp_ms: 1000,
            priority: Priority::Info,
            category_id: 1,
            category_name: "Boot".to_string(),
            message_id: 2,
            text: "Booted".to_string(),
            parameters: String::new(),
        }
    }

    #[test]
    fn test_text_output() {
        let mut out = Vec::new();
        write_lines(&mut out, Path::new("a.bin"), &[line()], OutputFormat::Text, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "==> a.bin <==\n[    1.000000] Info Boot(2): Booted \n");
    }

    #[test]
    fn test_json_output() {
        let mut out = Vec::new();
        write_lines(&mut out, Path::new("a.bin"), &[line()], OutputFormat::Json, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["file"], "a.bin");
        assert_eq!(value["offset"], 4096);
        assert_eq!(value["priority"], "Info");
        assert_eq!(value["category_name"], "Boot");
        assert_eq!(value["rendered"], "[    1.000000] Info Boot(2): Booted ");
    }

    #[test]
    fn test_bank_table() {
        let banks = [
            BankFooter {
                offset: 0,
                counter: 2,
                status: 0,
            },
            BankFooter {
                offset: 4096,
                counter: 1,
                status: 0,
            },
        ];
        let mut out = Vec::new();
        write_banks(&mut out, Path::new("a.bin"), &banks, Some(4096)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[3].ends_with("<- start"));
        assert!(!rows[2].contains("start"));
    }
}
