//! Inspect a raw device log dump: bank counters and record statistics
//!
//! Usage:
//!   cargo run --example inspect_dump -- <AzureSphere_DeviceLog.bin>

use device_log_decoder::{Decoder, HexErrorTranslator, ManifestCatalog};
use std::collections::HashMap;
use std::env;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: inspect_dump <dump.bin>");
        std::process::exit(2);
    };

    let buffer = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("✗ Cannot read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let decoder = Decoder::new(ManifestCatalog::new());

    println!("Inspecting: {} ({} bytes)", path, buffer.len());
    println!("─────────────────────────");
    for bank in decoder.bank_counters(&buffer) {
        println!(
            "  Bank @ {:8}: counter {:5}  status 0x{:04x}",
            bank.offset, bank.counter, bank.status
        );
    }

    // Without manifests every record renders as a hex dump, which is
    // enough to count them by category
    let lines = match decoder.lines(&buffer, &HexErrorTranslator) {
        Ok(lines) => lines,
        Err(e) => {
            println!("✗ {}", e);
            return;
        }
    };
    if let Ok(start) = decoder.locate_start(&buffer) {
        println!("\nOldest bank at offset {}", start);
    }

    let mut per_category: HashMap<u16, usize> = HashMap::new();
    let mut total = 0;
    for line in lines {
        match line {
            Ok(line) => {
                *per_category.entry(line.category_id).or_insert(0) += 1;
                total += 1;
            }
            Err(e) => {
                println!("✗ Stopped: {}", e);
                break;
            }
        }
    }

    println!("\nRecords per category:");
    let mut categories: Vec<_> = per_category.into_iter().collect();
    categories.sort_by_key(|(id, _)| *id);
    for (id, count) in categories {
        println!("  Category {:5}: {:6} records", id, count);
    }
    println!("\nTotal records: {}", total);
}
