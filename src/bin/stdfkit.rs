//! # stdfkit CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Print every record of a file
//! stdfkit dump lot.stdf
//!
//! # Per-kind counts, part totals, and bin totals
//! stdfkit summary lot.stdf.gz
//!
//! # Report format, corruption, and ordering problems
//! stdfkit verify lot.stdf
//! ```
//!
//! Gzip inputs are detected by content, so compressed files need no flag.

use std::env;
use std::fmt::Display;

use eyre::{bail, Result};
use hashbrown::HashMap;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use stdfkit::records::{Hbr, Pcr};
use stdfkit::{RecordData, StdfFile};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stdfkit=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-v" => {
            println!("stdfkit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "dump" => dump(file_argument(&args)?),
        "summary" => summary(file_argument(&args)?),
        "verify" => verify(file_argument(&args)?),
        other => bail!("unknown command: {other}"),
    }
}

fn file_argument(args: &[String]) -> Result<&str> {
    match args.get(2) {
        Some(path) if args.len() == 3 => Ok(path),
        Some(_) => bail!("expected exactly one file argument"),
        None => bail!("missing file argument"),
    }
}

fn dump(path: &str) -> Result<()> {
    let mut file = StdfFile::builder()
        .tolerant(true)
        .recovery(true)
        .open(path)?;
    for record in file.records() {
        let record = record?;
        println!("{:>10}  {:?}", record.offset, record.data);
    }
    Ok(())
}

fn summary(path: &str) -> Result<()> {
    let mut file = StdfFile::builder()
        .tolerant(true)
        .recovery(true)
        .synthesize_summaries(true)
        .open(path)?;

    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    let mut parts: Option<Pcr> = None;
    let mut hard_bins: Vec<Hbr> = Vec::new();
    for record in file.records() {
        let record = record?;
        if record.data.is_marker() {
            continue;
        }
        if !record.synthesized {
            *counts.entry(record.data.kind_name()).or_insert(0) += 1;
        }
        match &record.data {
            RecordData::Pcr(pcr) if pcr.head_num == Some(255) => parts = Some(pcr.clone()),
            RecordData::Hbr(hbr) if hbr.head_num == Some(255) => hard_bins.push(hbr.clone()),
            _ => {}
        }
    }

    let mut kinds: Vec<(&str, u64)> = counts.into_iter().collect();
    kinds.sort_unstable();
    println!("records by kind:");
    for (kind, count) in kinds {
        println!("  {kind:<10} {count:>8}");
    }
    if let Some(pcr) = parts {
        println!(
            "parts: {} tested, {} good",
            or_dash(pcr.part_cnt),
            or_dash(pcr.good_cnt)
        );
    }
    if !hard_bins.is_empty() {
        hard_bins.sort_unstable_by_key(|bin| bin.hbin_num);
        println!("hard bins:");
        for bin in hard_bins {
            println!(
                "  bin {:>5}  {}  {:>8}  {}",
                or_dash(bin.hbin_num),
                bin.hbin_pf.unwrap_or(' '),
                or_dash(bin.hbin_cnt),
                bin.hbin_nam.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

fn verify(path: &str) -> Result<()> {
    let mut file = StdfFile::builder()
        .tolerant(true)
        .recovery(true)
        .validate_order(true)
        .open(path)?;

    let mut records = 0u64;
    let mut findings = 0u64;
    for record in file.records() {
        let record = record?;
        match &record.data {
            RecordData::FormatError(report) => {
                findings += 1;
                println!(
                    "format error at offset {}: {}",
                    record.offset, report.message
                );
            }
            RecordData::CorruptData(run) => {
                findings += 1;
                println!(
                    "corrupt run at offset {}: {} bytes{}",
                    record.offset,
                    run.bytes.len(),
                    if run.recoverable {
                        ""
                    } else {
                        " (unrecoverable)"
                    }
                );
            }
            RecordData::OrderError(order) => {
                findings += 1;
                println!("order error at offset {}: {}", record.offset, order.message);
            }
            data if data.is_writable() => records += 1,
            _ => {}
        }
    }
    if findings > 0 {
        bail!("{findings} problems found in '{path}'");
    }
    println!("ok: {records} records, no problems");
    Ok(())
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

fn print_usage() {
    println!("stdfkit - STDF V4 reader, writer, and repair toolkit");
    println!();
    println!("USAGE:");
    println!("    stdfkit <COMMAND> <FILE>");
    println!();
    println!("COMMANDS:");
    println!("    dump       Print every record, including in-band error markers");
    println!("    summary    Per-kind record counts, part totals, and hard bins");
    println!("    verify     Report format errors, corrupt runs, and order violations");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help         Print help information");
    println!("    -v, --version      Print version information");
    println!();
    println!("EXAMPLES:");
    println!("    stdfkit dump lot.stdf          Render every record");
    println!("    stdfkit summary lot.stdf.gz    Totals (gzip detected by content)");
    println!("    stdfkit verify lot.stdf        Exit nonzero if problems are found");
}
