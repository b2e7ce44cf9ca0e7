//! nal-probe - Annex-B bitstream inspector
//!
//! Reads a raw H.264 elementary stream and lists its NAL units.
//!
//! # Usage
//!
//! ```bash
//! # Human-readable table
//! nal-probe stream.h264
//!
//! # JSON output
//! nal-probe --format json stream.h264
//! ```

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use vidpipe::codec::h264::nal;
use vidpipe::{init, Config};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "nal-probe")]
#[command(about = "Inspect the NAL units of a raw Annex-B H.264 stream", long_about = None)]
#[command(version)]
struct Args {
    /// Annex-B elementary stream to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct UnitReport {
    index: usize,
    offset: usize,
    size: usize,
    nal_type: u8,
    nal_ref_idc: u8,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct StreamReport {
    file: String,
    bytes: usize,
    frames: usize,
    key_frames: usize,
    units: Vec<UnitReport>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init(Config {
        verbose: args.verbose,
        ..Config::default()
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    let data = fs::read(&args.file)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", args.file.display(), e))?;

    let report = probe(&args.file.display().to_string(), &data);

    match args.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn probe(file: &str, data: &[u8]) -> StreamReport {
    let units: Vec<UnitReport> = nal::NalUnitIter::new(data)
        .enumerate()
        .map(|(index, unit)| UnitReport {
            index,
            offset: unit.offset,
            size: unit.data.len(),
            nal_type: unit.nal_type,
            nal_ref_idc: unit.nal_ref_idc,
            kind: kind_name(unit.nal_type),
        })
        .collect();

    StreamReport {
        file: file.to_string(),
        bytes: data.len(),
        frames: nal::count_frames(data),
        key_frames: nal::count_key_frames(data),
        units,
    }
}

fn kind_name(nal_type: u8) -> &'static str {
    match nal_type {
        nal::NAL_TYPE_SLICE => "slice",
        nal::NAL_TYPE_IDR => "IDR slice",
        nal::NAL_TYPE_SEI => "SEI",
        nal::NAL_TYPE_SPS => "SPS",
        nal::NAL_TYPE_PPS => "PPS",
        nal::NAL_TYPE_AUD => "AUD",
        _ => "other",
    }
}

fn print_text(report: &StreamReport) {
    println!("{} ({} bytes)", report.file, report.bytes);
    println!(
        "{:>5} {:>10} {:>10} {:>5} {:>4}  kind",
        "unit", "offset", "size", "type", "ref"
    );
    for unit in &report.units {
        println!(
            "{:>5} {:>10} {:>10} {:>5} {:>4}  {}",
            unit.index, unit.offset, unit.size, unit.nal_type, unit.nal_ref_idc, unit.kind
        );
    }
    println!();
    println!(
        "{} NAL units, {} key frames",
        report.frames, report.key_frames
    );
}
