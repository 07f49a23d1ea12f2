#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use fossil_core::hexdump::hex_dump;
use fossil_core::outline::Outline;
use fossil_core::view::RecordView;

#[derive(Debug, Parser)]
#[command(name = "fossil-decode")]
#[command(about = "Decode a stored value without a schema")]
struct Args {
    /// File holding the raw value; `-` reads stdin.
    #[arg(default_value = "data.bin")]
    path: PathBuf,

    /// Print the decoded tree as JSON, or the hex rows and decode error when
    /// the value does not decode.
    #[arg(long, conflicts_with = "hex")]
    json: bool,

    /// Print a hex dump without attempting to decode.
    #[arg(long)]
    hex: bool,
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return Ok(bytes);
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bytes = read_input(&args.path)?;

    if args.hex {
        println!("{}", hex_dump(&bytes));
        return Ok(());
    }
    let view = RecordView::from_bytes(&bytes);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{} bytes, {}", bytes.len(), view.summary());
    for line in Outline::new().lines(&view) {
        println!("{}", line.text());
    }
    Ok(())
}
