//! Prints the register and bus trace of one SDRAM bring-up.
//!
//! Usage: `sequence_trace [dimm0] [dimm1]` where each module is `none`,
//! `ss<density>` or `ds<density>` with density in 4 MiB units, e.g.
//! `sequence_trace ds16 ss32`.

use log as _;
use proptest as _;
use raminit_core::{sdram_initialize, BoardOp, RamInitConfig, SimBoard, SpdImage};
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn parse_module(arg: &str) -> Option<SpdImage> {
    if arg == "none" {
        return Some(SpdImage::empty());
    }
    let (banks, density) = if let Some(rest) = arg.strip_prefix("ds") {
        (2, rest)
    } else {
        (1, arg.strip_prefix("ss")?)
    };
    density.parse().ok().map(|density| SpdImage::sdram(density, banks))
}

fn describe(op: BoardOp) -> String {
    match op {
        BoardOp::ConfigRead8 { offset } => format!("cfg rd8  {offset:#04x}"),
        BoardOp::ConfigRead16 { offset } => format!("cfg rd16 {offset:#04x}"),
        BoardOp::ConfigWrite8 { offset, value } => format!("cfg wr8  {offset:#04x} <- {value:#04x}"),
        BoardOp::ConfigWrite16 { offset, value } => {
            format!("cfg wr16 {offset:#04x} <- {value:#06x}")
        }
        BoardOp::SmbusRead { device, offset } => format!("smbus rd {device:#04x}:{offset}"),
        BoardOp::DramRead { addr } => format!("dram rd  {addr:#010x}"),
        BoardOp::Delay { micros } => format!("udelay   {micros}"),
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let dimm0 = args.next().unwrap_or_else(|| "ds16".to_owned());
    let dimm1 = args.next().unwrap_or_else(|| "ss32".to_owned());

    let (Some(spd0), Some(spd1)) = (parse_module(&dimm0), parse_module(&dimm1)) else {
        eprintln!("modules must be none, ss<density> or ds<density>");
        std::process::exit(2);
    };

    let mut board = SimBoard::new(spd0, spd1);
    let report = match sdram_initialize(&mut board, &RamInitConfig::default()) {
        Ok(report) => report,
        Err(error) => {
            eprintln!("init failed: {error}");
            std::process::exit(1);
        }
    };

    for timed in board.ops() {
        println!("{:>6} us  {}", timed.at, describe(timed.op));
    }

    println!();
    println!("DRP      = {:#04x}", report.row_population.raw());
    println!("BUFF_SC  = {:#06x}", report.buffer_strength);
    println!("memory   = {} MiB", report.total_mb);
    println!(
        "commands = {}, dram reads = {}, settle = {} us",
        report.commands_issued, report.dram_accesses, report.total_settle_micros
    );
}
