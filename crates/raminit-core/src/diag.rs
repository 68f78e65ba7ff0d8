//! Post-init report and host bridge register dump.

use core::fmt::Write as _;

use log::debug;

use crate::{ConfigSpace, RowPopulation};

/// Size of the host bridge configuration space.
pub const CONFIG_SPACE_BYTES: usize = 256;

const DUMP_ROW_BYTES: usize = 16;

/// Outcome of one [`crate::sdram_initialize`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InitReport {
    /// Value programmed into `DRP`.
    pub row_population: RowPopulation,
    /// Value programmed into `BUFF_SC`.
    pub buffer_strength: u16,
    /// Top of memory in MiB as decoded from `DRP`.
    pub total_mb: u32,
    /// `DRAMT` command selections written.
    pub commands_issued: u32,
    /// Command-delivery reads on the memory bus.
    pub dram_accesses: u32,
    /// Modules clamped to 128 MiB per side.
    pub clamped_sockets: u8,
    /// Sum of all settling delays, in microseconds.
    pub total_settle_micros: u64,
}

/// Formats one dump row as `"XX: b0 b1 .. bN"`.
#[must_use]
pub fn format_dump_row(offset: usize, bytes: &[u8]) -> String {
    let mut row = format!("{offset:02x}:");
    for byte in bytes {
        let _ = write!(row, " {byte:02x}");
    }
    row
}

/// Reads the whole config space and logs it in 16-byte rows.
pub fn dump_config_space<C: ConfigSpace + ?Sized>(config: &mut C) -> [u8; CONFIG_SPACE_BYTES] {
    let mut snapshot = [0; CONFIG_SPACE_BYTES];
    for (offset, slot) in (0..=u8::MAX).zip(snapshot.iter_mut()) {
        *slot = config.read8(offset);
    }

    for (index, row) in snapshot.chunks(DUMP_ROW_BYTES).enumerate() {
        debug!("{}", format_dump_row(index * DUMP_ROW_BYTES, row));
    }

    snapshot
}
