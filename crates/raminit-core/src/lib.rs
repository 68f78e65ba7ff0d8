//! SDRAM bring-up for the Intel 82810 host bridge.
//!
//! Runs once at boot, before any allocator exists: probes the DIMM SPD
//! EEPROMs over SMBus, programs the row-population (`DRP`) and buffer
//! strength (`BUFF_SC`) registers, then walks the JEDEC power-up command
//! sequence through `DRAMT[7:5]`.

/// Host capability traits and initialization configuration.
pub mod api;
pub use api::{
    CasLatency, ConfigSpace, Delay, DramBus, RamInitConfig, RamInitHost, RefreshRate, SmbusHost,
    DEFAULT_SPD_BASE, SPD_ADDRESS_END,
};

/// Error and absence taxonomy.
pub mod fault;
pub use fault::{AbsenceReason, ConfigError, SmbusError};

/// Host-bridge register map and typed register port.
pub mod regs;
pub use regs::{
    Northbridge, Socket, BUFF_SC, DIMM_SOCKETS, DRAMT, DRAMT_PRESERVED_MASK, DRAMT_SMS_SHIFT, DRP,
};

/// Fixed DRP nibble size tables.
pub mod tables;
pub use tables::{bank0_mb, total_mb, SocketSpan, DRP_TO_BANK0_MB, DRP_TO_MB, RESERVED_DRP_NIBBLE};

/// Serial presence detect field layout and module descriptor reader.
pub mod spd;
pub use spd::{
    ModuleDescriptor, ModuleInfo, Sidedness, SpdReader, SPD_BANK_DENSITY, SPD_MEMORY_TYPE,
    SPD_MEMORY_TYPE_SDRAM, SPD_NUM_DIMM_BANKS, SPD_SIDEDNESS_SIGNATURE,
};

/// Row-population (`DRP`) encoder.
pub mod geometry;
pub use geometry::{
    clamp_density, encode_module, encode_row_population, RowPopulation, RowPopulationEncoding,
    DENSITY_TO_DRP, DUAL_SIDED_DRP_OFFSET, MAX_ROW_DENSITY,
};

/// Buffer strength (`BUFF_SC`) encoder.
pub mod strength;
pub use strength::{encode_buffer_strength, encode_strength, StrengthFlags};

/// Per-command settling delays.
pub mod timing;
pub use timing::{settle_delay, CommandKind, MAX_SETTLE_MICROS, SETTLE_DELAY_TABLE};

/// SDRAM command set and the JEDEC power-up sequencer.
pub mod sequencer;
pub use sequencer::{
    command_address_offset, init_sequence, mrs_address_offset, socket_base_offsets, Command,
    CommandSequencer, SequenceStats, AUTO_REFRESH_CYCLES, INIT_SEQUENCE_LEN,
};

/// Initialization report and register dump helpers.
pub mod diag;
pub use diag::{dump_config_space, format_dump_row, InitReport, CONFIG_SPACE_BYTES};

/// Top-level initialization entry points.
pub mod init;
pub use init::{sdram_enable, sdram_initialize, set_spd_registers, SpdProgramming};

/// In-memory i82810 board model used by host-side tests and tooling.
pub mod sim;
pub use sim::{BoardOp, SimBoard, SpdImage, TimedOp, SPD_IMAGE_BYTES};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
