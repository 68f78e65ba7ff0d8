//! JEDEC SDRAM power-up sequencer.
//!
//! A command is selected through `DRAMT[7:5]` and then delivered by reading
//! one address inside every populated row. Rows are laid out back to back
//! in socket order, so each socket's base is the sum of the spans before it.

use log::debug;

use crate::{
    settle_delay, CasLatency, CommandKind, ConfigSpace, Delay, DramBus, Northbridge, RefreshRate,
    RowPopulation, Socket, SocketSpan, DIMM_SOCKETS, MAX_SETTLE_MICROS,
};

/// CBR refresh cycles issued between precharge and mode register set.
pub const AUTO_REFRESH_CYCLES: usize = 8;

/// Number of commands in the power-up sequence.
pub const INIT_SEQUENCE_LEN: usize = AUTO_REFRESH_CYCLES + 4;

const MIB: u32 = 1 << 20;

// SMAA bits for MRS: 0b00000001X1010, X = SMAA[4] selects CL3.
const MRS_SMAA_BASE: u32 = 0x2a;
const MRS_SMAA_CL3: u32 = 1 << 4;
// DIMM1 sees SMAA[7:4] inverted.
const MRS_SMAA_DIMM1_INVERT: u32 = 0xf0;
const MRS_ADDRESS_SHIFT: u32 = 3;

/// SDRAM commands the controller can issue during init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Command {
    /// No operation.
    Nop,
    /// Precharge all banks.
    PrechargeAll,
    /// CBR auto-refresh.
    AutoRefresh,
    /// Mode register set.
    ModeRegisterSet,
    /// Normal operation with the given refresh rate.
    Normal(RefreshRate),
}

impl Command {
    /// `DRAMT[7:5]` SDRAM mode-select code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Nop => 0x4,
            Self::PrechargeAll => 0x5,
            Self::ModeRegisterSet => 0x6,
            Self::AutoRefresh => 0x7,
            Self::Normal(refresh) => refresh.code(),
        }
    }

    /// Delay-table kind of this command.
    #[must_use]
    pub const fn kind(self) -> CommandKind {
        match self {
            Self::Nop => CommandKind::Nop,
            Self::PrechargeAll => CommandKind::PrechargeAll,
            Self::AutoRefresh => CommandKind::AutoRefresh,
            Self::ModeRegisterSet => CommandKind::ModeRegisterSet,
            Self::Normal(_) => CommandKind::Normal,
        }
    }

    /// Returns `false` for commands that only change controller state and
    /// are not delivered to the DIMMs.
    #[must_use]
    pub const fn reaches_modules(self) -> bool {
        !matches!(self, Self::Normal(_))
    }

    /// Short name used in boot logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nop => "apply NOP",
            Self::PrechargeAll => "precharge all",
            Self::AutoRefresh => "CBR",
            Self::ModeRegisterSet => "mode register set",
            Self::Normal(_) => "normal operation",
        }
    }
}

/// The power-up command order: NOP, precharge, 8x CBR, MRS, normal.
#[must_use]
pub const fn init_sequence(refresh: RefreshRate) -> [Command; INIT_SEQUENCE_LEN] {
    let mut sequence = [Command::AutoRefresh; INIT_SEQUENCE_LEN];
    sequence[0] = Command::Nop;
    sequence[1] = Command::PrechargeAll;
    sequence[INIT_SEQUENCE_LEN - 2] = Command::ModeRegisterSet;
    sequence[INIT_SEQUENCE_LEN - 1] = Command::Normal(refresh);
    sequence
}

/// Address offset that carries the MRS opcode for a socket.
#[must_use]
pub const fn mrs_address_offset(socket: Socket, cas_latency: CasLatency) -> u32 {
    let mut smaa = MRS_SMAA_BASE;
    if matches!(cas_latency, CasLatency::Cl3) {
        smaa |= MRS_SMAA_CL3;
    }
    if matches!(socket, Socket::Dimm1) {
        smaa ^= MRS_SMAA_DIMM1_INVERT;
    }
    smaa << MRS_ADDRESS_SHIFT
}

/// Offset added to a row base when delivering `command`; zero except for
/// mode register set.
#[must_use]
pub const fn command_address_offset(
    command: Command,
    socket: Socket,
    cas_latency: CasLatency,
) -> u32 {
    match command {
        Command::ModeRegisterSet => mrs_address_offset(socket, cas_latency),
        Command::Nop | Command::PrechargeAll | Command::AutoRefresh | Command::Normal(_) => 0,
    }
}

/// Byte address where each socket's first row starts.
#[must_use]
pub fn socket_base_offsets(row_population: RowPopulation) -> [u32; DIMM_SOCKETS] {
    let mut dimm_start_mb = 0_u32;
    Socket::ALL.map(|socket| {
        let base = dimm_start_mb * MIB;
        dimm_start_mb += u32::from(SocketSpan::from_nibble(row_population.nibble(socket)).total_mb);
        base
    })
}

/// Counters collected while running the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SequenceStats {
    /// `DRAMT` command selections written.
    pub commands: u32,
    /// Command-delivery reads issued on the memory bus.
    pub dram_accesses: u32,
    /// Total settling delay requested, in microseconds.
    pub settle_micros: u64,
}

/// Drives the controller through the power-up sequence.
pub struct CommandSequencer<'a, H: ConfigSpace + DramBus + Delay + ?Sized> {
    host: &'a mut H,
    cas_latency: CasLatency,
    stats: SequenceStats,
}

impl<'a, H: ConfigSpace + DramBus + Delay + ?Sized> CommandSequencer<'a, H> {
    /// Creates a sequencer over the host.
    pub fn new(host: &'a mut H, cas_latency: CasLatency) -> Self {
        Self {
            host,
            cas_latency,
            stats: SequenceStats::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> SequenceStats {
        self.stats
    }

    /// Selects `command` and delivers it to every populated row.
    ///
    /// `DRP` is read back for each socket rather than taken from the
    /// encoder. Returns the `DRAMT` value written.
    pub fn send(&mut self, command: Command) -> u8 {
        let dramt = Northbridge::new(&mut *self.host).select_command(command.code());
        self.stats.commands += 1;

        if !command.reaches_modules() {
            return dramt;
        }

        let mut dimm_start_mb = 0_u32;
        for socket in Socket::ALL {
            let offset = command_address_offset(command, socket, self.cas_latency);
            let nibble = Northbridge::new(&mut *self.host)
                .row_population()
                .nibble(socket);
            let span = SocketSpan::from_nibble(nibble);

            if span.total_mb != 0 {
                self.deliver(dramt, dimm_start_mb * MIB + offset);
            }
            if span.bank0_mb != 0 {
                self.deliver(dramt, (dimm_start_mb + u32::from(span.bank0_mb)) * MIB + offset);
            }

            dimm_start_mb += u32::from(span.total_mb);
        }

        dramt
    }

    /// Sends `command`, then blocks for its settling delay.
    pub fn step(&mut self, command: Command) {
        self.send(command);
        let micros = settle_delay(command.kind()).unwrap_or(MAX_SETTLE_MICROS);
        self.host.udelay(micros);
        self.stats.settle_micros += u64::from(micros);
    }

    /// Runs the full power-up sequence and returns the counters.
    pub fn run(mut self, refresh: RefreshRate) -> SequenceStats {
        for (index, command) in init_sequence(refresh).into_iter().enumerate() {
            debug!("RAM enable {}: {}", index + 1, command.name());
            self.step(command);
        }
        self.stats
    }

    fn deliver(&mut self, dramt: u8, addr: u32) {
        debug!("    sending RAM command {dramt:#04x} to {addr:#010x}");
        self.host.read32(addr);
        self.stats.dram_accesses += 1;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        command_address_offset, init_sequence, mrs_address_offset, socket_base_offsets, Command,
        CommandSequencer, AUTO_REFRESH_CYCLES, INIT_SEQUENCE_LEN,
    };
    use crate::{
        BoardOp, CasLatency, RefreshRate, RowPopulation, SimBoard, Socket, SpdImage, DRAMT, DRP,
    };

    fn board_with_drp(drp: u8) -> SimBoard {
        let mut board = SimBoard::new(SpdImage::empty(), SpdImage::empty());
        board.set_config_byte(DRP, drp);
        board.clear_ops();
        board
    }

    #[test]
    fn command_codes_match_dramt_mode_select() {
        assert_eq!(Command::Nop.code(), 0x4);
        assert_eq!(Command::PrechargeAll.code(), 0x5);
        assert_eq!(Command::ModeRegisterSet.code(), 0x6);
        assert_eq!(Command::AutoRefresh.code(), 0x7);
        assert_eq!(Command::Normal(RefreshRate::Standard).code(), 0x1);
        assert_eq!(Command::Normal(RefreshRate::Fast).code(), 0x2);
    }

    #[test]
    fn sequence_is_nop_precharge_refreshes_mrs_normal() {
        let sequence = init_sequence(RefreshRate::Standard);
        assert_eq!(sequence.len(), INIT_SEQUENCE_LEN);
        assert_eq!(sequence[0], Command::Nop);
        assert_eq!(sequence[1], Command::PrechargeAll);
        assert!(sequence[2..2 + AUTO_REFRESH_CYCLES]
            .iter()
            .all(|command| *command == Command::AutoRefresh));
        assert_eq!(sequence[10], Command::ModeRegisterSet);
        assert_eq!(sequence[11], Command::Normal(RefreshRate::Standard));
    }

    #[rstest]
    #[case(Socket::Dimm0, CasLatency::Cl3, 0x1d0)]
    #[case(Socket::Dimm1, CasLatency::Cl3, 0x650)]
    #[case(Socket::Dimm0, CasLatency::Cl2, 0x150)]
    #[case(Socket::Dimm1, CasLatency::Cl2, 0x6d0)]
    fn mrs_offsets_encode_cas_and_dimm1_inversion(
        #[case] socket: Socket,
        #[case] cas: CasLatency,
        #[case] offset: u32,
    ) {
        assert_eq!(mrs_address_offset(socket, cas), offset);
    }

    #[test]
    fn only_mrs_carries_an_address_offset() {
        for command in [
            Command::Nop,
            Command::PrechargeAll,
            Command::AutoRefresh,
            Command::Normal(RefreshRate::Standard),
        ] {
            assert_eq!(
                command_address_offset(command, Socket::Dimm1, CasLatency::Cl3),
                0
            );
        }
    }

    #[test]
    fn base_offsets_accumulate_whole_module_size() {
        // DIMM0 256 MiB dual-sided, DIMM1 128 MiB single-sided.
        assert_eq!(
            socket_base_offsets(RowPopulation::from_raw(0xdf)),
            [0, 256 << 20]
        );
        assert_eq!(socket_base_offsets(RowPopulation::from_raw(0xd0)), [0, 0]);
    }

    #[test]
    fn precharge_reaches_each_row_of_two_dual_sided_modules() {
        let mut board = board_with_drp(0xcc);
        CommandSequencer::new(&mut board, CasLatency::Cl3).send(Command::PrechargeAll);
        assert_eq!(
            board.dram_reads(),
            vec![0, 64 << 20, 128 << 20, 192 << 20]
        );
    }

    #[test]
    fn mrs_reads_use_per_socket_offsets() {
        let mut board = board_with_drp(0xdc);
        CommandSequencer::new(&mut board, CasLatency::Cl3).send(Command::ModeRegisterSet);
        assert_eq!(
            board.dram_reads(),
            vec![0x1d0, (64 << 20) + 0x1d0, (128 << 20) + 0x650]
        );
    }

    #[test]
    fn normal_operation_touches_no_memory() {
        let mut board = board_with_drp(0xff);
        board.set_config_byte(DRAMT, 0x15);
        let dramt =
            CommandSequencer::new(&mut board, CasLatency::Cl3).send(Command::Normal(RefreshRate::Standard));
        assert_eq!(dramt, 0x35);
        assert!(board.dram_reads().is_empty());
    }

    #[test]
    fn empty_and_reserved_nibbles_are_skipped() {
        let mut board = board_with_drp(0x20);
        let mut sequencer = CommandSequencer::new(&mut board, CasLatency::Cl3);
        sequencer.send(Command::Nop);
        assert_eq!(sequencer.stats().dram_accesses, 0);
        assert_eq!(sequencer.stats().commands, 1);
    }

    #[test]
    fn drp_is_reread_for_every_socket() {
        let mut board = board_with_drp(0x0d);
        CommandSequencer::new(&mut board, CasLatency::Cl3).send(Command::Nop);
        let drp_reads = board
            .ops()
            .iter()
            .filter(|op| op.op == BoardOp::ConfigRead8 { offset: DRP })
            .count();
        assert_eq!(drp_reads, 2);
    }

    #[test]
    fn step_waits_after_the_command() {
        let mut board = board_with_drp(0x0d);
        CommandSequencer::new(&mut board, CasLatency::Cl3).step(Command::Nop);
        let last = board.ops().last().map(|op| op.op);
        assert_eq!(last, Some(BoardOp::Delay { micros: 200 }));
        assert_eq!(board.clock_micros(), 200);
    }
}
