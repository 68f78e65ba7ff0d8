/// SDRAM command kinds with fixed settling delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CommandKind {
    /// NOP after power-up, before any other command.
    Nop,
    /// Precharge all banks (tRP).
    PrechargeAll,
    /// CBR auto-refresh cycle (tRC).
    AutoRefresh,
    /// Mode register set (two memory clocks).
    ModeRegisterSet,
    /// Switch to normal operation with refresh enabled.
    Normal,
}

/// Settling delay in microseconds after each command kind.
pub const SETTLE_DELAY_TABLE: &[(CommandKind, u32)] = &[
    (CommandKind::Nop, 200),
    (CommandKind::PrechargeAll, 1),
    (CommandKind::AutoRefresh, 1),
    (CommandKind::ModeRegisterSet, 2),
    (CommandKind::Normal, 1),
];

/// Longest settling delay in the table.
pub const MAX_SETTLE_MICROS: u32 = 200;

/// Looks up the settling delay for a command kind.
#[must_use]
pub fn settle_delay(kind: CommandKind) -> Option<u32> {
    SETTLE_DELAY_TABLE
        .iter()
        .find_map(|(entry_kind, micros)| (*entry_kind == kind).then_some(*micros))
}
