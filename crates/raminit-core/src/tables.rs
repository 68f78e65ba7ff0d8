//! DRP nibble to size translation tables.
//!
//! Sizes are in MiB. Some totals appear twice because the same capacity can
//! be built single- or dual-sided; the bank-0 table tells them apart.

/// DRP nibble the controller must never be programmed with.
pub const RESERVED_DRP_NIBBLE: u8 = 2;

/// Total DIMM size in MiB for each DRP nibble.
pub const DRP_TO_MB: [u16; 16] = [
    // 0  1  (2)  3   4   5   6   7   8   9   A   B    C    D    E    F
    0, 8, 0, 16, 16, 24, 32, 32, 48, 64, 64, 96, 128, 128, 192, 256,
];

/// Size of bank 0 in MiB for dual-sided encodings, 0 otherwise.
pub const DRP_TO_BANK0_MB: [u16; 16] = [
    // 0  1  (2)  3  4   5   6  7   8   9  A   B   C  D    E    F
    0, 0, 0, 8, 0, 16, 16, 0, 32, 32, 0, 64, 64, 0, 128, 128,
];

const _: () = assert_table_layout();

const fn assert_table_layout() {
    assert!(
        DRP_TO_MB[RESERVED_DRP_NIBBLE as usize] == 0
            && DRP_TO_BANK0_MB[RESERVED_DRP_NIBBLE as usize] == 0,
        "reserved nibble must decode to no memory"
    );

    let mut nibble = 0;
    while nibble < DRP_TO_MB.len() {
        assert!(
            DRP_TO_BANK0_MB[nibble] < DRP_TO_MB[nibble] || DRP_TO_MB[nibble] == 0,
            "bank 0 must be a strict part of the module"
        );
        nibble += 1;
    }
}

/// Total module size in MiB for a DRP nibble; only the low 4 bits are used.
#[must_use]
pub const fn total_mb(nibble: u8) -> u16 {
    DRP_TO_MB[(nibble & 0x0f) as usize]
}

/// Bank-0 size in MiB for a DRP nibble; only the low 4 bits are used.
#[must_use]
pub const fn bank0_mb(nibble: u8) -> u16 {
    DRP_TO_BANK0_MB[(nibble & 0x0f) as usize]
}

/// Address span one socket occupies, decoded from its DRP nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SocketSpan {
    /// Whole module size in MiB.
    pub total_mb: u16,
    /// Bank 0 size in MiB; non-zero only for dual-sided modules.
    pub bank0_mb: u16,
}

impl SocketSpan {
    /// Decodes a DRP nibble.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self {
            total_mb: total_mb(nibble),
            bank0_mb: bank0_mb(nibble),
        }
    }

    /// Returns `true` when no memory decodes to this socket.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.total_mb == 0
    }
}
