//! System memory buffer strength (`BUFF_SC`) encoding.
//!
//! The datasheet gives no formula for `BUFF_SC`; the predicates below are
//! fitted to values read back from working boards:
//!
//! ```text
//! BUFF_SC  DRP   DIMM0                DIMM1
//! 0x3356   0x0c  128MB dual-sided     -
//! 0xcc56   0xc0  -                    128MB dual-sided
//! 0x77da   0x0d  128MB single-sided   -
//! 0xddda   0xd0  -                    128MB single-sided
//! 0x0001   0xcc  128MB dual-sided     128MB dual-sided
//! 0x55c6   0xdd  128MB single-sided   128MB single-sided
//! 0x4445   0xcd  128MB single-sided   128MB dual-sided
//! 0x1145   0xdc  128MB dual-sided     128MB single-sided
//! ```
//!
//! Keep every predicate as written. Several overlap, and the two-bit fields
//! at 7:6, 9:8 and 11:10 are ORed in after their single-bit counterparts.

use log::info;

use crate::{ModuleDescriptor, DIMM_SOCKETS};

/// Boolean view of one socket as seen by the strength table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StrengthFlags {
    /// Module present with a non-zero density.
    pub size: bool,
    /// Dual-sided by bank count.
    pub ds: bool,
    /// Single-sided by bank count.
    pub ss: bool,
}

impl StrengthFlags {
    /// Flags of an empty socket.
    pub const ABSENT: Self = Self {
        size: false,
        ds: false,
        ss: false,
    };

    /// Derives flags from a descriptor.
    #[must_use]
    pub const fn from_descriptor(descriptor: &ModuleDescriptor) -> Self {
        match descriptor {
            ModuleDescriptor::Absent => Self::ABSENT,
            ModuleDescriptor::Present(info) => Self {
                size: info.density != 0,
                ds: info.sided.is_dual(),
                ss: !info.sided.is_dual(),
            },
        }
    }
}

/// Computes `BUFF_SC` from both sockets' flags.
#[must_use]
#[allow(clippy::nonminimal_bool, clippy::too_many_lines)]
pub const fn encode_strength(d0: StrengthFlags, d1: StrengthFlags) -> u16 {
    let mut buff_sc: u16 = 0;

    if (d0.ds && d1.ds) || (d0.ds && d1.ss) || (d0.ss && d1.ds) {
        buff_sc |= 1;
    }
    if (d0.size && !d1.size) || (!d0.size && d1.size) || (d0.ss && d1.ss) {
        buff_sc |= 1 << 1;
    }
    if (d0.ds && !d1.size)
        || (!d0.size && d1.ds)
        || (d0.ss && d1.ss)
        || (d0.ds && d1.ss)
        || (d0.ss && d1.ds)
    {
        buff_sc |= 1 << 2;
    }
    if (d0.ss && !d1.size) || (!d0.size && d1.ss) {
        buff_sc |= 1 << 3;
    }
    if (d0.size && !d1.size) || (!d0.size && d1.size) {
        buff_sc |= 1 << 4;
    }
    if (d0.ds && !d1.size) || (!d0.size && d1.ds) || (d0.ds && d1.ss) || (d0.ss && d1.ds) {
        buff_sc |= 1 << 6;
    }
    if (d0.ss && !d1.size) || (!d0.size && d1.ss) || (d0.ss && d1.ss) {
        buff_sc |= 3 << 6;
    }
    if (!d0.size && d1.ss) || (d0.ds && d1.ss) || (d0.ss && d1.ss) {
        buff_sc |= 1 << 8;
    }
    if d0.size && !d1.size {
        buff_sc |= 3 << 8;
    }
    if (d0.ss && !d1.size) || (d0.ss && d1.ss) || (d0.ss && d1.ds) {
        buff_sc |= 1 << 10;
    }
    if !d0.size && d1.size {
        buff_sc |= 3 << 10;
    }
    if (d0.size && !d1.size)
        || (d0.ss && !d1.size)
        || (!d0.size && d1.ss)
        || (d0.ss && d1.ss)
        || (d0.ds && d1.ss)
    {
        buff_sc |= 1 << 12;
    }
    if d0.size && !d1.size {
        buff_sc |= 1 << 13;
    }
    if (!d0.size && d1.size) || (d0.ss && !d1.size) || (d0.ss && d1.ss) || (d0.ss && d1.ds) {
        buff_sc |= 1 << 14;
    }
    if !d0.size && d1.size {
        buff_sc |= 1 << 15;
    }

    buff_sc
}

/// Computes `BUFF_SC` for both sockets.
#[must_use]
pub fn encode_buffer_strength(descriptors: &[ModuleDescriptor; DIMM_SOCKETS]) -> u16 {
    let [d0, d1] = descriptors.map(|descriptor| StrengthFlags::from_descriptor(&descriptor));
    let buff_sc = encode_strength(d0, d1);
    info!("BUFF_SC calculated to {buff_sc:#06x}");
    buff_sc
}
