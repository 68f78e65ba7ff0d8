//! Row-population (`DRP`) encoding.
//!
//! Each socket gets one nibble. Single-sided codes come from
//! [`DENSITY_TO_DRP`]; a dual-sided module uses the code two above it.

use log::warn;

use crate::{total_mb, ModuleDescriptor, Sidedness, Socket, DIMM_SOCKETS};

/// Largest row density the controller decodes, in 4 MiB units (128 MiB).
pub const MAX_ROW_DENSITY: u8 = 32;

/// Added to a single-sided code to describe the second rank.
pub const DUAL_SIDED_DRP_OFFSET: u8 = 2;

/// Single-sided DRP nibble for each row density `0..=32` (4 MiB units).
///
/// SPD density is a bitmap of row sizes. Mixed bitmaps use their smallest
/// row; anything with a 4 MiB row, or no row at all, has no code and maps
/// to 0.
pub const DENSITY_TO_DRP: [u8; MAX_ROW_DENSITY as usize + 1] = [
    0x0, 0x0, 0x1, 0x0, // 0, 4, 8, 12 MiB
    0x4, 0x0, 0x1, 0x0, // 16, 20, 24, 28 MiB
    0x7, 0x0, 0x1, 0x0, // 32 .. 44 MiB
    0x4, 0x0, 0x1, 0x0, // 48 .. 60 MiB
    0xa, 0x0, 0x1, 0x0, // 64 .. 76 MiB
    0x4, 0x0, 0x1, 0x0, // 80 .. 92 MiB
    0x7, 0x0, 0x1, 0x0, // 96 .. 108 MiB
    0x4, 0x0, 0x1, 0x0, // 112 .. 124 MiB
    0xd, // 128 MiB
];

const _: () = assert_density_table();

const fn assert_density_table() {
    let mut density = 0;
    while density < DENSITY_TO_DRP.len() {
        let nibble = DENSITY_TO_DRP[density];
        assert!(nibble < 0x10, "drp codes are 4 bits");
        assert!(
            nibble == 0 || nibble + DUAL_SIDED_DRP_OFFSET <= 0x0f,
            "dual-sided code must stay a nibble"
        );
        assert!(
            (total_mb(nibble) as usize) <= density * 4,
            "translation may never overstate a row"
        );
        density += 1;
    }
}

/// Caps a raw density at [`MAX_ROW_DENSITY`]; the flag reports a clamp.
#[must_use]
pub const fn clamp_density(density: u8) -> (u8, bool) {
    if density > MAX_ROW_DENSITY {
        (MAX_ROW_DENSITY, true)
    } else {
        (density, false)
    }
}

/// DRP nibble for a present module, after clamping.
///
/// Returns 0 when the density has no usable code; such a module is left
/// unpopulated regardless of its sidedness.
#[must_use]
pub const fn encode_module(density: u8, sided: Sidedness) -> u8 {
    let (density, _) = clamp_density(density);
    let nibble = DENSITY_TO_DRP[density as usize];
    if nibble != 0 && sided.is_dual() {
        nibble + DUAL_SIDED_DRP_OFFSET
    } else {
        nibble
    }
}

/// Packed `DRP` value, socket 0 in bits `3:0`, socket 1 in bits `7:4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RowPopulation(u8);

impl RowPopulation {
    /// Wraps a raw register value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw register value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Nibble for one socket.
    #[must_use]
    pub const fn nibble(self, socket: Socket) -> u8 {
        (self.0 >> socket.drp_shift()) & 0x0f
    }

    /// Returns a copy with one socket's nibble replaced.
    #[must_use]
    pub const fn with_nibble(self, socket: Socket, nibble: u8) -> Self {
        let shift = socket.drp_shift();
        Self((self.0 & !(0x0f << shift)) | ((nibble & 0x0f) << shift))
    }

    /// Installed memory in MiB across all sockets (top of memory).
    #[must_use]
    pub fn total_mb(self) -> u32 {
        Socket::ALL
            .iter()
            .map(|socket| u32::from(total_mb(self.nibble(*socket))))
            .sum()
    }
}

/// Result of encoding both sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowPopulationEncoding {
    /// Value for the `DRP` register.
    pub value: RowPopulation,
    /// Number of modules whose density was clamped to 128 MiB per side.
    pub clamped_sockets: u8,
}

/// Encodes the `DRP` value for both sockets.
///
/// Oversized modules are clamped to 128 MiB per side with a warning; the
/// rest of their capacity is not mapped.
#[must_use]
pub fn encode_row_population(descriptors: &[ModuleDescriptor; DIMM_SOCKETS]) -> RowPopulationEncoding {
    let mut encoding = RowPopulationEncoding::default();

    for socket in Socket::ALL {
        let ModuleDescriptor::Present(info) = descriptors[socket.index()] else {
            continue;
        };

        if clamp_density(info.density).1 {
            warn!(
                "DIMM{}: rows larger than 128 MiB are not supported, treating as 128 MiB",
                socket.index()
            );
            encoding.clamped_sockets += 1;
        }

        let nibble = encode_module(info.density, info.signature);
        if nibble == 0 {
            warn!(
                "DIMM{}: row density {:#04x} has no DRP code, leaving socket unpopulated",
                socket.index(),
                info.density
            );
        }
        encoding.value = encoding.value.with_nibble(socket, nibble);
    }

    encoding
}
