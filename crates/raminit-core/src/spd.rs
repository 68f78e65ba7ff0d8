//! SPD field offsets and the module descriptor reader.

use log::{debug, info};

use crate::{AbsenceReason, SmbusHost, Socket, DIMM_SOCKETS};

/// SPD byte holding the fundamental memory type.
pub const SPD_MEMORY_TYPE: u8 = 2;
/// SPD byte holding the number of DIMM banks (sides).
pub const SPD_NUM_DIMM_BANKS: u8 = 5;
/// SPD byte holding the row density, in 4 MiB units.
pub const SPD_BANK_DENSITY: u8 = 31;
/// SPD byte whose high nibble is all ones on dual-sided modules.
pub const SPD_SIDEDNESS_SIGNATURE: u8 = 127;

/// Memory type code for SDR SDRAM.
pub const SPD_MEMORY_TYPE_SDRAM: u8 = 4;

const SIGNATURE_LOW_NIBBLE: u8 = 0x0f;

/// Whether a module exposes one or two ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Sidedness {
    /// One rank.
    Single,
    /// Two ranks.
    Dual,
}

impl Sidedness {
    /// Classifies from the SPD bank count.
    #[must_use]
    pub const fn from_bank_count(banks: u8) -> Self {
        if banks > 1 {
            Self::Dual
        } else {
            Self::Single
        }
    }

    /// Classifies from the SPD byte-127 signature.
    #[must_use]
    pub const fn from_signature(byte: u8) -> Self {
        if byte | SIGNATURE_LOW_NIBBLE == 0xff {
            Self::Dual
        } else {
            Self::Single
        }
    }

    /// Returns `true` for dual-sided modules.
    #[must_use]
    pub const fn is_dual(self) -> bool {
        matches!(self, Self::Dual)
    }
}

/// Raw SPD fields of a recognized SDRAM module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ModuleInfo {
    /// Row density in 4 MiB units, uncapped.
    pub density: u8,
    /// Sidedness from the bank count; drives buffer strength.
    pub sided: Sidedness,
    /// Sidedness from the byte-127 signature; drives row population.
    pub signature: Sidedness,
}

/// What one socket holds.
///
/// An empty socket carries no size or sidedness at all, so it cannot be
/// confused with a present module of zero density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ModuleDescriptor {
    /// No recognized module.
    #[default]
    Absent,
    /// Recognized SDRAM module.
    Present(ModuleInfo),
}

impl ModuleDescriptor {
    /// Returns `true` when a recognized module is installed.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Module fields, when present.
    #[must_use]
    pub const fn info(&self) -> Option<&ModuleInfo> {
        match self {
            Self::Present(info) => Some(info),
            Self::Absent => None,
        }
    }
}

/// Reads module descriptors from SPD EEPROMs.
pub struct SpdReader<'a, S: SmbusHost + ?Sized> {
    bus: &'a mut S,
    spd_base: u8,
}

impl<'a, S: SmbusHost + ?Sized> SpdReader<'a, S> {
    /// Creates a reader for sockets answering at `spd_base + index`.
    pub fn new(bus: &'a mut S, spd_base: u8) -> Self {
        Self { bus, spd_base }
    }

    /// Probes one socket.
    ///
    /// # Errors
    ///
    /// Returns the [`AbsenceReason`] when the socket has to be treated as
    /// empty.
    pub fn probe(&mut self, socket: Socket) -> Result<ModuleInfo, AbsenceReason> {
        let device = socket.spd_address(self.spd_base);

        let memory_type = self.bus.read_byte(device, SPD_MEMORY_TYPE)?;
        if memory_type != SPD_MEMORY_TYPE_SDRAM {
            return Err(AbsenceReason::UnsupportedType(memory_type));
        }

        let density = self.bus.read_byte(device, SPD_BANK_DENSITY)?;
        let banks = self.bus.read_byte(device, SPD_NUM_DIMM_BANKS)?;
        let signature = self.bus.read_byte(device, SPD_SIDEDNESS_SIGNATURE)?;

        Ok(ModuleInfo {
            density,
            sided: Sidedness::from_bank_count(banks),
            signature: Sidedness::from_signature(signature),
        })
    }

    /// Reads one socket, folding every failure into [`ModuleDescriptor::Absent`].
    pub fn read_descriptor(&mut self, socket: Socket) -> ModuleDescriptor {
        match self.probe(socket) {
            Ok(info) => {
                info!(
                    "DIMM{}: {} MiB per side, {:?}-sided",
                    socket.index(),
                    u32::from(info.density) * 4,
                    info.sided
                );
                ModuleDescriptor::Present(info)
            }
            Err(reason) => {
                debug!("DIMM{}: no module ({reason})", socket.index());
                ModuleDescriptor::Absent
            }
        }
    }

    /// Reads every socket in order.
    pub fn read_all(&mut self) -> [ModuleDescriptor; DIMM_SOCKETS] {
        Socket::ALL.map(|socket| self.read_descriptor(socket))
    }
}
