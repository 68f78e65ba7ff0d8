//! i82810 host bridge registers touched by SDRAM init.

use crate::{ConfigSpace, RowPopulation};

/// DRAM Row Population register: one 4-bit geometry code per socket.
pub const DRP: u8 = 0x52;
/// DRAM Timing register; `[7:5]` is the SDRAM mode select (SMS).
pub const DRAMT: u8 = 0x53;
/// System memory buffer strength control (16-bit).
pub const BUFF_SC: u8 = 0x92;

/// Shift of the SMS command field inside `DRAMT`.
pub const DRAMT_SMS_SHIFT: u8 = 5;
/// `DRAMT` bits left untouched when a command is selected.
pub const DRAMT_PRESERVED_MASK: u8 = 0x1f;

/// Number of DIMM sockets on the board.
pub const DIMM_SOCKETS: usize = 2;

/// Physical DIMM socket, in DRP nibble order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Socket {
    Dimm0 = 0,
    Dimm1 = 1,
}

impl Socket {
    /// All sockets in ascending address order.
    pub const ALL: [Self; DIMM_SOCKETS] = [Self::Dimm0, Self::Dimm1];

    /// Zero-based socket index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// SMBus address of this socket's SPD EEPROM.
    #[must_use]
    pub const fn spd_address(self, spd_base: u8) -> u8 {
        spd_base.wrapping_add(self as u8)
    }

    /// Bit offset of this socket's nibble inside `DRP`.
    #[must_use]
    pub const fn drp_shift(self) -> u8 {
        (self as u8) * 4
    }
}

/// Typed register port over the host bridge config space.
///
/// Borrowed for the duration of a single register operation; every read
/// goes to the hardware.
pub struct Northbridge<'a, C: ConfigSpace + ?Sized> {
    config: &'a mut C,
}

impl<'a, C: ConfigSpace + ?Sized> Northbridge<'a, C> {
    /// Wraps a config-space port.
    pub fn new(config: &'a mut C) -> Self {
        Self { config }
    }

    /// Reads the live `DRP` value.
    pub fn row_population(&mut self) -> RowPopulation {
        RowPopulation::from_raw(self.config.read8(DRP))
    }

    /// Programs `DRP`.
    pub fn set_row_population(&mut self, value: RowPopulation) {
        self.config.write8(DRP, value.raw());
    }

    /// Reads `BUFF_SC`.
    pub fn buffer_strength(&mut self) -> u16 {
        self.config.read16(BUFF_SC)
    }

    /// Programs `BUFF_SC` in one 16-bit write.
    pub fn set_buffer_strength(&mut self, value: u16) {
        self.config.write16(BUFF_SC, value);
    }

    /// Loads a 3-bit SMS code into `DRAMT[7:5]`, keeping `DRAMT[4:0]`.
    ///
    /// Returns the value written.
    pub fn select_command(&mut self, code: u8) -> u8 {
        let dramt = (self.config.read8(DRAMT) & DRAMT_PRESERVED_MASK)
            | ((code & 0x07) << DRAMT_SMS_SHIFT);
        self.config.write8(DRAMT, dramt);
        dramt
    }
}
