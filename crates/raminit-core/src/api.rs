//! Host capability contracts and initialization configuration.
//!
//! The boot stage owns every register it touches, so each capability is
//! taken as `&mut` and threaded through the call chain instead of living in
//! global state.

use crate::{ConfigError, SmbusError, DIMM_SOCKETS};

/// SMBus address of the SPD EEPROM in socket 0.
pub const DEFAULT_SPD_BASE: u8 = 0x50;

/// Last address of the SPD EEPROM address window.
pub const SPD_ADDRESS_END: u8 = 0x57;

/// Byte and word access to the host bridge (bus 0, device 0, function 0)
/// configuration space.
pub trait ConfigSpace {
    /// Reads one configuration byte.
    fn read8(&mut self, offset: u8) -> u8;

    /// Reads one little-endian configuration word.
    fn read16(&mut self, offset: u8) -> u16;

    /// Writes one configuration byte.
    fn write8(&mut self, offset: u8, value: u8);

    /// Writes one little-endian configuration word in a single access.
    fn write16(&mut self, offset: u8, value: u16);
}

/// Physical memory bus as seen by the CPU during SDRAM init.
///
/// While the controller is in a command mode, a read is what delivers the
/// selected command to the DIMM row decoded from the address.
pub trait DramBus {
    /// Issues one 32-bit read at a physical address.
    fn read32(&mut self, addr: u32) -> u32;
}

/// Blocking delay primitive.
pub trait Delay {
    /// Blocks for at least `micros` microseconds.
    fn udelay(&mut self, micros: u32);
}

/// SMBus transaction provider.
pub trait SmbusHost {
    /// Reads one byte from `offset` of `device`.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`SmbusError`] when the transaction fails.
    fn read_byte(&mut self, device: u8, offset: u8) -> Result<u8, SmbusError>;

    /// Writes one byte to `offset` of `device`.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`SmbusError`] when the transaction fails.
    fn write_byte(&mut self, device: u8, offset: u8, value: u8) -> Result<(), SmbusError>;

    /// Reads a block starting at command `cmd` into `buf`, returning the
    /// number of bytes transferred.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`SmbusError`] when the transaction fails.
    fn block_read(&mut self, device: u8, cmd: u8, buf: &mut [u8]) -> Result<usize, SmbusError>;

    /// Writes `data` as a block starting at command `cmd`.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`SmbusError`] when the transaction fails.
    fn block_write(&mut self, device: u8, cmd: u8, data: &[u8]) -> Result<(), SmbusError>;
}

/// Everything [`crate::sdram_initialize`] needs from the platform.
pub trait RamInitHost: SmbusHost + ConfigSpace + DramBus + Delay {}

impl<T: SmbusHost + ConfigSpace + DramBus + Delay + ?Sized> RamInitHost for T {}

/// CAS latency encoded into the mode-register-set address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CasLatency {
    /// Two clocks.
    Cl2,
    /// Three clocks, the slowest the controller supports.
    #[default]
    Cl3,
}

impl CasLatency {
    /// Converts a latency in clocks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedCasLatency`] for anything but 2 or 3.
    pub const fn from_cycles(cycles: u8) -> Result<Self, ConfigError> {
        match cycles {
            2 => Ok(Self::Cl2),
            3 => Ok(Self::Cl3),
            other => Err(ConfigError::UnsupportedCasLatency(other)),
        }
    }

    /// Latency in clocks.
    #[must_use]
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Cl2 => 2,
            Self::Cl3 => 3,
        }
    }
}

/// Refresh mode selected by the normal-operation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RefreshRate {
    /// 15.6/11.7 us refresh at 100/133 MHz (`DRAMT[7:5] = 001`).
    #[default]
    Standard,
    /// 7.8/5.85 us refresh at 100/133 MHz (`DRAMT[7:5] = 010`).
    Fast,
}

impl RefreshRate {
    /// `DRAMT[7:5]` mode-select code for this refresh mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Standard => 0x1,
            Self::Fast => 0x2,
        }
    }
}

/// Boot-time configuration for one initialization run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RamInitConfig {
    /// SMBus address of socket 0's SPD; socket `i` answers at `spd_base + i`.
    pub spd_base: u8,
    /// CAS latency programmed through the MRS address.
    pub cas_latency: CasLatency,
    /// Refresh mode entered at the end of the sequence.
    pub refresh: RefreshRate,
    /// Logs the host bridge config space once the sequence completes.
    pub dump_northbridge: bool,
}

impl Default for RamInitConfig {
    fn default() -> Self {
        Self {
            spd_base: DEFAULT_SPD_BASE,
            cas_latency: CasLatency::Cl3,
            refresh: RefreshRate::Standard,
            dump_northbridge: false,
        }
    }
}

impl RamInitConfig {
    /// Checks that every socket's SPD address falls in the EEPROM window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SpdBaseOutOfRange`] when the first or last
    /// socket would fall outside `0x50..=0x57`.
    #[allow(clippy::cast_lossless)]
    pub const fn validate(&self) -> Result<(), ConfigError> {
        let last = self.spd_base as usize + DIMM_SOCKETS - 1;
        if self.spd_base < DEFAULT_SPD_BASE || last > SPD_ADDRESS_END as usize {
            return Err(ConfigError::SpdBaseOutOfRange(self.spd_base));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CasLatency, RamInitConfig, RefreshRate, DEFAULT_SPD_BASE};
    use crate::ConfigError;

    #[test]
    fn default_config_uses_slowest_cas_and_standard_refresh() {
        let config = RamInitConfig::default();
        assert_eq!(config.spd_base, DEFAULT_SPD_BASE);
        assert_eq!(config.cas_latency, CasLatency::Cl3);
        assert_eq!(config.refresh, RefreshRate::Standard);
        assert!(!config.dump_northbridge);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn spd_base_must_keep_both_sockets_in_window() {
        let top = RamInitConfig {
            spd_base: 0x56,
            ..RamInitConfig::default()
        };
        assert_eq!(top.validate(), Ok(()));

        let past_end = RamInitConfig {
            spd_base: 0x57,
            ..RamInitConfig::default()
        };
        assert_eq!(
            past_end.validate(),
            Err(ConfigError::SpdBaseOutOfRange(0x57))
        );

        let below = RamInitConfig {
            spd_base: 0x18,
            ..RamInitConfig::default()
        };
        assert_eq!(below.validate(), Err(ConfigError::SpdBaseOutOfRange(0x18)));
    }

    #[test]
    fn cas_latency_accepts_only_two_and_three() {
        assert_eq!(CasLatency::from_cycles(2), Ok(CasLatency::Cl2));
        assert_eq!(CasLatency::from_cycles(3), Ok(CasLatency::Cl3));
        assert_eq!(
            CasLatency::from_cycles(4),
            Err(ConfigError::UnsupportedCasLatency(4))
        );
        assert_eq!(CasLatency::Cl3.cycles(), 3);
    }

    #[test]
    fn refresh_codes_match_dramt_mode_select() {
        assert_eq!(RefreshRate::Standard.code(), 0x1);
        assert_eq!(RefreshRate::Fast.code(), 0x2);
    }
}
