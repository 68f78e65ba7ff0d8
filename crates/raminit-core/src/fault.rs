use thiserror::Error;

/// Failure surface of the SMBus transaction provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SmbusError {
    /// Nothing answered at the device address.
    #[error("no device at smbus address {device:#04x}")]
    NoDevice {
        /// 7-bit device address.
        device: u8,
    },
    /// Device answered its address but refused the register offset or data.
    #[error("device {device:#04x} did not acknowledge offset {offset:#04x}")]
    Nack {
        /// 7-bit device address.
        device: u8,
        /// Register or command offset.
        offset: u8,
    },
    /// Transaction did not complete in time.
    #[error("smbus transaction timed out")]
    Timeout,
    /// Host controller was still busy with a previous transaction.
    #[error("smbus host controller busy")]
    Busy,
    /// Block transfer longer than the SMBus 32-byte limit.
    #[error("block transfer of {len} bytes exceeds the 32-byte smbus limit")]
    BlockTooLong {
        /// Requested transfer length.
        len: usize,
    },
}

/// Why a DIMM socket is treated as empty.
///
/// Absence is never an error for the boot path; the reason only feeds
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AbsenceReason {
    /// The SPD EEPROM did not answer one of the required reads.
    #[error("spd read failed: {0}")]
    NoResponse(SmbusError),
    /// SPD answered with a memory type other than SDRAM.
    #[error("unsupported memory type {0:#04x}")]
    UnsupportedType(u8),
}

impl From<SmbusError> for AbsenceReason {
    fn from(error: SmbusError) -> Self {
        Self::NoResponse(error)
    }
}

/// Rejected initialization configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// SPD base leaves a socket address outside `0x50..=0x57`.
    #[error("spd base address {0:#04x} puts a socket outside 0x50..=0x57")]
    SpdBaseOutOfRange(u8),
    /// CAS latency the MRS address table has no encoding for.
    #[error("cas latency {0} is not supported (expected 2 or 3)")]
    UnsupportedCasLatency(u8),
}
