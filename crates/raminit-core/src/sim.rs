//! In-memory i82810 board.
//!
//! Models the pieces of a board SDRAM init can observe: two SPD EEPROMs on
//! SMBus, the host bridge config space, the memory bus and a microsecond
//! clock. Every access is appended to an ordered log so tests can assert on
//! command order, delivery addresses and delay placement.

use crate::{
    ConfigSpace, Delay, DramBus, SmbusError, SmbusHost, DEFAULT_SPD_BASE, DIMM_SOCKETS, DRAMT,
    DRAMT_SMS_SHIFT, SPD_BANK_DENSITY, SPD_MEMORY_TYPE, SPD_MEMORY_TYPE_SDRAM, SPD_NUM_DIMM_BANKS,
    SPD_SIDEDNESS_SIGNATURE,
};

/// Size of a modeled SPD EEPROM image.
pub const SPD_IMAGE_BYTES: usize = 128;

const SMBUS_BLOCK_MAX: usize = 32;
const CONFIG_SPACE_LEN: usize = 256;

// Bytes 0 and 1 of a JEDEC SPD: bytes written by the vendor, total EEPROM size.
const SPD_BYTES_USED: u8 = 0x80;
const SPD_EEPROM_SIZE_LOG2: u8 = 0x08;

/// Contents of one socket's SPD EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpdImage {
    bytes: Option<[u8; SPD_IMAGE_BYTES]>,
    fault: Option<(u8, SmbusError)>,
}

impl SpdImage {
    /// Empty socket; nothing answers at its address.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: None,
            fault: None,
        }
    }

    /// SDR SDRAM module with the given row density (4 MiB units) and bank
    /// count. Byte 127 carries the dual-sided signature when `banks > 1`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn sdram(density: u8, banks: u8) -> Self {
        let mut bytes = [0; SPD_IMAGE_BYTES];
        bytes[0] = SPD_BYTES_USED;
        bytes[1] = SPD_EEPROM_SIZE_LOG2;
        bytes[SPD_MEMORY_TYPE as usize] = SPD_MEMORY_TYPE_SDRAM;
        bytes[SPD_NUM_DIMM_BANKS as usize] = banks;
        bytes[SPD_BANK_DENSITY as usize] = density;
        bytes[SPD_SIDEDNESS_SIGNATURE as usize] = if banks > 1 { 0xff } else { 0x00 };
        Self::from_bytes(bytes)
    }

    /// Image with explicit contents.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SPD_IMAGE_BYTES]) -> Self {
        Self {
            bytes: Some(bytes),
            fault: None,
        }
    }

    /// Returns a copy with one byte replaced. An empty image becomes a
    /// zero-filled one first.
    #[must_use]
    pub fn with_byte(mut self, offset: u8, value: u8) -> Self {
        let bytes = self.bytes.get_or_insert([0; SPD_IMAGE_BYTES]);
        if let Some(slot) = bytes.get_mut(usize::from(offset)) {
            *slot = value;
        }
        self
    }

    /// Returns a copy whose reads of `offset` fail with `error`.
    #[must_use]
    pub const fn with_fault(mut self, offset: u8, error: SmbusError) -> Self {
        self.fault = Some((offset, error));
        self
    }

    /// Returns `true` when something answers at this socket's address.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.bytes.is_some()
    }

    /// Stored byte, if the image is present and long enough.
    #[must_use]
    pub fn byte(&self, offset: u8) -> Option<u8> {
        self.bytes
            .as_ref()
            .and_then(|bytes| bytes.get(usize::from(offset)).copied())
    }

    fn read(&self, device: u8, offset: u8) -> Result<u8, SmbusError> {
        if let Some((fault_offset, error)) = self.fault {
            if fault_offset == offset {
                return Err(error);
            }
        }
        self.byte(offset).ok_or(SmbusError::Nack { device, offset })
    }
}

/// One observable board access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BoardOp {
    ConfigRead8 { offset: u8 },
    ConfigRead16 { offset: u8 },
    ConfigWrite8 { offset: u8, value: u8 },
    ConfigWrite16 { offset: u8, value: u16 },
    SmbusRead { device: u8, offset: u8 },
    DramRead { addr: u32 },
    Delay { micros: u32 },
}

/// Logged access with the virtual clock value at which it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimedOp {
    /// Virtual time in microseconds.
    pub at: u64,
    /// The access.
    pub op: BoardOp,
}

/// Simulated board implementing every host capability.
#[derive(Debug, Clone)]
pub struct SimBoard {
    config: [u8; CONFIG_SPACE_LEN],
    spd: [SpdImage; DIMM_SOCKETS],
    spd_base: u8,
    clock_micros: u64,
    ops: Vec<TimedOp>,
}

impl SimBoard {
    /// Board with the given SPD images in socket order, zeroed config
    /// space and the SPD EEPROMs at the default base.
    #[must_use]
    pub fn new(dimm0: SpdImage, dimm1: SpdImage) -> Self {
        Self {
            config: [0; CONFIG_SPACE_LEN],
            spd: [dimm0, dimm1],
            spd_base: DEFAULT_SPD_BASE,
            clock_micros: 0,
            ops: Vec::new(),
        }
    }

    /// Moves the SPD EEPROMs to another base address.
    #[must_use]
    pub fn with_spd_base(mut self, spd_base: u8) -> Self {
        self.spd_base = spd_base;
        self
    }

    /// Presets a config byte without logging it.
    pub fn set_config_byte(&mut self, offset: u8, value: u8) {
        self.config[usize::from(offset)] = value;
    }

    /// Current config byte, not logged.
    #[must_use]
    pub fn config_byte(&self, offset: u8) -> u8 {
        self.config[usize::from(offset)]
    }

    /// Full config space snapshot, not logged.
    #[must_use]
    pub const fn config(&self) -> &[u8; CONFIG_SPACE_LEN] {
        &self.config
    }

    /// Every access so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[TimedOp] {
        &self.ops
    }

    /// Drops the access log; the clock keeps running.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Virtual time elapsed through [`Delay::udelay`].
    #[must_use]
    pub const fn clock_micros(&self) -> u64 {
        self.clock_micros
    }

    /// Addresses of every memory-bus read, in order.
    #[must_use]
    pub fn dram_reads(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|timed| match timed.op {
                BoardOp::DramRead { addr } => Some(addr),
                _ => None,
            })
            .collect()
    }

    /// SMS codes written to `DRAMT[7:5]`, in order.
    #[must_use]
    pub fn command_codes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|timed| match timed.op {
                BoardOp::ConfigWrite8 {
                    offset: DRAMT,
                    value,
                } => Some(value >> DRAMT_SMS_SHIFT),
                _ => None,
            })
            .collect()
    }

    /// Every 16-bit config write, in order.
    #[must_use]
    pub fn config_writes16(&self) -> Vec<(u8, u16)> {
        self.ops
            .iter()
            .filter_map(|timed| match timed.op {
                BoardOp::ConfigWrite16 { offset, value } => Some((offset, value)),
                _ => None,
            })
            .collect()
    }

    /// Every requested delay, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|timed| match timed.op {
                BoardOp::Delay { micros } => Some(micros),
                _ => None,
            })
            .collect()
    }

    fn log(&mut self, op: BoardOp) {
        self.ops.push(TimedOp {
            at: self.clock_micros,
            op,
        });
    }

    fn image(&self, device: u8) -> Result<&SpdImage, SmbusError> {
        device
            .checked_sub(self.spd_base)
            .and_then(|index| self.spd.get(usize::from(index)))
            .filter(|image| image.is_present())
            .ok_or(SmbusError::NoDevice { device })
    }
}

impl ConfigSpace for SimBoard {
    fn read8(&mut self, offset: u8) -> u8 {
        self.log(BoardOp::ConfigRead8 { offset });
        self.config[usize::from(offset)]
    }

    fn read16(&mut self, offset: u8) -> u16 {
        self.log(BoardOp::ConfigRead16 { offset });
        u16::from_le_bytes([
            self.config[usize::from(offset)],
            self.config[usize::from(offset.wrapping_add(1))],
        ])
    }

    fn write8(&mut self, offset: u8, value: u8) {
        self.log(BoardOp::ConfigWrite8 { offset, value });
        self.config[usize::from(offset)] = value;
    }

    fn write16(&mut self, offset: u8, value: u16) {
        self.log(BoardOp::ConfigWrite16 { offset, value });
        let [low, high] = value.to_le_bytes();
        self.config[usize::from(offset)] = low;
        self.config[usize::from(offset.wrapping_add(1))] = high;
    }
}

impl DramBus for SimBoard {
    fn read32(&mut self, addr: u32) -> u32 {
        self.log(BoardOp::DramRead { addr });
        0
    }
}

impl Delay for SimBoard {
    fn udelay(&mut self, micros: u32) {
        self.log(BoardOp::Delay { micros });
        self.clock_micros += u64::from(micros);
    }
}

impl SmbusHost for SimBoard {
    fn read_byte(&mut self, device: u8, offset: u8) -> Result<u8, SmbusError> {
        self.log(BoardOp::SmbusRead { device, offset });
        self.image(device)?.read(device, offset)
    }

    fn write_byte(&mut self, device: u8, offset: u8, _value: u8) -> Result<(), SmbusError> {
        self.image(device)?;
        // SPD EEPROMs are write-protected on this board.
        Err(SmbusError::Nack { device, offset })
    }

    fn block_read(&mut self, device: u8, cmd: u8, buf: &mut [u8]) -> Result<usize, SmbusError> {
        if buf.len() > SMBUS_BLOCK_MAX {
            return Err(SmbusError::BlockTooLong { len: buf.len() });
        }
        let image = *self.image(device)?;
        let mut count = 0;
        for (slot, offset) in buf.iter_mut().zip(cmd..=u8::MAX) {
            match image.read(device, offset) {
                Ok(value) => *slot = value,
                Err(SmbusError::Nack { .. }) if count > 0 => break,
                Err(error) => return Err(error),
            }
            self.log(BoardOp::SmbusRead { device, offset });
            count += 1;
        }
        Ok(count)
    }

    fn block_write(&mut self, device: u8, cmd: u8, data: &[u8]) -> Result<(), SmbusError> {
        if data.len() > SMBUS_BLOCK_MAX {
            return Err(SmbusError::BlockTooLong { len: data.len() });
        }
        self.image(device)?;
        Err(SmbusError::Nack {
            device,
            offset: cmd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardOp, SimBoard, SpdImage, SPD_IMAGE_BYTES};
    use crate::{
        ConfigSpace, Delay, DramBus, SmbusError, SmbusHost, BUFF_SC, DRAMT, SPD_BANK_DENSITY,
        SPD_MEMORY_TYPE, SPD_NUM_DIMM_BANKS, SPD_SIDEDNESS_SIGNATURE,
    };

    #[test]
    fn sdram_image_is_self_consistent() {
        let dual = SpdImage::sdram(16, 2);
        assert_eq!(dual.byte(SPD_MEMORY_TYPE), Some(4));
        assert_eq!(dual.byte(SPD_NUM_DIMM_BANKS), Some(2));
        assert_eq!(dual.byte(SPD_BANK_DENSITY), Some(16));
        assert_eq!(dual.byte(SPD_SIDEDNESS_SIGNATURE), Some(0xff));

        let single = SpdImage::sdram(32, 1);
        assert_eq!(single.byte(SPD_SIDEDNESS_SIGNATURE), Some(0x00));
        assert_eq!(single.byte(200), None);
    }

    #[test]
    fn with_byte_fills_an_empty_image() {
        let image = SpdImage::empty().with_byte(3, 0x0c);
        assert!(image.is_present());
        assert_eq!(image.byte(3), Some(0x0c));
        assert_eq!(image.byte(0), Some(0));
    }

    #[test]
    fn smbus_reads_follow_socket_addresses() {
        let mut board = SimBoard::new(SpdImage::empty(), SpdImage::sdram(8, 1));
        assert_eq!(
            board.read_byte(0x50, SPD_MEMORY_TYPE),
            Err(SmbusError::NoDevice { device: 0x50 })
        );
        assert_eq!(board.read_byte(0x51, SPD_BANK_DENSITY), Ok(8));
        assert_eq!(
            board.read_byte(0x4f, 0),
            Err(SmbusError::NoDevice { device: 0x4f })
        );
        assert_eq!(
            board.read_byte(0x51, 0x90),
            Err(SmbusError::Nack {
                device: 0x51,
                offset: 0x90
            })
        );
    }

    #[test]
    fn injected_fault_hits_only_its_offset() {
        let image = SpdImage::sdram(8, 1).with_fault(SPD_BANK_DENSITY, SmbusError::Busy);
        let mut board = SimBoard::new(image, SpdImage::empty());
        assert_eq!(board.read_byte(0x50, SPD_BANK_DENSITY), Err(SmbusError::Busy));
        assert_eq!(board.read_byte(0x50, SPD_MEMORY_TYPE), Ok(4));
    }

    #[test]
    fn spd_is_read_only() {
        let mut board = SimBoard::new(SpdImage::sdram(8, 1), SpdImage::empty());
        assert_eq!(
            board.write_byte(0x50, 0, 1),
            Err(SmbusError::Nack {
                device: 0x50,
                offset: 0
            })
        );
        assert_eq!(
            board.block_write(0x50, 0, &[0; 40]),
            Err(SmbusError::BlockTooLong { len: 40 })
        );
    }

    #[test]
    fn block_read_stops_at_image_end_and_caps_length() {
        let mut board = SimBoard::new(SpdImage::sdram(8, 1), SpdImage::empty());
        let mut buf = [0; 8];
        let tail = u8::try_from(SPD_IMAGE_BYTES - 4).unwrap();
        assert_eq!(board.block_read(0x50, tail, &mut buf), Ok(4));

        let mut too_long = [0; 33];
        assert_eq!(
            board.block_read(0x50, 0, &mut too_long),
            Err(SmbusError::BlockTooLong { len: 33 })
        );

        let mut head = [0; 3];
        assert_eq!(board.block_read(0x50, 0, &mut head), Ok(3));
        assert_eq!(head, [0x80, 0x08, 0x04]);
    }

    #[test]
    fn word_access_is_little_endian() {
        let mut board = SimBoard::new(SpdImage::empty(), SpdImage::empty());
        board.write16(BUFF_SC, 0x1145);
        assert_eq!(board.config_byte(BUFF_SC), 0x45);
        assert_eq!(board.config_byte(BUFF_SC + 1), 0x11);
        assert_eq!(board.read16(BUFF_SC), 0x1145);
    }

    #[test]
    fn log_records_clock_at_each_access() {
        let mut board = SimBoard::new(SpdImage::empty(), SpdImage::empty());
        board.write8(DRAMT, 0x80);
        board.udelay(200);
        board.read32(0x40);

        let stamps: Vec<_> = board.ops().iter().map(|timed| (timed.at, timed.op)).collect();
        assert_eq!(
            stamps,
            vec![
                (0, BoardOp::ConfigWrite8 { offset: DRAMT, value: 0x80 }),
                (0, BoardOp::Delay { micros: 200 }),
                (200, BoardOp::DramRead { addr: 0x40 }),
            ]
        );
        assert_eq!(board.command_codes(), vec![0x4]);
        assert_eq!(board.delays(), vec![200]);
    }

    #[test]
    fn presets_are_not_logged() {
        let mut board = SimBoard::new(SpdImage::empty(), SpdImage::empty());
        board.set_config_byte(DRAMT, 0x15);
        assert!(board.ops().is_empty());
        board.clear_ops();
        assert_eq!(board.clock_micros(), 0);
    }
}
