//! Boot-time entry points.
//!
//! Two stages run back to back: SPD probing programs `DRP` and `BUFF_SC`,
//! then the enable stage walks the power-up sequence. Each stage reads the
//! SPDs itself; nothing is cached between them.

use log::info;

use crate::{
    dump_config_space, encode_buffer_strength, encode_row_population, CommandSequencer,
    ConfigError, ConfigSpace, Delay, DramBus, InitReport, Northbridge, RamInitConfig,
    RamInitHost, RowPopulation, SequenceStats, SmbusHost, SpdReader,
};

/// Register values written by [`set_spd_registers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpdProgramming {
    /// Value written to `DRP`.
    pub row_population: RowPopulation,
    /// Value written to `BUFF_SC`.
    pub buffer_strength: u16,
    /// Modules clamped to 128 MiB per side.
    pub clamped_sockets: u8,
}

/// Probes both sockets and programs `DRP`, then `BUFF_SC`.
pub fn set_spd_registers<H: SmbusHost + ConfigSpace + ?Sized>(
    host: &mut H,
    config: &RamInitConfig,
) -> SpdProgramming {
    let descriptors = SpdReader::new(&mut *host, config.spd_base).read_all();
    let encoding = encode_row_population(&descriptors);
    Northbridge::new(&mut *host).set_row_population(encoding.value);
    info!("DRP calculated to {:#04x}", encoding.value.raw());

    let descriptors = SpdReader::new(&mut *host, config.spd_base).read_all();
    let buffer_strength = encode_buffer_strength(&descriptors);
    Northbridge::new(&mut *host).set_buffer_strength(buffer_strength);

    SpdProgramming {
        row_population: encoding.value,
        buffer_strength,
        clamped_sockets: encoding.clamped_sockets,
    }
}

/// Runs the power-up command sequence against the programmed `DRP`.
pub fn sdram_enable<H: ConfigSpace + DramBus + Delay + ?Sized>(
    host: &mut H,
    config: &RamInitConfig,
) -> SequenceStats {
    CommandSequencer::new(host, config.cas_latency).run(config.refresh)
}

/// Full SDRAM bring-up: validate, program from SPD, enable.
///
/// # Errors
///
/// Returns [`ConfigError`] when `config` is rejected; no register has been
/// touched in that case. Missing or unreadable modules are not errors.
pub fn sdram_initialize<H: RamInitHost + ?Sized>(
    host: &mut H,
    config: &RamInitConfig,
) -> Result<InitReport, ConfigError> {
    config.validate()?;

    let programming = set_spd_registers(host, config);
    let stats = sdram_enable(host, config);

    if config.dump_northbridge {
        dump_config_space(host);
    }

    let total_mb = programming.row_population.total_mb();
    info!("SDRAM enabled, top of memory {total_mb} MiB");

    Ok(InitReport {
        row_population: programming.row_population,
        buffer_strength: programming.buffer_strength,
        total_mb,
        commands_issued: stats.commands,
        dram_accesses: stats.dram_accesses,
        clamped_sockets: programming.clamped_sockets,
        total_settle_micros: stats.settle_micros,
    })
}

#[cfg(test)]
mod tests {
    use super::{sdram_initialize, set_spd_registers};
    use crate::{
        BoardOp, ConfigError, InitReport, RamInitConfig, RowPopulation, SimBoard, SpdImage,
        BUFF_SC, CONFIG_SPACE_BYTES, DRP, SPD_MEMORY_TYPE,
    };

    #[test]
    fn programs_drp_before_buff_sc() {
        let mut board = SimBoard::new(SpdImage::sdram(32, 1), SpdImage::sdram(32, 1));
        let programming = set_spd_registers(&mut board, &RamInitConfig::default());

        assert_eq!(programming.row_population.raw(), 0xdd);
        assert_eq!(programming.buffer_strength, 0x55c6);

        let writes: Vec<_> = board
            .ops()
            .iter()
            .filter(|timed| {
                matches!(
                    timed.op,
                    BoardOp::ConfigWrite8 { .. } | BoardOp::ConfigWrite16 { .. }
                )
            })
            .map(|timed| timed.op)
            .collect();
        assert_eq!(
            writes,
            vec![
                BoardOp::ConfigWrite8 {
                    offset: DRP,
                    value: 0xdd
                },
                BoardOp::ConfigWrite16 {
                    offset: BUFF_SC,
                    value: 0x55c6
                },
            ]
        );
    }

    #[test]
    fn each_stage_reads_spd_afresh() {
        let mut board = SimBoard::new(SpdImage::sdram(16, 2), SpdImage::empty());
        set_spd_registers(&mut board, &RamInitConfig::default());

        let type_reads = board
            .ops()
            .iter()
            .filter(|timed| {
                timed.op
                    == BoardOp::SmbusRead {
                        device: 0x50,
                        offset: SPD_MEMORY_TYPE,
                    }
            })
            .count();
        assert_eq!(type_reads, 2);
    }

    #[test]
    fn full_run_reports_two_single_sided_modules() {
        let mut board = SimBoard::new(SpdImage::sdram(32, 1), SpdImage::sdram(32, 1));
        let report = sdram_initialize(&mut board, &RamInitConfig::default()).unwrap();

        assert_eq!(
            report,
            InitReport {
                row_population: RowPopulation::from_raw(0xdd),
                buffer_strength: 0x55c6,
                total_mb: 256,
                commands_issued: 12,
                dram_accesses: 22,
                clamped_sockets: 0,
                total_settle_micros: 212,
            }
        );
        assert_eq!(board.clock_micros(), 212);
    }

    #[test]
    fn rejected_config_touches_nothing() {
        let mut board = SimBoard::new(SpdImage::sdram(32, 1), SpdImage::empty());
        let config = RamInitConfig {
            spd_base: 0x60,
            ..RamInitConfig::default()
        };

        assert_eq!(
            sdram_initialize(&mut board, &config),
            Err(ConfigError::SpdBaseOutOfRange(0x60))
        );
        assert!(board.ops().is_empty());
    }

    #[test]
    fn dump_runs_after_the_sequence() {
        let mut board = SimBoard::new(SpdImage::sdram(16, 2), SpdImage::empty());
        let config = RamInitConfig {
            dump_northbridge: true,
            ..RamInitConfig::default()
        };
        sdram_initialize(&mut board, &config).unwrap();

        let ops = board.ops();
        let tail = &ops[ops.len() - CONFIG_SPACE_BYTES..];
        assert!(tail
            .iter()
            .all(|timed| matches!(timed.op, BoardOp::ConfigRead8 { .. })));
        assert!(matches!(
            ops[ops.len() - CONFIG_SPACE_BYTES - 1].op,
            BoardOp::Delay { micros: 1 }
        ));
    }
}
