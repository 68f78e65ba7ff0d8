#![no_main]

use libfuzzer_sys::fuzz_target;
use raminit_core::{
    sdram_initialize, RamInitConfig, SimBoard, SpdImage, INIT_SEQUENCE_LEN, SPD_IMAGE_BYTES,
};

fn image(bytes: &[u8]) -> SpdImage {
    let mut raw = [0; SPD_IMAGE_BYTES];
    for (slot, byte) in raw.iter_mut().zip(bytes) {
        *slot = *byte;
    }
    SpdImage::from_bytes(raw)
}

fuzz_target!(|data: &[u8]| {
    let (first, rest) = data.split_at(data.len().min(SPD_IMAGE_BYTES));
    let mut board = SimBoard::new(image(first), image(rest));

    let Ok(report) = sdram_initialize(&mut board, &RamInitConfig::default()) else {
        return;
    };

    let drp = report.row_population.raw();
    assert_ne!(drp & 0x0f, 2);
    assert_ne!(drp >> 4, 2);
    assert_eq!(board.command_codes().len(), INIT_SEQUENCE_LEN);
    assert!(report.total_mb <= 512);
});
