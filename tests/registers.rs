//! Register transactions and configuration setters against a scripted bus

mod common;

use common::{MockPin, MockSpi};
use max30009::{configs::CurrentAmplitude, ll, Error, MAX30009};

#[test]
fn staged_writes_land_and_read_back() {
    let mut device = ll::MAX30009::new(MockSpi::new(), MockPin::new());

    for &address in &ll::REGISTER_ADDRESSES {
        device.stage_register(address, 0xA5).unwrap();
        device.write_register(address).unwrap();
        assert_eq!(device.read_register(address).unwrap(), 0xA5);
        assert_eq!(device.shadow(address), Some((0xA5, 0xA5)));
    }
}

#[test]
fn unknown_addresses_never_reach_the_bus() {
    let mut device = ll::MAX30009::new(MockSpi::new(), MockPin::new());

    assert!(matches!(
        device.read_register(0x05),
        Err(ll::Error::InvalidAddress { address: 0x05 }),
    ));
    assert!(matches!(
        device.stage_register(0x05, 0xFF),
        Err(ll::Error::InvalidAddress { address: 0x05 }),
    ));

    let (spi, _) = device.free();
    assert_eq!(spi.transfers, 0);
}

#[test]
fn transient_write_corruption_is_retried_away() {
    let mut spi = MockSpi::new();
    spi.fail_writes = 2;

    let mut device = ll::MAX30009::new(spi, MockPin::new());
    device.stage_register(0x20, 0x3F).unwrap();
    device.write_register(0x20).unwrap();

    assert_eq!(device.read_register(0x20).unwrap(), 0x3F);
}

#[test]
fn persistent_write_corruption_reports_the_address() {
    let mut spi = MockSpi::new();
    spi.fail_writes = usize::MAX;

    let mut device = ll::MAX30009::new(spi, MockPin::new());
    device.stage_register(0x20, 0x3F).unwrap();

    assert!(matches!(
        device.write_register(0x20),
        Err(ll::Error::WriteVerify { address: 0x20 }),
    ));
}

#[test]
fn demodulation_setter_inverts_into_the_disable_bit() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());

    bioz.set_demodulation(true).unwrap();
    assert!(bioz.bioz_state().demodulation);

    bioz.set_demodulation(false).unwrap();
    assert!(!bioz.bioz_state().demodulation);

    let (spi, _) = bioz.free();
    assert_eq!(spi.mem[0x24] & 0x04, 0x04);
}

#[test]
fn current_amplitude_fails_over_at_low_drive_frequencies() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());

    // 100 Hz, far below the floor of every restricted amplitude
    bioz.set_drive_frequency(1_000, 1_000).unwrap();
    let programmed = bioz
        .set_constant_current_mode(CurrentAmplitude::Amp1_28mA)
        .unwrap();

    assert_eq!(programmed, CurrentAmplitude::Amp64uA);
    assert_eq!(bioz.bioz_state().current, CurrentAmplitude::Amp64uA);

    let (spi, _) = bioz.free();
    assert_eq!(spi.mem[0x22] & 0x03, 0x00);
    assert_eq!((spi.mem[0x22] >> 2) & 0x03, 0x02);
    assert_eq!((spi.mem[0x22] >> 4) & 0x03, 0x03);
}

#[test]
fn fifo_threshold_is_programmed_as_free_slots() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());
    bioz.set_fifo_full_threshold(250).unwrap();

    let (spi, _) = bioz.free();
    assert_eq!(spi.mem[0x0D], 6);
}

#[test]
fn out_of_range_drive_frequency_commits_nothing() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());

    assert!(matches!(
        bioz.set_drive_frequency(100, 1_000),
        Err(Error::DriveFrequencyOutOfRange),
    ));

    let (spi, _) = bioz.free();
    assert_eq!(spi.transfers, 0);
}

#[test]
fn commit_failure_still_stages_the_whole_solution() {
    let mut clean = MAX30009::new(MockSpi::new(), MockPin::new());
    clean.set_drive_frequency(10_000, 3_000).unwrap();

    let mut spi = MockSpi::new();
    spi.fail_writes = usize::MAX;
    let mut failing = MAX30009::new(spi, MockPin::new());
    assert!(failing.set_drive_frequency(10_000, 3_000).is_err());

    // Even though no write verified, the shadows hold the complete
    // divider solution, never a partially staged one.
    for &address in &[0x17u8, 0x18, 0x20, 0x28] {
        let staged = failing.ll().shadow(address).unwrap().1;
        let committed = clean.ll().shadow(address).unwrap().1;
        assert_eq!(staged, committed, "address {:#04x}", address);
    }
}

#[test]
fn committed_clock_tree_matches_the_solution() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());

    let solution = bioz.set_drive_frequency(10_000, 3_000).unwrap();
    let clocks = bioz.clocks();

    assert_eq!(clocks.drive_freq, solution.drive_freq);
    assert_eq!(clocks.sample_rate, solution.sample_rate);
    assert_eq!(clocks.pll_clk, solution.pll_clk);
    assert_eq!(clocks.mdiv, solution.mdiv);
}

#[test]
fn status_decodes_both_banks() {
    let mut spi = MockSpi::new();
    spi.mem[0x01] = 0x90; // lead-on and drive out-of-range

    let mut bioz = MAX30009::new(spi, MockPin::new());
    let status = bioz.status().unwrap();

    assert!(status.power_ready);
    assert!(status.fifo_full);
    assert!(status.lead_on);
    assert!(status.drive_out_of_range);
    assert!(!status.phase_locked);
    assert!(!status.bioz_over_range);
}
