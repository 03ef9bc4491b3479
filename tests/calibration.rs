//! The calibration state machine run against the scripted bus
//!
//! The mock serves fixed queue data per pass: offsets of 10 and 6 codes, and
//! a reference reading whose I/Q projections swap between the in-phase and
//! quadrature passes. The expected coefficients follow from the conversion
//! math at 64 µA and gain 1.

mod common;

use common::{MockPin, MockSpi};
use max30009::{
    configs::{CurrentAmplitude, TotalGain},
    fifo::{ChannelTag, Sample},
    CalibSource, CalibState, CalibrationRecord, MAX30009,
};

fn started_device(reference_ohms: f32) -> MAX30009<MockSpi, MockPin> {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());
    bioz.start_calibration(
        CalibSource::CalibrationPath,
        reference_ohms,
        CurrentAmplitude::Amp64uA,
        100_000,
        TotalGain::X1,
    );
    bioz
}

fn run_to_ready(bioz: &mut MAX30009<MockSpi, MockPin>) {
    for _ in 0..100 {
        if bioz.poll_calibration().unwrap() == CalibState::Ready {
            return;
        }
    }
    panic!("calibration did not reach Ready");
}

#[test]
fn full_run_reaches_ready_with_the_expected_record() {
    let mut bioz = started_device(100.0);
    run_to_ready(&mut bioz);

    let record = bioz.calibration();
    assert_eq!(record.state, CalibState::Ready);
    assert_eq!(record.i_offset, 10);
    assert_eq!(record.q_offset, 6);

    // 1000 codes at 64 µA peak and gain 1 convert to 33.10 Ω, 500 to 16.55 Ω
    assert!((record.i_in_phase - 33.10).abs() < 0.02);
    assert!((record.q_in_phase - 16.55).abs() < 0.02);
    assert!((record.i_quadrature - 16.55).abs() < 0.02);
    assert!((record.q_quadrature - 33.10).abs() < 0.02);

    // sqrt(33.10^2 + 16.55^2) / 100, with slack for the approximate sqrt
    assert!((record.i_coef - 0.3701).abs() < 0.01);
    assert!((record.q_coef - 0.3701).abs() < 0.01);

    assert!((record.i_phase_deg - 26.57).abs() < 1.0);
}

#[test]
fn coefficients_scale_inversely_with_the_reference() {
    let mut first = started_device(100.0);
    run_to_ready(&mut first);

    let mut second = started_device(200.0);
    run_to_ready(&mut second);

    let ratio = first.calibration().i_coef / second.calibration().i_coef;
    assert!((ratio - 2.0).abs() < 1e-3);
}

#[test]
fn measurement_current_survives_into_the_record() {
    let mut bioz = started_device(100.0);
    run_to_ready(&mut bioz);

    // 10 kHz is above every amplitude floor, so no fail-over happened
    assert_eq!(bioz.calibration().current, CurrentAmplitude::Amp64uA);
    assert_eq!(bioz.calibration().gain, TotalGain::X1);
}

#[test]
fn stop_request_parks_the_paths() {
    let mut bioz = started_device(100.0);
    for _ in 0..3 {
        bioz.poll_calibration().unwrap();
    }

    bioz.request_calibration_stop();
    assert_eq!(bioz.poll_calibration().unwrap(), CalibState::Stopped);
    assert_eq!(bioz.calibration_state(), CalibState::Stopped);

    let (spi, _) = bioz.free();
    // MUX_EN, CAL_EN, CONNECT_CAL_ONLY and BIST all off again
    assert_eq!(spi.mem[0x41] & 0x27, 0);
    // Driver parked in standby
    assert_eq!(spi.mem[0x22] & 0x03, 0x03);
}

#[test]
fn failed_abort_writes_keep_the_stop_request_armed() {
    // Exactly one verify cycle's worth of corruption: the first shutdown
    // write exhausts its retries, then the bus recovers.
    let mut spi = MockSpi::new();
    spi.fail_writes = 30;

    let mut bioz = MAX30009::new(spi, MockPin::new());
    bioz.start_calibration(
        CalibSource::CalibrationPath,
        100.0,
        CurrentAmplitude::Amp64uA,
        100_000,
        TotalGain::X1,
    );
    bioz.request_calibration_stop();

    assert!(bioz.poll_calibration().is_err());
    assert_ne!(bioz.calibration_state(), CalibState::Stopped);

    // The request survives the error; the next poll aborts instead of
    // resuming the run.
    assert_eq!(bioz.poll_calibration().unwrap(), CalibState::Stopped);
    assert_eq!(bioz.calibration_state(), CalibState::Stopped);

    let (spi, _) = bioz.free();
    assert_eq!(spi.mem[0x41] & 0x27, 0);
}

#[test]
fn restored_records_are_used_as_is() {
    let mut bioz = MAX30009::new(MockSpi::new(), MockPin::new());

    let mut record = CalibrationRecord::default();
    record.state = CalibState::Ready;
    record.i_offset = 42;
    bioz.restore_calibration(record);

    assert_eq!(bioz.calibration_state(), CalibState::Ready);
    assert_eq!(bioz.calibration().i_offset, 42);
}

#[test]
fn default_record_passes_readings_through() {
    let record = CalibrationRecord::default();

    let in_phase = Sample {
        tag: ChannelTag::InPhase,
        value: 1_000,
        impedance: 5_000,
        voltage: 0,
    };
    let quadrature = Sample {
        tag: ChannelTag::Quadrature,
        value: 0,
        impedance: 2_500,
        voltage: 0,
    };

    let corrected = record.apply(&in_phase, &quadrature);
    assert!(!corrected.overload);
    assert!((corrected.real - 25.0).abs() < 1e-3);
    assert!(corrected.imag.abs() < 1e-3);
    assert!((corrected.magnitude - 25.0).abs() < 0.3);
}

#[test]
fn adc_codes_outside_the_safe_range_flag_overload() {
    let record = CalibrationRecord::default();

    let in_phase = Sample {
        tag: ChannelTag::InPhase,
        value: 600_000,
        impedance: 5_000,
        voltage: 0,
    };
    let quadrature = Sample {
        tag: ChannelTag::Quadrature,
        value: 0,
        impedance: 2_500,
        voltage: 0,
    };

    assert!(record.apply(&in_phase, &quadrature).overload);
}
