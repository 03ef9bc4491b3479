//! Vector calibration of the measurement path
//!
//! The chip's I/Q readings carry a gain and phase error that depends on the
//! active stimulus frequency, current and gain. Calibration measures a known
//! reference resistance in three passes and derives per-channel correction
//! coefficients from it: one pass with both demodulation clocks at their
//! nominal phase to capture the channel offsets, one pass per channel with
//! the other channel's clock inverted to separate the in-phase and
//! quadrature projections.
//!
//! The procedure is driven by [`MAX30009::poll_calibration`], which advances
//! a state machine one step per call and never blocks. Settling time between
//! steps is expressed in poll ticks, so the caller decides the tick duration
//! by how often it polls.

use embedded_hal::{blocking::spi, digital::v2::OutputPin};
use micromath::F32Ext;
use serde::{Deserialize, Serialize};

use crate::{
    configs::{
        AmplifierMode, BistLoad, CurrentAmplitude, DigitalHpFilter, DigitalLpFilter,
        FastStartMode, InputHpFilter, LeadBiasResistance, NegativeElectrode,
        PositiveElectrode, ReferenceClockSource, TotalGain,
    },
    fifo::Sample,
};

use super::{Error, MAX30009};

/// ADC codes beyond this magnitude are treated as overloaded
pub const ADC_SAFE_RANGE: i32 = 500_000;

/// Sample rate requested while calibrating, in tenths of hertz
const CALIB_SAMPLE_RATE: u32 = 3_000;

/// Queue fill that ends a measurement wait, in samples
const CALIB_FIFO_THRESHOLD: u16 = 250;

/// Poll ticks to sit out after reconfiguring the analog path
const SETTLE_TICKS: u32 = 5;

/// Poll ticks to sit out after the stimulus driver comes out of reset
const DRIVE_SETTLE_TICKS: u32 = 15;

/// Where the calibration stimulus is routed
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CalibSource {
    /// Through the dedicated calibration port, against an external reference
    CalibrationPath,
    /// Through the measurement electrodes, against a reference in the fixture
    MeasurementPath,
}

/// Progress of the calibration state machine
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CalibState {
    /// No calibration has been run or restored
    NoData,
    /// A run was requested and is about to begin
    NeedCalibration,
    /// Reference path connected, about to configure the channel
    PreStart,
    /// Channel configured for the offset pass
    StartOffset,
    /// Offset pass measured and recorded
    MeasureOffset,
    /// Stimulus running, clocks set for the in-phase pass
    StartInPhase,
    /// In-phase pass measured and recorded
    MeasureInPhase,
    /// Clocks set for the quadrature pass
    StartQuadrature,
    /// Quadrature pass measured and recorded
    MeasureQuadrature,
    /// Coefficients derived from the three passes
    CalculateCoefficients,
    /// Paths shut down, record complete
    PreReady,
    /// Calibration is valid and in use
    Ready,
    /// The run was aborted on request
    Stopped,
    /// Transient: waiting out a settling delay
    InDelay,
    /// Transient: waiting for the sample queue to fill
    WaitForFullQueue,
}

/// The result of applying a calibration to one I/Q sample pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibratedImpedance {
    /// Raw in-phase impedance in ohms, before correction
    pub i_load: f32,
    /// Raw quadrature impedance in ohms, before correction
    pub q_load: f32,
    /// Corrected resistance in ohms
    pub real: f32,
    /// Corrected reactance in ohms
    pub imag: f32,
    /// Corrected impedance magnitude in ohms
    pub magnitude: f32,
    /// Corrected impedance angle in degrees
    pub angle_deg: f32,
    /// Either channel's ADC code was outside the safe range
    pub overload: bool,
}

/// Everything a calibration run produces
///
/// The record is plain data and serializable, so a host can persist it and
/// hand it back through [`MAX30009::restore_calibration`] instead of
/// re-running the procedure after every power cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Where the state machine currently stands
    pub state: CalibState,
    /// Stimulus routing for this run
    pub source: CalibSource,
    /// The known reference resistance, in ohms
    pub reference_ohms: f32,
    /// Stimulus current for the measurement passes
    pub current: CurrentAmplitude,
    /// Channel gain the run was made with
    pub gain: TotalGain,
    /// Drive frequency the run was made at, in tenths of hertz
    pub frequency: u32,

    /// In-phase channel offset, in ADC codes
    pub i_offset: i32,
    /// Quadrature channel offset, in ADC codes
    pub q_offset: i32,

    /// In-phase reading of the in-phase pass, in ohms
    pub i_in_phase: f32,
    /// Quadrature reading of the in-phase pass, in ohms
    pub q_in_phase: f32,
    /// In-phase reading of the quadrature pass, in ohms
    pub i_quadrature: f32,
    /// Quadrature reading of the quadrature pass, in ohms
    pub q_quadrature: f32,

    /// In-phase gain correction, dimensionless
    pub i_coef: f32,
    /// Quadrature gain correction, dimensionless
    pub q_coef: f32,
    /// In-phase channel phase error, in degrees
    pub i_phase_deg: f32,
    /// Quadrature channel phase error, in degrees
    pub q_phase_deg: f32,
    /// Cosine of the in-phase phase error
    pub i_phase_cos: f32,
    /// Sine of the in-phase phase error
    pub i_phase_sin: f32,
    /// Cosine of the quadrature phase error
    pub q_phase_cos: f32,
    /// Sine of the quadrature phase error
    pub q_phase_sin: f32,

    /// Channel samples consumed by the most recent measurement pass
    pub consumed_samples: u16,

    delay_ticks: u32,
    wait_queue_full: bool,
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        CalibrationRecord {
            state: CalibState::NoData,
            source: CalibSource::CalibrationPath,
            reference_ohms: 100.0,
            current: CurrentAmplitude::Amp64uA,
            gain: TotalGain::X1,
            frequency: 100_000,
            i_offset: 0,
            q_offset: 0,
            i_in_phase: 0.0,
            q_in_phase: 0.0,
            i_quadrature: 0.0,
            q_quadrature: 0.0,
            i_coef: 1.0,
            q_coef: 1.0,
            i_phase_deg: 0.0,
            q_phase_deg: 0.0,
            i_phase_cos: 1.0,
            i_phase_sin: 0.0,
            q_phase_cos: 1.0,
            q_phase_sin: 0.0,
            consumed_samples: 0,
            delay_ticks: 0,
            wait_queue_full: false,
        }
    }
}

impl CalibrationRecord {
    /// Correct one converted I/Q sample pair with this record
    ///
    /// Expects samples that already went through
    /// [`MAX30009::convert_sample`]. A record with a degenerate coefficient
    /// passes the raw readings through with zeroed corrections.
    pub fn apply(&self, in_phase: &Sample, quadrature: &Sample) -> CalibratedImpedance {
        let i_load = in_phase.impedance as f32 / 100.0;
        let q_load = quadrature.impedance as f32 / 100.0;
        let overload =
            in_phase.value.abs() > ADC_SAFE_RANGE || quadrature.value.abs() > ADC_SAFE_RANGE;

        if self.i_coef == 0.0 || self.q_coef == 0.0 {
            return CalibratedImpedance {
                i_load,
                q_load,
                real: 0.0,
                imag: 0.0,
                magnitude: 0.0,
                angle_deg: 0.0,
                overload,
            };
        }

        let i_corrected = i_load / self.i_coef;
        let q_corrected = q_load / self.q_coef;

        let real = i_corrected * self.i_phase_cos - q_corrected * self.q_phase_cos;
        let imag = i_corrected * self.i_phase_sin + q_corrected * self.q_phase_sin;

        CalibratedImpedance {
            i_load,
            q_load,
            real,
            imag,
            magnitude: (real * real + imag * imag).sqrt(),
            angle_deg: imag.atan2(real).to_degrees(),
            overload,
        }
    }
}

impl<SPI, CS> MAX30009<SPI, CS> {
    /// Begin a calibration run
    ///
    /// Stores the run parameters and arms the state machine; the actual work
    /// happens across subsequent [`MAX30009::poll_calibration`] calls.
    pub fn start_calibration(
        &mut self,
        source: CalibSource,
        reference_ohms: f32,
        current: CurrentAmplitude,
        frequency: u32,
        gain: TotalGain,
    ) {
        self.calib = CalibrationRecord {
            state: CalibState::NeedCalibration,
            source,
            reference_ohms,
            current,
            gain,
            frequency,
            ..CalibrationRecord::default()
        };
        self.stop_requested = false;
    }

    /// Ask the state machine to abort at the next poll
    pub fn request_calibration_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Where the calibration state machine currently stands
    pub fn calibration_state(&self) -> CalibState {
        self.calib.state
    }
}

impl<SPI, CS> MAX30009<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    /// Advance the calibration state machine by one step
    ///
    /// Returns the state reached by this step. [`CalibState::InDelay`] and
    /// [`CalibState::WaitForFullQueue`] are transient and never stored; the
    /// machine resumes where it was once the delay has elapsed or the queue
    /// has filled. On a transport error the state is left unchanged, so the
    /// caller can simply poll again.
    pub fn poll_calibration(&mut self) -> Result<CalibState, Error<SPI, CS>> {
        if self.stop_requested {
            // The flag stays set until the shutdown writes land, so a
            // transport error here means the next poll retries the abort.
            self.shut_down_calibration_paths()?;
            self.stop_requested = false;
            self.calib.state = CalibState::Stopped;
            return Ok(CalibState::Stopped);
        }

        if self.calib.delay_ticks > 0 {
            self.calib.delay_ticks -= 1;
            // Discard whatever settled into the queue during the delay.
            self.flush_fifo()?;
            self.status()?;
            return Ok(CalibState::InDelay);
        }

        if self.calib.wait_queue_full {
            if !self.status()?.fifo_full {
                return Ok(CalibState::WaitForFullQueue);
            }
            self.calib.wait_queue_full = false;
        }

        match self.calib.state {
            CalibState::NoData | CalibState::Ready | CalibState::Stopped => {}

            CalibState::NeedCalibration => {
                self.set_bist_load(BistLoad::Ohm280)?;
                self.set_bist_enable(true)?;
                self.set_mux_enable(true)?;
                self.calib.state = CalibState::PreStart;
            }

            CalibState::PreStart => {
                self.calib.state = CalibState::StartOffset;
            }

            CalibState::StartOffset => {
                self.configure_offset_pass()?;
                self.calib.state = CalibState::MeasureOffset;
                self.calib.delay_ticks = SETTLE_TICKS;
                self.calib.wait_queue_full = true;
            }

            CalibState::MeasureOffset => {
                let average = self.fifo_average()?;
                self.calib.i_offset = average.in_phase.value;
                self.calib.q_offset = average.quadrature.value;
                self.calib.consumed_samples = average.consumed;
                self.calib.state = CalibState::StartInPhase;
            }

            CalibState::StartInPhase => {
                self.connect_reference_path()?;
                self.set_drive_reset(false)?;
                self.calib.current = self.set_constant_current_mode(self.calib.current)?;
                self.set_i_clk_phase(false)?;
                self.set_q_clk_phase(true)?;
                self.flush_fifo()?;
                self.calib.state = CalibState::MeasureInPhase;
                self.calib.delay_ticks = DRIVE_SETTLE_TICKS;
                self.calib.wait_queue_full = true;
            }

            CalibState::MeasureInPhase => {
                let (i_ohms, q_ohms, consumed) = self.measure_pass_ohms()?;
                self.calib.i_in_phase = i_ohms;
                self.calib.q_in_phase = q_ohms;
                self.calib.consumed_samples = consumed;
                self.calib.state = CalibState::StartQuadrature;
            }

            CalibState::StartQuadrature => {
                self.set_i_clk_phase(true)?;
                self.set_q_clk_phase(false)?;
                self.flush_fifo()?;
                self.calib.state = CalibState::MeasureQuadrature;
                self.calib.delay_ticks = SETTLE_TICKS;
                self.calib.wait_queue_full = true;
            }

            CalibState::MeasureQuadrature => {
                let (i_ohms, q_ohms, consumed) = self.measure_pass_ohms()?;
                self.calib.i_quadrature = i_ohms;
                self.calib.q_quadrature = q_ohms;
                self.calib.consumed_samples = consumed;
                self.calib.state = CalibState::CalculateCoefficients;
            }

            CalibState::CalculateCoefficients => {
                self.shut_down_calibration_paths()?;
                self.flush_fifo()?;
                self.derive_coefficients();
                self.calib.state = CalibState::PreReady;
            }

            CalibState::PreReady => {
                self.calib.state = CalibState::Ready;
            }

            // Transients are never stored as the machine's state.
            CalibState::InDelay | CalibState::WaitForFullQueue => {}
        }

        Ok(self.calib.state)
    }

    /// Configure the channel for the offset pass: everything settled and
    /// quiet, stimulus driver held in reset, minimal current programmed
    fn configure_offset_pass(&mut self) -> Result<(), Error<SPI, CS>> {
        self.set_reference_clock_source(ReferenceClockSource::Internal32768)?;

        self.set_mux_enable(false)?;
        self.set_bist_enable(false)?;
        self.set_gsr_enable(false)?;

        self.set_lead_bias_resistance(LeadBiasResistance::MOhm50)?;
        self.set_lead_bias_inputs(true, true)?;

        self.set_external_capacitor(false)?;
        self.set_external_resistor(false)?;
        self.set_bandgap(true)?;
        self.set_fast_start_mode(FastStartMode::Timed200ms)?;

        self.set_total_gain(self.calib.gain)?;
        self.set_amplifier_range(AmplifierMode::High)?;
        self.set_amplifier_bandwidth(AmplifierMode::High)?;
        self.set_dc_restore(true)?;

        self.set_input_hp_filter(InputHpFilter::Bypass)?;
        self.set_digital_hp_filter(DigitalHpFilter::Bypass)?;
        self.set_digital_lp_filter(DigitalLpFilter::Bypass)?;

        self.set_drive_frequency(self.calib.frequency, CALIB_SAMPLE_RATE)?;
        self.set_constant_current_mode(CurrentAmplitude::Amp16nA)?;
        self.set_drive_reset(true)?;
        self.set_pll_enable(true)?;

        self.set_i_channel(true)?;
        self.set_q_channel(true)?;
        self.set_i_clk_phase(false)?;
        self.set_q_clk_phase(false)?;

        self.set_fifo_full_threshold(CALIB_FIFO_THRESHOLD)?;
        self.flush_fifo()?;
        Ok(())
    }

    /// Route the stimulus to the reference resistance for this run
    fn connect_reference_path(&mut self) -> Result<(), Error<SPI, CS>> {
        match self.calib.source {
            CalibSource::CalibrationPath => {
                self.set_mux_enable(true)?;
                self.set_calibration_port(true)?;
                self.set_calibration_only(true)?;
            }
            CalibSource::MeasurementPath => {
                self.set_calibration_port(false)?;
                self.set_calibration_only(false)?;
                self.set_mux_enable(true)?;
                self.set_drvp_electrode(PositiveElectrode::El1)?;
                self.set_bip_electrode(PositiveElectrode::El2B)?;
                self.set_bin_electrode(NegativeElectrode::El3B)?;
                self.set_drvn_electrode(NegativeElectrode::El4)?;
            }
        }
        Ok(())
    }

    /// Average the queue and convert both channels to ohms
    fn measure_pass_ohms(&mut self) -> Result<(f32, f32, u16), Error<SPI, CS>> {
        let average = self.fifo_average()?;
        let record = self.calib;

        let mut in_phase = average.in_phase;
        let mut quadrature = average.quadrature;
        self.convert_sample(&mut in_phase, &record);
        self.convert_sample(&mut quadrature, &record);

        Ok((
            in_phase.impedance as f32 / 100.0,
            quadrature.impedance as f32 / 100.0,
            average.consumed,
        ))
    }

    /// Turn the three measurement passes into correction coefficients
    fn derive_coefficients(&mut self) {
        let record = &mut self.calib;

        let i_magnitude = (record.i_in_phase * record.i_in_phase
            + record.i_quadrature * record.i_quadrature)
            .sqrt();
        let q_magnitude = (record.q_in_phase * record.q_in_phase
            + record.q_quadrature * record.q_quadrature)
            .sqrt();

        if record.reference_ohms != 0.0 {
            record.i_coef = i_magnitude / record.reference_ohms;
            record.q_coef = q_magnitude / record.reference_ohms;
        }

        record.i_phase_deg = record.i_quadrature.atan2(record.i_in_phase).to_degrees();
        record.q_phase_deg = (-record.q_quadrature)
            .atan2(-record.q_in_phase)
            .to_degrees();

        record.i_phase_cos = record.i_phase_deg.to_radians().cos();
        record.i_phase_sin = record.i_phase_deg.to_radians().sin();
        record.q_phase_cos = record.q_phase_deg.to_radians().cos();
        record.q_phase_sin = record.q_phase_deg.to_radians().sin();
    }

    /// Park every path calibration may have enabled
    fn shut_down_calibration_paths(&mut self) -> Result<(), Error<SPI, CS>> {
        self.set_i_clk_phase(false)?;
        self.set_q_clk_phase(false)?;
        self.set_drive_standby()?;
        self.set_i_channel(false)?;
        self.set_q_channel(false)?;
        self.set_pll_enable(false)?;
        self.set_mux_enable(false)?;
        self.set_bist_enable(false)?;
        self.set_calibration_port(false)?;
        self.set_calibration_only(false)?;
        Ok(())
    }
}
