//! High-level interface to the MAX30009
//!
//! The entry point to this API is the [`MAX30009`] struct. It wraps the
//! low-level register interface and keeps a decoded projection of the chip's
//! state: the clock tree, the analog measurement path and the input
//! multiplexer. Every setter commits its register change with a verified
//! write, then refreshes the relevant projection from the register shadows.

mod calib;
mod error;

pub use self::calib::{
    CalibSource, CalibState, CalibratedImpedance, CalibrationRecord,
};
pub use self::error::Error;

use embedded_hal::{blocking::spi, digital::v2::OutputPin};

use crate::{
    clock::{self, ClockSolution},
    configs::*,
    fifo::{self, ChannelTag, Sample},
    ll::{self, Register as _},
};

/// Decoded status flags of the chip
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Status {
    /// Supply is up; the hardware flag is active low and inverted here
    pub power_ready: bool,
    /// PLL phase locked
    pub phase_locked: bool,
    /// PLL phase lock was lost
    pub phase_unlocked: bool,
    /// PLL frequency locked
    pub freq_locked: bool,
    /// PLL frequency lock was lost
    pub freq_unlocked: bool,
    /// New data is waiting in the sample queue
    pub fifo_data_ready: bool,
    /// The sample queue reached its full threshold
    pub fifo_full: bool,
    /// Lead-on detected
    pub lead_on: bool,
    /// DC lead-off, negative input below threshold
    pub lead_off_neg_low: bool,
    /// DC lead-off, negative input above threshold
    pub lead_off_neg_high: bool,
    /// DC lead-off, positive input below threshold
    pub lead_off_pos_low: bool,
    /// DC lead-off, positive input above threshold
    pub lead_off_pos_high: bool,
    /// The stimulus driver ran out of compliance range
    pub drive_out_of_range: bool,
    /// BioZ input under the low threshold
    pub bioz_under_range: bool,
    /// BioZ input over the high threshold
    pub bioz_over_range: bool,
}

/// Decoded projection of the clock tree
///
/// All frequencies in tenths of hertz.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SystemClocks {
    /// Reference frequency feeding the PLL
    pub ref_clk: u32,
    /// PLL output frequency
    pub pll_clk: u32,
    /// Synthesis clock driving the stimulus DAC
    pub synth_clk: u32,
    /// ADC conversion clock
    pub adc_clk: u32,
    /// Stimulus drive frequency
    pub drive_freq: u32,
    /// Output sample rate
    pub sample_rate: u32,
    /// Whether the PLL is enabled (from the write shadow; the enable bit
    /// takes effect immediately and has no meaningful readback before lock)
    pub pll_enabled: bool,
    /// PLL multiplier register value
    pub mdiv: u16,
    /// NDIV register code
    pub ndiv: u8,
    /// KDIV register code
    pub kdiv: u8,
    /// DAC oversampling register code
    pub dac_osr: u8,
    /// ADC oversampling register code
    pub adc_osr: u8,
}

/// Decoded projection of the analog measurement path
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BiozState {
    /// Stimulus drive mode
    pub drive_mode: DriveMode,
    /// Current amplitude implied by the range and magnitude fields
    pub current: CurrentAmplitude,
    /// RMS stimulus current in nanoamperes
    pub current_rms_na: u32,
    /// Peak stimulus current in nanoamperes
    pub current_peak_na: u32,
    /// Voltage amplitude implied by the magnitude field
    pub voltage: VoltageAmplitude,
    /// RMS stimulus voltage in microvolts
    pub voltage_rms_uv: u32,
    /// Peak stimulus voltage in microvolts
    pub voltage_peak_uv: u32,
    /// External stimulus resistor in use
    pub external_resistor: bool,
    /// External coupling capacitor in use
    pub external_capacitor: bool,
    /// Receive amplifier range
    pub amplifier_range: AmplifierMode,
    /// Receive amplifier bandwidth
    pub amplifier_bandwidth: AmplifierMode,
    /// Bandgap reference enabled
    pub bandgap: bool,
    /// In-phase channel enabled
    pub i_channel: bool,
    /// Quadrature channel enabled
    pub q_channel: bool,
    /// In-phase demodulation clock phase inverted
    pub i_clk_phase: bool,
    /// Quadrature demodulation clock phase inverted
    pub q_clk_phase: bool,
    /// INA chopper enabled
    pub chopper: bool,
    /// Channel frequency select flag
    pub channel_freq_divided: bool,
    /// Channel kept biased in standby
    pub standby_bias: bool,
    /// INA running in low-power mode
    pub ina_low_power: bool,
    /// Demodulation enabled (the register holds the inverse, a disable bit)
    pub demodulation: bool,
    /// Total channel gain
    pub gain: TotalGain,
    /// Total channel gain as a factor
    pub gain_factor: u32,
    /// Analog input high-pass filter
    pub input_hp_filter: InputHpFilter,
    /// Digital high-pass filter
    pub digital_hp_filter: DigitalHpFilter,
    /// Digital low-pass filter
    pub digital_lp_filter: DigitalLpFilter,
    /// DC restore enabled
    pub dc_restore: bool,
    /// Stimulus driver held in reset
    pub drive_reset: bool,
    /// Stimulus DAC held in reset
    pub dac_reset: bool,
    /// Fast-start behavior
    pub fast_start: FastStartMode,
}

/// Decoded projection of the input multiplexer
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MuxState {
    /// Multiplexer enabled
    pub mux_enabled: bool,
    /// Calibration port connected
    pub calibration_port: bool,
    /// Calibration port connected exclusively
    pub calibration_only: bool,
    /// Built-in self-test load connected
    pub bist_enabled: bool,
    /// Selected self-test load
    pub bist_load: BistLoad,
    /// Selected self-test load in ohms
    pub bist_load_ohms: u32,
    /// GSR load connected
    pub gsr_enabled: bool,
    /// Selected GSR load
    pub gsr_load: GsrLoad,
    /// Internal input load enabled
    pub internal_input_load: bool,
    /// External input load enabled
    pub external_input_load: bool,
    /// Electrode behind the positive drive pin
    pub drvp: PositiveElectrode,
    /// Electrode behind the positive sense pin
    pub bip: PositiveElectrode,
    /// Electrode behind the negative sense pin
    pub bin: NegativeElectrode,
    /// Electrode behind the negative drive pin
    pub drvn: NegativeElectrode,
}

/// Averaged drain of the sample queue
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FifoAverage {
    /// Average of the in-phase samples seen
    pub in_phase: Sample,
    /// Average of the quadrature samples seen
    pub quadrature: Sample,
    /// How many channel samples went into the averages
    pub consumed: u16,
}

/// Entry point to the MAX30009 driver API
pub struct MAX30009<SPI, CS> {
    ll: ll::MAX30009<SPI, CS>,
    clocks: SystemClocks,
    bioz: BiozState,
    mux: MuxState,
    calib: CalibrationRecord,
    stop_requested: bool,
}

impl<SPI, CS> MAX30009<SPI, CS> {
    /// Create a new instance of `MAX30009`
    ///
    /// Requires the SPI peripheral and the chip select pin that are connected
    /// to the MAX30009.
    pub fn new(spi: SPI, chip_select: CS) -> Self {
        MAX30009 {
            ll: ll::MAX30009::new(spi, chip_select),
            clocks: decode_clocks(0, 0, 0, 0, false),
            bioz: decode_bioz(0, 0, 0, 0, 0, 0, 0),
            mux: decode_mux(0, 0, 0),
            calib: CalibrationRecord::default(),
            stop_requested: false,
        }
    }

    /// Whether the construction-time self-check passed
    pub fn is_initialized(&self) -> bool {
        self.ll.is_initialized()
    }

    /// Provides direct access to the registers
    pub fn ll(&mut self) -> &mut ll::MAX30009<SPI, CS> {
        &mut self.ll
    }

    /// The decoded clock tree, as of the last register access
    pub fn clocks(&self) -> SystemClocks {
        self.clocks
    }

    /// The decoded measurement path, as of the last register access
    pub fn bioz_state(&self) -> BiozState {
        self.bioz
    }

    /// The decoded input multiplexer, as of the last register access
    pub fn mux_state(&self) -> MuxState {
        self.mux
    }

    /// The calibration record
    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calib
    }

    /// Restore a previously saved calibration record
    ///
    /// The record's offsets and coefficients are used as-is; its state is
    /// what it was when saved.
    pub fn restore_calibration(&mut self, record: CalibrationRecord) {
        self.calib = record;
        self.stop_requested = false;
    }

    /// Subtract the calibration offset and convert a sample's ADC code into
    /// physical units, using the active gain and stimulus current
    ///
    /// Impedance lands in hundredths of ohm, voltage in microvolts. Both stay
    /// zero if the active configuration gives a degenerate transfer factor.
    pub fn convert_sample(&self, sample: &mut Sample, record: &CalibrationRecord) {
        // ADC transfer: counts per volt at gain 1
        const ADC_COUNTS_PER_VOLT: i64 = 333_772;

        let mut value = sample.value as i64;
        match sample.tag {
            ChannelTag::InPhase => value -= record.i_offset as i64,
            ChannelTag::Quadrature => value -= record.q_offset as i64,
            _ => return,
        }

        let gain = self.bioz.gain_factor as i64;
        let current_divisor =
            ADC_COUNTS_PER_VOLT * gain * self.bioz.current_peak_na as i64 * 1_000 / 1_000_000_000;
        if current_divisor != 0 {
            sample.impedance = (value * 100_000 / current_divisor) as i32;
        }
        sample.voltage = (value * 1_000_000 / (ADC_COUNTS_PER_VOLT * gain)) as i32;
    }

    /// Return the SPI peripheral and chip select pin
    pub fn free(self) -> (SPI, CS) {
        self.ll.free()
    }

    fn recompute_clocks(&mut self) {
        let pll1 = self.ll.pll_configuration_1().cached().0;
        let pll2 = self.ll.pll_configuration_2().cached().0;
        let pll4 = self.ll.pll_configuration_4().cached().0;
        let bioz1 = self.ll.bioz_configuration_1().cached().0;
        let pll_enabled = self.ll.pll_configuration_1().pending().pll_en() == 1;
        self.clocks = decode_clocks(pll1, pll2, pll4, bioz1, pll_enabled);
    }

    fn recompute_bioz(&mut self) {
        let cfg1 = self.ll.bioz_configuration_1().cached().0;
        let cfg2 = self.ll.bioz_configuration_2().cached().0;
        let cfg3 = self.ll.bioz_configuration_3().cached().0;
        let cfg4 = self.ll.bioz_configuration_4().cached().0;
        let cfg5 = self.ll.bioz_configuration_5().cached().0;
        let cfg6 = self.ll.bioz_configuration_6().cached().0;
        let cfg7 = self.ll.bioz_configuration_7().cached().0;
        self.bioz = decode_bioz(cfg1, cfg2, cfg3, cfg4, cfg5, cfg6, cfg7);
    }

    fn recompute_mux(&mut self) {
        let mux1 = self.ll.bioz_mux_configuration_1().cached().0;
        let mux2 = self.ll.bioz_mux_configuration_2().cached().0;
        let mux3 = self.ll.bioz_mux_configuration_3().cached().0;
        self.mux = decode_mux(mux1, mux2, mux3);
    }
}

impl<SPI, CS> MAX30009<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    /// Read and decode both status registers
    pub fn status(&mut self) -> Result<Status, Error<SPI, CS>> {
        let s1 = self.ll.status_1().read()?;
        let s2 = self.ll.status_2().read()?;

        Ok(Status {
            power_ready: s1.pwr_rdy() == 0,
            phase_locked: s1.phase_lock() == 1,
            phase_unlocked: s1.phase_unlock() == 1,
            freq_locked: s1.freq_lock() == 1,
            freq_unlocked: s1.freq_unlock() == 1,
            fifo_data_ready: s1.fifo_data_rdy() == 1,
            fifo_full: s1.a_full() == 1,
            lead_on: s2.lon() == 1,
            lead_off_neg_low: s2.dc_loff_nl() == 1,
            lead_off_neg_high: s2.dc_loff_nh() == 1,
            lead_off_pos_low: s2.dc_loff_pl() == 1,
            lead_off_pos_high: s2.dc_loff_ph() == 1,
            drive_out_of_range: s2.drv_oor() == 1,
            bioz_under_range: s2.bioz_undr() == 1,
            bioz_over_range: s2.bioz_over() == 1,
        })
    }

    /// Read the hardwired part identifier
    pub fn part_id(&mut self) -> Result<u8, Error<SPI, CS>> {
        Ok(self.ll.part_id().read()?.part_id())
    }

    /// Re-read every register in the table and refresh all projections
    pub fn load_all_registers(&mut self) -> Result<(), Error<SPI, CS>> {
        for &address in ll::MAX30009::<SPI, CS>::register_addresses() {
            self.ll.read_register(address)?;
        }
        self.recompute_clocks();
        self.recompute_bioz();
        self.recompute_mux();
        Ok(())
    }

    /// Select the reference clock feeding the PLL
    pub fn set_reference_clock_source(
        &mut self,
        source: ReferenceClockSource,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll.pll_configuration_4().write(|w| {
            w.clk_freq_sel(source.freq_sel_bit())
                .ref_clk_sel(source.external_bit())
        })?;
        self.recompute_clocks();
        Ok(())
    }

    /// Enable or disable the PLL
    pub fn set_pll_enable(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .pll_configuration_1()
            .write(|w| w.pll_en(enabled as u8))?;
        self.recompute_clocks();
        Ok(())
    }

    /// Solve the clock tree for a drive frequency and sample rate, then
    /// commit the dividers
    ///
    /// Both arguments are in tenths of hertz. The reference frequency is
    /// taken from the staged clock-source selection. On success the achieved
    /// configuration is returned and cached. If no solution exists, nothing
    /// is staged or written. The complete solution is staged into the write
    /// shadows before the first bus transaction, so a transport failure can
    /// never leave a partially staged divider tree.
    pub fn set_drive_frequency(
        &mut self,
        drive_freq: u32,
        desired_sample_rate: u32,
    ) -> Result<ClockSolution, Error<SPI, CS>> {
        if drive_freq < clock::MIN_DRIVE_FREQ || drive_freq > clock::MAX_DRIVE_FREQ {
            return Err(Error::DriveFrequencyOutOfRange);
        }

        let ref_clk = if self.ll.pll_configuration_4().pending().clk_freq_sel() == 0 {
            clock::REF_CLK_32000
        } else {
            clock::REF_CLK_32768
        };

        let solution = clock::find_solution(ref_clk, drive_freq, desired_sample_rate)
            .ok_or(Error::NoClockSolution)?;

        // The chopper only works with the demodulator running at half the
        // ADC clock; the channel divider flag marks the eighth-rate case.
        let chopper = if solution.drive_freq == solution.adc_clk / 2 { 0 } else { 1 };
        let ch_fsel = if solution.drive_freq == solution.adc_clk / 8 { 1 } else { 0 };

        // Stage the whole solution into the shadows first, so a transport
        // failure mid-commit never leaves a half-staged divider tree.
        self.ll.pll_configuration_1().stage(|w| {
            w.mdiv_h(((solution.mdiv >> 8) & 0x03) as u8)
                .ndiv(solution.ndiv)
                .kdiv(solution.kdiv)
        });
        self.ll
            .pll_configuration_2()
            .stage(|w| w.mdiv_l((solution.mdiv & 0xFF) as u8));
        self.ll.bioz_configuration_1().stage(|w| {
            w.bioz_dac_osr(solution.dac_osr).bioz_adc_osr(solution.adc_osr)
        });
        self.ll.bioz_configuration_7().stage(|w| {
            w.bioz_ina_chop_en(chopper).bioz_ch_fsel(ch_fsel)
        });

        self.ll.write_register(ll::PLL_CONFIGURATION_1::ADDR)?;
        self.ll.write_register(ll::PLL_CONFIGURATION_2::ADDR)?;
        self.ll.write_register(ll::BIOZ_CONFIGURATION_1::ADDR)?;
        self.ll.write_register(ll::BIOZ_CONFIGURATION_7::ADDR)?;

        self.recompute_clocks();
        self.recompute_bioz();
        Ok(solution)
    }

    /// Put the driver into constant-current mode
    ///
    /// If the current drive frequency is below the amplitude's floor, the
    /// next lower amplitude down the chain is tried until one fits. The
    /// amplitude actually programmed is returned.
    pub fn set_constant_current_mode(
        &mut self,
        amplitude: CurrentAmplitude,
    ) -> Result<CurrentAmplitude, Error<SPI, CS>> {
        let mut amplitude = amplitude;
        while self.clocks.drive_freq < amplitude.min_drive_frequency() {
            match amplitude.next_lower() {
                Some(lower) => amplitude = lower,
                None => break,
            }
        }

        self.ll.bioz_configuration_3().write(|w| {
            w.bioz_drv_mode(DriveMode::Current.into())
                .bioz_idrv_rge(amplitude.range_bits())
                .bioz_vdrv_mag(amplitude.magnitude_bits())
        })?;
        self.recompute_bioz();
        Ok(amplitude)
    }

    /// Put the driver into constant-voltage mode
    pub fn set_constant_voltage_mode(
        &mut self,
        amplitude: VoltageAmplitude,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll.bioz_configuration_3().write(|w| {
            w.bioz_drv_mode(DriveMode::Voltage.into())
                .bioz_vdrv_mag(amplitude.into())
        })?;
        self.recompute_bioz();
        Ok(())
    }

    /// Put the driver into H-bridge mode
    pub fn set_h_bridge_mode(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_3()
            .write(|w| w.bioz_drv_mode(DriveMode::HBridge.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Put the driver into standby
    pub fn set_drive_standby(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_3()
            .write(|w| w.bioz_drv_mode(DriveMode::Standby.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Use an external stimulus resistor
    pub fn set_external_resistor(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_3()
            .write(|w| w.bioz_ext_res(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Use an external coupling capacitor
    pub fn set_external_capacitor(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_ext_cap(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable DC restore
    pub fn set_dc_restore(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_dc_restore(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Hold or release the stimulus driver reset
    pub fn set_drive_reset(&mut self, held: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_drv_reset(held as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Hold or release the stimulus DAC reset
    pub fn set_dac_reset(&mut self, held: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_dac_reset(held as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the receive amplifier bandwidth
    pub fn set_amplifier_bandwidth(&mut self, mode: AmplifierMode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_amp_bw(mode.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the receive amplifier range
    pub fn set_amplifier_range(&mut self, mode: AmplifierMode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_6()
            .write(|w| w.bioz_amp_rge(mode.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable the bandgap reference
    pub fn set_bandgap(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_1()
            .write(|w| w.bioz_bg_en(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable the in-phase channel
    pub fn set_i_channel(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_1()
            .write(|w| w.bioz_i_en(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable the quadrature channel
    pub fn set_q_channel(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_1()
            .write(|w| w.bioz_q_en(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Invert the in-phase demodulation clock phase
    pub fn set_i_clk_phase(&mut self, inverted: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_7()
            .write(|w| w.bioz_i_clk_phase(inverted as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Invert the quadrature demodulation clock phase
    pub fn set_q_clk_phase(&mut self, inverted: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_7()
            .write(|w| w.bioz_q_clk_phase(inverted as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable the INA chopper
    pub fn set_chopper(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_7()
            .write(|w| w.bioz_ina_chop_en(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Keep the channel biased while in standby
    pub fn set_standby_bias(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_7()
            .write(|w| w.bioz_stbyon(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Run the INA in low-power mode
    pub fn set_ina_low_power(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_5()
            .write(|w| w.bioz_ina_mode(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable demodulation
    ///
    /// The hardware bit is a disable; the negation happens here, exactly
    /// once.
    pub fn set_demodulation(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_5()
            .write(|w| w.bioz_dm_dis(!enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the total channel gain
    pub fn set_total_gain(&mut self, gain: TotalGain) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_5()
            .write(|w| w.bioz_gain(gain.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the analog input high-pass filter
    pub fn set_input_hp_filter(&mut self, filter: InputHpFilter) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_5()
            .write(|w| w.bioz_ahpf(filter.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the digital high-pass filter
    pub fn set_digital_hp_filter(&mut self, filter: DigitalHpFilter) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_2()
            .write(|w| w.bioz_dhpf(filter.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the digital low-pass filter
    pub fn set_digital_lp_filter(&mut self, filter: DigitalLpFilter) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_configuration_2()
            .write(|w| w.bioz_dlpf(filter.into()))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Set the fast-start behavior of the stimulus driver
    pub fn set_fast_start_mode(&mut self, mode: FastStartMode) -> Result<(), Error<SPI, CS>> {
        self.ll.bioz_configuration_4().write(|w| {
            w.bioz_fast_start_en(mode.enable_bit())
                .bioz_fast_manual(mode.manual_bit())
        })?;
        self.recompute_bioz();
        Ok(())
    }

    /// Configure the BioZ range comparator window
    pub fn set_threshold_window(
        &mut self,
        enabled: bool,
        low: u8,
        high: u8,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_low_threshold()
            .write(|w| w.bioz_lo_thresh(low))?;
        self.ll
            .bioz_high_threshold()
            .write(|w| w.bioz_hi_thresh(high))?;
        self.ll
            .bioz_configuration_2()
            .write(|w| w.en_bioz_thresh(enabled as u8))?;
        self.recompute_bioz();
        Ok(())
    }

    /// Enable or disable the input multiplexer
    pub fn set_mux_enable(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_1()
            .write(|w| w.mux_en(enabled as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Connect or disconnect the calibration port
    pub fn set_calibration_port(&mut self, connected: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_1()
            .write(|w| w.cal_en(connected as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Connect the calibration port exclusively
    pub fn set_calibration_only(&mut self, exclusive: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_1()
            .write(|w| w.connect_cal_only(exclusive as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Select the built-in self-test load
    pub fn set_bist_load(&mut self, load: BistLoad) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_1()
            .write(|w| w.bmux_rsel(load.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Connect or disconnect the built-in self-test load
    pub fn set_bist_enable(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_1()
            .write(|w| w.bmux_bist_en(enabled as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Select the GSR load
    pub fn set_gsr_load(&mut self, load: GsrLoad) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_2()
            .write(|w| w.bmux_gsr_rsel(load.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Connect or disconnect the GSR load
    pub fn set_gsr_enable(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_2()
            .write(|w| w.gsr_load_en(enabled as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Enable or disable the internal input load
    pub fn set_internal_input_load(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_2()
            .write(|w| w.en_int_inload(enabled as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Enable or disable the external input load
    pub fn set_external_input_load(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_2()
            .write(|w| w.en_ext_inload(enabled as u8))?;
        self.recompute_mux();
        Ok(())
    }

    /// Assign the electrode behind the positive drive pin
    pub fn set_drvp_electrode(&mut self, electrode: PositiveElectrode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_3()
            .write(|w| w.drvp_assign(electrode.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Assign the electrode behind the positive sense pin
    pub fn set_bip_electrode(&mut self, electrode: PositiveElectrode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_3()
            .write(|w| w.bip_assign(electrode.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Assign the electrode behind the negative sense pin
    pub fn set_bin_electrode(&mut self, electrode: NegativeElectrode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_3()
            .write(|w| w.bin_assign(electrode.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Assign the electrode behind the negative drive pin
    pub fn set_drvn_electrode(&mut self, electrode: NegativeElectrode) -> Result<(), Error<SPI, CS>> {
        self.ll
            .bioz_mux_configuration_3()
            .write(|w| w.drvn_assign(electrode.into()))?;
        self.recompute_mux();
        Ok(())
    }

    /// Select the lead bias resistance
    pub fn set_lead_bias_resistance(
        &mut self,
        resistance: LeadBiasResistance,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .lead_bias_configuration()
            .write(|w| w.rbias_value(resistance.into()))
            .map_err(Error::from)
    }

    /// Enable lead bias on the sense inputs
    pub fn set_lead_bias_inputs(&mut self, bip: bool, bin: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .lead_bias_configuration()
            .write(|w| w.en_rbias_bip(bip as u8).en_rbias_bin(bin as u8))
            .map_err(Error::from)
    }

    /// Enable or disable DC lead-off detection
    pub fn set_lead_off_detection(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_leads_configuration()
            .write(|w| w.en_loff_det(enabled as u8))
            .map_err(Error::from)
    }

    /// Use an external lead-off detection network
    pub fn set_external_lead_off(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_leads_configuration()
            .write(|w| w.en_ext_loff(enabled as u8))
            .map_err(Error::from)
    }

    /// Enable or disable lead-on detection
    pub fn set_lead_on_detection(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_leads_configuration()
            .write(|w| w.en_lon_det(enabled as u8))
            .map_err(Error::from)
    }

    /// Set the lead-off detection current magnitude and polarity
    pub fn set_lead_off_current(
        &mut self,
        magnitude: u8,
        inverted_polarity: bool,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_leads_configuration()
            .write(|w| {
                w.loff_imag(magnitude).loff_ipol(inverted_polarity as u8)
            })
            .map_err(Error::from)
    }

    /// Set the lead-off comparator threshold code
    pub fn set_lead_off_threshold(&mut self, threshold: u8) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_lead_detect_threshold()
            .write(|w| w.loff_thresh(threshold))
            .map_err(Error::from)
    }

    /// Enable or disable drive out-of-range detection
    pub fn set_drive_oor_detection(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .dc_leads_configuration()
            .write(|w| w.en_drv_oor(enabled as u8))
            .map_err(Error::from)
    }

    /// Put the chip into or take it out of shutdown
    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .system_configuration()
            .write(|w| w.shdn(shutdown as u8))
            .map_err(Error::from)
    }

    /// Disable the chip's I2C interface, leaving SPI as the only transport
    pub fn set_i2c_disabled(&mut self, disabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .system_configuration()
            .write(|w| w.disable_i2c(disabled as u8))
            .map_err(Error::from)
    }

    /// Make this chip the timing master
    pub fn set_timing_master(&mut self, master: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .system_configuration()
            .write(|w| w.master(master as u8))
            .map_err(Error::from)
    }

    /// Pulse the soft-reset bit
    ///
    /// The bit self-clears, so the write is not verified.
    pub fn soft_reset(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .system_configuration()
            .write_unchecked(|w| w.reset(1))?;
        self.ll.system_configuration().stage(|w| w.reset(0));
        Ok(())
    }

    /// Widen the PLL phase-lock detection window
    pub fn set_pll_lock_window(&mut self, widened: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .pll_configuration_3()
            .write(|w| w.pll_lock_wndw(widened as u8))
            .map_err(Error::from)
    }

    /// Enable interrupts for queue events
    pub fn set_fifo_interrupts(
        &mut self,
        data_ready: bool,
        full: bool,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .interrupt_enable_1()
            .write(|w| {
                w.fifo_data_rdy_en(data_ready as u8).a_full_en(full as u8)
            })
            .map_err(Error::from)
    }

    /// Enable interrupts for PLL phase and frequency lock changes
    pub fn set_pll_interrupts(&mut self, lock: bool, unlock: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .interrupt_enable_1()
            .write(|w| {
                w.phase_lock_en(lock as u8)
                    .freq_lock_en(lock as u8)
                    .phase_unlock_en(unlock as u8)
                    .freq_unlock_en(unlock as u8)
            })
            .map_err(Error::from)
    }

    /// Enable interrupts for lead-on and the DC lead-off comparators
    pub fn set_lead_interrupts(
        &mut self,
        lead_on: bool,
        lead_off: bool,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .interrupt_enable_2()
            .write(|w| {
                w.lon_en(lead_on as u8)
                    .dc_loff_nl_en(lead_off as u8)
                    .dc_loff_nh_en(lead_off as u8)
                    .dc_loff_pl_en(lead_off as u8)
                    .dc_loff_ph_en(lead_off as u8)
            })
            .map_err(Error::from)
    }

    /// Enable interrupts for BioZ range violations and driver compliance
    pub fn set_range_interrupts(&mut self, enabled: bool) -> Result<(), Error<SPI, CS>> {
        self.ll
            .interrupt_enable_2()
            .write(|w| {
                w.bioz_undr_en(enabled as u8)
                    .bioz_over_en(enabled as u8)
                    .drv_oor_en(enabled as u8)
            })
            .map_err(Error::from)
    }

    /// Select the INT pin function and output driver mode
    pub fn set_interrupt_pin(
        &mut self,
        function: u8,
        output_mode: u8,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .pin_functional_configuration()
            .write(|w| w.int_fcfg(function))?;
        self.ll
            .output_pin_configuration()
            .write(|w| w.int_ocfg(output_mode))
            .map_err(Error::from)
    }

    /// Select the TRIG pin function and output driver mode
    pub fn set_trigger_pin(
        &mut self,
        input_function: u8,
        output_mode: u8,
    ) -> Result<(), Error<SPI, CS>> {
        self.ll
            .pin_functional_configuration()
            .write(|w| w.trig_icfg(input_function))?;
        self.ll
            .output_pin_configuration()
            .write(|w| w.trig_ocfg(output_mode))
            .map_err(Error::from)
    }

    /// Pulse the timing-reset bit to resynchronize internal timing
    pub fn sync_timing(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .system_sync()
            .write_unchecked(|w| w.timing_sys_reset(1))?;
        self.ll.system_sync().stage(|w| w.timing_sys_reset(0));
        Ok(())
    }

    /// Number of samples currently in the queue
    pub fn fifo_sample_count(&mut self) -> Result<u16, Error<SPI, CS>> {
        let high = self.ll.fifo_counter_1().read()?;
        let low = self.ll.fifo_counter_2().read()?;
        Ok(((high.fifo_data_count_msb() as u16) << 8) | low.fifo_data_count() as u16)
    }

    /// Number of samples lost to queue overflow
    pub fn fifo_overflow_count(&mut self) -> Result<u8, Error<SPI, CS>> {
        Ok(self.ll.fifo_counter_1().read()?.ovf_counter())
    }

    /// Queue slot the chip writes to next
    pub fn fifo_write_pointer(&mut self) -> Result<u8, Error<SPI, CS>> {
        Ok(self.ll.fifo_write_pointer().read()?.fifo_wr_ptr())
    }

    /// Queue slot the host reads from next
    pub fn fifo_read_pointer(&mut self) -> Result<u8, Error<SPI, CS>> {
        Ok(self.ll.fifo_read_pointer().read()?.fifo_rd_ptr())
    }

    /// Assert the full flag once the queue holds this many samples
    pub fn set_fifo_full_threshold(&mut self, samples: u16) -> Result<(), Error<SPI, CS>> {
        // The register counts free slots left, not samples held.
        let value = (256u16.saturating_sub(samples)) as u8;
        self.ll
            .fifo_configuration_1()
            .write(|w| w.fifo_a_full(value))
            .map_err(Error::from)
    }

    /// Choose when the queue status flags clear
    pub fn set_fifo_stat_clear(&mut self, mode: FifoStatClear) -> Result<(), Error<SPI, CS>> {
        self.ll
            .fifo_configuration_2()
            .write(|w| w.fifo_stat_clr(mode.into()))
            .map_err(Error::from)
    }

    /// Choose how the queue-full flag re-asserts
    pub fn set_fifo_full_assert(&mut self, mode: FifoFullAssert) -> Result<(), Error<SPI, CS>> {
        self.ll
            .fifo_configuration_2()
            .write(|w| w.a_full_type(mode.into()))
            .map_err(Error::from)
    }

    /// Choose what happens when the queue fills up
    pub fn set_fifo_rollover(&mut self, mode: FifoRollover) -> Result<(), Error<SPI, CS>> {
        self.ll
            .fifo_configuration_2()
            .write(|w| w.fifo_ro(mode.into()))
            .map_err(Error::from)
    }

    /// Push a marker word into the queue
    ///
    /// The bit self-clears, so the write is not verified.
    pub fn mark_fifo(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .fifo_configuration_2()
            .write_unchecked(|w| w.fifo_mark(1))?;
        self.ll.fifo_configuration_2().stage(|w| w.fifo_mark(0));
        Ok(())
    }

    /// Drop everything currently in the queue
    ///
    /// The bit self-clears, so the write is not verified.
    pub fn flush_fifo(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll
            .fifo_configuration_2()
            .write_unchecked(|w| w.flush_fifo(1))?;
        self.ll.fifo_configuration_2().stage(|w| w.flush_fifo(0));
        Ok(())
    }

    /// Read and decode one I/Q sample pair from the queue
    pub fn read_sample_pair(&mut self) -> Result<(Sample, Sample), Error<SPI, CS>> {
        let mut frame = [0u8; 2 + 2 * fifo::WORD_SIZE];
        self.ll.read_fifo(&mut frame)?;

        Ok((
            fifo::decode([frame[2], frame[3], frame[4]]),
            fifo::decode([frame[5], frame[6], frame[7]]),
        ))
    }

    /// Drain the queue in bursts and average each channel
    ///
    /// Words with invalid tags and markers are skipped. An empty channel
    /// averages to zero.
    pub fn fifo_average(&mut self) -> Result<FifoAverage, Error<SPI, CS>> {
        const BURSTS: usize = 40;
        const WORDS_PER_BURST: usize = 6;

        let mut sums = [0i64; 2];
        let mut counts = [0u32; 2];

        for _ in 0..BURSTS {
            let mut frame = [0u8; 2 + WORDS_PER_BURST * fifo::WORD_SIZE];
            self.ll.read_fifo(&mut frame)?;

            for word in frame[2..].chunks_exact(fifo::WORD_SIZE) {
                let sample = fifo::decode([word[0], word[1], word[2]]);
                match sample.tag {
                    ChannelTag::InPhase => {
                        sums[0] += sample.value as i64;
                        counts[0] += 1;
                    }
                    ChannelTag::Quadrature => {
                        sums[1] += sample.value as i64;
                        counts[1] += 1;
                    }
                    _ => {}
                }
            }
        }

        let average = |sum: i64, count: u32| -> i32 {
            if count == 0 {
                0
            } else {
                (sum / count as i64) as i32
            }
        };

        Ok(FifoAverage {
            in_phase: Sample {
                tag: ChannelTag::InPhase,
                value: average(sums[0], counts[0]),
                impedance: 0,
                voltage: 0,
            },
            quadrature: Sample {
                tag: ChannelTag::Quadrature,
                value: average(sums[1], counts[1]),
                impedance: 0,
                voltage: 0,
            },
            consumed: (counts[0] + counts[1]) as u16,
        })
    }
}

fn decode_clocks(pll1: u8, pll2: u8, pll4: u8, bioz1: u8, pll_enabled: bool) -> SystemClocks {
    let pll1 = ll::pll_configuration_1::R(pll1);
    let pll2 = ll::pll_configuration_2::R(pll2);
    let pll4 = ll::pll_configuration_4::R(pll4);
    let bioz1 = ll::bioz_configuration_1::R(bioz1);

    let ref_clk = if pll4.clk_freq_sel() == 0 {
        clock::REF_CLK_32000
    } else {
        clock::REF_CLK_32768
    };

    let mdiv = ((pll1.mdiv_h() as u16) << 8) | pll2.mdiv_l() as u16;
    let kdiv = clock::KDIV_DIVIDERS[pll1.kdiv() as usize];
    let ndiv = clock::NDIV_DIVIDERS[pll1.ndiv() as usize];
    let dac_osr = clock::DAC_OSR_DIVIDERS[bioz1.bioz_dac_osr() as usize];
    let adc_osr = clock::ADC_OSR_DIVIDERS[bioz1.bioz_adc_osr() as usize];

    let pll_clk = ref_clk * (mdiv as u32 + 1);
    let synth_clk = pll_clk / kdiv;
    let adc_clk = pll_clk / ndiv;

    SystemClocks {
        ref_clk,
        pll_clk,
        synth_clk,
        adc_clk,
        drive_freq: synth_clk / dac_osr,
        sample_rate: adc_clk / adc_osr,
        pll_enabled,
        mdiv,
        ndiv: pll1.ndiv(),
        kdiv: pll1.kdiv(),
        dac_osr: bioz1.bioz_dac_osr(),
        adc_osr: bioz1.bioz_adc_osr(),
    }
}

fn decode_bioz(
    cfg1: u8,
    cfg2: u8,
    cfg3: u8,
    cfg4: u8,
    cfg5: u8,
    cfg6: u8,
    cfg7: u8,
) -> BiozState {
    let cfg1 = ll::bioz_configuration_1::R(cfg1);
    let cfg2 = ll::bioz_configuration_2::R(cfg2);
    let cfg3 = ll::bioz_configuration_3::R(cfg3);
    let cfg4 = ll::bioz_configuration_4::R(cfg4);
    let cfg5 = ll::bioz_configuration_5::R(cfg5);
    let cfg6 = ll::bioz_configuration_6::R(cfg6);
    let cfg7 = ll::bioz_configuration_7::R(cfg7);

    let current = CurrentAmplitude::from_parts(cfg3.bioz_idrv_rge(), cfg3.bioz_vdrv_mag());
    let voltage = VoltageAmplitude::from_bits(cfg3.bioz_vdrv_mag());
    let gain = TotalGain::from_bits(cfg5.bioz_gain());

    BiozState {
        drive_mode: DriveMode::from_bits(cfg3.bioz_drv_mode()),
        current,
        current_rms_na: current.rms_nanoamps(),
        current_peak_na: current.peak_nanoamps(),
        voltage,
        voltage_rms_uv: voltage.rms_microvolts(),
        voltage_peak_uv: voltage.peak_microvolts(),
        external_resistor: cfg3.bioz_ext_res() == 1,
        external_capacitor: cfg6.bioz_ext_cap() == 1,
        amplifier_range: AmplifierMode::from_bits(cfg6.bioz_amp_rge()),
        amplifier_bandwidth: AmplifierMode::from_bits(cfg6.bioz_amp_bw()),
        bandgap: cfg1.bioz_bg_en() == 1,
        i_channel: cfg1.bioz_i_en() == 1,
        q_channel: cfg1.bioz_q_en() == 1,
        i_clk_phase: cfg7.bioz_i_clk_phase() == 1,
        q_clk_phase: cfg7.bioz_q_clk_phase() == 1,
        chopper: cfg7.bioz_ina_chop_en() == 1,
        channel_freq_divided: cfg7.bioz_ch_fsel() == 1,
        standby_bias: cfg7.bioz_stbyon() == 1,
        ina_low_power: cfg5.bioz_ina_mode() == 1,
        demodulation: cfg5.bioz_dm_dis() == 0,
        gain,
        gain_factor: gain.factor(),
        input_hp_filter: InputHpFilter::from_bits(cfg5.bioz_ahpf()),
        digital_hp_filter: DigitalHpFilter::from_bits(cfg2.bioz_dhpf()),
        digital_lp_filter: DigitalLpFilter::from_bits(cfg2.bioz_dlpf()),
        dc_restore: cfg6.bioz_dc_restore() == 1,
        drive_reset: cfg6.bioz_drv_reset() == 1,
        dac_reset: cfg6.bioz_dac_reset() == 1,
        fast_start: FastStartMode::from_parts(
            cfg4.bioz_fast_start_en(),
            cfg4.bioz_fast_manual(),
        ),
    }
}

fn decode_mux(mux1: u8, mux2: u8, mux3: u8) -> MuxState {
    let mux1 = ll::bioz_mux_configuration_1::R(mux1);
    let mux2 = ll::bioz_mux_configuration_2::R(mux2);
    let mux3 = ll::bioz_mux_configuration_3::R(mux3);

    let bist_load = BistLoad::from_bits(mux1.bmux_rsel());

    MuxState {
        mux_enabled: mux1.mux_en() == 1,
        calibration_port: mux1.cal_en() == 1,
        calibration_only: mux1.connect_cal_only() == 1,
        bist_enabled: mux1.bmux_bist_en() == 1,
        bist_load,
        bist_load_ohms: bist_load.resistance_ohms(),
        gsr_enabled: mux2.gsr_load_en() == 1,
        gsr_load: GsrLoad::from_bits(mux2.bmux_gsr_rsel()),
        internal_input_load: mux2.en_int_inload() == 1,
        external_input_load: mux2.en_ext_inload() == 1,
        drvp: PositiveElectrode::from_bits(mux3.drvp_assign()),
        bip: PositiveElectrode::from_bits(mux3.bip_assign()),
        bin: NegativeElectrode::from_bits(mux3.bin_assign()),
        drvn: NegativeElectrode::from_bits(mux3.drvn_assign()),
    }
}
