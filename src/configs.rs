//! Configuration vocabulary for the MAX30009
//!
//! The types in this module give names to the register codings of the chip's
//! analog front-end: reference clock selection, stimulus amplitudes, gain,
//! filters, input multiplexer routing and sample-queue behavior. Each enum
//! knows its register coding and, where applicable, the physical value the
//! code stands for.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// RMS drive voltage per [`VoltageAmplitude`] step, in microvolts
pub const DRIVE_VOLTAGE_RMS_UV: [u32; 4] = [35_400, 70_700, 177_000, 354_000];

/// Peak drive voltage per [`VoltageAmplitude`] step, in microvolts
pub const DRIVE_VOLTAGE_PEAK_UV: [u32; 4] = [50_000, 100_000, 250_000, 500_000];

/// RMS drive current in nanoamperes, indexed by range, then magnitude
pub const DRIVE_CURRENT_RMS_NA: [[u32; 4]; 4] = [
    [16, 32, 80, 160],
    [320, 640, 1_600, 3_200],
    [6_400, 12_800, 32_000, 64_000],
    [128_000, 256_000, 640_000, 1_280_000],
];

/// Peak drive current in nanoamperes, indexed by range, then magnitude
pub const DRIVE_CURRENT_PEAK_NA: [[u32; 4]; 4] = [
    [23, 45, 113, 226],
    [452, 905, 2_262, 4_525],
    [9_050, 18_100, 45_250, 90_500],
    [181_000, 362_000, 905_000, 1_810_000],
];

/// The reference clock feeding the PLL
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ReferenceClockSource {
    /// Internal oscillator trimmed to 32.0 kHz
    Internal32000 = 0x00,
    /// Internal oscillator trimmed to 32.768 kHz
    Internal32768 = 0x01,
    /// External 32.0 kHz clock
    External32000 = 0x02,
    /// External 32.768 kHz clock
    External32768 = 0x03,
}

impl ReferenceClockSource {
    /// The CLK_FREQ_SEL bit for this source
    pub fn freq_sel_bit(self) -> u8 {
        self as u8 & 0x01
    }

    /// The REF_CLK_SEL bit for this source
    pub fn external_bit(self) -> u8 {
        (self as u8 >> 1) & 0x01
    }

    /// Reference frequency in tenths of hertz
    pub fn frequency_tenths(self) -> u32 {
        if self.freq_sel_bit() == 0 {
            320_000
        } else {
            327_680
        }
    }
}

impl Default for ReferenceClockSource {
    fn default() -> Self {
        ReferenceClockSource::Internal32000
    }
}

/// The stimulus drive mode
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DriveMode {
    /// Constant-current stimulus
    Current = 0x00,
    /// Constant-voltage stimulus
    Voltage = 0x01,
    /// H-bridge stimulus
    HBridge = 0x02,
    /// Driver disabled
    Standby = 0x03,
}

impl DriveMode {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => DriveMode::Current,
            0x01 => DriveMode::Voltage,
            0x02 => DriveMode::HBridge,
            _ => DriveMode::Standby,
        }
    }
}

/// Constant-current stimulus amplitude
///
/// The code packs the current range into the high nibble and the magnitude
/// within the range into the low nibble, matching the IDRV_RGE and VDRV_MAG
/// register fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum CurrentAmplitude {
    /// 16 nA RMS
    Amp16nA = 0x00,
    /// 32 nA RMS
    Amp32nA = 0x01,
    /// 80 nA RMS
    Amp80nA = 0x02,
    /// 160 nA RMS
    Amp160nA = 0x03,
    /// 320 nA RMS
    Amp320nA = 0x10,
    /// 640 nA RMS
    Amp640nA = 0x11,
    /// 1.6 µA RMS
    Amp1_6uA = 0x12,
    /// 3.2 µA RMS
    Amp3_2uA = 0x13,
    /// 6.4 µA RMS
    Amp6_4uA = 0x20,
    /// 12.8 µA RMS
    Amp12_8uA = 0x21,
    /// 32 µA RMS
    Amp32uA = 0x22,
    /// 64 µA RMS
    Amp64uA = 0x23,
    /// 128 µA RMS
    Amp128uA = 0x30,
    /// 256 µA RMS
    Amp256uA = 0x31,
    /// 640 µA RMS
    Amp640uA = 0x32,
    /// 1.28 mA RMS
    Amp1_28mA = 0x33,
}

impl CurrentAmplitude {
    /// The IDRV_RGE register field
    pub fn range_bits(self) -> u8 {
        (self as u8 >> 4) & 0x03
    }

    /// The VDRV_MAG register field
    pub fn magnitude_bits(self) -> u8 {
        self as u8 & 0x03
    }

    /// Reassemble an amplitude from the IDRV_RGE and VDRV_MAG fields
    pub fn from_parts(range: u8, magnitude: u8) -> Self {
        match (range & 0x03, magnitude & 0x03) {
            (0, 0) => CurrentAmplitude::Amp16nA,
            (0, 1) => CurrentAmplitude::Amp32nA,
            (0, 2) => CurrentAmplitude::Amp80nA,
            (0, 3) => CurrentAmplitude::Amp160nA,
            (1, 0) => CurrentAmplitude::Amp320nA,
            (1, 1) => CurrentAmplitude::Amp640nA,
            (1, 2) => CurrentAmplitude::Amp1_6uA,
            (1, 3) => CurrentAmplitude::Amp3_2uA,
            (2, 0) => CurrentAmplitude::Amp6_4uA,
            (2, 1) => CurrentAmplitude::Amp12_8uA,
            (2, 2) => CurrentAmplitude::Amp32uA,
            (2, 3) => CurrentAmplitude::Amp64uA,
            (3, 0) => CurrentAmplitude::Amp128uA,
            (3, 1) => CurrentAmplitude::Amp256uA,
            (3, 2) => CurrentAmplitude::Amp640uA,
            _ => CurrentAmplitude::Amp1_28mA,
        }
    }

    /// RMS current in nanoamperes
    pub fn rms_nanoamps(self) -> u32 {
        DRIVE_CURRENT_RMS_NA[self.range_bits() as usize][self.magnitude_bits() as usize]
    }

    /// Peak current in nanoamperes
    pub fn peak_nanoamps(self) -> u32 {
        DRIVE_CURRENT_PEAK_NA[self.range_bits() as usize][self.magnitude_bits() as usize]
    }

    /// Lowest drive frequency at which this amplitude may run, in tenths of
    /// hertz; zero when unrestricted
    pub fn min_drive_frequency(self) -> u32 {
        match self {
            CurrentAmplitude::Amp1_28mA => 163_840,
            CurrentAmplitude::Amp640uA => 81_920,
            CurrentAmplitude::Amp256uA => 20_480,
            CurrentAmplitude::Amp128uA => 5_120,
            _ => 0,
        }
    }

    /// The next amplitude down the fail-over chain
    pub fn next_lower(self) -> Option<Self> {
        match self {
            CurrentAmplitude::Amp1_28mA => Some(CurrentAmplitude::Amp640uA),
            CurrentAmplitude::Amp640uA => Some(CurrentAmplitude::Amp256uA),
            CurrentAmplitude::Amp256uA => Some(CurrentAmplitude::Amp128uA),
            CurrentAmplitude::Amp128uA => Some(CurrentAmplitude::Amp64uA),
            _ => None,
        }
    }
}

/// Constant-voltage stimulus amplitude
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum VoltageAmplitude {
    /// 35.4 mV RMS
    Rms35mV = 0x00,
    /// 70.7 mV RMS
    Rms70mV = 0x01,
    /// 177 mV RMS
    Rms177mV = 0x02,
    /// 354 mV RMS
    Rms354mV = 0x03,
}

impl VoltageAmplitude {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => VoltageAmplitude::Rms35mV,
            0x01 => VoltageAmplitude::Rms70mV,
            0x02 => VoltageAmplitude::Rms177mV,
            _ => VoltageAmplitude::Rms354mV,
        }
    }

    /// RMS voltage in microvolts
    pub fn rms_microvolts(self) -> u32 {
        DRIVE_VOLTAGE_RMS_UV[self as usize]
    }

    /// Peak voltage in microvolts
    pub fn peak_microvolts(self) -> u32 {
        DRIVE_VOLTAGE_PEAK_UV[self as usize]
    }
}

/// Level setting shared by the amplifier range and bandwidth fields
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AmplifierMode {
    /// Lowest setting
    Low = 0x00,
    /// Medium-low setting
    MediumLow = 0x01,
    /// Medium-high setting
    MediumHigh = 0x02,
    /// Highest setting
    High = 0x03,
}

impl AmplifierMode {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => AmplifierMode::Low,
            0x01 => AmplifierMode::MediumLow,
            0x02 => AmplifierMode::MediumHigh,
            _ => AmplifierMode::High,
        }
    }
}

/// Total channel gain
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TotalGain {
    /// Gain of 1
    X1 = 0x00,
    /// Gain of 2
    X2 = 0x01,
    /// Gain of 5
    X5 = 0x02,
    /// Gain of 10
    X10 = 0x03,
}

impl TotalGain {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => TotalGain::X1,
            0x01 => TotalGain::X2,
            0x02 => TotalGain::X5,
            _ => TotalGain::X10,
        }
    }

    /// The gain factor
    pub fn factor(self) -> u32 {
        match self {
            TotalGain::X1 => 1,
            TotalGain::X2 => 2,
            TotalGain::X5 => 5,
            TotalGain::X10 => 10,
        }
    }
}

impl Default for TotalGain {
    fn default() -> Self {
        TotalGain::X1
    }
}

/// Analog input high-pass filter corner
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum InputHpFilter {
    /// 100 Hz corner
    Hz100 = 0x00,
    /// 200 Hz corner
    Hz200 = 0x01,
    /// 500 Hz corner
    Hz500 = 0x02,
    /// 1 kHz corner
    Hz1000 = 0x03,
    /// 2 kHz corner
    Hz2000 = 0x04,
    /// 5 kHz corner
    Hz5000 = 0x05,
    /// 10 kHz corner
    Hz10000 = 0x06,
    /// Filter bypassed
    Bypass = 0x07,
}

impl InputHpFilter {
    /// Decode the four-bit register field; undocumented codes read as bypass
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0x00 => InputHpFilter::Hz100,
            0x01 => InputHpFilter::Hz200,
            0x02 => InputHpFilter::Hz500,
            0x03 => InputHpFilter::Hz1000,
            0x04 => InputHpFilter::Hz2000,
            0x05 => InputHpFilter::Hz5000,
            0x06 => InputHpFilter::Hz10000,
            _ => InputHpFilter::Bypass,
        }
    }

    /// Corner frequency in tenths of hertz, `None` when bypassed
    pub fn frequency_tenths(self) -> Option<u32> {
        match self {
            InputHpFilter::Hz100 => Some(1_000),
            InputHpFilter::Hz200 => Some(2_000),
            InputHpFilter::Hz500 => Some(5_000),
            InputHpFilter::Hz1000 => Some(10_000),
            InputHpFilter::Hz2000 => Some(20_000),
            InputHpFilter::Hz5000 => Some(50_000),
            InputHpFilter::Hz10000 => Some(100_000),
            InputHpFilter::Bypass => None,
        }
    }
}

/// Digital high-pass filter setting, as a fraction of the sample rate
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DigitalHpFilter {
    /// Filter bypassed
    Bypass = 0x00,
    /// Corner at 0.00025 of the sample rate
    Sr00025 = 0x01,
    /// Corner at 0.002 of the sample rate
    Sr002 = 0x02,
}

impl DigitalHpFilter {
    /// Decode the two-bit register field; undocumented codes read as bypass
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x01 => DigitalHpFilter::Sr00025,
            0x02 => DigitalHpFilter::Sr002,
            _ => DigitalHpFilter::Bypass,
        }
    }
}

/// Digital low-pass filter setting, as a fraction of the sample rate
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DigitalLpFilter {
    /// Filter bypassed
    Bypass = 0x00,
    /// Corner at 0.005 of the sample rate
    Sr0005 = 0x01,
    /// Corner at 0.02 of the sample rate
    Sr002 = 0x02,
    /// Corner at 0.08 of the sample rate
    Sr008 = 0x03,
    /// Corner at 0.25 of the sample rate
    Sr025 = 0x04,
}

impl DigitalLpFilter {
    /// Decode the three-bit register field; undocumented codes read as bypass
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x01 => DigitalLpFilter::Sr0005,
            0x02 => DigitalLpFilter::Sr002,
            0x03 => DigitalLpFilter::Sr008,
            0x04 => DigitalLpFilter::Sr025,
            _ => DigitalLpFilter::Bypass,
        }
    }
}

/// Fast-start behavior of the stimulus driver
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FastStartMode {
    /// Fast start disabled
    Off = 0x00,
    /// Fast start for 200 ms after the driver powers up
    Timed200ms = 0x01,
    /// Reserved bit combination
    Reserved = 0x02,
    /// Fast start held continuously under manual control
    Continuous = 0x03,
}

impl FastStartMode {
    /// The FAST_START_EN register bit
    pub fn enable_bit(self) -> u8 {
        self as u8 & 0x01
    }

    /// The FAST_MANUAL register bit
    pub fn manual_bit(self) -> u8 {
        (self as u8 >> 1) & 0x01
    }

    /// Reassemble the mode from the FAST_START_EN and FAST_MANUAL bits
    pub fn from_parts(enable: u8, manual: u8) -> Self {
        match ((manual & 0x01) << 1) | (enable & 0x01) {
            0x00 => FastStartMode::Off,
            0x01 => FastStartMode::Timed200ms,
            0x02 => FastStartMode::Reserved,
            _ => FastStartMode::Continuous,
        }
    }
}

/// Electrode assignment for the positive-side pins (DRVP and BIP)
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PositiveElectrode {
    /// Electrode EL1
    El1 = 0x00,
    /// Electrode EL2A
    El2A = 0x01,
    /// Electrode EL2B
    El2B = 0x02,
    /// Pin left unconnected
    Unused = 0x03,
}

impl PositiveElectrode {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => PositiveElectrode::El1,
            0x01 => PositiveElectrode::El2A,
            0x02 => PositiveElectrode::El2B,
            _ => PositiveElectrode::Unused,
        }
    }
}

/// Electrode assignment for the negative-side pins (DRVN and BIN)
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum NegativeElectrode {
    /// Electrode EL4
    El4 = 0x00,
    /// Electrode EL3A
    El3A = 0x01,
    /// Electrode EL3B
    El3B = 0x02,
    /// Pin left unconnected
    Unused = 0x03,
}

impl NegativeElectrode {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => NegativeElectrode::El4,
            0x01 => NegativeElectrode::El3A,
            0x02 => NegativeElectrode::El3B,
            _ => NegativeElectrode::Unused,
        }
    }
}

/// Built-in self-test load resistance
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BistLoad {
    /// 5100 Ω
    Ohm5100 = 0x00,
    /// 900 Ω
    Ohm900 = 0x01,
    /// 600 Ω
    Ohm600 = 0x02,
    /// 280 Ω
    Ohm280 = 0x03,
}

impl BistLoad {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => BistLoad::Ohm5100,
            0x01 => BistLoad::Ohm900,
            0x02 => BistLoad::Ohm600,
            _ => BistLoad::Ohm280,
        }
    }

    /// Load resistance in ohms
    pub fn resistance_ohms(self) -> u32 {
        match self {
            BistLoad::Ohm5100 => 5_100,
            BistLoad::Ohm900 => 900,
            BistLoad::Ohm600 => 600,
            BistLoad::Ohm280 => 280,
        }
    }
}

/// Galvanic-skin-response load resistance
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum GsrLoad {
    /// 25.7 kΩ
    KOhm25 = 0x00,
    /// 101 kΩ
    KOhm101 = 0x01,
    /// 505 kΩ
    KOhm505 = 0x02,
    /// 1 MΩ
    MOhm1 = 0x03,
}

impl GsrLoad {
    /// Decode the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => GsrLoad::KOhm25,
            0x01 => GsrLoad::KOhm101,
            0x02 => GsrLoad::KOhm505,
            _ => GsrLoad::MOhm1,
        }
    }

    /// Load resistance in ohms
    pub fn resistance_ohms(self) -> u32 {
        match self {
            GsrLoad::KOhm25 => 25_700,
            GsrLoad::KOhm101 => 101_000,
            GsrLoad::KOhm505 => 505_000,
            GsrLoad::MOhm1 => 1_000_000,
        }
    }
}

/// Lead bias resistance
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum LeadBiasResistance {
    /// 50 MΩ
    MOhm50 = 0x00,
    /// 100 MΩ
    MOhm100 = 0x01,
    /// 200 MΩ
    MOhm200 = 0x02,
}

impl LeadBiasResistance {
    /// Decode the two-bit register field; the reserved code reads as 200 MΩ
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => LeadBiasResistance::MOhm50,
            0x01 => LeadBiasResistance::MOhm100,
            _ => LeadBiasResistance::MOhm200,
        }
    }

    /// Bias resistance in megaohms
    pub fn resistance_megaohms(self) -> u32 {
        match self {
            LeadBiasResistance::MOhm50 => 50,
            LeadBiasResistance::MOhm100 => 100,
            LeadBiasResistance::MOhm200 => 200,
        }
    }
}

/// When the sample-queue status flags clear
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FifoStatClear {
    /// Flags clear when the status register is read
    OnStatusRead = 0x00,
    /// Flags also clear when queue data is read
    OnStatusOrDataRead = 0x01,
}

/// How the queue-full flag re-asserts
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FifoFullAssert {
    /// Asserts on every status evaluation while the queue is past the threshold
    Repeated = 0x00,
    /// Asserts once per fill cycle
    OncePerFill = 0x01,
}

/// What happens when the sample queue fills up
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FifoRollover {
    /// The chip stops writing until space is available
    StopOnFull = 0x00,
    /// New samples overwrite the oldest ones
    Overwrite = 0x01,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::TryFrom;

    #[test]
    fn current_amplitude_code_round_trips() {
        for &code in &[0x00u8, 0x03, 0x12, 0x23, 0x30, 0x33] {
            let amplitude = CurrentAmplitude::try_from(code).unwrap();
            assert_eq!(
                CurrentAmplitude::from_parts(
                    amplitude.range_bits(),
                    amplitude.magnitude_bits()
                ),
                amplitude,
            );
        }
        assert!(CurrentAmplitude::try_from(0x04).is_err());
    }

    #[test]
    fn current_tables_line_up_with_codes() {
        assert_eq!(CurrentAmplitude::Amp16nA.peak_nanoamps(), 23);
        assert_eq!(CurrentAmplitude::Amp64uA.peak_nanoamps(), 90_500);
        assert_eq!(CurrentAmplitude::Amp64uA.rms_nanoamps(), 64_000);
        assert_eq!(CurrentAmplitude::Amp1_28mA.rms_nanoamps(), 1_280_000);
    }

    #[test]
    fn fail_over_chain_descends_to_an_unrestricted_amplitude() {
        let mut amplitude = CurrentAmplitude::Amp1_28mA;
        let mut steps = 0;
        while let Some(lower) = amplitude.next_lower() {
            assert!(lower.min_drive_frequency() < amplitude.min_drive_frequency());
            amplitude = lower;
            steps += 1;
        }
        assert_eq!(amplitude, CurrentAmplitude::Amp64uA);
        assert_eq!(amplitude.min_drive_frequency(), 0);
        assert_eq!(steps, 4);
    }

    #[test]
    fn reference_clock_bits_and_frequency() {
        let source = ReferenceClockSource::External32768;
        assert_eq!(source.freq_sel_bit(), 1);
        assert_eq!(source.external_bit(), 1);
        assert_eq!(source.frequency_tenths(), 327_680);
        assert_eq!(
            ReferenceClockSource::Internal32000.frequency_tenths(),
            320_000,
        );
    }

    #[test]
    fn fast_start_mode_round_trips_through_its_bits() {
        for &mode in &[
            FastStartMode::Off,
            FastStartMode::Timed200ms,
            FastStartMode::Continuous,
        ] {
            assert_eq!(
                FastStartMode::from_parts(mode.enable_bit(), mode.manual_bit()),
                mode,
            );
        }
    }

    #[test]
    fn input_hp_filter_bypass_has_no_corner() {
        assert_eq!(InputHpFilter::Bypass.frequency_tenths(), None);
        assert_eq!(InputHpFilter::Hz500.frequency_tenths(), Some(5_000));
        assert_eq!(InputHpFilter::from_bits(0x0C), InputHpFilter::Bypass);
    }
}
