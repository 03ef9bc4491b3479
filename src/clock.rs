//! Clock-tree synthesis for the MAX30009
//!
//! The stimulus frequency of the chip is produced by a PLL running from a
//! 32 kHz-class reference, followed by a chain of dividers: the synthesis
//! divider KDIV and the DAC oversampling ratio set the drive frequency, while
//! NDIV and the ADC oversampling ratio set the sample rate. This module
//! searches that divider space for the configuration whose sample rate comes
//! closest to the requested one while holding the drive frequency within
//! 0.2 % of the request.
//!
//! All frequencies are fixed-point tenths of hertz.

use serde::{Deserialize, Serialize};

/// Reference frequency with CLK_FREQ_SEL = 0, in tenths of hertz
pub const REF_CLK_32000: u32 = 320_000;

/// Reference frequency with CLK_FREQ_SEL = 1, in tenths of hertz
pub const REF_CLK_32768: u32 = 327_680;

/// Lowest supported drive frequency, in tenths of hertz
pub const MIN_DRIVE_FREQ: u32 = 160;

/// Highest supported drive frequency, in tenths of hertz
pub const MAX_DRIVE_FREQ: u32 = 8_000_000;

const MIN_PLL_CLK: u64 = 140_000_000;
const MAX_PLL_CLK: u64 = 280_000_000;
const MIN_SYNTH_CLK: u64 = 40_960;
const MAX_SYNTH_CLK: u64 = 280_000_000;
const MIN_ADC_CLK: u32 = 160_000;
const MAX_ADC_CLK: u32 = 363_750;

/// How many times the target drive frequency is nudged up before giving up
const SOLVE_ATTEMPTS: u32 = 300;

/// ADC clock divider per NDIV code
pub const NDIV_DIVIDERS: [u32; 2] = [512, 1024];

/// Synthesis divider per KDIV code; codes above 0x0D saturate
pub const KDIV_DIVIDERS: [u32; 16] = [
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 8192, 8192,
];

/// ADC oversampling ratio per code
pub const ADC_OSR_DIVIDERS: [u32; 8] = [8, 16, 32, 64, 128, 256, 512, 1024];

/// DAC oversampling ratio per code
pub const DAC_OSR_DIVIDERS: [u32; 4] = [32, 64, 128, 256];

/// A solved divider configuration
///
/// Carries the register codes to commit alongside the frequencies the chip
/// will actually produce with them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClockSolution {
    /// How many valid divider combinations the search saw
    pub candidates: u32,

    /// Reference frequency the solution assumes
    pub ref_clk: u32,
    /// PLL output frequency
    pub pll_clk: u32,
    /// Synthesis clock (PLL / KDIV)
    pub synth_clk: u32,
    /// ADC clock (PLL / NDIV)
    pub adc_clk: u32,

    /// Drive frequency the caller asked for
    pub requested_drive_freq: u32,
    /// Drive frequency the dividers produce
    pub drive_freq: u32,
    /// Absolute error between target and produced drive frequency
    pub drive_freq_error: u32,

    /// Sample rate the caller asked for
    pub requested_sample_rate: u32,
    /// Sample rate the dividers produce
    pub sample_rate: u32,

    /// PLL multiplier register value (multiplication factor minus one)
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

/// Search the divider space for the given targets
///
/// When no divider combination can hit `drive_freq` within tolerance, the
/// target is raised one tenth-hertz at a time, up to 300 times, before the
/// search fails.
pub fn find_solution(
    ref_clk: u32,
    drive_freq: u32,
    desired_sample_rate: u32,
) -> Option<ClockSolution> {
    let mut target = drive_freq;
    for _ in 0..SOLVE_ATTEMPTS {
        if let Some(solution) = solve_once(ref_clk, drive_freq, target, desired_sample_rate) {
            return Some(solution);
        }
        target += 1;
    }
    None
}

fn solve_once(
    ref_clk: u32,
    requested: u32,
    target: u32,
    desired_sample_rate: u32,
) -> Option<ClockSolution> {
    let mut best: Option<ClockSolution> = None;
    let mut best_delta = u32::MAX;
    let mut candidates = 0;

    for (dac_osr_code, &dac_osr) in DAC_OSR_DIVIDERS.iter().enumerate() {
        for (kdiv_code, &kdiv) in KDIV_DIVIDERS.iter().enumerate() {
            let synth_target = target as u64 * dac_osr as u64;
            let pll_target = synth_target * kdiv as u64;

            // Round the PLL target to a whole multiple of the reference.
            let multiplier = (pll_target + ref_clk as u64 / 2) / ref_clk as u64;
            if multiplier == 0 {
                continue;
            }
            let pll_clk = multiplier * ref_clk as u64;
            if pll_clk < MIN_PLL_CLK || pll_clk > MAX_PLL_CLK {
                continue;
            }

            let synth_clk = pll_clk / kdiv as u64;
            if synth_clk < MIN_SYNTH_CLK || synth_clk > MAX_SYNTH_CLK {
                continue;
            }

            let achieved = (synth_clk / dac_osr as u64) as u32;
            let error = if achieved > target {
                achieved - target
            } else {
                target - achieved
            };
            if error > achieved / 500 {
                continue;
            }

            for (ndiv_code, &ndiv) in NDIV_DIVIDERS.iter().enumerate() {
                let adc_clk = (pll_clk / ndiv as u64) as u32;
                if adc_clk < MIN_ADC_CLK || adc_clk > MAX_ADC_CLK {
                    continue;
                }

                for (adc_osr_code, &adc_osr) in ADC_OSR_DIVIDERS.iter().enumerate() {
                    // The sample clock must divide the drive period evenly,
                    // or demodulation drifts against the stimulus.
                    let dac_divider = kdiv * dac_osr;
                    let adc_divider = ndiv * adc_osr;
                    if adc_divider < dac_divider || adc_divider % dac_divider != 0 {
                        continue;
                    }

                    candidates += 1;

                    let sample_rate = adc_clk / adc_osr;
                    let delta = if sample_rate > desired_sample_rate {
                        sample_rate - desired_sample_rate
                    } else {
                        desired_sample_rate - sample_rate
                    };
                    if delta < best_delta {
                        best_delta = delta;
                        best = Some(ClockSolution {
                            candidates: 0,
                            ref_clk,
                            pll_clk: pll_clk as u32,
                            synth_clk: synth_clk as u32,
                            adc_clk,
                            requested_drive_freq: requested,
                            drive_freq: achieved,
                            drive_freq_error: error,
                            requested_sample_rate: desired_sample_rate,
                            sample_rate,
                            mdiv: (multiplier - 1) as u16,
                            ndiv: ndiv_code as u8,
                            kdiv: kdiv_code as u8,
                            dac_osr: dac_osr_code as u8,
                            adc_osr: adc_osr_code as u8,
                        });
                    }
                }
            }
        }
    }

    best.map(|mut solution| {
        solution.candidates = candidates;
        solution
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_hertz_solves_exactly_from_32768() {
        let solution = find_solution(REF_CLK_32768, 1_000, 1_000).unwrap();

        assert!(solution.candidates > 0);
        assert_eq!(solution.drive_freq, 1_000);
        assert_eq!(solution.drive_freq_error, 0);
        assert_eq!(solution.sample_rate, 1_000);
        assert_eq!(solution.pll_clk, 262_144_000);
        assert_eq!(solution.mdiv, 799);
    }

    #[test]
    fn achieved_frequency_stays_within_two_permille() {
        for &drive in &[1_234u32, 5_000, 123_450, 1_000_000] {
            let solution = find_solution(REF_CLK_32000, drive, 2_000).unwrap();
            assert!(
                solution.drive_freq_error <= solution.drive_freq / 500,
                "drive {} landed on {} with error {}",
                drive,
                solution.drive_freq,
                solution.drive_freq_error,
            );
        }
    }

    #[test]
    fn divider_ratio_is_a_whole_multiple() {
        let solution = find_solution(REF_CLK_32768, 10_000, 3_000).unwrap();
        let dac_divider = KDIV_DIVIDERS[solution.kdiv as usize]
            * DAC_OSR_DIVIDERS[solution.dac_osr as usize];
        let adc_divider = NDIV_DIVIDERS[solution.ndiv as usize]
            * ADC_OSR_DIVIDERS[solution.adc_osr as usize];
        assert!(adc_divider >= dac_divider);
        assert_eq!(adc_divider % dac_divider, 0);
    }

    #[test]
    fn search_is_deterministic() {
        let first = find_solution(REF_CLK_32768, 50_000, 4_000).unwrap();
        let second = find_solution(REF_CLK_32768, 50_000, 4_000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn committed_frequencies_reproduce_from_the_register_codes() {
        let solution = find_solution(REF_CLK_32768, 1_000, 1_000).unwrap();

        let pll = solution.ref_clk as u64 * (solution.mdiv as u64 + 1);
        let synth = pll / KDIV_DIVIDERS[solution.kdiv as usize] as u64;
        let drive = synth / DAC_OSR_DIVIDERS[solution.dac_osr as usize] as u64;
        let adc = pll / NDIV_DIVIDERS[solution.ndiv as usize] as u64;
        let rate = adc / ADC_OSR_DIVIDERS[solution.adc_osr as usize] as u64;

        assert_eq!(pll as u32, solution.pll_clk);
        assert_eq!(drive as u32, solution.drive_freq);
        assert_eq!(rate as u32, solution.sample_rate);
    }
}
