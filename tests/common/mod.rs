//! A scripted SPI bus standing in for the chip
//!
//! `MockSpi` keeps a 256-byte register memory and answers the driver's
//! 3-byte register frames and longer queue bursts. Queue bursts serve a
//! pattern chosen by the currently programmed stimulus, so a calibration run
//! sees plausibly different data in each of its measurement passes.

#![allow(dead_code)]

use embedded_hal::{blocking::spi::Transfer, digital::v2::OutputPin};

const DIR_READ: u8 = 0x80;
const FIFO_DATA_ADDRESS: usize = 0x0C;
const STATUS_1_ADDRESS: usize = 0x00;
const BIOZ_CONFIGURATION_3: usize = 0x22;
const BIOZ_CONFIGURATION_7: usize = 0x28;

pub struct MockSpi {
    /// Register memory, indexed by address
    pub mem: [u8; 256],
    /// Number of transactions seen
    pub transfers: usize,
    /// Corrupt this many register writes before behaving again
    pub fail_writes: usize,
}

impl MockSpi {
    pub fn new() -> Self {
        MockSpi {
            mem: [0; 256],
            transfers: 0,
            fail_writes: 0,
        }
    }

    /// The I and Q words served for queue bursts, chosen by the programmed
    /// stimulus: minimal current means the offset pass, otherwise the
    /// in-phase clock selects between the two measurement passes.
    fn fifo_pattern(&self) -> [[u8; 3]; 2] {
        let current_bits = (self.mem[BIOZ_CONFIGURATION_3] >> 2) & 0x0F;
        let i_clk_inverted = self.mem[BIOZ_CONFIGURATION_7] & 0x04 != 0;

        if current_bits == 0 {
            // Offset pass: I = 10, Q = 6
            [[0x10, 0x00, 0x0A], [0x20, 0x00, 0x06]]
        } else if !i_clk_inverted {
            // In-phase pass: I = 1010, Q = 506
            [[0x10, 0x03, 0xF2], [0x20, 0x01, 0xFA]]
        } else {
            // Quadrature pass: I = 510, Q = 1006
            [[0x10, 0x01, 0xFE], [0x20, 0x03, 0xEE]]
        }
    }
}

impl Transfer<u8> for MockSpi {
    type Error = ();

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        self.transfers += 1;
        let address = words[0] as usize;
        let direction = words[1];

        if words.len() > 3 && address == FIFO_DATA_ADDRESS && direction == DIR_READ {
            let pattern = self.fifo_pattern();
            for (slot, word) in words[2..].chunks_exact_mut(3).enumerate() {
                word.copy_from_slice(&pattern[slot % 2]);
            }
        } else if direction == DIR_READ {
            words[2] = if address == STATUS_1_ADDRESS {
                // Report the queue as full so measurement waits complete
                self.mem[address] | 0x80
            } else {
                self.mem[address]
            };
        } else {
            let mut value = words[2];
            if self.fail_writes > 0 {
                self.fail_writes -= 1;
                value = !value;
            }
            self.mem[address] = value;
        }

        Ok(words)
    }
}

pub struct MockPin {
    pub high: bool,
}

impl MockPin {
    pub fn new() -> Self {
        MockPin { high: true }
    }
}

impl OutputPin for MockPin {
    type Error = ();

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
