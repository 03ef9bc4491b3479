//! Decoding of the MAX30009 sample queue
//!
//! The chip streams 24-bit big-endian words. The top nibble tags the word's
//! channel; the remaining 20 bits are a two's-complement ADC code. A fixed
//! all-but-one-bits word is reserved for host-inserted markers, which let a
//! caller correlate a moment in time with a position in the queue.

use serde::{Deserialize, Serialize};

/// Channel tag nibble of an in-phase word
pub const IN_PHASE_TAG: u8 = 0x1;

/// Channel tag nibble of a quadrature word
pub const QUADRATURE_TAG: u8 = 0x2;

/// The complete marker word
pub const MARKER_WORD: u32 = 0xFF_FFFE;

/// Number of bytes per queue word
pub const WORD_SIZE: usize = 3;

/// What a queue word belongs to
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ChannelTag {
    /// In-phase measurement channel
    InPhase,
    /// Quadrature measurement channel
    Quadrature,
    /// Host-inserted marker
    Marker,
    /// Unrecognized tag nibble
    Invalid,
}

/// One decoded queue word
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The channel this word belongs to
    pub tag: ChannelTag,
    /// Sign-extended ADC code; zero for markers
    pub value: i32,
    /// Impedance in hundredths of ohm, once converted
    pub impedance: i32,
    /// Voltage in microvolts, once converted
    pub voltage: i32,
}

impl Sample {
    /// A sample carrying nothing
    pub fn invalid() -> Self {
        Sample {
            tag: ChannelTag::Invalid,
            value: 0,
            impedance: 0,
            voltage: 0,
        }
    }
}

/// Decode one queue word
///
/// Total over all inputs: unknown tags come back as [`ChannelTag::Invalid`]
/// rather than an error, so a corrupted stream cannot take the reader down.
pub fn decode(bytes: [u8; WORD_SIZE]) -> Sample {
    let word = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32;

    if word == MARKER_WORD {
        return Sample {
            tag: ChannelTag::Marker,
            value: 0,
            impedance: 0,
            voltage: 0,
        };
    }

    let tag = match (word >> 20) as u8 {
        IN_PHASE_TAG => ChannelTag::InPhase,
        QUADRATURE_TAG => ChannelTag::Quadrature,
        _ => return Sample::invalid(),
    };

    // 20-bit two's complement payload
    let mut value = (word & 0x000F_FFFF) as i32;
    if value & 0x0008_0000 != 0 {
        value -= 0x0010_0000;
    }

    Sample {
        tag,
        value,
        impedance: 0,
        voltage: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_words_decode_with_their_tags() {
        let sample = decode([0x10, 0x00, 0x2A]);
        assert_eq!(sample.tag, ChannelTag::InPhase);
        assert_eq!(sample.value, 0x2A);

        let sample = decode([0x20, 0x03, 0xE8]);
        assert_eq!(sample.tag, ChannelTag::Quadrature);
        assert_eq!(sample.value, 1000);
    }

    #[test]
    fn negative_codes_sign_extend() {
        // -1 on the in-phase channel
        let sample = decode([0x1F, 0xFF, 0xFF]);
        assert_eq!(sample.value, -1);

        // Most negative code
        let sample = decode([0x28, 0x00, 0x00]);
        assert_eq!(sample.tag, ChannelTag::Quadrature);
        assert_eq!(sample.value, -524_288);
    }

    #[test]
    fn marker_word_decodes_with_value_zero() {
        let sample = decode([0xFF, 0xFF, 0xFE]);
        assert_eq!(sample.tag, ChannelTag::Marker);
        assert_eq!(sample.value, 0);
    }

    #[test]
    fn unknown_tags_are_invalid_not_fatal() {
        assert_eq!(decode([0x30, 0x12, 0x34]).tag, ChannelTag::Invalid);
        assert_eq!(decode([0x00, 0x00, 0x00]).tag, ChannelTag::Invalid);
        assert_eq!(decode([0xFF, 0xFF, 0xFF]).tag, ChannelTag::Invalid);
    }
}
