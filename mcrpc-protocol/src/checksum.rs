//! CRC-16/CCITT-FALSE
//!
//! Polynomial 0x1021, initial value 0xFFFF, MSB first, no final XOR.
//! Both ends of a link must run exactly this; it is part of the wire format.

/// Generator polynomial (x^16 + x^12 + x^5 + 1)
const POLY: u16 = 0x1021;

/// Initial register value, also the CRC of an empty span
pub const CRC_SEED: u16 = 0xFFFF;

/// Incremental CRC-16 accumulator
///
/// Lets the codec checksum the length field and the payload without
/// copying them into one contiguous buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Start a new checksum
    pub const fn new() -> Self {
        Self { crc: CRC_SEED }
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.crc ^= (byte as u16) << 8;
            for _ in 0..8 {
                if self.crc & 0x8000 != 0 {
                    self.crc = (self.crc << 1) ^ POLY;
                } else {
                    self.crc <<= 1;
                }
            }
        }
    }

    /// Current checksum value
    pub const fn finish(&self) -> u16 {
        self.crc
    }
}

/// CRC-16 of a single byte span
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_check_value() {
        // Standard catalogue check value for CRC-16/CCITT-FALSE
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_empty_is_seed() {
        assert_eq!(crc16(&[]), CRC_SEED);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = [0x05u8, 0x00, 0x00, 0x00, b'h', b'e', b'l', b'l', b'o'];
        let mut crc = Crc16::new();
        crc.update(&data[..4]);
        crc.update(&data[4..]);
        assert_eq!(crc.finish(), crc16(&data));
    }

    proptest! {
        #[test]
        fn test_deterministic(data in proptest::collection::vec(any::<u8>(), 0..300)) {
            prop_assert_eq!(crc16(&data), crc16(&data));
        }

        #[test]
        fn test_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..300),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut flipped = data.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(crc16(&data), crc16(&flipped));
        }
    }
}
