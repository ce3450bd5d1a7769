//! Bit-serial CRCs used by token, SOF and data packets.
//!
//! Both registers are kept in reflected form so that bit 0 of the result is the
//! first CRC bit on the wire.

const CRC5_POLY: u8 = 0x14; // x^5 + x^2 + 1, reflected
const CRC16_POLY: u16 = 0xA001; // x^16 + x^15 + x^2 + 1, reflected

/// Remainder of a field followed by its own (complemented) CRC5.
pub const CRC5_RESIDUAL: u8 = 0x19;
/// Remainder of a payload followed by its own (complemented) CRC16.
pub const CRC16_RESIDUAL: u16 = 0x4FFE;

fn crc5_bits(mut v: u32, bits: u32) -> u8 {
    let mut acc = 0x1F;
    for _ in 0..bits {
        let do_xor = (v & 1) as u8 != (acc & 1);
        acc >>= 1;
        if do_xor {
            acc ^= CRC5_POLY;
        }
        v >>= 1;
    }
    acc ^ 0x1F
}

/// CRC5 of an 11-bit token (`endpoint << 7 | address`) or SOF frame number field.
pub fn crc5(value: u16) -> u8 {
    crc5_bits(u32::from(value & 0x7FF), 11)
}

/// CRC16 of a data packet payload.
pub fn crc16(v: &[u8]) -> u16 {
    let mut acc = 0xFFFF;
    for b in v {
        let mut b = *b;
        for _ in 0..8 {
            let do_xor = (b as u16 & 1) != (acc & 1);
            acc >>= 1;
            if do_xor {
                acc ^= CRC16_POLY;
            }
            b >>= 1;
        }
    }
    acc ^ 0xFFFF
}

/// Checks the two bytes following a token or SOF PID: 11 field bits then 5 CRC bits.
pub fn check_crc5(field: [u8; 2]) -> bool {
    crc5_bits(u32::from(u16::from_le_bytes(field)), 16) == CRC5_RESIDUAL
}

/// Checks a data payload with its little-endian CRC16 still attached.
pub fn check_crc16(payload_with_crc: &[u8]) -> bool {
    payload_with_crc.len() >= 2 && crc16(payload_with_crc) == CRC16_RESIDUAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crc::{Crc, CRC_16_USB};

    #[test]
    fn crc5_reference_vectors() {
        assert_eq!(crc5(0x000), 0x02);
        assert_eq!(crc5(0x7FF), 0x08);
        // address 0x15, endpoint 0xE
        assert_eq!(crc5(0xE << 7 | 0x15), 0x1D);
        // address 0x3A, endpoint 0xA
        assert_eq!(crc5(0xA << 7 | 0x3A), 0x07);
        // address 0x70, endpoint 0x4
        assert_eq!(crc5(0x4 << 7 | 0x70), 0x0E);
    }

    #[test]
    fn crc5_ignores_bits_above_the_field() {
        assert_eq!(crc5(0xF800), crc5(0));
        assert_eq!(crc5(0xFFFF), crc5(0x7FF));
    }

    #[test]
    fn crc16_reference_vectors() {
        assert_eq!(crc16(&[]), 0x0000);
        assert_eq!(crc16(b"123456789"), 0xB4C8);
        assert_eq!(
            crc16(&[0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00]),
            0x94DD
        );
    }

    #[test]
    fn crc16_matches_crc_crate() {
        let usb = Crc::<u16>::new(&CRC_16_USB);
        let inputs: [&[u8]; 4] = [b"", b"\x00", b"\xFF\xFF\x00\xFF", b"123456789"];
        for input in inputs.iter() {
            assert_eq!(crc16(input), usb.checksum(input), "input {:02x?}", input);
        }
    }

    #[test]
    fn crc5_residual_holds_for_every_field() {
        for field in 0..=0x7FFu16 {
            let word = field | u16::from(crc5(field)) << 11;
            assert!(check_crc5(word.to_le_bytes()), "field {:#05x}", field);
        }
    }

    #[test]
    fn crc5_residual_rejects_flipped_bit() {
        let word = 0x123u16 | u16::from(crc5(0x123)) << 11;
        assert!(!check_crc5((word ^ 0x0010).to_le_bytes()));
    }

    #[test]
    fn crc16_residual_holds() {
        for payload in [&[][..], &[0x01, 0x02, 0x03][..], &[0xAA; 64][..]].iter() {
            let mut buf = payload.to_vec();
            buf.extend_from_slice(&crc16(payload).to_le_bytes());
            assert!(check_crc16(&buf));
            buf[0] ^= 0x80;
            assert!(!check_crc16(&buf));
        }
        assert!(!check_crc16(&[0x00]));
    }
}
