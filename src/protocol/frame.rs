//! Measurement frame decoding.
//!
//! Turns one raw notification payload from the measurement characteristic
//! into a typed [`Measurement`].

use crate::data::{Function, Mantissa, Measurement};
use crate::error::{Error, Result};

/// Minimum frame length accepted by the decoder.
///
/// Bytes 0, 1, 4 and 5 are load-bearing; bytes 2–3 are unused here.
pub const MIN_FRAME_LEN: usize = 6;

/// Decode one notification frame.
///
/// Frame layout:
/// - Byte 0 bits 6-7 + byte 1 bits 0-1: 4-bit function index
/// - Byte 0 bits 3-5: order index, biased by 4 (signed range −4..=3)
/// - Byte 0 bits 0-2: digits after the decimal point (0–7)
/// - Byte 4 + byte 5 bits 0-6: 15-bit unsigned magnitude, little-endian
/// - Byte 5 bit 7: sign (1 = negative)
///
/// Fails with [`Error::MalformedFrame`] for frames shorter than
/// [`MIN_FRAME_LEN`] and [`Error::OutOfRangeOrder`] for the two order
/// indices the hardware never emits.
pub fn decode(frame: &[u8]) -> Result<Measurement> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(Error::MalformedFrame {
            length: frame.len(),
            minimum: MIN_FRAME_LEN,
        });
    }

    let function_index = (frame[1] & 0b11) << 2 | frame[0] >> 6;
    let function = Function::from_index(function_index);

    let order_index = ((frame[0] >> 3) & 0b111) as i8 - 4;

    let decimal_point = frame[0] & 0b111;
    let magnitude = ((frame[5] & 0b0111_1111) as i32) << 8 | frame[4] as i32;
    let digits = if frame[5] >> 7 == 1 { -magnitude } else { magnitude };
    let mantissa = Mantissa::new(digits, decimal_point);

    Measurement::from_parts(function, mantissa, order_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Build a frame with the given function index, order index, decimal
    /// point position and raw magnitude bytes.
    fn frame(function_index: u8, order_index: i8, decimal_point: u8, lo: u8, hi: u8) -> [u8; 6] {
        let byte0 = (function_index & 0b11) << 6
            | (((order_index + 4) as u8) & 0b111) << 3
            | (decimal_point & 0b111);
        let byte1 = function_index >> 2;
        [byte0, byte1, 0, 0, lo, hi]
    }

    #[test]
    fn test_decode_documented_fixture() {
        // functionIndex 0, decimalPointPosition 2, orderIndex 0, magnitude 1
        let measurement = decode(&[0b0000_0010, 0b0000_0000, 0, 0, 0b0000_0001, 0]).unwrap();
        assert_eq!(measurement.function, Function::VoltageDc);
        assert_eq!(measurement.mantissa, Mantissa::new(1, 2));
        assert_eq!(measurement.order(), 0);
        assert_eq!(measurement.prefix(), "");
        assert_eq!(measurement.unit(), Some("V"));
        assert_eq!(measurement.value_string(), "0.01");
        assert!((measurement.value() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_decode_sign_bit() {
        let positive = decode(&frame(0, 0, 2, 1, 0)).unwrap();
        let negative = decode(&frame(0, 0, 2, 1, 0b1000_0000)).unwrap();
        assert!(!positive.mantissa.is_negative());
        assert!(negative.mantissa.is_negative());
        assert_eq!(negative.mantissa.digits(), -positive.mantissa.digits());
        assert_eq!(negative.value_string(), "-0.01");
    }

    #[test]
    fn test_decode_fifteen_bit_magnitude() {
        // All magnitude bits set, sign clear: 0x7FFF = 32767
        let measurement = decode(&frame(0, 0, 0, 0xFF, 0x7F)).unwrap();
        assert_eq!(measurement.mantissa.digits(), 32767);

        // Sign bit set on the same magnitude
        let measurement = decode(&frame(0, 0, 0, 0xFF, 0xFF)).unwrap();
        assert_eq!(measurement.mantissa.digits(), -32767);
    }

    #[test]
    fn test_decode_all_function_indices() {
        for index in 0u8..=15 {
            let measurement = decode(&frame(index, 0, 0, 1, 0)).unwrap();
            assert_eq!(measurement.function, Function::from_index(index));
            assert_eq!(measurement.unit(), Function::from_index(index).unit());
        }
    }

    #[test]
    fn test_decode_order_range() {
        for (index, order, prefix) in [
            (-3, -9, "n"),
            (-2, -6, "u"),
            (-1, -3, "m"),
            (0, 0, ""),
            (1, 3, "k"),
            (2, 6, "M"),
        ] {
            let measurement = decode(&frame(0, index, 0, 1, 0)).unwrap();
            assert_eq!(measurement.order(), order);
            assert_eq!(measurement.prefix(), prefix);
        }
    }

    #[test]
    fn test_decode_out_of_range_order() {
        for index in [-4i8, 3] {
            let err = decode(&frame(0, index, 0, 1, 0)).unwrap_err();
            assert!(matches!(err, Error::OutOfRangeOrder { index: i } if i == index));
        }
    }

    #[test]
    fn test_decode_short_frame() {
        for length in 0..MIN_FRAME_LEN {
            let short = vec![0u8; length];
            let err = decode(&short).unwrap_err();
            assert!(matches!(err, Error::MalformedFrame { length: l, .. } if l == length));
        }
    }

    #[test]
    fn test_decode_ignores_unused_bytes() {
        let mut raw = frame(0, 0, 2, 1, 0);
        raw[2] = 0xAB;
        raw[3] = 0xCD;
        let measurement = decode(&raw).unwrap();
        assert_eq!(measurement.value_string(), "0.01");
    }

    #[test]
    fn test_decode_accepts_longer_frames() {
        let mut raw = frame(0, 0, 2, 1, 0).to_vec();
        raw.extend_from_slice(&[0, 0, 0, 0]);
        assert!(decode(&raw).is_ok());
    }

    proptest! {
        #[test]
        fn decode_never_panics(frame in proptest::collection::vec(any::<u8>(), 0..16)) {
            let _ = decode(&frame);
        }

        #[test]
        fn decode_is_deterministic_and_consistent(bytes in any::<[u8; 6]>()) {
            let first = decode(&bytes);
            let second = decode(&bytes);
            match (first, second) {
                (Ok(a), Ok(b)) => {
                    prop_assert_eq!(a, b);
                    // order and prefix always move together
                    let expected = match a.order() {
                        -9 => "n",
                        -6 => "u",
                        -3 => "m",
                        0 => "",
                        3 => "k",
                        6 => "M",
                        _ => "?",
                    };
                    prop_assert_ne!(expected, "?", "order {} outside table", a.order());
                    prop_assert_eq!(a.prefix(), expected);
                }
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "decode not deterministic"),
            }
        }
    }
}
