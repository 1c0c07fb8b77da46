//! Delta-varint integer codec ("compressed integers").
//!
//! Values travel as running deltas. A header declares a *common* delta;
//! then a 2-bit code per element selects the width of that element's
//! delta: the common value (no bytes), small, medium, or large. Small /
//! medium / large are 8 / 16 / 32-bit signed deltas for the 32-bit codec
//! and 16 / 32 / 64-bit for the 64-bit codec. Each value is the previous
//! value plus its delta, starting from zero.

use crate::util::{Error, Result};

const CODE_COMMON: u8 = 0;
const CODE_SMALL: u8 = 1;
const CODE_MEDIUM: u8 = 2;
const CODE_LARGE: u8 = 3;

/// Worst-case encoded size for `count` 32-bit elements.
pub fn encoded_buffer_size_32(count: usize) -> usize {
    if count == 0 {
        0
    } else {
        4 + (count + 3) / 4 + count * 4
    }
}

/// Worst-case encoded size for `count` 64-bit elements.
pub fn encoded_buffer_size_64(count: usize) -> usize {
    if count == 0 {
        0
    } else {
        8 + (count + 3) / 4 + count * 8
    }
}

macro_rules! define_int_codec {
    ($decode:ident, $ty:ty, $header_bytes:expr,
     $small:ty, $medium:ty, $large:ty) => {
        /// Decode `count` elements from an encoded (already inflated)
        /// buffer. Truncated streams are rejected.
        pub fn $decode(data: &[u8], count: usize) -> Result<Vec<$ty>> {
            if count == 0 {
                return Ok(Vec::new());
            }
            let header = $header_bytes;
            let n_code_bytes = (count + 3) / 4;
            if data.len() < header + n_code_bytes {
                return Err(Error::invalid("compressed-int stream truncated"));
            }
            let common = <$ty>::from_le_bytes(data[..header].try_into().unwrap());
            let codes = &data[header..header + n_code_bytes];
            let mut deltas = &data[header + n_code_bytes..];

            let mut out = Vec::with_capacity(count);
            let mut prev: $ty = 0;
            for i in 0..count {
                let code = (codes[i / 4] >> ((i % 4) * 2)) & 0b11;
                let delta: $ty = match code {
                    CODE_COMMON => common,
                    CODE_SMALL => {
                        const W: usize = std::mem::size_of::<$small>();
                        if deltas.len() < W {
                            return Err(Error::invalid("compressed-int stream truncated"));
                        }
                        let v = <$small>::from_le_bytes(deltas[..W].try_into().unwrap());
                        deltas = &deltas[W..];
                        v as $ty
                    }
                    CODE_MEDIUM => {
                        const W: usize = std::mem::size_of::<$medium>();
                        if deltas.len() < W {
                            return Err(Error::invalid("compressed-int stream truncated"));
                        }
                        let v = <$medium>::from_le_bytes(deltas[..W].try_into().unwrap());
                        deltas = &deltas[W..];
                        v as $ty
                    }
                    CODE_LARGE => {
                        const W: usize = std::mem::size_of::<$large>();
                        if deltas.len() < W {
                            return Err(Error::invalid("compressed-int stream truncated"));
                        }
                        let v = <$large>::from_le_bytes(deltas[..W].try_into().unwrap());
                        deltas = &deltas[W..];
                        v as $ty
                    }
                    _ => unreachable!(),
                };
                prev = prev.wrapping_add(delta);
                out.push(prev);
            }
            Ok(out)
        }
    };
}

define_int_codec!(decode_i32s, i32, 4, i8, i16, i32);
define_int_codec!(decode_i64s, i64, 8, i16, i32, i64);

macro_rules! define_int_encoder {
    ($encode:ident, $ty:ty, $small:ty, $medium:ty, $large:ty) => {
        /// Encode values into the raw codec stream (header + codes +
        /// packed deltas). Fixture helper for tests.
        pub fn $encode(values: &[$ty]) -> Vec<u8> {
            if values.is_empty() {
                return Vec::new();
            }

            // Deltas against the running previous value.
            let mut deltas = Vec::with_capacity(values.len());
            let mut prev: $ty = 0;
            for &v in values {
                deltas.push(v.wrapping_sub(prev));
                prev = v;
            }

            // Most frequent delta becomes the common value.
            let mut counts = std::collections::HashMap::new();
            for &d in &deltas {
                *counts.entry(d).or_insert(0usize) += 1;
            }
            let common = counts
                .into_iter()
                .max_by_key(|&(_, n)| n)
                .map(|(d, _)| d)
                .unwrap_or(0);

            let n_code_bytes = (values.len() + 3) / 4;
            let mut codes = vec![0u8; n_code_bytes];
            let mut packed = Vec::new();
            for (i, &d) in deltas.iter().enumerate() {
                let code = if d == common {
                    CODE_COMMON
                } else if let Ok(v) = <$small>::try_from(d) {
                    packed.extend_from_slice(&v.to_le_bytes());
                    CODE_SMALL
                } else if let Ok(v) = <$medium>::try_from(d) {
                    packed.extend_from_slice(&v.to_le_bytes());
                    CODE_MEDIUM
                } else {
                    packed.extend_from_slice(&(d as $large).to_le_bytes());
                    CODE_LARGE
                };
                codes[i / 4] |= code << ((i % 4) * 2);
            }

            let mut out = Vec::new();
            out.extend_from_slice(&common.to_le_bytes());
            out.extend_from_slice(&codes);
            out.extend_from_slice(&packed);
            out
        }
    };
}

define_int_encoder!(encode_i32s, i32, i8, i16, i32);
define_int_encoder!(encode_i64s, i64, i16, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_i32() {
        let cases: Vec<Vec<i32>> = vec![
            vec![],
            vec![0],
            vec![1, 2, 3, 4, 5],
            vec![100, 100, 100, 100],
            vec![0, -1, i32::MIN, i32::MAX, 42],
            (0..1000).map(|i| i * 7 - 350).collect(),
        ];
        for values in cases {
            let encoded = encode_i32s(&values);
            let decoded = decode_i32s(&encoded, values.len()).unwrap();
            assert_eq!(decoded, values);
        }
    }

    #[test]
    fn test_roundtrip_i64() {
        let cases: Vec<Vec<i64>> = vec![
            vec![],
            vec![i64::MIN, i64::MAX, 0, -1],
            (0..500).map(|i| (i as i64) << 33).collect(),
            vec![7; 64],
        ];
        for values in cases {
            let encoded = encode_i64s(&values);
            let decoded = decode_i64s(&encoded, values.len()).unwrap();
            assert_eq!(decoded, values);
        }
    }

    #[test]
    fn test_monotonic_indices_compress_to_common() {
        // A run of +1 deltas is the codec's sweet spot: header + code
        // bytes only.
        let values: Vec<i32> = (1..=64).collect();
        let encoded = encode_i32s(&values);
        assert_eq!(encoded.len(), 4 + 16);
    }

    #[test]
    fn test_truncated_rejected() {
        let values: Vec<i32> = (0..16).map(|i| i * 1000).collect();
        let encoded = encode_i32s(&values);
        for cut in [0, 3, encoded.len() - 1] {
            assert!(decode_i32s(&encoded[..cut], values.len()).is_err());
        }
    }

    #[test]
    fn test_zero_count() {
        assert_eq!(decode_i32s(&[], 0).unwrap(), Vec::<i32>::new());
    }
}
