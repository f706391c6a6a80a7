//! IEEE-754 binary16 conversion as the engine expects it.
//!
//! Decoding handles the whole binary16 domain, subnormals included. Encoding
//! truncates the mantissa, saturates large exponents to infinity and flushes
//! anything below the smallest normal exponent to a signed zero; it never
//! produces subnormals. NaN payloads keep only their low ten bits.

const F16_EXPONENT_SHIFT: u32 = 10;
const F16_EXPONENT_BIAS: i32 = 15;
const F16_MANTISSA_BITS: u32 = 0x3ff;
const F16_MANTISSA_SHIFT: u32 = 23 - F16_EXPONENT_SHIFT;
const F16_MAX_EXPONENT: u32 = 0x1f << F16_EXPONENT_SHIFT;

pub fn decode_half(half: u16) -> f32 {
    f32::from_bits(half_to_single_bits(half))
}

pub fn encode_half(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = (bits >> 16) & 0x8000;
    let exponent = ((bits >> 23) & 0xff) as i32 - 127;
    let mantissa = bits & 0x007f_ffff;

    let half = if exponent == 128 {
        // NaN keeps only the low ten payload bits, so a quiet NaN whose
        // payload is all high bits comes out as infinity
        sign | F16_MAX_EXPONENT | (mantissa & F16_MANTISSA_BITS)
    } else if exponent > F16_EXPONENT_BIAS {
        sign | F16_MAX_EXPONENT
    } else if exponent > -F16_EXPONENT_BIAS {
        let biased = (exponent + F16_EXPONENT_BIAS) as u32;
        sign | (biased << F16_EXPONENT_SHIFT) | (mantissa >> F16_MANTISSA_SHIFT)
    } else {
        sign
    };
    half as u16
}

fn half_to_single_bits(half: u16) -> u32 {
    let half = half as u32;
    let sign = (half >> 15) & 0x1;
    let mut exponent = ((half >> 10) & 0x1f) as i32;
    let mut fraction = half & F16_MANTISSA_BITS;

    if exponent == 0 {
        if fraction == 0 {
            return sign << 31;
        }
        while fraction & 0x400 == 0 {
            fraction <<= 1;
            exponent -= 1;
        }
        exponent += 1;
        fraction &= !0x400;
    } else if exponent == 31 {
        return (sign << 31) | 0x7f80_0000 | (fraction << 13);
    }

    let exponent = (exponent + (127 - F16_EXPONENT_BIAS)) as u32;
    (sign << 31) | (exponent << 23) | (fraction << 13)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_matches_reference_for_every_bit_pattern() {
        for bits in 0..=u16::MAX {
            let ours = decode_half(bits);
            let reference = ::half::f16::from_bits(bits).to_f32();
            if reference.is_nan() {
                assert!(ours.is_nan(), "{bits:#06x} should decode to NaN");
                assert_eq!(ours.is_sign_negative(), reference.is_sign_negative());
            } else {
                assert_eq!(ours.to_bits(), reference.to_bits(), "{bits:#06x}");
            }
        }
    }

    #[test]
    fn normal_range_values_survive_encode_decode() {
        // every finite, normal binary16 value
        for bits in 0..=u16::MAX {
            let exponent = (bits >> 10) & 0x1f;
            if exponent == 0 || exponent == 31 {
                continue;
            }
            let value = decode_half(bits);
            assert_eq!(encode_half(value), bits);
            assert_eq!(decode_half(encode_half(value)), value);
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(encode_half(1.0), 0x3c00);
        assert_eq!(encode_half(-2.0), 0xc000);
        assert_eq!(encode_half(0.5), 0x3800);
        assert_eq!(encode_half(0.0), 0x0000);
        assert_eq!(encode_half(-0.0), 0x8000);
        assert_eq!(decode_half(0x3c00), 1.0);
        assert_eq!(decode_half(0x7bff), 65504.0);
    }

    #[test]
    fn mantissa_is_truncated_not_rounded() {
        // 1 + 2^-11 sits exactly between two binary16 values
        let value = 1.0 + f32::powi(2.0, -11);
        assert_eq!(encode_half(value), 0x3c00);
        let just_below_two = f32::from_bits(2.0f32.to_bits() - 1);
        assert_eq!(encode_half(just_below_two), 0x3fff);
    }

    #[test]
    fn large_values_saturate_to_infinity() {
        assert_eq!(encode_half(1.0e6), 0x7c00);
        assert_eq!(encode_half(-70000.0), 0xfc00);
        assert_eq!(decode_half(encode_half(1.0e6)), f32::INFINITY);
        assert_eq!(encode_half(f32::INFINITY), 0x7c00);
        assert_eq!(encode_half(f32::NEG_INFINITY), 0xfc00);
    }

    #[test]
    fn tiny_values_flush_to_signed_zero() {
        let smallest_normal = f32::powi(2.0, -14);
        assert_eq!(encode_half(smallest_normal), 0x0400);
        assert_eq!(encode_half(smallest_normal / 2.0), 0x0000);
        assert_eq!(encode_half(-1.0e-7), 0x8000);
        // subnormal halfs decode fine but do not come back
        let subnormal = decode_half(0x0001);
        assert_eq!(subnormal, f32::powi(2.0, -24));
        assert_eq!(encode_half(subnormal), 0x0000);
    }

    #[test]
    fn nan_payload_keeps_low_bits() {
        assert_eq!(encode_half(f32::from_bits(0x7fc0_0000)), 0x7c00);
        assert_eq!(encode_half(f32::from_bits(0xffc0_0000)), 0xfc00);
        assert_eq!(encode_half(f32::from_bits(0x7f80_0001)), 0x7c01);
        assert_eq!(encode_half(f32::from_bits(0x7fc0_03ff)), 0x7fff);
        assert!(decode_half(encode_half(f32::from_bits(0x7f80_0001))).is_nan());
        assert_eq!(decode_half(0x7e00).to_bits(), 0x7fc0_0000);
    }
}
