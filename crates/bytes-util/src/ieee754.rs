//! Portable IEEE-754 packing.
//!
//! Floats are assembled from their sign, exponent and mantissa fields with
//! plain arithmetic instead of the host's float-to-bits conversion. Single
//! precision values are rounded to nearest through the `rt` correction term
//! (`2^-24 - 2^-77`), so a value narrowed from an `f64` ends up with exactly the
//! bits the reference ByteArray implementations produce. NaN is always written
//! with a mantissa of one and no sign.

use std::f64::consts::LN_2;

/// Field widths of a binary interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatLayout {
    /// Number of explicit mantissa bits.
    pub mantissa_bits: i32,
    /// Encoded width in bytes.
    pub bytes: usize,
}

impl FloatLayout {
    /// binary16
    pub const HALF: Self = Self {
        mantissa_bits: 10,
        bytes: 2,
    };
    /// binary32
    pub const SINGLE: Self = Self {
        mantissa_bits: 23,
        bytes: 4,
    };
    /// binary64
    pub const DOUBLE: Self = Self {
        mantissa_bits: 52,
        bytes: 8,
    };

    const fn total_bits(self) -> i32 {
        self.bytes as i32 * 8
    }

    const fn exponent_bits(self) -> i32 {
        self.total_bits() - self.mantissa_bits - 1
    }

    const fn exponent_max(self) -> i32 {
        (1 << self.exponent_bits()) - 1
    }

    const fn exponent_bias(self) -> i32 {
        self.exponent_max() >> 1
    }
}

/// Exact `2^n` for any integer `n`, saturating to zero and infinity.
fn exp2i(n: i32) -> f64 {
    if n > 1023 {
        f64::INFINITY
    } else if n >= -1022 {
        f64::from_bits(((n + 1023) as u64) << 52)
    } else if n >= -1074 {
        f64::from_bits(1u64 << (n + 1074))
    } else {
        0.0
    }
}

/// Packs `value` into the low `layout.bytes * 8` bits of the result.
pub fn pack(value: f64, layout: FloatLayout) -> u64 {
    let m_len = layout.mantissa_bits;
    let e_max = layout.exponent_max();
    let e_bias = layout.exponent_bias();
    let rt = if m_len == 23 {
        exp2i(-24) - exp2i(-77)
    } else {
        0.0
    };

    let sign = u64::from(value < 0.0 || (value == 0.0 && value.is_sign_negative()));
    let mut value = value.abs();

    let (exponent, mantissa) = if value.is_nan() {
        (e_max, 1)
    } else if value.is_infinite() {
        (e_max, 0)
    } else if value == 0.0 {
        (0, 0)
    } else {
        let mut e = (value.ln() / LN_2).floor() as i32;
        let mut c = exp2i(-e);
        if value * c < 1.0 {
            e -= 1;
            c *= 2.0;
        }

        if e + e_bias >= 1 {
            value += rt / c;
        } else {
            value += rt * exp2i(1 - e_bias);
        }

        if value * c >= 2.0 {
            e += 1;
            c /= 2.0;
        }

        if e + e_bias >= e_max {
            (e_max, 0)
        } else if e + e_bias >= 1 {
            (e + e_bias, ((value * c - 1.0) * exp2i(m_len)) as u64)
        } else {
            // Subnormal. A mantissa that rounded up to 2^m_len carries into
            // the exponent field through the OR below.
            (0, (value * exp2i(e_bias - 1) * exp2i(m_len)) as u64)
        }
    };

    (sign << (layout.total_bits() - 1)) | ((exponent as u64) << m_len) | mantissa
}

/// Unpacks the low `layout.bytes * 8` bits of `bits`.
pub fn unpack(bits: u64, layout: FloatLayout) -> f64 {
    let m_len = layout.mantissa_bits;
    let e_max = layout.exponent_max();
    let e_bias = layout.exponent_bias();

    let negative = (bits >> (layout.total_bits() - 1)) & 1 == 1;
    let mut e = ((bits >> m_len) as i32) & e_max;
    let mut m = bits & ((1u64 << m_len) - 1);

    if e == 0 {
        e = 1 - e_bias;
    } else if e == e_max {
        return match (m, negative) {
            (0, false) => f64::INFINITY,
            (0, true) => f64::NEG_INFINITY,
            _ => f64::NAN,
        };
    } else {
        m += 1u64 << m_len;
        e -= e_bias;
    }

    let magnitude = m as f64 * exp2i(e - m_len);
    if negative { -magnitude } else { magnitude }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_double_matches_native_bits() {
        let cases = [
            0.0,
            -0.0,
            1.0,
            -2.0,
            42.5,
            772.161,
            0.1,
            f64::MAX,
            f64::MIN_POSITIVE,
            5e-324,
            1.5e-310,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ];

        for value in cases {
            let bits = pack(value, FloatLayout::DOUBLE);
            assert_eq!(bits, value.to_bits(), "packing {value}");
            assert_eq!(unpack(bits, FloatLayout::DOUBLE).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_single_rounds_to_nearest() {
        let cases = [1.0f32, 1.5, -2.0, 0.1, 3.14159, 65504.0, 1.0e-40, f32::MAX];

        for value in cases {
            let bits = pack(f64::from(value), FloatLayout::SINGLE);
            assert_eq!(bits as u32, value.to_bits(), "packing {value}");
            assert_eq!(unpack(bits, FloatLayout::SINGLE) as f32, value);
        }

        // 0.1 is not representable, the nearest single is 0x3DCCCCCD.
        assert_eq!(pack(0.1, FloatLayout::SINGLE), 0x3DCC_CCCD);
    }

    #[test]
    fn test_single_halfway_rounds_up() {
        let halfway = 1.0 + exp2i(-24);

        // the host conversion rounds ties to even
        assert_eq!((halfway as f32).to_bits(), 0x3F80_0000);
        assert_eq!(pack(halfway, FloatLayout::SINGLE), 0x3F80_0001);
        assert_eq!(pack(-halfway, FloatLayout::SINGLE), 0xBF80_0001);
    }

    #[test]
    fn test_single_overflow_is_infinity() {
        assert_eq!(pack(1.0e39, FloatLayout::SINGLE), 0x7F80_0000);
        assert_eq!(pack(-1.0e39, FloatLayout::SINGLE), 0xFF80_0000);
    }

    #[test]
    fn test_nan() {
        assert_eq!(pack(f64::NAN, FloatLayout::DOUBLE), 0x7FF0_0000_0000_0001);
        assert_eq!(pack(f64::NAN, FloatLayout::SINGLE), 0x7F80_0001);
        assert!(unpack(0x7FF8_0000_0000_0000, FloatLayout::DOUBLE).is_nan());
        assert!(unpack(0xFFC0_0000, FloatLayout::SINGLE).is_nan());
    }

    #[test]
    fn test_half() {
        assert_eq!(pack(1.0, FloatLayout::HALF), 0x3C00);
        assert_eq!(pack(-2.0, FloatLayout::HALF), 0xC000);
        assert_eq!(pack(65504.0, FloatLayout::HALF), 0x7BFF);
        assert_eq!(unpack(0x3555, FloatLayout::HALF), 0.333_251_953_125);
        assert_eq!(unpack(0x0001, FloatLayout::HALF), 2f64.powi(-24));
    }

    #[test]
    fn test_signed_zero() {
        assert_eq!(pack(-0.0, FloatLayout::SINGLE), 0x8000_0000);
        assert!(unpack(0x8000_0000, FloatLayout::SINGLE).is_sign_negative());
    }
}
