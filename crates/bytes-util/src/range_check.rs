//! A helper macro to ensure that a number is within the specified [$lower, $upper] bounds.

/// Enforces that a number is within the specified \[LOWER, UPPER\] bounds.
///
/// The brackets indicate that this range is inclusive on both sides. On
/// failure it evaluates to a [`CursorError::OutOfRange`](crate::CursorError::OutOfRange).
#[macro_export]
macro_rules! range_check {
    ($n:expr, $lower:expr, $upper:expr) => {{
        let n = $n;

        #[allow(unused_comparisons, clippy::manual_range_contains)]
        if n < $lower || n > $upper {
            ::std::result::Result::Err($crate::CursorError::OutOfRange {
                name: stringify!($n),
                value: n as i128,
                lower: $lower as i128,
                upper: $upper as i128,
            })
        } else {
            ::std::result::Result::Ok(())
        }
    }};
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use crate::CursorError;

    #[test]
    fn within_bounds() {
        let i = 2u64;
        range_check!(i, 0, 63).unwrap();
        range_check!(-0x80_0000i32, -0x80_0000, 0x7F_FFFF).unwrap();
    }

    #[test]
    fn out_of_bounds() {
        let value = 0x100_0000u32;
        let err = range_check!(value, 0, 0xFF_FFFF).unwrap_err();
        assert!(matches!(
            err,
            CursorError::OutOfRange {
                name: "value",
                value: 0x100_0000,
                lower: 0,
                upper: 0xFF_FFFF,
            }
        ));
        assert_eq!(
            err.to_string(),
            "value is out of range [0, 16777215]: 16777216"
        );
    }
}
