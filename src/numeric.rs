// AccelWatch — Integer Helpers
//
// Square root without floating point and fixed-point axis labels.

use std::num::NonZeroU32;

/// Labels are expressed in units of 1/1000 (milli-g).
pub const MILLI_SCALE: NonZeroU32 = match NonZeroU32::new(1000) {
    Some(scale) => scale,
    None => unreachable!(),
};

/// `floor(sqrt(n))`, digit by digit.
///
/// - `isqrt(3) == 1`
/// - `isqrt(4) == 2`
/// - `isqrt(8) == 2`
/// - `isqrt(9) == 3`
pub fn isqrt(n: u32) -> u32 {
    let mut op = n;
    let mut res: u32 = 0;
    // Highest power of four representable in 32 bits.
    let mut one: u32 = 1 << 30;

    while one > op {
        one >>= 2;
    }

    while one != 0 {
        if op >= res + one {
            op -= res + one;
            res = (res >> 1) + one;
        } else {
            res >>= 1;
        }
        one >>= 2;
    }
    res
}

/// Render `value / scale` with exactly two fraction digits, truncated.
///
/// Negative values always carry the sign, even when the truncated result is
/// zero (`-5` at milli scale renders as `-0.00`).
pub fn format_scaled(value: i32, scale: NonZeroU32) -> String {
    let hundredths = (i64::from(value) * 100 / i64::from(scale.get())).unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, hundredths / 100, hundredths % 100)
}

pub fn format_signed_milli(value: i32) -> String {
    format_scaled(value, MILLI_SCALE)
}
