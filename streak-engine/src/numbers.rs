//! Numeric conversion helpers centralizing lossy casts.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use num_traits::cast::cast;

/// Significant bits kept when converting big ratios to `f64`.
const RATIO_BITS: u64 = 960;

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Exact integer ratio `numerator / denominator` rounded to `f64`.
///
/// Both operands are shifted down together when the denominator is too wide
/// for `f64`, so the quotient stays finite. Returns 0.0 for a zero denominator.
#[must_use]
pub fn biguint_ratio(numerator: &BigUint, denominator: &BigUint) -> f64 {
    let bits = denominator.bits();
    if bits == 0 {
        return 0.0;
    }
    let shift = bits.saturating_sub(RATIO_BITS);
    let num = (numerator >> shift).to_f64().unwrap_or(0.0);
    let den = (denominator >> shift).to_f64().unwrap_or(f64::INFINITY);
    if den == 0.0 { 0.0 } else { num / den }
}
