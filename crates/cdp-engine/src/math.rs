//! Fixed-point arithmetic
//!
//! Amounts and USD values are u128 at 1e18 scale. A product of two scaled
//! values does not fit in 128 bits, so multiplication widens to 256 bits
//! before the divide.

use crate::constants::PERCENT_DIVISOR;
use crate::error::{CdpError, EngineResult};

const LO_MASK: u128 = (1 << 64) - 1;

/// Computes `a * b / denom` exactly, truncating toward zero.
pub fn mul_div(a: u128, b: u128, denom: u128) -> EngineResult<u128> {
    if denom == 0 {
        return Err(CdpError::DivisionByZero);
    }
    let (hi, lo) = mul_wide(a, b);
    div_wide(hi, lo, denom)
}

/// Applies a percent to a value, truncating toward zero.
pub fn percent_of(value: u128, percent: u64) -> EngineResult<u128> {
    mul_div(value, percent as u128, PERCENT_DIVISOR)
}

/// 128x128 -> 256 bit multiply via 64-bit limbs.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let a_lo = a & LO_MASK;
    let a_hi = a >> 64;
    let b_lo = b & LO_MASK;
    let b_hi = b >> 64;

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // Every partial sum below stays under 2^128, so plain adds are exact.
    let mid = (ll >> 64) + (lh & LO_MASK) + (hl & LO_MASK);
    let lo = (mid << 64) | (ll & LO_MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);

    (hi, lo)
}

/// 256 / 128 -> 128 bit divide.
///
/// Errors with `ArithmeticOverflow` when the quotient needs more than
/// 128 bits.
fn div_wide(hi: u128, lo: u128, divisor: u128) -> EngineResult<u128> {
    if hi == 0 {
        return Ok(lo / divisor);
    }
    if hi >= divisor {
        return Err(CdpError::ArithmeticOverflow);
    }

    // Bitwise long division over the low 128 dividend bits. The running
    // remainder starts at `hi` and stays below `divisor`; `carry` catches
    // the bit shifted out past 2^128.
    let mut rem = hi;
    let mut quo: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quo <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quo |= 1;
        }
    }

    Ok(quo)
}
