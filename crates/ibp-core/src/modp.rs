//! Arithmetic in `GF(p)` for `p = 9223372036854775783`, the largest prime
//! below `2^63`.
//!
//! `ModP` stores a reduced residue in `[0, p)`. Multiplication widens to
//! `u128` to avoid overflow; everything else fits in `u64`. Decimal-string
//! parsing goes through a `rug::Integer` intermediate so that literals of
//! arbitrary size reduce correctly (matching the role `rug` already plays
//! for `QInt`/`QRat` elsewhere in this crate).

use crate::error::IbpError;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// The largest 63-bit prime.
pub const MODULUS: u64 = 9_223_372_036_854_775_783;

/// An element of `GF(p)`, always stored reduced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ModP(u64);

impl ModP {
    /// Wrap an already-reduced residue.
    ///
    /// # Panics
    /// Panics in debug builds if `residue >= MODULUS`.
    pub fn new(residue: u64) -> Self {
        debug_assert!(residue < MODULUS, "residue {residue} not reduced mod p");
        ModP(residue)
    }

    pub fn zero() -> Self {
        ModP(0)
    }

    pub fn one() -> Self {
        ModP(1)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Reduce an arbitrary signed 64-bit integer into `GF(p)`.
    pub fn from_i64(value: i64) -> Self {
        let m = MODULUS as i64;
        let r = value.rem_euclid(m);
        ModP(r as u64)
    }

    /// Parse a (possibly signed, possibly arbitrarily large) decimal literal.
    pub fn from_decimal(text: &str) -> Result<Self, IbpError> {
        let trimmed = text.trim();
        let value = rug::Integer::parse(trimmed)
            .map_err(|e| IbpError::ConfigError(format!("invalid integer literal {trimmed:?}: {e}")))?;
        let value = rug::Integer::from(value);
        let modulus = rug::Integer::from(MODULUS);
        let mut residue = rug::Integer::from(&value % &modulus);
        if residue.cmp0() == std::cmp::Ordering::Less {
            residue += &modulus;
        }
        let residue = residue
            .to_u64()
            .expect("residue reduced mod a 63-bit prime fits in u64");
        Ok(ModP(residue))
    }

    /// Recover the representative of smallest absolute value, in `(-p/2, p/2]`.
    ///
    /// `ModP::from_i64(x).as_signed() == x` whenever `|x| < p/2`.
    pub fn as_signed(&self) -> i64 {
        if self.0 > MODULUS / 2 {
            self.0 as i64 - MODULUS as i64
        } else {
            self.0 as i64
        }
    }

    pub fn pow(&self, mut exponent: u64) -> Self {
        let mut base = *self;
        let mut acc = ModP::one();
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exponent >>= 1;
        }
        acc
    }

    /// Modular inverse via Fermat's little theorem (`p` is prime).
    pub fn inverse(&self) -> Result<Self, IbpError> {
        if self.is_zero() {
            return Err(IbpError::DivByZero);
        }
        Ok(self.pow(MODULUS - 2))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ModP {
    fn from(value: u64) -> Self {
        ModP(value % MODULUS)
    }
}

impl From<i64> for ModP {
    fn from(value: i64) -> Self {
        ModP::from_i64(value)
    }
}

impl PartialEq<i64> for ModP {
    fn eq(&self, other: &i64) -> bool {
        *self == ModP::from_i64(*other)
    }
}

impl Add for ModP {
    type Output = ModP;
    fn add(self, rhs: ModP) -> ModP {
        let sum = self.0 + rhs.0;
        ModP(if sum >= MODULUS { sum - MODULUS } else { sum })
    }
}

impl Sub for ModP {
    type Output = ModP;
    fn sub(self, rhs: ModP) -> ModP {
        if self.0 >= rhs.0 {
            ModP(self.0 - rhs.0)
        } else {
            ModP(self.0 + MODULUS - rhs.0)
        }
    }
}

impl Mul for ModP {
    type Output = ModP;
    fn mul(self, rhs: ModP) -> ModP {
        let product = (self.0 as u128) * (rhs.0 as u128);
        ModP((product % MODULUS as u128) as u64)
    }
}

impl Div for ModP {
    type Output = ModP;
    /// Panics with the same message as `rug`'s division-by-zero panic would;
    /// prefer `inverse()` / checked division at the call sites that can see
    /// a genuine `DivByZero`.
    fn div(self, rhs: ModP) -> ModP {
        self * rhs.inverse().expect("ModP division by zero")
    }
}

impl Neg for ModP {
    type Output = ModP;
    fn neg(self) -> ModP {
        if self.0 == 0 {
            self
        } else {
            ModP(MODULUS - self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_wraps() {
        let a = ModP::new(MODULUS - 1);
        let b = ModP::one();
        assert_eq!(a + b, ModP::zero());
    }

    #[test]
    fn inverse_round_trip() {
        let x = ModP::from_i64(12345);
        let inv = x.inverse().unwrap();
        assert_eq!(x * inv, ModP::one());
    }

    #[test]
    fn zero_has_no_inverse() {
        assert!(matches!(ModP::zero().inverse(), Err(IbpError::DivByZero)));
    }

    #[test]
    fn pow_zero_is_one() {
        let x = ModP::from_i64(7);
        assert_eq!(x.pow(0), ModP::one());
    }

    #[test]
    fn pow_matches_repeated_mul() {
        let x = ModP::from_i64(7);
        assert_eq!(x.pow(3), x * x * x);
    }

    #[test]
    fn signed_round_trip() {
        for n in [-42i64, 0, 1, 42, 1_000_000_007] {
            assert_eq!(ModP::from_i64(n).as_signed(), n);
        }
    }

    #[test]
    fn decimal_parse_matches_from_i64() {
        assert_eq!(ModP::from_decimal("-42").unwrap(), ModP::from_i64(-42));
        assert_eq!(ModP::from_decimal("42").unwrap(), ModP::from_i64(42));
    }
}
