//! Exact integer ratio reduction.
//!
//! Sample rate conversion needs the input and output rates as a co-prime
//! pair, e.g. `48000:44100` becomes `160:147`. The reduction is done with an
//! integer GCD, so there is no rounding.
//!
//! # Example
//!
//! ```rust
//! use audioflow_ratio::IntegerRatio;
//!
//! let ratio = IntegerRatio::new(44100, 48000).unwrap().reduce();
//! assert_eq!(ratio.numerator(), 147);
//! assert_eq!(ratio.denominator(), 160);
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RatioError {
    /// One of the terms was zero.
    #[error("Ratio terms must be positive (got {numerator}:{denominator})")]
    ZeroTerm { numerator: u32, denominator: u32 },
}

/// A ratio of two positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerRatio {
    numerator: u32,
    denominator: u32,
}

impl IntegerRatio {
    /// # Errors
    ///
    /// * If either term is zero
    pub const fn new(numerator: u32, denominator: u32) -> Result<Self, RatioError> {
        if numerator == 0 || denominator == 0 {
            return Err(RatioError::ZeroTerm {
                numerator,
                denominator,
            });
        }

        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Returns the equivalent ratio in lowest terms.
    #[must_use]
    pub const fn reduce(self) -> Self {
        let divisor = gcd(self.numerator, self.denominator);

        Self {
            numerator: self.numerator / divisor,
            denominator: self.denominator / divisor,
        }
    }

    #[must_use]
    pub const fn numerator(&self) -> u32 {
        self.numerator
    }

    #[must_use]
    pub const fn denominator(&self) -> u32 {
        self.denominator
    }

    #[must_use]
    pub const fn is_reduced(&self) -> bool {
        gcd(self.numerator, self.denominator) == 1
    }
}

impl std::fmt::Display for IntegerRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

/// Reduces `numerator:denominator` to lowest terms.
///
/// # Errors
///
/// * If either term is zero
pub const fn reduce(numerator: u32, denominator: u32) -> Result<IntegerRatio, RatioError> {
    match IntegerRatio::new(numerator, denominator) {
        Ok(ratio) => Ok(ratio.reduce()),
        Err(e) => Err(e),
    }
}

/// Greatest common divisor (Euclid). `gcd(0, n) == n`.
#[must_use]
pub const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
