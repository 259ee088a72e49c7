// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Prime field context.
//!
//! Every element handled by this module is a canonical residue in `[0, p)`.
//! Arithmetic helpers take any `BigUint` and reduce before returning, so callers
//! never observe a non-canonical value.

use crate::errors::FieldError;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in field configurations. Each has a generator of order exactly `2^19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// `p = 0x8000000000080001`
    P63,
    /// `p = 0x8000000000000000080001`
    #[default]
    P87,
    /// `p = 0x80000000000000000000080001`
    P102,
}

impl FieldPreset {
    fn parameters(self) -> (u128, u128) {
        match self {
            FieldPreset::P63 => (0x8000000000080001, 0x22855fdf11374225),
            FieldPreset::P87 => (0x8000000000000000080001, 0x2597c14f48d5b65ed8dcca),
            FieldPreset::P102 => (
                0x80000000000000000000080001,
                0x71a9f9595f292cfd55e4c5254e,
            ),
        }
    }
}

impl fmt::Display for FieldPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldPreset::P63 => "p63",
            FieldPreset::P87 => "p87",
            FieldPreset::P102 => "p102",
        };
        write!(f, "{name}")
    }
}

impl FromStr for FieldPreset {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p63" => Ok(FieldPreset::P63),
            "p87" => Ok(FieldPreset::P87),
            "p102" => Ok(FieldPreset::P102),
            other => Err(FieldError::UnknownPreset(other.to_string())),
        }
    }
}

const PRESET_TWO_ORDER: u32 = 19;

/// A prime field `Z_p` with a generator `g` of the multiplicative subgroup of
/// order `2^two_order`.
#[derive(Clone, PartialEq, Eq)]
pub struct Field {
    modulus: BigUint,
    generator: BigUint,
    two_order: u32,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("modulus", &format_args!("{:#x}", self.modulus))
            .field("two_order", &self.two_order)
            .finish()
    }
}

impl Field {
    /// Creates a field context after checking that `generator` has order exactly
    /// `2^two_order` modulo `modulus`.
    ///
    /// Primality of `modulus` is not tested; callers supply known primes.
    pub fn new(modulus: BigUint, generator: BigUint, two_order: u32) -> Result<Self, FieldError> {
        if modulus < BigUint::from(3u32) || !modulus.bit(0) {
            return Err(FieldError::InvalidModulus {
                message: format!("modulus {modulus} must be an odd prime"),
            });
        }
        if two_order == 0 {
            return Err(FieldError::InvalidGenerator {
                message: "subgroup order must be at least 2".to_string(),
            });
        }
        let p_minus_one = &modulus - 1u32;
        let order = BigUint::one() << two_order;
        if !(&p_minus_one % &order).is_zero() {
            return Err(FieldError::InvalidModulus {
                message: format!("2^{two_order} does not divide p - 1"),
            });
        }
        let generator = generator % &modulus;
        let half = BigUint::one() << (two_order - 1);
        if !generator.modpow(&order, &modulus).is_one()
            || generator.modpow(&half, &modulus) != p_minus_one
        {
            return Err(FieldError::InvalidGenerator {
                message: format!("generator does not have order 2^{two_order}"),
            });
        }
        Ok(Self {
            modulus,
            generator,
            two_order,
        })
    }

    /// Returns one of the built-in configurations.
    pub fn preset(preset: FieldPreset) -> Self {
        let (p, g) = preset.parameters();
        Self {
            modulus: BigUint::from(p),
            generator: BigUint::from(g),
            two_order: PRESET_TWO_ORDER,
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// `log2` of the largest supported root-of-unity order.
    pub fn two_order(&self) -> u32 {
        self.two_order
    }

    /// Largest power-of-two domain size the field supports.
    pub fn max_domain(&self) -> usize {
        1usize << self.two_order
    }

    pub fn zero(&self) -> BigUint {
        BigUint::zero()
    }

    pub fn one(&self) -> BigUint {
        BigUint::one()
    }

    /// Whether `a` is a canonical element.
    pub fn contains(&self, a: &BigUint) -> bool {
        a < &self.modulus
    }

    pub fn reduce(&self, a: &BigUint) -> BigUint {
        a % &self.modulus
    }

    pub fn from_u64(&self, v: u64) -> BigUint {
        BigUint::from(v) % &self.modulus
    }

    /// Maps a signed integer to its residue, so `-1` becomes `p - 1`.
    pub fn from_i64(&self, v: i64) -> BigUint {
        let magnitude = self.from_u64(v.unsigned_abs());
        if v < 0 {
            self.neg(&magnitude)
        } else {
            magnitude
        }
    }

    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.modulus
    }

    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let b = b % &self.modulus;
        (a + &self.modulus - b) % &self.modulus
    }

    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    pub fn neg(&self, a: &BigUint) -> BigUint {
        let a = a % &self.modulus;
        if a.is_zero() {
            a
        } else {
            &self.modulus - a
        }
    }

    /// Multiplicative inverse via Fermat's little theorem.
    pub fn inv(&self, a: &BigUint) -> Result<BigUint, FieldError> {
        let a = a % &self.modulus;
        if a.is_zero() {
            return Err(FieldError::NotInvertible);
        }
        let e = &self.modulus - 2u32;
        Ok(a.modpow(&e, &self.modulus))
    }

    pub fn pow(&self, a: &BigUint, e: &BigUint) -> BigUint {
        a.modpow(e, &self.modulus)
    }

    pub fn pow_u64(&self, a: &BigUint, e: u64) -> BigUint {
        a.modpow(&BigUint::from(e), &self.modulus)
    }

    /// Uniform element of `[0, p)`.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_below(&self.modulus)
    }

    /// Uniform element of `[1, p)`.
    pub fn random_nonzero<R: Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_range(&BigUint::one(), &self.modulus)
    }

    /// A principal `n`-th root of unity, `g^(2^k / n)`.
    ///
    /// `n` must be a power of two no larger than `2^two_order`.
    pub fn root_of_unity(&self, n: usize) -> Result<BigUint, FieldError> {
        if n == 0 || !n.is_power_of_two() || n.trailing_zeros() > self.two_order {
            return Err(FieldError::UnsupportedRootOrder {
                requested: n,
                two_order: self.two_order,
            });
        }
        let shift = self.two_order - n.trailing_zeros();
        let exponent = BigUint::one() << shift;
        Ok(self.generator.modpow(&exponent, &self.modulus))
    }

    /// `[w^0, w^1, ..., w^(n-1)]` for the principal `n`-th root `w`.
    pub fn roots(&self, n: usize) -> Result<Vec<BigUint>, FieldError> {
        let w = self.root_of_unity(n)?;
        Ok(self.powers(&w, n))
    }

    /// `[w^0, w^-1, ..., w^-(n-1)]` for the principal `n`-th root `w`.
    pub fn roots_inv(&self, n: usize) -> Result<Vec<BigUint>, FieldError> {
        let w = self.root_of_unity(n)?;
        let w_inv = self.inv(&w)?;
        Ok(self.powers(&w_inv, n))
    }

    /// `[x^0, x^1, ..., x^(n-1)]`.
    pub fn powers(&self, x: &BigUint, n: usize) -> Vec<BigUint> {
        let mut out = Vec::with_capacity(n);
        let mut acc = BigUint::one();
        for _ in 0..n {
            out.push(acc.clone());
            acc = self.mul(&acc, x);
        }
        out
    }

    /// Sum of a slice of elements.
    pub fn sum<'a, I: IntoIterator<Item = &'a BigUint>>(&self, items: I) -> BigUint {
        items
            .into_iter()
            .fold(BigUint::zero(), |acc, x| self.add(&acc, x))
    }
}
