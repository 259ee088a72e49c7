// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Polynomial arithmetic implementation.

use crate::errors::PolynomialError;
use crate::fft::{transform, MUL_FFT_THRESHOLD};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use prio_field::Field;
use std::fmt;

/// A polynomial over a prime field, represented by its coefficients in
/// ascending order of degree.
///
/// The polynomial is `a_0 + a_1 * x + ... + a_n * x^n`. Operations take the
/// [`Field`] explicitly and always return canonical coefficients.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Polynomial {
    /// Coefficients in ascending order (constant term first).
    pub(crate) coefficients: Vec<BigUint>,
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (degree, coeff) in self.coefficients.iter().enumerate().rev() {
            if coeff.is_zero() {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;

            if degree == 0 || !coeff.is_one() {
                write!(f, "{coeff}")?;
            }
            if degree > 0 {
                write!(f, "x")?;
                if degree > 1 {
                    write!(f, "^{degree}")?;
                }
            }
        }

        if first {
            write!(f, "0")?;
        }

        Ok(())
    }
}

impl Polynomial {
    /// Creates a new polynomial from coefficients in ascending order of degree.
    pub fn new(coefficients: Vec<BigUint>) -> Self {
        Self { coefficients }
    }

    /// Creates a zero polynomial with `len` zero coefficients.
    pub fn zero(len: usize) -> Self {
        Self {
            coefficients: vec![BigUint::zero(); len],
        }
    }

    /// Creates a constant polynomial.
    pub fn constant(constant: BigUint) -> Self {
        Self {
            coefficients: vec![constant],
        }
    }

    /// The monic linear factor `x - root`.
    pub fn linear(field: &Field, root: &BigUint) -> Self {
        Self {
            coefficients: vec![field.neg(root), BigUint::one()],
        }
    }

    /// Returns the degree of the polynomial.
    ///
    /// The degree of a zero polynomial is 0.
    pub fn degree(&self) -> usize {
        self.coefficients
            .iter()
            .rposition(|c| !c.is_zero())
            .unwrap_or(0)
    }

    /// Checks if the polynomial is zero.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_zero())
    }

    /// Removes high-degree zero coefficients, keeping at least one term.
    pub fn trim(mut self) -> Self {
        while self.coefficients.len() > 1
            && self.coefficients.last().is_some_and(|c| c.is_zero())
        {
            self.coefficients.pop();
        }
        self
    }

    /// Returns the coefficient of the highest non-zero term.
    pub fn leading_coefficient(&self) -> Option<&BigUint> {
        self.coefficients.iter().rev().find(|c| !c.is_zero())
    }

    /// Adds two polynomials together.
    pub fn add(&self, other: &Self, field: &Field) -> Self {
        let len = self.coefficients.len().max(other.coefficients.len());
        let zero = BigUint::zero();
        let coefficients = (0..len)
            .map(|i| {
                let a = self.coefficients.get(i).unwrap_or(&zero);
                let b = other.coefficients.get(i).unwrap_or(&zero);
                field.add(a, b)
            })
            .collect();
        Polynomial::new(coefficients)
    }

    /// Subtracts one polynomial from another.
    pub fn sub(&self, other: &Self, field: &Field) -> Self {
        self.add(&other.neg(field), field)
    }

    /// Negates all coefficients of the polynomial.
    pub fn neg(&self, field: &Field) -> Self {
        Polynomial::new(self.coefficients.iter().map(|x| field.neg(x)).collect())
    }

    /// Multiplies two polynomials.
    ///
    /// Small products use the schoolbook algorithm. Larger ones go through the
    /// transform on a power-of-two root domain when the field supports it.
    pub fn mul(&self, other: &Self, field: &Field) -> Self {
        if self.coefficients.is_empty() || other.coefficients.is_empty() {
            return Polynomial::zero(1);
        }
        let product_len = self.coefficients.len() + other.coefficients.len() - 1;
        let domain = product_len.next_power_of_two();
        if product_len >= MUL_FFT_THRESHOLD && domain <= field.max_domain() {
            if let Some(product) = self.mul_by_transform(other, field, product_len, domain) {
                return product;
            }
        }
        self.mul_schoolbook(other, field)
    }

    fn mul_schoolbook(&self, other: &Self, field: &Field) -> Self {
        let product_len = self.coefficients.len() + other.coefficients.len() - 1;
        let mut product = vec![BigUint::zero(); product_len];

        for (i, a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                product[i + j] += a * b;
            }
        }

        Polynomial::new(product.iter().map(|c| field.reduce(c)).collect())
    }

    fn mul_by_transform(
        &self,
        other: &Self,
        field: &Field,
        product_len: usize,
        domain: usize,
    ) -> Option<Self> {
        let roots = field.roots(domain).ok()?;
        let roots_inv = field.roots_inv(domain).ok()?;
        let n_inv = field.inv(&BigUint::from(domain)).ok()?;

        let pad = |coeffs: &[BigUint]| {
            let mut v = coeffs.to_vec();
            v.resize(domain, BigUint::zero());
            v
        };
        let a = transform(field, &pad(&self.coefficients), &roots);
        let b = transform(field, &pad(&other.coefficients), &roots);
        let pointwise: Vec<BigUint> = a.iter().zip(&b).map(|(x, y)| field.mul(x, y)).collect();

        let mut coefficients = transform(field, &pointwise, &roots_inv);
        coefficients.truncate(product_len);
        for c in coefficients.iter_mut() {
            *c = field.mul(c, &n_inv);
        }
        Some(Polynomial::new(coefficients))
    }

    /// Divides one polynomial by another, returning the quotient and remainder.
    ///
    /// # Errors
    ///
    /// Returns `PolynomialError::DivisionByZero` if the divisor is zero.
    pub fn div_rem(&self, divisor: &Self, field: &Field) -> Result<(Self, Self), PolynomialError> {
        let divisor = divisor.clone().trim();
        let lead = divisor
            .leading_coefficient()
            .ok_or(PolynomialError::DivisionByZero)?;
        let lead_inv = field.inv(lead)?;
        let d = divisor.coefficients.len() - 1;

        let mut remainder = self.clone().trim().coefficients;
        if remainder.len() <= d {
            return Ok((Polynomial::zero(1), Polynomial::new(remainder)));
        }

        let mut quotient = vec![BigUint::zero(); remainder.len() - d];
        for i in (0..quotient.len()).rev() {
            let top = &remainder[i + d];
            if top.is_zero() {
                continue;
            }
            let coeff = field.mul(top, &lead_inv);
            for (j, dc) in divisor.coefficients.iter().enumerate() {
                remainder[i + j] = field.sub(&remainder[i + j], &field.mul(dc, &coeff));
            }
            quotient[i] = coeff;
        }
        remainder.truncate(d.max(1));

        Ok((Polynomial::new(quotient), Polynomial::new(remainder).trim()))
    }

    /// Multiplies each coefficient of the polynomial by a scalar.
    pub fn scalar_mul(&self, scalar: &BigUint, field: &Field) -> Self {
        Polynomial::new(
            self.coefficients
                .iter()
                .map(|x| field.mul(x, scalar))
                .collect(),
        )
    }

    /// Formal derivative.
    pub fn derivative(&self, field: &Field) -> Self {
        if self.coefficients.len() <= 1 {
            return Polynomial::zero(1);
        }
        Polynomial::new(
            self.coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| field.mul(c, &BigUint::from(i)))
                .collect(),
        )
    }

    /// Evaluates the polynomial at a given point using Horner's method.
    pub fn evaluate(&self, x: &BigUint, field: &Field) -> BigUint {
        self.coefficients
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, c| field.add(&field.mul(&acc, x), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_field::FieldPreset;
    use proptest::prelude::*;

    fn small() -> Field {
        Field::new(BigUint::from(7681u32), BigUint::from(62u32), 9).unwrap()
    }

    fn poly(coeffs: &[u64]) -> Polynomial {
        Polynomial::new(coeffs.iter().map(|&c| BigUint::from(c)).collect())
    }

    #[test]
    fn test_degree_ignores_high_zeros() {
        assert_eq!(poly(&[1, 2, 3]).degree(), 2);
        assert_eq!(poly(&[1, 2, 0, 0]).degree(), 1);
        assert_eq!(Polynomial::zero(4).degree(), 0);
        assert!(Polynomial::zero(4).is_zero());
        assert_eq!(poly(&[5, 0, 0]).trim(), poly(&[5]));
    }

    #[test]
    fn test_polynomial_display() {
        assert_eq!(poly(&[1, 3, 2]).to_string(), "2x^2 + 3x + 1");
        assert_eq!(poly(&[0, 1]).to_string(), "x");
        assert_eq!(Polynomial::zero(3).to_string(), "0");
    }

    #[test]
    fn test_addition_wraps_modulus() {
        let f = small();
        let a = poly(&[7680, 2]);
        let b = poly(&[1, 3, 4]);
        assert_eq!(a.add(&b, &f), poly(&[0, 5, 4]));
        assert_eq!(a.sub(&a, &f), poly(&[0, 0]));
    }

    #[test]
    fn test_polynomial_multiplication() {
        let f = small();
        // (x + 2)(x + 3) = x^2 + 5x + 6
        assert_eq!(poly(&[2, 1]).mul(&poly(&[3, 1]), &f), poly(&[6, 5, 1]));
    }

    #[test]
    fn test_polynomial_division() {
        let f = small();
        let (q, r) = poly(&[6, 5, 1]).div_rem(&poly(&[2, 1]), &f).unwrap();
        assert_eq!(q, poly(&[3, 1]));
        assert!(r.is_zero());

        let (q, r) = poly(&[1, 0, 1]).div_rem(&poly(&[0, 1]), &f).unwrap();
        assert_eq!(q, poly(&[0, 1]));
        assert_eq!(r, poly(&[1]));
    }

    #[test]
    fn test_division_by_zero() {
        let f = small();
        assert_eq!(
            poly(&[1, 2]).div_rem(&Polynomial::zero(3), &f),
            Err(PolynomialError::DivisionByZero)
        );
    }

    #[test]
    fn test_derivative_and_evaluation() {
        let f = small();
        let p = poly(&[3, 2, 1]); // x^2 + 2x + 3
        assert_eq!(p.evaluate(&BigUint::from(2u32), &f), BigUint::from(11u32));
        assert_eq!(p.derivative(&f), poly(&[2, 2]));
        assert_eq!(p.scalar_mul(&BigUint::from(5u32), &f), poly(&[15, 10, 5]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn transform_product_matches_schoolbook(
            a in prop::collection::vec(any::<u64>(), 1..80),
            b in prop::collection::vec(any::<u64>(), 1..80),
        ) {
            let f = Field::preset(FieldPreset::P87);
            let a = poly(&a);
            let b = poly(&b);
            prop_assert_eq!(a.mul(&b, &f), a.mul_schoolbook(&b, &f));
        }

        #[test]
        fn division_reconstructs_dividend(
            a in prop::collection::vec(0u64..7681, 1..40),
            b in prop::collection::vec(0u64..7681, 1..20),
        ) {
            let f = small();
            let a = poly(&a);
            let b = poly(&b);
            prop_assume!(!b.is_zero());
            let (q, r) = a.div_rem(&b, &f).unwrap();
            prop_assert!(r.is_zero() || r.degree() < b.degree());
            prop_assert_eq!(q.mul(&b, &f).add(&r, &f).trim(), a.trim());
        }
    }
}
