// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Number-theoretic transform over the power-of-two roots of unity of a field.

use crate::errors::PolynomialError;
use num_bigint::BigUint;
use num_traits::Zero;
use prio_field::Field;

/// Product length from which [`crate::Polynomial::mul`] switches to the transform.
pub(crate) const MUL_FFT_THRESHOLD: usize = 64;

/// Evaluates the coefficient vector at `roots[0..n]`, where `roots` are the
/// powers of a principal `n`-th root of unity and `n = coeffs.len()`.
///
/// Output index `j` holds the evaluation at `roots[j]`.
pub fn fft(
    field: &Field,
    coeffs: &[BigUint],
    roots: &[BigUint],
) -> Result<Vec<BigUint>, PolynomialError> {
    check_domain(coeffs.len(), roots.len())?;
    Ok(transform(field, coeffs, roots))
}

/// Recovers coefficients from evaluations at `roots_inv`'s inverse points.
///
/// `roots_inv` are the powers of the inverse of the root used by [`fft`].
pub fn inverse_fft(
    field: &Field,
    evals: &[BigUint],
    roots_inv: &[BigUint],
) -> Result<Vec<BigUint>, PolynomialError> {
    check_domain(evals.len(), roots_inv.len())?;
    let n_inv = field.inv(&BigUint::from(evals.len()))?;
    Ok(transform(field, evals, roots_inv)
        .into_iter()
        .map(|c| field.mul(&c, &n_inv))
        .collect())
}

/// Zero-pads `coeffs` to `n` and evaluates at the `n`-th roots of unity.
pub fn evaluate_on_roots(
    field: &Field,
    coeffs: &[BigUint],
    n: usize,
) -> Result<Vec<BigUint>, PolynomialError> {
    if coeffs.len() > n {
        return Err(PolynomialError::LengthMismatch {
            expected: n,
            found: coeffs.len(),
        });
    }
    let roots = field.roots(n)?;
    let mut padded = coeffs.to_vec();
    padded.resize(n, BigUint::zero());
    fft(field, &padded, &roots)
}

/// Coefficients of the unique polynomial of degree `< n` taking `evals[j]` at
/// the `j`-th power of the principal `n`-th root of unity.
pub fn interpolate_on_roots(
    field: &Field,
    evals: &[BigUint],
) -> Result<Vec<BigUint>, PolynomialError> {
    let roots_inv = field.roots_inv(evals.len())?;
    inverse_fft(field, evals, &roots_inv)
}

fn check_domain(len: usize, roots: usize) -> Result<(), PolynomialError> {
    if !len.is_power_of_two() {
        return Err(PolynomialError::NotPowerOfTwo(len));
    }
    if roots != len {
        return Err(PolynomialError::LengthMismatch {
            expected: len,
            found: roots,
        });
    }
    Ok(())
}

/// Unchecked transform. `values.len()` must be a power of two equal to `roots.len()`.
pub(crate) fn transform(field: &Field, values: &[BigUint], roots: &[BigUint]) -> Vec<BigUint> {
    transform_strided(field, values, roots, 1)
}

// Decimation in frequency: the even outputs are the half-size transform of
// y[i] + y[i + n/2], the odd outputs that of (y[i] - y[i + n/2]) * w^i, both
// over the squared roots.
fn transform_strided(
    field: &Field,
    values: &[BigUint],
    roots: &[BigUint],
    stride: usize,
) -> Vec<BigUint> {
    let n = values.len();
    if n <= 1 {
        return values.to_vec();
    }
    let half = n / 2;
    let mut sums = Vec::with_capacity(half);
    let mut diffs = Vec::with_capacity(half);
    for i in 0..half {
        let (lo, hi) = (&values[i], &values[i + half]);
        sums.push(field.add(lo, hi));
        diffs.push(field.mul(&field.sub(lo, hi), &roots[i * stride]));
    }
    let even = transform_strided(field, &sums, roots, stride * 2);
    let odd = transform_strided(field, &diffs, roots, stride * 2);

    let mut out = Vec::with_capacity(n);
    for (e, o) in even.into_iter().zip(odd) {
        out.push(e);
        out.push(o);
    }
    out
}
