// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::batch::BatchPrecomp;
use crate::errors::PolynomialError;
use num_bigint::BigUint;
use num_traits::Zero;
use prio_field::Field;

/// Binds an evaluation point `x` to a [`BatchPrecomp`].
///
/// Stores `w_i = s_i * prod_{j != i} (x - x_j)`, so that the interpolant of
/// `values` through the batch points, evaluated at `x`, is `sum w_i * values[i]`.
/// When `x` coincides with a batch point `x_k`, the weights collapse to the
/// indicator of `k`.
#[derive(Debug, Clone)]
pub struct PointPrecomp {
    x: BigUint,
    weights: Vec<BigUint>,
}

impl PointPrecomp {
    pub fn new(field: &Field, batch: &BatchPrecomp, x: &BigUint) -> Self {
        let x = field.reduce(x);
        let points = batch.points();
        let n = points.len();

        if let Some(k) = points.iter().position(|p| p == &x) {
            let mut weights = vec![BigUint::zero(); n];
            weights[k] = field.one();
            return Self { x, weights };
        }

        let diffs: Vec<BigUint> = points.iter().map(|p| field.sub(&x, p)).collect();
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(field.one());
        for d in &diffs {
            let next = field.mul(&prefix[prefix.len() - 1], d);
            prefix.push(next);
        }
        let mut suffix = vec![field.one(); n + 1];
        for i in (0..n).rev() {
            suffix[i] = field.mul(&suffix[i + 1], &diffs[i]);
        }

        let weights = batch
            .weights()
            .iter()
            .enumerate()
            .map(|(i, s)| field.mul(s, &field.mul(&prefix[i], &suffix[i + 1])))
            .collect();
        Self { x, weights }
    }

    pub fn x(&self) -> &BigUint {
        &self.x
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Value at `x` of the interpolant through `values`.
    pub fn evaluate(&self, field: &Field, values: &[BigUint]) -> Result<BigUint, PolynomialError> {
        if values.len() != self.weights.len() {
            return Err(PolynomialError::LengthMismatch {
                expected: self.weights.len(),
                found: values.len(),
            });
        }
        Ok(field.sum(
            &values
                .iter()
                .zip(&self.weights)
                .map(|(v, w)| field.mul(v, w))
                .collect::<Vec<_>>(),
        ))
    }
}
