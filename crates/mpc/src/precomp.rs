// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::CheckerError;
use num_bigint::BigUint;
use prio_circuit::Circuit;
use prio_field::Field;
use prio_polynomial::{BatchPrecomp, PointPrecomp, PolynomialError};
use rand::Rng;
use std::sync::Arc;

/// Interpolation domains for one circuit size.
///
/// `f` and `g` are interpolated through the `N`-th roots of unity and `h`
/// through the first `2N - 1` of the `2N`-th roots, where `N` is the next power
/// of two above `#mul + 1`.
#[derive(Debug)]
pub struct CircuitDomain {
    n: usize,
    big_n: usize,
    batch_n: BatchPrecomp,
    batch_2n: BatchPrecomp,
}

impl CircuitDomain {
    pub fn new(field: &Field, circuit: &Circuit) -> Result<Self, CheckerError> {
        let n = circuit.num_muls() + 1;
        let big_n = n.next_power_of_two();
        let batch_n = BatchPrecomp::on_roots(field, big_n)?;
        let mut roots_2n = field.roots(2 * big_n).map_err(PolynomialError::from)?;
        roots_2n.truncate(2 * big_n - 1);
        let batch_2n = BatchPrecomp::new(field, roots_2n)?;
        Ok(Self {
            n,
            big_n,
            batch_n,
            batch_2n,
        })
    }

    /// Number of interpolation points actually used, `#mul + 1`.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Size of the `f`/`g` domain.
    pub fn big_n(&self) -> usize {
        self.big_n
    }

    /// Number of `h` values shipped as hints: the odd `2N`-th roots below `2N - 1`.
    pub fn num_h_hints(&self) -> usize {
        self.big_n - 1
    }

    pub fn batch_n(&self) -> &BatchPrecomp {
        &self.batch_n
    }

    pub fn batch_2n(&self) -> &BatchPrecomp {
        &self.batch_2n
    }
}

/// A uniform field element that is not a `2 * big_n`-th root of unity, so that
/// it never lands on an interpolation point.
pub fn random_eval_point<R: Rng + ?Sized>(field: &Field, big_n: usize, rng: &mut R) -> BigUint {
    let order = BigUint::from(2 * big_n);
    loop {
        let x = field.random(rng);
        if field.pow(&x, &order) != field.one() {
            return x;
        }
    }
}

/// A [`CircuitDomain`] bound to the shared evaluation point `x`.
///
/// Built once per evaluation point and shared by every checker that serves the
/// same circuit until the point rotates.
#[derive(Debug)]
pub struct CheckerPrecomp {
    domain: Arc<CircuitDomain>,
    x: BigUint,
    point_n: PointPrecomp,
    point_2n: PointPrecomp,
}

impl CheckerPrecomp {
    pub fn new(field: &Field, domain: Arc<CircuitDomain>, x: BigUint) -> Self {
        let point_n = PointPrecomp::new(field, domain.batch_n(), &x);
        let point_2n = PointPrecomp::new(field, domain.batch_2n(), &x);
        Self {
            x: point_n.x().clone(),
            domain,
            point_n,
            point_2n,
        }
    }

    /// A precompute at a random point outside the `2N`-th roots of unity.
    pub fn random<R: Rng + ?Sized>(field: &Field, domain: Arc<CircuitDomain>, rng: &mut R) -> Self {
        let x = random_eval_point(field, domain.big_n(), rng);
        Self::new(field, domain, x)
    }

    pub fn x(&self) -> &BigUint {
        &self.x
    }

    pub fn domain(&self) -> &Arc<CircuitDomain> {
        &self.domain
    }

    pub(crate) fn point_n(&self) -> &PointPrecomp {
        &self.point_n
    }

    pub(crate) fn point_2n(&self) -> &PointPrecomp {
        &self.point_2n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_circuit::gadgets;
    use prio_field::FieldPreset;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn domain_sizes_follow_the_multiplication_count() {
        let field = Field::preset(FieldPreset::P87);
        let mut c = Circuit::new();
        gadgets::n_bits(&mut c, &field, 4, "v").unwrap();
        let domain = CircuitDomain::new(&field, &c).unwrap();
        assert_eq!(domain.n(), 5);
        assert_eq!(domain.big_n(), 8);
        assert_eq!(domain.num_h_hints(), 7);
        assert_eq!(domain.batch_n().len(), 8);
        assert_eq!(domain.batch_2n().len(), 15);
    }

    #[test]
    fn empty_circuit_has_a_single_point() {
        let field = Field::preset(FieldPreset::P63);
        let domain = CircuitDomain::new(&field, &Circuit::new()).unwrap();
        assert_eq!(domain.big_n(), 1);
        assert_eq!(domain.num_h_hints(), 0);
        assert_eq!(domain.batch_2n().len(), 1);
    }

    #[test]
    fn random_point_avoids_the_roots() {
        let field = Field::preset(FieldPreset::P87);
        let mut c = Circuit::new();
        gadgets::one_bit(&mut c, &field, "b").unwrap();
        let domain = Arc::new(CircuitDomain::new(&field, &c).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let precomp = CheckerPrecomp::random(&field, domain.clone(), &mut rng);
        assert!(!domain.batch_2n().points().contains(precomp.x()));
        assert_eq!(precomp.point_n().len(), domain.big_n());
        assert_eq!(precomp.point_2n().len(), 2 * domain.big_n() - 1);
    }
}
