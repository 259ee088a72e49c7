// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Interpolation and multipoint evaluation over a fixed point set.

use crate::errors::PolynomialError;
use crate::polynomial::Polynomial;
use num_bigint::BigUint;
use num_traits::Zero;
use prio_field::Field;
use std::collections::HashSet;

/// Node of the subproduct tree. Covers `points[lo..hi]` and stores
/// `prod_{lo <= i < hi} (x - points[i])`.
#[derive(Debug, Clone)]
struct Node {
    lo: usize,
    hi: usize,
    product: Polynomial,
    children: Option<(usize, usize)>,
}

/// Precomputation for a fixed set of distinct interpolation points.
///
/// Holds the subproduct tree of `m(x) = prod (x - x_i)` and the barycentric
/// weights `s_i = 1 / m'(x_i)`. Build once per point set and reuse across every
/// polynomial interpolated through the same points.
#[derive(Debug, Clone)]
pub struct BatchPrecomp {
    points: Vec<BigUint>,
    nodes: Vec<Node>,
    root: usize,
    weights: Vec<BigUint>,
}

impl BatchPrecomp {
    pub fn new(field: &Field, points: Vec<BigUint>) -> Result<Self, PolynomialError> {
        if points.is_empty() {
            return Err(PolynomialError::EmptyPointSet);
        }
        let points: Vec<BigUint> = points.iter().map(|p| field.reduce(p)).collect();
        {
            let mut seen = HashSet::with_capacity(points.len());
            for (index, p) in points.iter().enumerate() {
                if !seen.insert(p) {
                    return Err(PolynomialError::DuplicatePoint { index });
                }
            }
        }

        let mut nodes = Vec::with_capacity(2 * points.len());
        let root = build_tree(field, &points, 0, points.len(), &mut nodes);
        let mut precomp = Self {
            points,
            nodes,
            root,
            weights: Vec::new(),
        };

        let derivative = precomp.nodes[precomp.root].product.derivative(field);
        precomp.weights = precomp
            .evaluate_many(field, &derivative)?
            .iter()
            .map(|d| field.inv(d))
            .collect::<Result<_, _>>()?;
        Ok(precomp)
    }

    /// The interpolation points for the `n`-th roots of unity.
    pub fn on_roots(field: &Field, n: usize) -> Result<Self, PolynomialError> {
        Self::new(field, field.roots(n)?)
    }

    pub fn points(&self) -> &[BigUint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `s_i = 1 / prod_{j != i} (x_i - x_j)`.
    pub fn weights(&self) -> &[BigUint] {
        &self.weights
    }

    /// `m(x) = prod (x - x_i)`.
    pub fn vanishing(&self) -> &Polynomial {
        &self.nodes[self.root].product
    }

    /// Evaluates `poly` at every point with a remainder tree.
    pub fn evaluate_many(
        &self,
        field: &Field,
        poly: &Polynomial,
    ) -> Result<Vec<BigUint>, PolynomialError> {
        let mut out = vec![BigUint::zero(); self.points.len()];
        self.remainder_down(field, self.root, poly, &mut out)?;
        Ok(out)
    }

    fn remainder_down(
        &self,
        field: &Field,
        node: usize,
        poly: &Polynomial,
        out: &mut [BigUint],
    ) -> Result<(), PolynomialError> {
        let node = &self.nodes[node];
        match node.children {
            None => {
                out[node.lo] = poly.evaluate(&self.points[node.lo], field);
            }
            Some((left, right)) => {
                let (_, rem) = poly.div_rem(&node.product, field)?;
                self.remainder_down(field, left, &rem, out)?;
                self.remainder_down(field, right, &rem, out)?;
            }
        }
        Ok(())
    }

    /// The unique polynomial of degree `< len()` through `(x_i, values[i])`.
    pub fn interpolate(
        &self,
        field: &Field,
        values: &[BigUint],
    ) -> Result<Polynomial, PolynomialError> {
        if values.len() != self.points.len() {
            return Err(PolynomialError::LengthMismatch {
                expected: self.points.len(),
                found: values.len(),
            });
        }
        let scaled: Vec<BigUint> = values
            .iter()
            .zip(&self.weights)
            .map(|(v, s)| field.mul(v, s))
            .collect();
        Ok(self.combine_up(field, self.root, &scaled).trim())
    }

    // Returns sum_{i in node} c_i * m_node(x) / (x - x_i).
    fn combine_up(&self, field: &Field, node: usize, c: &[BigUint]) -> Polynomial {
        let node = &self.nodes[node];
        match node.children {
            None => Polynomial::constant(c[node.lo].clone()),
            Some((left, right)) => {
                let l = self.combine_up(field, left, c);
                let r = self.combine_up(field, right, c);
                let l_m = &self.nodes[left].product;
                let r_m = &self.nodes[right].product;
                l.mul(r_m, field).add(&r.mul(l_m, field), field)
            }
        }
    }
}

fn build_tree(
    field: &Field,
    points: &[BigUint],
    lo: usize,
    hi: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    if hi - lo == 1 {
        nodes.push(Node {
            lo,
            hi,
            product: Polynomial::linear(field, &points[lo]),
            children: None,
        });
        return nodes.len() - 1;
    }
    let mid = lo + (hi - lo) / 2;
    let left = build_tree(field, points, lo, mid, nodes);
    let right = build_tree(field, points, mid, hi, nodes);
    let product = nodes[left].product.mul(&nodes[right].product, field);
    nodes.push(Node {
        lo,
        hi,
        product,
        children: Some((left, right)),
    });
    nodes.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_field::FieldPreset;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn lagrange_at(field: &Field, xs: &[BigUint], ys: &[BigUint], x: &BigUint) -> BigUint {
        let mut acc = BigUint::zero();
        for (i, (xi, yi)) in xs.iter().zip(ys).enumerate() {
            let mut num = field.one();
            let mut den = field.one();
            for (j, xj) in xs.iter().enumerate() {
                if i != j {
                    num = field.mul(&num, &field.sub(x, xj));
                    den = field.mul(&den, &field.sub(xi, xj));
                }
            }
            let term = field.mul(yi, &field.mul(&num, &field.inv(&den).unwrap()));
            acc = field.add(&acc, &term);
        }
        acc
    }

    fn random_poly(field: &Field, len: usize, seed: u64) -> Polynomial {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Polynomial::new((0..len).map(|_| field.random(&mut rng)).collect())
    }

    #[test]
    fn rejects_repeated_points() {
        let f = Field::preset(FieldPreset::P63);
        let pts = vec![BigUint::from(1u32), BigUint::from(2u32), BigUint::from(1u32)];
        assert_eq!(
            BatchPrecomp::new(&f, pts).unwrap_err(),
            PolynomialError::DuplicatePoint { index: 2 }
        );
        assert_eq!(
            BatchPrecomp::new(&f, vec![]).unwrap_err(),
            PolynomialError::EmptyPointSet
        );
    }

    #[test]
    fn single_point_interpolates_constant() {
        let f = Field::preset(FieldPreset::P87);
        let batch = BatchPrecomp::on_roots(&f, 1).unwrap();
        let p = batch.interpolate(&f, &[BigUint::from(9u32)]).unwrap();
        assert_eq!(p, Polynomial::constant(BigUint::from(9u32)));
    }

    #[test]
    fn weights_match_direct_products() {
        let f = Field::preset(FieldPreset::P87);
        let xs: Vec<BigUint> = [3u32, 10, 17, 99, 1000].map(BigUint::from).to_vec();
        let batch = BatchPrecomp::new(&f, xs.clone()).unwrap();
        for (i, s) in batch.weights().iter().enumerate() {
            let mut den = f.one();
            for (j, xj) in xs.iter().enumerate() {
                if i != j {
                    den = f.mul(&den, &f.sub(&xs[i], xj));
                }
            }
            assert!(f.mul(s, &den) == f.one());
        }
    }

    #[test]
    fn large_point_set_round_trips() {
        let f = Field::preset(FieldPreset::P87);
        let n = 1030;
        let xs: Vec<BigUint> = (0..n as u64).map(|i| BigUint::from(i * 7 + 3)).collect();
        let batch = BatchPrecomp::new(&f, xs).unwrap();
        let p = random_poly(&f, n, 11);
        let evals = batch.evaluate_many(&f, &p).unwrap();
        assert_eq!(batch.interpolate(&f, &evals).unwrap(), p.trim());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn interpolation_agrees_with_lagrange(len in 1usize..48, seed in any::<u64>()) {
            let f = Field::preset(FieldPreset::P87);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let xs: Vec<BigUint> = (0..len).map(|_| f.random(&mut rng)).collect();
            prop_assume!(xs.iter().collect::<HashSet<_>>().len() == len);
            let batch = BatchPrecomp::new(&f, xs.clone()).unwrap();

            let p = random_poly(&f, len, seed ^ 0x5a5a);
            let ys = batch.evaluate_many(&f, &p).unwrap();
            for (x, y) in xs.iter().zip(&ys) {
                prop_assert_eq!(&p.evaluate(x, &f), y);
            }

            let q = batch.interpolate(&f, &ys).unwrap();
            let probe = f.random(&mut rng);
            prop_assert_eq!(q.evaluate(&probe, &f), lagrange_at(&f, &xs, &ys, &probe));
        }
    }
}
