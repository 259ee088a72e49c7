// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Beaver multiplication triples.
//!
//! A triple is a secret-shared `(A, B, C)` with `A * B = C`. Servers use their
//! shares to check a shared product without learning the operands.

use num_bigint::BigUint;
use prio_field::Field;
use prio_share::ShareError;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// One server's share of a Beaver triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleShare {
    pub a: BigUint,
    pub b: BigUint,
    pub c: BigUint,
}

impl TripleShare {
    /// Whether every component is a canonical element of `field`.
    pub fn is_canonical(&self, field: &Field) -> bool {
        field.contains(&self.a) && field.contains(&self.b) && field.contains(&self.c)
    }
}

/// Draws fresh shares for `num_servers` servers. Share 0 carries the correction
/// to `C` that makes the reconstructed values satisfy `A * B = C`.
pub fn new_triple<R: RngCore + CryptoRng>(
    field: &Field,
    num_servers: usize,
    rng: &mut R,
) -> Result<Vec<TripleShare>, ShareError> {
    if num_servers == 0 {
        return Err(ShareError::NoServers);
    }
    let mut shares: Vec<TripleShare> = (0..num_servers)
        .map(|_| TripleShare {
            a: field.random(rng),
            b: field.random(rng),
            c: field.random(rng),
        })
        .collect();

    let (a, b, c) = sum(field, &shares);
    let correction = field.sub(&field.mul(&a, &b), &c);
    shares[0].c = field.add(&shares[0].c, &correction);
    Ok(shares)
}

/// Reconstructs the triple and checks `A * B = C`.
///
/// Reveals `A` and `B`; only for tests and offline validation.
pub fn is_valid(field: &Field, shares: &[TripleShare]) -> bool {
    let (a, b, c) = sum(field, shares);
    field.mul(&a, &b) == c
}

fn sum(field: &Field, shares: &[TripleShare]) -> (BigUint, BigUint, BigUint) {
    (
        field.sum(shares.iter().map(|s| &s.a)),
        field.sum(shares.iter().map(|s| &s.b)),
        field.sum(shares.iter().map(|s| &s.c)),
    )
}
