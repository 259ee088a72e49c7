// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::field::Field;
use num_bigint::{BigUint, RandBigInt};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seed of a deterministic element stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrgKey(pub [u8; 32]);

impl PrgKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrgKey({}..)", &hex::encode(self.0)[..8])
    }
}

impl fmt::Display for PrgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Deterministic stream of field elements derived from a [`PrgKey`].
///
/// Two streams built from the same key yield the same sequence of elements for
/// the same field, which lets a compact share be expanded identically by the
/// client and the server that receives it.
pub struct Prg {
    key: PrgKey,
    rng: ChaCha20Rng,
    position: usize,
}

impl Prg {
    pub fn new(key: PrgKey) -> Self {
        Self {
            key,
            rng: ChaCha20Rng::from_seed(key.0),
            position: 0,
        }
    }

    /// Fresh stream with a key drawn from `rng`.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(PrgKey::random(rng))
    }

    pub fn key(&self) -> PrgKey {
        self.key
    }

    /// Number of elements drawn so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Next element of `[0, p)`.
    pub fn next_element(&mut self, field: &Field) -> BigUint {
        self.position += 1;
        self.rng.gen_biguint_below(field.modulus())
    }

    /// Next `n` elements.
    pub fn next_elements(&mut self, field: &Field, n: usize) -> Vec<BigUint> {
        (0..n).map(|_| self.next_element(field)).collect()
    }
}

impl fmt::Debug for Prg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prg")
            .field("key", &self.key)
            .field("position", &self.position)
            .finish()
    }
}
