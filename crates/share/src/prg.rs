// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ShareError;
use num_bigint::BigUint;
use prio_field::{Field, Prg, PrgKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Compressed form of one server's shares.
///
/// `delta` is empty for every server except the leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrgHints {
    pub key: PrgKey,
    pub delta: Vec<BigUint>,
}

/// Client-side sharing state: one keyed stream per server plus the delta log.
#[derive(Debug)]
pub struct GenPrg {
    leader: usize,
    streams: Vec<Prg>,
    delta: Vec<BigUint>,
}

impl GenPrg {
    pub fn new<R: RngCore + CryptoRng>(
        num_servers: usize,
        leader: usize,
        rng: &mut R,
    ) -> Result<Self, ShareError> {
        if num_servers == 0 {
            return Err(ShareError::NoServers);
        }
        if leader >= num_servers {
            return Err(ShareError::ServerOutOfRange {
                index: leader,
                num_servers,
            });
        }
        Ok(Self {
            leader,
            streams: (0..num_servers).map(|_| Prg::random(rng)).collect(),
            delta: Vec::new(),
        })
    }

    pub fn num_servers(&self) -> usize {
        self.streams.len()
    }

    pub fn leader(&self) -> usize {
        self.leader
    }

    /// Number of values shared so far.
    pub fn count(&self) -> usize {
        self.delta.len()
    }

    /// Shares `value`, returning each server's share.
    ///
    /// Draws one element from every stream; the leader's share absorbs the
    /// correction, which is appended to the delta log.
    pub fn share(&mut self, field: &Field, value: &BigUint) -> Vec<BigUint> {
        let mut out: Vec<BigUint> = self
            .streams
            .iter_mut()
            .map(|s| s.next_element(field))
            .collect();
        let delta = field.sub(value, &field.sum(&out));
        out[self.leader] = field.add(&out[self.leader], &delta);
        self.delta.push(delta);
        out
    }

    /// The hints that let `server` replay its shares.
    pub fn hints(&self, server: usize) -> Result<PrgHints, ShareError> {
        let stream = self
            .streams
            .get(server)
            .ok_or(ShareError::ServerOutOfRange {
                index: server,
                num_servers: self.streams.len(),
            })?;
        let delta = if server == self.leader {
            self.delta.clone()
        } else {
            Vec::new()
        };
        Ok(PrgHints {
            key: stream.key(),
            delta,
        })
    }
}

/// Server-side replay of a [`GenPrg`] stream.
#[derive(Debug)]
pub struct ReplayPrg {
    server: usize,
    leader: usize,
    stream: Prg,
    delta: Vec<BigUint>,
}

impl ReplayPrg {
    /// Validates the hints for `server` and positions the stream at zero.
    ///
    /// A non-leader must receive no deltas, and every leader delta must be a
    /// canonical element of `field`.
    pub fn new(
        field: &Field,
        server: usize,
        leader: usize,
        hints: PrgHints,
    ) -> Result<Self, ShareError> {
        if server != leader && !hints.delta.is_empty() {
            return Err(ShareError::UnexpectedDeltas {
                server,
                count: hints.delta.len(),
            });
        }
        if let Some(index) = hints.delta.iter().position(|d| !field.contains(d)) {
            return Err(ShareError::NonCanonicalDelta { index });
        }
        Ok(Self {
            server,
            leader,
            stream: Prg::new(hints.key),
            delta: hints.delta,
        })
    }

    pub fn is_leader(&self) -> bool {
        self.server == self.leader
    }

    pub fn server(&self) -> usize {
        self.server
    }

    /// Values consumed so far.
    pub fn position(&self) -> usize {
        self.stream.position()
    }

    /// Number of deltas shipped to this server.
    pub fn delta_len(&self) -> usize {
        self.delta.len()
    }

    /// This server's share of the next shared value.
    pub fn get(&mut self, field: &Field) -> Result<BigUint, ShareError> {
        let position = self.stream.position();
        if self.is_leader() && position >= self.delta.len() {
            return Err(ShareError::Exhausted { position });
        }
        let draw = self.stream.next_element(field);
        if self.is_leader() {
            Ok(field.add(&draw, &self.delta[position]))
        } else {
            Ok(draw)
        }
    }

    /// Confirms that exactly `expected` values were consumed and, on the
    /// leader, that every delta was used.
    pub fn finish(&self, expected: usize) -> Result<(), ShareError> {
        let found = self.position();
        if found != expected {
            return Err(ShareError::PositionMismatch { expected, found });
        }
        if self.is_leader() && self.delta.len() != expected {
            return Err(ShareError::PositionMismatch {
                expected: self.delta.len(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_field::FieldPreset;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn replay_all(
        field: &Field,
        gen: &GenPrg,
        count: usize,
    ) -> Vec<Vec<BigUint>> {
        (0..gen.num_servers())
            .map(|s| {
                let hints = gen.hints(s).unwrap();
                let mut replay = ReplayPrg::new(field, s, gen.leader(), hints).unwrap();
                let shares = (0..count).map(|_| replay.get(field).unwrap()).collect();
                replay.finish(count).unwrap();
                shares
            })
            .collect()
    }

    #[test]
    fn replayed_shares_match_generated_shares() {
        let field = Field::preset(FieldPreset::P87);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut gen = GenPrg::new(3, 1, &mut rng).unwrap();
        let generated: Vec<Vec<BigUint>> = (0u32..5)
            .map(|v| gen.share(&field, &BigUint::from(v)))
            .collect();
        let replayed = replay_all(&field, &gen, 5);
        for (value, shares) in generated.iter().enumerate() {
            for (server, share) in shares.iter().enumerate() {
                assert_eq!(&replayed[server][value], share);
            }
        }
    }

    #[test]
    fn only_the_leader_gets_deltas() {
        let field = Field::preset(FieldPreset::P63);
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut gen = GenPrg::new(4, 2, &mut rng).unwrap();
        gen.share(&field, &BigUint::from(1u32));
        gen.share(&field, &BigUint::from(2u32));
        for s in 0..4 {
            let hints = gen.hints(s).unwrap();
            assert_eq!(hints.delta.len(), if s == 2 { 2 } else { 0 });
        }
        assert!(matches!(
            gen.hints(4),
            Err(ShareError::ServerOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn malformed_hints_are_rejected() {
        let field = Field::preset(FieldPreset::P63);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut gen = GenPrg::new(2, 0, &mut rng).unwrap();
        gen.share(&field, &BigUint::from(9u32));

        let mut leader_hints = gen.hints(0).unwrap();
        assert_eq!(
            ReplayPrg::new(&field, 1, 0, leader_hints.clone()).unwrap_err(),
            ShareError::UnexpectedDeltas {
                server: 1,
                count: 1
            }
        );

        leader_hints.delta[0] = field.modulus().clone();
        assert_eq!(
            ReplayPrg::new(&field, 0, 0, leader_hints).unwrap_err(),
            ShareError::NonCanonicalDelta { index: 0 }
        );
    }

    #[test]
    fn over_and_under_consumption_are_detected() {
        let field = Field::preset(FieldPreset::P87);
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let mut gen = GenPrg::new(2, 0, &mut rng).unwrap();
        gen.share(&field, &BigUint::from(1u32));
        gen.share(&field, &BigUint::from(0u32));

        let mut leader = ReplayPrg::new(&field, 0, 0, gen.hints(0).unwrap()).unwrap();
        leader.get(&field).unwrap();
        assert_eq!(
            leader.finish(2),
            Err(ShareError::PositionMismatch {
                expected: 2,
                found: 1
            })
        );
        leader.get(&field).unwrap();
        assert_eq!(
            leader.get(&field),
            Err(ShareError::Exhausted { position: 2 })
        );
    }

    #[test]
    fn hints_survive_bincode() {
        let field = Field::preset(FieldPreset::P102);
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let mut gen = GenPrg::new(2, 1, &mut rng).unwrap();
        gen.share(&field, &BigUint::from(77u32));
        let hints = gen.hints(1).unwrap();
        let decoded: PrgHints = bincode::deserialize(&bincode::serialize(&hints).unwrap()).unwrap();
        assert_eq!(decoded, hints);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn replayed_shares_reconstruct_the_value(
            value in any::<u128>(),
            num_servers in 1usize..8,
            leader_seed in any::<usize>(),
            seed in any::<u64>(),
        ) {
            let field = Field::preset(FieldPreset::P87);
            let value = field.reduce(&BigUint::from(value));
            let leader = leader_seed % num_servers;
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mut gen = GenPrg::new(num_servers, leader, &mut rng).unwrap();
            gen.share(&field, &value);

            let replayed = replay_all(&field, &gen, 1);
            let total = field.sum(replayed.iter().map(|s| &s[0]));
            prop_assert_eq!(total, value);
        }
    }
}
