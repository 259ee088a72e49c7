// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ShareError;
use num_bigint::BigUint;
use prio_field::Field;
use rand::{CryptoRng, RngCore};

/// Splits `secret` into `num_servers` uniformly random additive shares.
///
/// The last share absorbs the correction; a single server gets the secret itself.
pub fn share<R: RngCore + CryptoRng>(
    field: &Field,
    secret: &BigUint,
    num_servers: usize,
    rng: &mut R,
) -> Result<Vec<BigUint>, ShareError> {
    if num_servers == 0 {
        return Err(ShareError::NoServers);
    }
    let mut out: Vec<BigUint> = (0..num_servers - 1).map(|_| field.random(rng)).collect();
    let acc = field.sum(&out);
    out.push(field.sub(secret, &acc));
    Ok(out)
}

/// Sum of shares.
pub fn reconstruct(field: &Field, shares: &[BigUint]) -> BigUint {
    field.sum(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_field::FieldPreset;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn shares_sum_to_secret() {
        let field = Field::preset(FieldPreset::P87);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let secret = BigUint::from(123_456u32);
        for n in 1..6 {
            let shares = share(&field, &secret, n, &mut rng).unwrap();
            assert_eq!(shares.len(), n);
            assert_eq!(reconstruct(&field, &shares), secret);
        }
    }

    #[test]
    fn zero_servers_is_an_error() {
        let field = Field::preset(FieldPreset::P87);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(
            share(&field, &BigUint::from(1u32), 0, &mut rng),
            Err(ShareError::NoServers)
        );
    }
}
