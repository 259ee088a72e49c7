// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::CheckerError;
use crate::schema::{FieldValue, Schema};
use num_bigint::BigUint;
use num_traits::Zero;
use prio_circuit::Circuit;
use prio_field::Field;
use prio_polynomial::{evaluate_on_roots, interpolate_on_roots};
use prio_share::{GenPrg, PrgHints};
use prio_triple::{new_triple, TripleShare};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything one server receives for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub hints: PrgHints,
    pub triple: TripleShare,
}

/// Number of values a client shares for `circuit`: every Input and Mul wire,
/// `r_f`, `r_g`, `r_f * r_g`, then the `N - 1` odd-root evaluations of `h`.
pub fn num_shared_values(circuit: &Circuit) -> usize {
    let big_n = (circuit.num_muls() + 1).next_power_of_two();
    circuit.num_shared() + 3 + big_n - 1
}

/// Encodes `values` with `schema` and builds one request per server.
pub fn build_request<R: RngCore + CryptoRng>(
    field: &Field,
    schema: &Schema,
    values: &[FieldValue],
    num_servers: usize,
    leader: usize,
    rng: &mut R,
) -> Result<Vec<ClientRequest>, CheckerError> {
    let inputs = schema.encode(field, values)?;
    build_request_from_inputs(field, schema.circuit(), &inputs, num_servers, leader, rng)
}

/// Builds one request per server from raw circuit inputs.
///
/// The inputs are not checked against the circuit's predicate, so this is also
/// how a dishonest submission is produced.
pub fn build_request_from_inputs<R: RngCore + CryptoRng>(
    field: &Field,
    circuit: &Circuit,
    inputs: &[BigUint],
    num_servers: usize,
    leader: usize,
    rng: &mut R,
) -> Result<Vec<ClientRequest>, CheckerError> {
    let wires = circuit.evaluate(field, inputs)?;
    let mut prg = GenPrg::new(num_servers, leader, rng)?;
    circuit.share_wires(field, &wires, &mut prg)?;

    let big_n = (circuit.num_muls() + 1).next_power_of_two();
    let r_f = field.random(rng);
    let r_g = field.random(rng);

    let mut points_f = vec![BigUint::zero(); big_n];
    let mut points_g = vec![BigUint::zero(); big_n];
    points_f[0] = r_f.clone();
    points_g[0] = r_g.clone();
    for (i, (l, r)) in circuit.mul_operands().into_iter().enumerate() {
        points_f[i + 1] = wires[l].clone();
        points_g[i + 1] = wires[r].clone();
    }

    let f = interpolate_on_roots(field, &points_f)?;
    let g = interpolate_on_roots(field, &points_g)?;
    let f_evals = evaluate_on_roots(field, &f, 2 * big_n)?;
    let g_evals = evaluate_on_roots(field, &g, 2 * big_n)?;

    prg.share(field, &r_f);
    prg.share(field, &r_g);
    prg.share(field, &field.mul(&r_f, &r_g));
    for j in (1..2 * big_n - 1).step_by(2) {
        prg.share(field, &field.mul(&f_evals[j], &g_evals[j]));
    }
    debug_assert_eq!(prg.count(), num_shared_values(circuit));

    let triples = new_triple(field, num_servers, rng)?;
    debug!(
        shared = prg.count(),
        num_servers, leader, "Built client request"
    );
    triples
        .into_iter()
        .enumerate()
        .map(|(server, triple)| -> Result<ClientRequest, CheckerError> {
            Ok(ClientRequest {
                hints: prg.hints(server)?,
                triple,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_circuit::gadgets;
    use prio_field::FieldPreset;
    use prio_share::ReplayPrg;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn only_the_leader_receives_deltas() {
        let field = Field::preset(FieldPreset::P87);
        let mut c = Circuit::new();
        gadgets::n_bits(&mut c, &field, 4, "v").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let inputs: Vec<BigUint> = [1u32, 1, 1, 0].into_iter().map(BigUint::from).collect();

        let requests = build_request_from_inputs(&field, &c, &inputs, 3, 2, &mut rng).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].hints.delta.is_empty());
        assert!(requests[1].hints.delta.is_empty());
        assert_eq!(requests[2].hints.delta.len(), num_shared_values(&c));
        // 4 inputs, 4 muls, 3 randoms, 7 h hints
        assert_eq!(num_shared_values(&c), 18);
    }

    #[test]
    fn h_hints_reconstruct_to_the_product() {
        let field = Field::preset(FieldPreset::P63);
        let mut c = Circuit::new();
        gadgets::one_bit(&mut c, &field, "b").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let requests =
            build_request_from_inputs(&field, &c, &[BigUint::from(1u32)], 2, 0, &mut rng).unwrap();

        let total = num_shared_values(&c);
        let replayed: Vec<Vec<BigUint>> = requests
            .iter()
            .enumerate()
            .map(|(server, req)| {
                let mut prg = ReplayPrg::new(&field, server, 0, req.hints.clone()).unwrap();
                (0..total).map(|_| prg.get(&field).unwrap()).collect()
            })
            .collect();
        let values: Vec<BigUint> = (0..total)
            .map(|i| field.add(&replayed[0][i], &replayed[1][i]))
            .collect();

        // one input, one mul: N = 2, then r_f, r_g, r_f * r_g, h(w_4)
        let (r_f, r_g, r_fg) = (&values[2], &values[3], &values[4]);
        assert_eq!(&field.mul(r_f, r_g), r_fg);
        assert_eq!(values[1], BigUint::zero());

        let w = field.root_of_unity(4).unwrap();
        let f = interpolate_on_roots(&field, &[r_f.clone(), values[0].clone()]).unwrap();
        let minus_one = field.add(&values[0], &field.from_i64(-1));
        let g = interpolate_on_roots(&field, &[r_g.clone(), minus_one]).unwrap();
        let eval = |p: &[BigUint]| field.add(&p[0], &field.mul(&p[1], &w));
        assert_eq!(values[5], field.mul(&eval(&f), &eval(&g)));
    }

    #[test]
    fn requests_survive_bincode() {
        let field = Field::preset(FieldPreset::P87);
        let mut c = Circuit::new();
        gadgets::one_bit(&mut c, &field, "b").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let requests =
            build_request_from_inputs(&field, &c, &[BigUint::from(0u32)], 2, 1, &mut rng).unwrap();
        let bytes = bincode::serialize(&requests[1]).unwrap();
        let decoded: ClientRequest = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, requests[1]);
    }
}
