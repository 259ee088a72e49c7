// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use num_bigint::BigUint;
use prio_field::PrgKey;
use prio_mpc::{ClientRequest, CorShare, OutShare};
use serde::{Deserialize, Serialize};

/// Public identifier the client attaches to a submission.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequestArgs {
    pub request_id: RequestId,
    pub leader: usize,
    /// Evaluation point epoch the request is checked under
    pub epoch: u64,
    pub request: ClientRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCircuitArgs {
    pub request_id: RequestId,
    pub leader: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalCircuitArgs {
    pub request_id: RequestId,
    pub leader: usize,
    /// Every server's reply to `eval_circuit`, in server order
    pub cor_shares: Vec<CorShare>,
    /// Seed of the random linear combination, identical on every server
    pub key: PrgKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptArgs {
    pub request_id: RequestId,
    pub leader: usize,
    /// Every server's reply to `final_circuit`, in server order
    pub out_shares: Vec<OutShare>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptReply {
    pub accepted: bool,
    /// This server's shares of the output wires, only when accepted
    pub output_shares: Option<Vec<BigUint>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalPointArgs {
    pub leader: usize,
    pub epoch: u64,
    pub x: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortArgs {
    pub request_id: RequestId,
    pub leader: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_config::FieldConfig;
    use prio_field::{Field, FieldPreset};
    use prio_mpc::{build_request, FieldValue, Schema};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn requests_survive_the_wire() {
        let field = Field::preset(FieldPreset::P87);
        let schema = Schema::from_fields(
            &field,
            &[FieldConfig::Int {
                name: "a".to_string(),
                int_bits: 5,
            }],
        )
        .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let requests = build_request(&field, &schema, &[FieldValue::Int(17)], 3, 2, &mut rng).unwrap();

        for (server, request) in requests.into_iter().enumerate() {
            let args = NewRequestArgs {
                request_id: 40 + server as u64,
                leader: 2,
                epoch: 6,
                request,
            };
            let bytes = bincode::serialize(&args).unwrap();
            let decoded: NewRequestArgs = bincode::deserialize(&bytes).unwrap();
            assert_eq!(decoded, args);
        }

        let key = PrgKey::random(&mut rng);
        let args = FinalCircuitArgs {
            request_id: 1,
            leader: 0,
            cor_shares: vec![],
            key,
        };
        let decoded: FinalCircuitArgs =
            bincode::deserialize(&bincode::serialize(&args).unwrap()).unwrap();
        assert_eq!(decoded.key, key);
    }
}
