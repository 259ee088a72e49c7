// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::client::{num_shared_values, ClientRequest};
use crate::errors::{major_issue, CheckerError};
use crate::precomp::CheckerPrecomp;
use num_bigint::BigUint;
use num_traits::Zero;
use prio_circuit::{Circuit, GateId, Wires};
use prio_field::{Field, Prg, PrgKey};
use prio_share::ReplayPrg;
use prio_triple::TripleShare;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckerState {
    Idle,
    HasRequest,
    Layer1Done,
    Finished,
}

impl fmt::Display for CheckerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckerState::Idle => "idle",
            CheckerState::HasRequest => "holding a request",
            CheckerState::Layer1Done => "past the first round",
            CheckerState::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// One server's blinded shares of `f(x) - A` and `x * g(x) - B`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorShare {
    pub d: BigUint,
    pub e: BigUint,
}

/// The public sums of every server's [`CorShare`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cor {
    pub d: BigUint,
    pub e: BigUint,
}

/// One server's share of the final randomized check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutShare {
    pub check: BigUint,
}

#[derive(Debug)]
struct Request {
    wires: Wires,
    r_f: BigUint,
    r_g: BigUint,
    r_fg: BigUint,
    h_hints: Vec<BigUint>,
    triple: TripleShare,
}

#[derive(Debug)]
struct Evaluations {
    f: BigUint,
    g: BigUint,
    h: BigUint,
}

/// Per-server state machine of the validity check for one request at a time.
///
/// Calls must follow `set_req`, `cor_share`, `cor`, `out_share`,
/// `output_is_valid`. `reset` returns the checker to [`CheckerState::Idle`]
/// so it can be reused.
#[derive(Debug)]
pub struct Checker {
    field: Arc<Field>,
    circuit: Arc<Circuit>,
    mul_operands: Vec<(GateId, GateId)>,
    mul_gates: Vec<GateId>,
    big_n: usize,
    server: usize,
    leader: usize,
    num_servers: usize,
    state: CheckerState,
    request: Option<Request>,
    evals: Option<Evaluations>,
}

fn in_sync<T, E: Into<anyhow::Error>>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!(
            "{}",
            major_issue("PRG replay lost sync with a validated client stream", e)
        ),
    }
}

impl Checker {
    pub fn new(
        field: Arc<Field>,
        circuit: Arc<Circuit>,
        server: usize,
        leader: usize,
        num_servers: usize,
    ) -> Self {
        Self {
            mul_operands: circuit.mul_operands(),
            mul_gates: circuit.mul_gates(),
            big_n: (circuit.num_muls() + 1).next_power_of_two(),
            field,
            circuit,
            server,
            leader,
            num_servers,
            state: CheckerState::Idle,
            request: None,
            evals: None,
        }
    }

    pub fn server(&self) -> usize {
        self.server
    }

    pub fn leader(&self) -> usize {
        self.leader
    }

    pub fn state(&self) -> CheckerState {
        self.state
    }

    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    fn expect_state(&self, expected: CheckerState) -> Result<(), CheckerError> {
        if self.state != expected {
            return Err(CheckerError::ProtocolSequence {
                expected,
                found: self.state,
            });
        }
        Ok(())
    }

    fn expect_count(&self, found: usize) -> Result<(), CheckerError> {
        if found != self.num_servers {
            return Err(CheckerError::WrongShareCount {
                expected: self.num_servers,
                found,
            });
        }
        Ok(())
    }

    fn is_leader(&self) -> bool {
        self.server == self.leader
    }

    /// Replays this server's shares of the client's request.
    pub fn set_req(&mut self, request: ClientRequest) -> Result<(), CheckerError> {
        self.expect_state(CheckerState::Idle)?;
        let field = &*self.field;
        let expected = num_shared_values(&self.circuit);

        if !request.triple.is_canonical(field) {
            return Err(CheckerError::malformed("triple share is not a field element"));
        }
        if self.is_leader() && request.hints.delta.len() != expected {
            return Err(CheckerError::malformed(format!(
                "leader expected {expected} deltas, got {}",
                request.hints.delta.len()
            )));
        }
        let mut prg = ReplayPrg::new(field, self.server, self.leader, request.hints)
            .map_err(|e| CheckerError::malformed(e.to_string()))?;

        let wires = in_sync(self.circuit.import_wires(field, &mut prg));
        let r_f = in_sync(prg.get(field));
        let r_g = in_sync(prg.get(field));
        let r_fg = in_sync(prg.get(field));
        let h_hints = (0..self.big_n - 1)
            .map(|_| in_sync(prg.get(field)))
            .collect();
        in_sync(prg.finish(expected));

        self.request = Some(Request {
            wires,
            r_f,
            r_g,
            r_fg,
            h_hints,
            triple: request.triple,
        });
        self.state = CheckerState::HasRequest;
        trace!(server = self.server, leader = self.leader, "Request replayed");
        Ok(())
    }

    /// This server's share of `(f(x) - A, x * g(x) - B)`.
    pub fn cor_share(&mut self, precomp: &CheckerPrecomp) -> Result<CorShare, CheckerError> {
        self.expect_state(CheckerState::HasRequest)?;
        let found = precomp.domain().big_n();
        if found != self.big_n {
            return Err(CheckerError::PrecompMismatch {
                expected: self.big_n,
                found,
            });
        }
        let field = &*self.field;
        let Some(req) = &self.request else {
            return Err(CheckerError::ProtocolSequence {
                expected: CheckerState::HasRequest,
                found: CheckerState::Idle,
            });
        };

        let mut points_f = vec![BigUint::zero(); self.big_n];
        let mut points_g = vec![BigUint::zero(); self.big_n];
        let mut points_h = vec![BigUint::zero(); 2 * self.big_n - 1];
        points_f[0] = req.r_f.clone();
        points_g[0] = req.r_g.clone();
        points_h[0] = req.r_fg.clone();
        for (i, ((l, r), m)) in self.mul_operands.iter().zip(&self.mul_gates).enumerate() {
            points_f[i + 1] = req.wires[*l].clone();
            points_g[i + 1] = req.wires[*r].clone();
            points_h[2 * (i + 1)] = req.wires[*m].clone();
        }
        for (i, hint) in req.h_hints.iter().enumerate() {
            points_h[2 * i + 1] = hint.clone();
        }

        let x = precomp.x();
        let f = precomp.point_n().evaluate(field, &points_f)?;
        let g = field.mul(&precomp.point_n().evaluate(field, &points_g)?, x);
        let h = field.mul(&precomp.point_2n().evaluate(field, &points_h)?, x);

        let share = CorShare {
            d: field.sub(&f, &req.triple.a),
            e: field.sub(&g, &req.triple.b),
        };
        self.evals = Some(Evaluations { f, g, h });
        self.state = CheckerState::Layer1Done;
        Ok(share)
    }

    /// Sums every server's [`CorShare`].
    pub fn cor(&self, shares: &[CorShare]) -> Result<Cor, CheckerError> {
        self.expect_state(CheckerState::Layer1Done)?;
        self.expect_count(shares.len())?;
        let field = &*self.field;
        Ok(Cor {
            d: field.sum(shares.iter().map(|s| &s.d)),
            e: field.sum(shares.iter().map(|s| &s.e)),
        })
    }

    /// This server's share of a random linear combination of the
    /// multiplication check and every assert-zero wire.
    ///
    /// `key` must be the same on every server for a given request.
    pub fn out_share(&mut self, cor: &Cor, key: &PrgKey) -> Result<OutShare, CheckerError> {
        self.expect_state(CheckerState::Layer1Done)?;
        let field = &*self.field;
        let (Some(req), Some(evals)) = (&self.request, &self.evals) else {
            return Err(CheckerError::ProtocolSequence {
                expected: CheckerState::Layer1Done,
                found: CheckerState::Idle,
            });
        };
        let t = &req.triple;

        let mut mul_check = field.add(&field.mul(&cor.d, &t.b), &field.mul(&cor.e, &t.a));
        mul_check = field.add(&mul_check, &t.c);
        mul_check = field.sub(&mul_check, &evals.h);
        if self.is_leader() {
            mul_check = field.add(&mul_check, &field.mul(&cor.d, &cor.e));
        }

        let mut coefficients = Prg::new(*key);
        let mut check = field.mul(&mul_check, &coefficients.next_element(field));
        for gate in self.circuit.zero_checks() {
            let r = coefficients.next_element(field);
            check = field.add(&check, &field.mul(&req.wires[*gate], &r));
        }

        self.state = CheckerState::Finished;
        Ok(OutShare { check })
    }

    /// Whether every server's [`OutShare`] sums to zero.
    pub fn output_is_valid(&self, shares: &[OutShare]) -> Result<bool, CheckerError> {
        self.expect_state(CheckerState::Finished)?;
        self.expect_count(shares.len())?;
        Ok(self.field.sum(shares.iter().map(|s| &s.check)).is_zero())
    }

    /// This server's shares of the circuit's output wires, in output order.
    pub fn output_shares(&self) -> Result<Vec<BigUint>, CheckerError> {
        self.expect_state(CheckerState::Finished)?;
        let Some(req) = &self.request else {
            return Ok(Vec::new());
        };
        Ok(self
            .circuit
            .outputs()
            .iter()
            .map(|g| req.wires[*g].clone())
            .collect())
    }

    pub fn reset(&mut self) {
        self.state = CheckerState::Idle;
        self.request = None;
        self.evals = None;
    }

    #[cfg(test)]
    fn overwrite_input_share(&mut self, gate: GateId, value: BigUint) {
        let is_leader = self.is_leader();
        if let Some(req) = &mut self.request {
            req.wires.set(gate, value);
            self.circuit
                .derive_local_wires(&self.field, &mut req.wires, is_leader)
                .unwrap();
        }
    }
}
