// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use num_bigint::BigUint;
use prio_field::Field;

/// Index of a gate in its circuit's arena.
pub type GateId = usize;

/// A single gate. Parents are indices of earlier gates in the same circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Input,
    Add(GateId, GateId),
    AddConst(GateId, BigUint),
    Mul(GateId, GateId),
    MulConst(GateId, BigUint),
}

impl Gate {
    pub fn parents(&self) -> impl Iterator<Item = GateId> {
        let (l, r) = match self {
            Gate::Input => (None, None),
            Gate::Add(l, r) | Gate::Mul(l, r) => (Some(*l), Some(*r)),
            Gate::AddConst(p, _) | Gate::MulConst(p, _) => (Some(*p), None),
        };
        l.into_iter().chain(r)
    }

    /// Input and Mul wires are secret-shared by the client; every other wire is
    /// derived locally from its parents.
    pub fn is_shared(&self) -> bool {
        matches!(self, Gate::Input | Gate::Mul(..))
    }

    /// The same gate with parents shifted by `offset`.
    pub(crate) fn rebased(&self, offset: usize) -> Gate {
        match self {
            Gate::Input => Gate::Input,
            Gate::Add(l, r) => Gate::Add(l + offset, r + offset),
            Gate::AddConst(p, c) => Gate::AddConst(p + offset, c.clone()),
            Gate::Mul(l, r) => Gate::Mul(l + offset, r + offset),
            Gate::MulConst(p, c) => Gate::MulConst(p + offset, c.clone()),
        }
    }

    /// Value of a derived wire given its parents' values.
    ///
    /// `apply_constant` is false on every server but the leader, so that the
    /// public offset of an AddConst gate is counted exactly once across shares.
    /// Returns `None` for Input and Mul gates when `multiply` is false.
    pub(crate) fn derive(
        &self,
        field: &Field,
        wires: &[BigUint],
        apply_constant: bool,
        multiply: bool,
    ) -> Option<BigUint> {
        match self {
            Gate::Input => None,
            Gate::Add(l, r) => Some(field.add(&wires[*l], &wires[*r])),
            Gate::AddConst(p, c) => {
                if apply_constant {
                    Some(field.add(&wires[*p], c))
                } else {
                    Some(wires[*p].clone())
                }
            }
            Gate::Mul(l, r) => multiply.then(|| field.mul(&wires[*l], &wires[*r])),
            Gate::MulConst(p, c) => Some(field.mul(&wires[*p], c)),
        }
    }
}
