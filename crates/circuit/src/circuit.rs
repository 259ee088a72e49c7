// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::CircuitError;
use crate::gate::{Gate, GateId};
use num_bigint::BigUint;
use num_traits::Zero;
use prio_field::Field;
use prio_share::{GenPrg, ReplayPrg};
use std::ops::Index;

/// An arithmetic circuit: gates in evaluation order, named outputs and the
/// gates that must evaluate to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    gates: Vec<Gate>,
    outputs: Vec<GateId>,
    output_names: Vec<String>,
    zero_checks: Vec<GateId>,
}

/// One value per gate of a circuit, either the true wire values or one
/// server's shares of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wires {
    values: Vec<BigUint>,
}

impl Wires {
    pub fn zeroed(len: usize) -> Self {
        Self {
            values: vec![BigUint::zero(); len],
        }
    }

    pub fn values(&self) -> &[BigUint] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set(&mut self, gate: GateId, value: BigUint) {
        self.values[gate] = value;
    }
}

impl Index<GateId> for Wires {
    type Output = BigUint;

    fn index(&self, gate: GateId) -> &BigUint {
        &self.values[gate]
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, gate: Gate) -> Result<GateId, CircuitError> {
        let id = self.gates.len();
        if let Some(parent) = gate.parents().find(|p| *p >= id) {
            return Err(CircuitError::UnknownParent { gate: id, parent });
        }
        self.gates.push(gate);
        Ok(id)
    }

    pub fn input(&mut self) -> GateId {
        self.gates.push(Gate::Input);
        self.gates.len() - 1
    }

    pub fn add(&mut self, l: GateId, r: GateId) -> Result<GateId, CircuitError> {
        self.push(Gate::Add(l, r))
    }

    pub fn add_const(&mut self, p: GateId, c: BigUint) -> Result<GateId, CircuitError> {
        self.push(Gate::AddConst(p, c))
    }

    pub fn mul(&mut self, l: GateId, r: GateId) -> Result<GateId, CircuitError> {
        self.push(Gate::Mul(l, r))
    }

    pub fn mul_const(&mut self, p: GateId, c: BigUint) -> Result<GateId, CircuitError> {
        self.push(Gate::MulConst(p, c))
    }

    /// Marks `gate` as one that must evaluate to zero.
    pub fn assert_zero(&mut self, gate: GateId) -> Result<(), CircuitError> {
        self.check_exists(gate)?;
        self.zero_checks.push(gate);
        Ok(())
    }

    pub fn add_output(&mut self, gate: GateId, name: impl Into<String>) -> Result<(), CircuitError> {
        self.check_exists(gate)?;
        self.outputs.push(gate);
        self.output_names.push(name.into());
        Ok(())
    }

    fn check_exists(&self, gate: GateId) -> Result<(), CircuitError> {
        if gate >= self.gates.len() {
            return Err(CircuitError::UnknownParent {
                gate: self.gates.len(),
                parent: gate,
            });
        }
        Ok(())
    }

    /// Conjunction of two circuits. `other`'s gates are appended after this
    /// circuit's, with every index shifted accordingly.
    pub fn and(mut self, other: Circuit) -> Circuit {
        let offset = self.gates.len();
        self.gates
            .extend(other.gates.iter().map(|g| g.rebased(offset)));
        self.outputs
            .extend(other.outputs.iter().map(|g| g + offset));
        self.output_names.extend(other.output_names);
        self.zero_checks
            .extend(other.zero_checks.iter().map(|g| g + offset));
        self
    }

    pub fn and_all(circuits: impl IntoIterator<Item = Circuit>) -> Circuit {
        circuits.into_iter().fold(Circuit::new(), Circuit::and)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn outputs(&self) -> &[GateId] {
        &self.outputs
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn zero_checks(&self) -> &[GateId] {
        &self.zero_checks
    }

    pub fn input_gates(&self) -> Vec<GateId> {
        self.gates_where(|g| matches!(g, Gate::Input))
    }

    pub fn mul_gates(&self) -> Vec<GateId> {
        self.gates_where(|g| matches!(g, Gate::Mul(..)))
    }

    /// `(left, right)` parents of every Mul gate, in gate order.
    pub fn mul_operands(&self) -> Vec<(GateId, GateId)> {
        self.gates
            .iter()
            .filter_map(|g| match g {
                Gate::Mul(l, r) => Some((*l, *r)),
                _ => None,
            })
            .collect()
    }

    pub fn num_inputs(&self) -> usize {
        self.gates.iter().filter(|g| matches!(g, Gate::Input)).count()
    }

    pub fn num_muls(&self) -> usize {
        self.gates.iter().filter(|g| matches!(g, Gate::Mul(..))).count()
    }

    /// Number of wire values the client shares: every Input and Mul gate.
    pub fn num_shared(&self) -> usize {
        self.gates.iter().filter(|g| g.is_shared()).count()
    }

    fn gates_where(&self, pred: impl Fn(&Gate) -> bool) -> Vec<GateId> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| pred(g))
            .map(|(i, _)| i)
            .collect()
    }

    /// Evaluates every wire on `inputs`, one per Input gate in gate order.
    pub fn evaluate(&self, field: &Field, inputs: &[BigUint]) -> Result<Wires, CircuitError> {
        let expected = self.num_inputs();
        if inputs.len() != expected {
            return Err(CircuitError::InputCountMismatch {
                expected,
                found: inputs.len(),
            });
        }
        let mut values: Vec<BigUint> = Vec::with_capacity(self.gates.len());
        let mut next_input = inputs.iter();
        for gate in &self.gates {
            let value = match gate.derive(field, &values, true, true) {
                Some(v) => v,
                None => next_input
                    .next()
                    .map(|v| field.reduce(v))
                    .unwrap_or_default(),
            };
            values.push(value);
        }
        Ok(Wires { values })
    }

    /// Whether every assert-zero wire is zero.
    pub fn accepts(&self, wires: &Wires) -> bool {
        self.zero_checks.iter().all(|g| wires[*g].is_zero())
    }

    /// Evaluates and reports acceptance.
    pub fn check(&self, field: &Field, inputs: &[BigUint]) -> Result<bool, CircuitError> {
        Ok(self.accepts(&self.evaluate(field, inputs)?))
    }

    /// Output wire values, paired with their names.
    pub fn named_outputs<'a>(&'a self, wires: &'a Wires) -> impl Iterator<Item = (&'a str, &'a BigUint)> {
        self.output_names
            .iter()
            .zip(&self.outputs)
            .map(move |(name, g)| (name.as_str(), &wires[*g]))
    }

    fn check_wires(&self, wires: &Wires) -> Result<(), CircuitError> {
        if wires.len() != self.gates.len() {
            return Err(CircuitError::WireCountMismatch {
                expected: self.gates.len(),
                found: wires.len(),
            });
        }
        Ok(())
    }

    /// Shares every Input wire, then every Mul wire, through `prg`.
    pub fn share_wires(
        &self,
        field: &Field,
        wires: &Wires,
        prg: &mut GenPrg,
    ) -> Result<(), CircuitError> {
        self.check_wires(wires)?;
        for g in self.input_gates().into_iter().chain(self.mul_gates()) {
            prg.share(field, &wires[g]);
        }
        Ok(())
    }

    /// Rebuilds one server's share of every wire.
    ///
    /// Input and Mul shares are pulled from `prg` in the order
    /// [`Circuit::share_wires`] produced them. Derived wires are then
    /// recomputed locally.
    pub fn import_wires(&self, field: &Field, prg: &mut ReplayPrg) -> Result<Wires, CircuitError> {
        let mut wires = Wires::zeroed(self.gates.len());
        for g in self.input_gates().into_iter().chain(self.mul_gates()) {
            wires.values[g] = prg.get(field)?;
        }
        self.derive_local_wires(field, &mut wires, prg.is_leader())?;
        Ok(wires)
    }

    /// Recomputes every Add, AddConst and MulConst wire from its parents,
    /// keeping Input and Mul wires as they are.
    pub fn derive_local_wires(
        &self,
        field: &Field,
        wires: &mut Wires,
        is_leader: bool,
    ) -> Result<(), CircuitError> {
        self.check_wires(wires)?;
        for (i, gate) in self.gates.iter().enumerate() {
            if let Some(v) = gate.derive(field, &wires.values, is_leader, false) {
                wires.values[i] = v;
            }
        }
        Ok(())
    }
}
