// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Arithmetic circuits
//!
//! A [`Circuit`] is an arena of [`Gate`]s in evaluation order. Every parent
//! reference points at an earlier gate, so a single forward pass evaluates the
//! whole circuit. A subset of gates are assert-zero checks: the circuit accepts
//! an input iff every one of them evaluates to zero.
//!
//! Wire values live outside the circuit in a [`Wires`] buffer, so a circuit is
//! built once per predicate shape and shared across requests.
//!
//! [`gadgets`] holds the standard validity predicates.

mod circuit;
mod errors;
mod gate;
pub mod gadgets;

pub use circuit::{Circuit, Wires};
pub use errors::CircuitError;
pub use gate::{Gate, GateId};
