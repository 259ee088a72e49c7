// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use prio_share::ShareError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// A gate refers to a parent that does not precede it
    #[error("Gate {gate} refers to parent {parent}, which does not precede it")]
    UnknownParent { gate: usize, parent: usize },

    #[error("Circuit takes {expected} inputs, got {found}")]
    InputCountMismatch { expected: usize, found: usize },

    #[error("Wire buffer has {found} values, circuit has {expected} gates")]
    WireCountMismatch { expected: usize, found: usize },

    #[error("Invalid gadget parameters: {message}")]
    InvalidGadget { message: String },

    #[error(transparent)]
    Share(#[from] ShareError),
}
