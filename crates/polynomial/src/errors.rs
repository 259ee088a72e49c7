// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for polynomial operations.

use prio_field::FieldError;
use thiserror::Error;

/// Errors that can occur during polynomial operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolynomialError {
    /// Division by zero polynomial
    #[error("Division by zero polynomial")]
    DivisionByZero,

    /// Transform input whose length is not a power of two
    #[error("Transform length {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// Two slices that must line up do not
    #[error("Length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// An interpolation point set with a repeated point
    #[error("Interpolation points must be distinct (point {index} repeats)")]
    DuplicatePoint { index: usize },

    /// An interpolation point set with no points
    #[error("Interpolation requires at least one point")]
    EmptyPointSet,

    /// Underlying field error
    #[error(transparent)]
    Field(#[from] FieldError),
}
