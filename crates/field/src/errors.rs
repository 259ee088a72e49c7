// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for field construction and arithmetic.

use thiserror::Error;

/// Errors that can occur while building or using a [`crate::Field`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The modulus is too small or even
    #[error("Invalid modulus: {message}")]
    InvalidModulus { message: String },

    /// The generator does not have the advertised order
    #[error("Invalid generator: {message}")]
    InvalidGenerator { message: String },

    /// A root of unity was requested that the subgroup cannot supply
    #[error("No root of unity of order {requested}; the field supports orders up to 2^{two_order}")]
    UnsupportedRootOrder { requested: usize, two_order: u32 },

    /// Inversion of zero
    #[error("Zero has no multiplicative inverse")]
    NotInvertible,

    /// Unknown preset name
    #[error("Unknown field preset '{0}'")]
    UnknownPreset(String),
}
