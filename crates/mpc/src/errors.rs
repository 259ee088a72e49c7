// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::checker::CheckerState;
use prio_circuit::CircuitError;
use prio_config::ConfigError;
use prio_polynomial::PolynomialError;
use prio_share::ShareError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckerError {
    /// The client payload cannot be processed. Drops this request only.
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// A checker operation was called out of order.
    #[error("Protocol sequence error: checker is {found}, operation needs {expected}")]
    ProtocolSequence {
        expected: CheckerState,
        found: CheckerState,
    },

    /// A broadcast round produced the wrong number of peer replies.
    #[error("Expected {expected} shares, got {found}")]
    WrongShareCount { expected: usize, found: usize },

    /// A precompute built for another circuit size.
    #[error("Precompute is for {found} interpolation points, circuit needs {expected}")]
    PrecompMismatch { expected: usize, found: usize },

    /// A client value that the schema cannot encode.
    #[error("Invalid value for field '{name}': {message}")]
    InvalidValue { name: String, message: String },

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Polynomial(#[from] PolynomialError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CheckerError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        CheckerError::MalformedRequest {
            message: message.into(),
        }
    }
}

/// Formats panic errors so they are seen in logs clearly
pub fn major_issue(msg: &str, e: impl Into<anyhow::Error>) -> String {
    error!("\n\n\nMAJOR ISSUE: {msg}.\n\nThe error supplied was: {:?}\n\n As a precaution we are crashing the system.\n\n\n", e.into());
    "System has crashed. Shares can no longer be trusted.".to_string()
}
