// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Field '{name}': {message}")]
    InvalidField { name: String, message: String },

    #[error("Field name '{0}' is used more than once")]
    DuplicateField(String),

    #[error("Invalid setting '{setting}': {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },
}
