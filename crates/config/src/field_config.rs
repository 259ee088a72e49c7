// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest integer width a field may declare.
pub const MAX_INT_BITS: usize = 64;
/// Count-min sketches must have fewer hashes than this.
pub const MAX_HASHES: usize = 256;
/// Count-min sketches must have fewer buckets than this.
pub const MAX_BUCKETS: usize = 1024 * 128;

/// One collected value and its validity predicate.
///
/// In YAML:
///
/// ```yaml
/// fields:
///   - { name: age, type: int, intBits: 7 }
///   - { name: visits, type: countMin, countMinHashes: 4, countMinBuckets: 32 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[serde(deny_unknown_fields)]
pub enum FieldConfig {
    /// Integer in `[0, 2^intBits)`
    Int { name: String, int_bits: usize },
    /// Integer in `[0, 2^intBits)` together with its `intPow`-th power
    IntPow {
        name: String,
        int_bits: usize,
        int_pow: usize,
    },
    /// Integer with no range check
    IntUnsafe { name: String, int_bits: usize },
    BoolOr { name: String },
    BoolAnd { name: String },
    /// One set bit per row of a `countMinHashes x countMinBuckets` sketch
    CountMin {
        name: String,
        count_min_hashes: usize,
        count_min_buckets: usize,
    },
    /// A training example `(y, x_1, ..., x_n)`; entry `t` is the bit width of term `t`
    LinReg { name: String, lin_reg_bits: Vec<usize> },
}

impl FieldConfig {
    pub fn name(&self) -> &str {
        match self {
            FieldConfig::Int { name, .. }
            | FieldConfig::IntPow { name, .. }
            | FieldConfig::IntUnsafe { name, .. }
            | FieldConfig::BoolOr { name }
            | FieldConfig::BoolAnd { name }
            | FieldConfig::CountMin { name, .. }
            | FieldConfig::LinReg { name, .. } => name,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |message: String| ConfigError::InvalidField {
            name: self.name().to_string(),
            message,
        };
        let check_bits = |bits: usize| {
            if bits == 0 || bits > MAX_INT_BITS {
                Err(fail(format!(
                    "intBits must be in 1..={MAX_INT_BITS}, got {bits}"
                )))
            } else {
                Ok(())
            }
        };

        match self {
            FieldConfig::Int { int_bits, .. } | FieldConfig::IntUnsafe { int_bits, .. } => {
                check_bits(*int_bits)
            }
            FieldConfig::IntPow {
                int_bits, int_pow, ..
            } => {
                check_bits(*int_bits)?;
                if !matches!(int_pow, 2 | 4 | 8) {
                    return Err(fail(format!("intPow must be one of 2, 4, 8, got {int_pow}")));
                }
                Ok(())
            }
            FieldConfig::BoolOr { .. } | FieldConfig::BoolAnd { .. } => Ok(()),
            FieldConfig::CountMin {
                count_min_hashes,
                count_min_buckets,
                ..
            } => {
                if *count_min_hashes == 0 || *count_min_hashes >= MAX_HASHES {
                    return Err(fail(format!(
                        "countMinHashes must be in 1..{MAX_HASHES}, got {count_min_hashes}"
                    )));
                }
                if *count_min_buckets == 0 || *count_min_buckets >= MAX_BUCKETS {
                    return Err(fail(format!(
                        "countMinBuckets must be in 1..{MAX_BUCKETS}, got {count_min_buckets}"
                    )));
                }
                Ok(())
            }
            FieldConfig::LinReg { lin_reg_bits, .. } => {
                if lin_reg_bits.len() < 2 {
                    return Err(fail("linReg must have at least two terms".to_string()));
                }
                lin_reg_bits.iter().try_for_each(|b| check_bits(*b))
            }
        }
    }
}
