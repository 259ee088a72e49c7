// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Collection schema: turns a list of [`FieldConfig`]s into one validity
//! circuit, and client values into that circuit's inputs.

use crate::errors::CheckerError;
use num_bigint::BigUint;
use prio_circuit::{gadgets, Circuit};
use prio_config::FieldConfig;
use prio_field::Field;
use rand::Rng;
use std::sync::Arc;

/// A client's value for one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// `int`, `intPow` and `intUnsafe` fields
    Int(u64),
    /// `boolOr` and `boolAnd` fields
    Bool(bool),
    /// `countMin` fields, row-major
    Sketch(Vec<bool>),
    /// `linReg` fields, one value per term
    Vector(Vec<u64>),
}

#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldConfig>,
    circuit: Arc<Circuit>,
}

impl Schema {
    /// Builds one gadget per field and conjoins them in field order.
    pub fn from_fields(field: &Field, fields: &[FieldConfig]) -> Result<Self, CheckerError> {
        let circuits = fields
            .iter()
            .map(|f| field_circuit(field, f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            fields: fields.to_vec(),
            circuit: Arc::new(Circuit::and_all(circuits)),
        })
    }

    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    /// Circuit inputs for `values`, in Input-gate order.
    pub fn encode(&self, field: &Field, values: &[FieldValue]) -> Result<Vec<BigUint>, CheckerError> {
        if values.len() != self.fields.len() {
            return Err(CheckerError::malformed(format!(
                "schema has {} fields, got {} values",
                self.fields.len(),
                values.len()
            )));
        }
        let mut out = Vec::with_capacity(self.circuit.num_inputs());
        for (config, value) in self.fields.iter().zip(values) {
            encode_field(field, config, value, &mut out)?;
        }
        Ok(out)
    }

    /// A valid random value for every field.
    pub fn random_values<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<FieldValue> {
        self.fields.iter().map(|f| random_value(f, rng)).collect()
    }
}

fn field_circuit(field: &Field, config: &FieldConfig) -> Result<Circuit, CheckerError> {
    config.validate()?;
    let mut c = Circuit::new();
    match config {
        FieldConfig::Int { name, int_bits } => {
            gadgets::n_bits(&mut c, field, *int_bits, name)?;
        }
        FieldConfig::IntPow {
            name,
            int_bits,
            int_pow,
        } => {
            gadgets::int_pow(&mut c, field, *int_bits, *int_pow, name)?;
        }
        FieldConfig::IntUnsafe { name, .. }
        | FieldConfig::BoolOr { name }
        | FieldConfig::BoolAnd { name } => {
            gadgets::unchecked_input(&mut c, name)?;
        }
        FieldConfig::CountMin {
            name,
            count_min_hashes,
            count_min_buckets,
        } => {
            gadgets::count_min(&mut c, field, *count_min_hashes, *count_min_buckets, name)?;
        }
        FieldConfig::LinReg { name, lin_reg_bits } => {
            gadgets::lin_reg(&mut c, field, lin_reg_bits, name)?;
        }
    }
    Ok(c)
}

fn bits_of(value: u64, bits: usize) -> impl Iterator<Item = BigUint> {
    (0..bits).map(move |i| BigUint::from((value >> i) & 1))
}

fn fits(value: u64, bits: usize) -> bool {
    bits >= 64 || value >> bits == 0
}

fn encode_field(
    field: &Field,
    config: &FieldConfig,
    value: &FieldValue,
    out: &mut Vec<BigUint>,
) -> Result<(), CheckerError> {
    let invalid = |message: String| CheckerError::InvalidValue {
        name: config.name().to_string(),
        message,
    };
    let check_fits = |v: u64, bits: usize| {
        if fits(v, bits) {
            Ok(())
        } else {
            Err(invalid(format!("{v} does not fit in {bits} bits")))
        }
    };

    match (config, value) {
        (FieldConfig::Int { int_bits, .. }, FieldValue::Int(v)) => {
            check_fits(*v, *int_bits)?;
            out.extend(bits_of(*v, *int_bits));
        }
        (
            FieldConfig::IntPow {
                int_bits, int_pow, ..
            },
            FieldValue::Int(v),
        ) => {
            check_fits(*v, *int_bits)?;
            out.extend(bits_of(*v, *int_bits));
            let steps = gadgets::log_pow(*int_pow)?;
            let mut power = field.from_u64(*v);
            for _ in 0..steps {
                power = field.mul(&power, &power);
                out.push(power.clone());
            }
        }
        (FieldConfig::IntUnsafe { int_bits, .. }, FieldValue::Int(v)) => {
            check_fits(*v, *int_bits)?;
            out.push(field.from_u64(*v));
        }
        (FieldConfig::BoolOr { .. } | FieldConfig::BoolAnd { .. }, FieldValue::Bool(b)) => {
            out.push(BigUint::from(u8::from(*b)));
        }
        (
            FieldConfig::CountMin {
                count_min_hashes,
                count_min_buckets,
                ..
            },
            FieldValue::Sketch(cells),
        ) => {
            let total = count_min_hashes * count_min_buckets;
            if cells.len() != total {
                return Err(invalid(format!(
                    "sketch has {} cells, expected {total}",
                    cells.len()
                )));
            }
            out.extend(cells.iter().map(|c| BigUint::from(u8::from(*c))));
        }
        (FieldConfig::LinReg { lin_reg_bits, .. }, FieldValue::Vector(terms)) => {
            if terms.len() != lin_reg_bits.len() {
                return Err(invalid(format!(
                    "expected {} terms, got {}",
                    lin_reg_bits.len(),
                    terms.len()
                )));
            }
            for (v, bits) in terms.iter().zip(lin_reg_bits) {
                check_fits(*v, *bits)?;
                out.extend(bits_of(*v, *bits));
            }
            for i in 0..terms.len() {
                for j in 0..=i {
                    out.push(field.mul(&field.from_u64(terms[i]), &field.from_u64(terms[j])));
                }
            }
        }
        (_, other) => {
            return Err(invalid(format!("value {other:?} has the wrong kind")));
        }
    }
    Ok(())
}

fn random_below_bits<R: Rng + ?Sized>(bits: usize, rng: &mut R) -> u64 {
    let v: u64 = rng.gen();
    if bits >= 64 {
        v
    } else {
        v & ((1u64 << bits) - 1)
    }
}

fn random_value<R: Rng + ?Sized>(config: &FieldConfig, rng: &mut R) -> FieldValue {
    match config {
        FieldConfig::Int { int_bits, .. }
        | FieldConfig::IntPow { int_bits, .. }
        | FieldConfig::IntUnsafe { int_bits, .. } => {
            FieldValue::Int(random_below_bits(*int_bits, rng))
        }
        FieldConfig::BoolOr { .. } | FieldConfig::BoolAnd { .. } => FieldValue::Bool(rng.gen()),
        FieldConfig::CountMin {
            count_min_hashes,
            count_min_buckets,
            ..
        } => {
            let mut cells = vec![false; count_min_hashes * count_min_buckets];
            for row in 0..*count_min_hashes {
                let bucket = rng.gen_range(0..*count_min_buckets);
                cells[row * count_min_buckets + bucket] = true;
            }
            FieldValue::Sketch(cells)
        }
        FieldConfig::LinReg { lin_reg_bits, .. } => FieldValue::Vector(
            lin_reg_bits
                .iter()
                .map(|b| random_below_bits(*b, rng))
                .collect(),
        ),
    }
}
