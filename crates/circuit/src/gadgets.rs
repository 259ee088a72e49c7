// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Standard validity predicates.
//!
//! Each gadget appends its gates to an existing [`Circuit`] and registers its
//! named outputs and assert-zero checks there. Gadgets that need extra witness
//! values (powers, pairwise products) take them as additional Input gates,
//! appended after the gadget's own bit inputs.

use crate::circuit::Circuit;
use crate::errors::CircuitError;
use crate::gate::GateId;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use prio_field::Field;

/// Largest bit width an integer gadget accepts.
pub const MAX_INT_BITS: usize = 64;

fn invalid(message: impl Into<String>) -> CircuitError {
    CircuitError::InvalidGadget {
        message: message.into(),
    }
}

/// An input with no validity condition.
pub fn unchecked_input(c: &mut Circuit, name: &str) -> Result<GateId, CircuitError> {
    let input = c.input();
    c.add_output(input, name)?;
    Ok(input)
}

// x * (x - 1) == 0, without registering an output
fn bit_check(c: &mut Circuit, field: &Field) -> Result<GateId, CircuitError> {
    let input = c.input();
    let minus_one = c.add_const(input, field.from_i64(-1))?;
    let check = c.mul(input, minus_one)?;
    c.assert_zero(check)?;
    Ok(input)
}

/// An input that must be 0 or 1.
pub fn one_bit(c: &mut Circuit, field: &Field, name: &str) -> Result<GateId, CircuitError> {
    let input = bit_check(c, field)?;
    c.add_output(input, name)?;
    Ok(input)
}

/// `bits` inputs that must each be 0 or 1. The output, returned as well, is
/// `sum 2^i * x_i` with `x_0` the least significant bit.
pub fn n_bits(
    c: &mut Circuit,
    field: &Field,
    bits: usize,
    name: &str,
) -> Result<GateId, CircuitError> {
    if bits == 0 || bits > MAX_INT_BITS {
        return Err(invalid(format!(
            "{name}: bit width {bits} outside 1..={MAX_INT_BITS}"
        )));
    }
    let inputs = (0..bits)
        .map(|_| bit_check(c, field))
        .collect::<Result<Vec<_>, _>>()?;
    let scaled = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| c.mul_const(*input, BigUint::one() << i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sum = c.add_const(scaled[0], BigUint::zero())?;
    for term in &scaled[1..] {
        sum = c.add(*term, sum)?;
    }
    c.add_output(sum, name)?;
    Ok(sum)
}

pub fn mul_by_neg_one(c: &mut Circuit, field: &Field, parent: GateId) -> Result<GateId, CircuitError> {
    c.mul_const(parent, field.from_i64(-1))
}

/// Asserts `left * right == prod`. Returns the assert-zero gate.
pub fn check_mul(
    c: &mut Circuit,
    field: &Field,
    left: GateId,
    right: GateId,
    prod: GateId,
) -> Result<GateId, CircuitError> {
    let mul = c.mul(left, right)?;
    let negated = mul_by_neg_one(c, field, mul)?;
    let diff = c.add(negated, prod)?;
    c.assert_zero(diff)?;
    Ok(diff)
}

/// Number of squarings that take `x` to `x^pow`.
pub fn log_pow(pow: usize) -> Result<usize, CircuitError> {
    match pow {
        2 => Ok(1),
        4 => Ok(2),
        8 => Ok(3),
        _ => Err(invalid(format!("power {pow} not in {{2, 4, 8}}"))),
    }
}

/// A bounded integer `x` plus the witnesses `x^2, x^4, ...` up to `x^pow`,
/// each checked against the square of the previous one.
pub fn int_pow(
    c: &mut Circuit,
    field: &Field,
    bits: usize,
    pow: usize,
    name: &str,
) -> Result<GateId, CircuitError> {
    let steps = log_pow(pow)?;
    let value = n_bits(c, field, bits, name)?;
    let powers = (0..steps)
        .map(|_| unchecked_input(c, &format!("{name}-pow")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut base = value;
    for power in powers {
        check_mul(c, field, base, base, power)?;
        base = power;
    }
    Ok(value)
}

/// A `hashes x buckets` count-min sketch contribution: every cell is a bit and
/// every row holds exactly one set bit.
pub fn count_min(
    c: &mut Circuit,
    field: &Field,
    hashes: usize,
    buckets: usize,
    name: &str,
) -> Result<(), CircuitError> {
    if hashes == 0 || buckets == 0 {
        return Err(invalid(format!(
            "{name}: count-min needs at least one hash and one bucket"
        )));
    }
    let cells = (0..hashes * buckets)
        .map(|i| one_bit(c, field, &format!("{name}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    for row in cells.chunks(buckets) {
        let mut sum = c.add_const(row[0], field.from_i64(-1))?;
        for cell in &row[1..] {
            sum = c.add(*cell, sum)?;
        }
        c.assert_zero(sum)?;
    }
    Ok(())
}

/// Terms `x_t` of the given bit widths, plus the witnesses `x_i * x_j` for
/// every `i >= j`, each checked with [`check_mul`].
pub fn lin_reg(
    c: &mut Circuit,
    field: &Field,
    bits: &[usize],
    name: &str,
) -> Result<(), CircuitError> {
    if bits.len() < 2 {
        return Err(invalid(format!("{name}: linear regression needs two terms")));
    }
    let terms = bits
        .iter()
        .enumerate()
        .map(|(t, b)| n_bits(c, field, *b, &format!("{name}-bits[{t}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut products = Vec::new();
    for i in 0..terms.len() {
        for j in 0..=i {
            let prod = unchecked_input(c, &format!("{name}-prod[{i}*{j}]"))?;
            products.push((i, j, prod));
        }
    }
    for (i, j, prod) in products {
        check_mul(c, field, terms[i], terms[j], prod)?;
    }
    Ok(())
}
