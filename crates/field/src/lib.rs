// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Prio Field
//!
//! Arithmetic over a prime field `Z_p` that carries a multiplicative subgroup of
//! order `2^k`, plus the keyed pseudorandom streams every other component uses to
//! derive field elements.
//!
//! The [`Field`] is an immutable context value. It is built once and passed by
//! reference (or behind an `Arc`) to every component, so several field
//! configurations can coexist in one process.

mod errors;
mod field;
mod prg;

pub use errors::FieldError;
pub use field::{Field, FieldPreset};
pub use prg::{Prg, PrgKey};
