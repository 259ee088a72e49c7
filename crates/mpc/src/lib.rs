// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Distributed validity check
//!
//! A client encodes its values with a [`Schema`], evaluates the schema's
//! circuit and sends each server a [`ClientRequest`]. Every server runs a
//! [`Checker`] through two broadcast rounds:
//!
//! 1. [`Checker::set_req`] then [`Checker::cor_share`]; the [`CorShare`]s are
//!    broadcast and summed with [`Checker::cor`].
//! 2. [`Checker::out_share`]; the [`OutShare`]s are broadcast and
//!    [`Checker::output_is_valid`] accepts iff they sum to zero.
//!
//! No server learns anything about the client's values beyond validity.

mod checker;
mod client;
mod errors;
mod precomp;
mod schema;

pub use checker::{Checker, CheckerState, Cor, CorShare, OutShare};
pub use client::{build_request, build_request_from_inputs, num_shared_values, ClientRequest};
pub use errors::{major_issue, CheckerError};
pub use precomp::{random_eval_point, CheckerPrecomp, CircuitDomain};
pub use schema::{FieldValue, Schema};
