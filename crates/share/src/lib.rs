// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Additive secret sharing with PRG-compressed shares.
//!
//! A client holding a [`GenPrg`] splits each value into one share per server.
//! Every server's share is the next element of a keyed pseudorandom stream, so
//! the client only ships the key. The designated leader additionally receives
//! the ordered log of corrections (deltas) that make the shares sum to the
//! value. A server rebuilds its shares with a [`ReplayPrg`], calling
//! [`ReplayPrg::get`] once per shared value, in the order the values were shared.

mod additive;
mod errors;
mod prg;

pub use additive::{reconstruct, share};
pub use errors::ShareError;
pub use prg::{GenPrg, PrgHints, ReplayPrg};
