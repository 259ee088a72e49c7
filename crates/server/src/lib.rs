// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Prio servers
//!
//! A [`Server`] holds one pool of checkers per possible leader and answers the
//! [`ServerPeer`] calls. The [`Coordinator`] broadcasts each round to every
//! peer, waits for all replies, and rotates the shared evaluation point.

mod compute;
mod coordinator;
mod errors;
mod eval_points;
mod peer;
mod pool;
mod server;
mod types;

pub use compute::ComputePool;
pub use coordinator::{Coordinator, Verdict};
pub use errors::ServerError;
pub use eval_points::EvalPoints;
pub use peer::ServerPeer;
pub use pool::{CheckerPool, PooledChecker};
pub use server::Server;
pub use types::*;
