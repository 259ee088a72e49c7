// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("At least one server is required")]
    NoServers,

    #[error("Server index {index} is out of range for {num_servers} servers")]
    ServerOutOfRange { index: usize, num_servers: usize },

    #[error("Server {server} is not the leader but received {count} deltas")]
    UnexpectedDeltas { server: usize, count: usize },

    #[error("Delta {index} is not a canonical field element")]
    NonCanonicalDelta { index: usize },

    #[error("Replay stream exhausted after {position} values")]
    Exhausted { position: usize },

    #[error("Replay stream consumed {found} values, expected {expected}")]
    PositionMismatch { expected: usize, found: usize },
}
