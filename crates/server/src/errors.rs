// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::types::RequestId;
use prio_mpc::CheckerError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Request {0} is not pending")]
    UnknownRequest(RequestId),

    #[error("Request {0} is already pending")]
    DuplicateRequest(RequestId),

    #[error("Leader {leader} is out of range for {num_servers} servers")]
    LeaderOutOfRange { leader: usize, num_servers: usize },

    #[error("Leader {leader} has no evaluation point for epoch {epoch}")]
    UnknownEpoch { leader: usize, epoch: u64 },

    #[error("Epoch {epoch} is not newer than the current epoch {current} for leader {leader}")]
    StaleEpoch {
        leader: usize,
        epoch: u64,
        current: u64,
    },

    #[error("Servers disagree on the verdict for request {0}")]
    Disagreement(RequestId),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error("Checker pool for leader {0} is closed")]
    PoolClosed(usize),

    #[error("Compute task '{0}' did not complete")]
    Compute(String),

    #[error("Could not build compute pool: {0}")]
    ThreadPool(String),
}
