// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ServerError;
use crate::types::{
    AbortArgs, AcceptArgs, AcceptReply, EvalCircuitArgs, EvalPointArgs, FinalCircuitArgs,
    NewRequestArgs,
};
use async_trait::async_trait;
use prio_mpc::{CorShare, OutShare};

/// The calls a coordinator makes on every server, once per request and in
/// this order: `new_request`, `eval_circuit`, `final_circuit`, `accept`.
#[async_trait]
pub trait ServerPeer: Send + Sync + 'static {
    /// Position of this server in the deployment.
    fn index(&self) -> usize;

    async fn new_request(&self, args: NewRequestArgs) -> Result<(), ServerError>;

    async fn eval_circuit(&self, args: EvalCircuitArgs) -> Result<CorShare, ServerError>;

    async fn final_circuit(&self, args: FinalCircuitArgs) -> Result<OutShare, ServerError>;

    async fn accept(&self, args: AcceptArgs) -> Result<AcceptReply, ServerError>;

    async fn change_eval_point(&self, args: EvalPointArgs) -> Result<(), ServerError>;

    /// Drops a pending request and frees its checker.
    async fn abort(&self, args: AbortArgs) -> Result<(), ServerError>;
}
