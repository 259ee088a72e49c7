// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ServerError;
use crate::peer::ServerPeer;
use crate::types::{
    AbortArgs, AcceptArgs, EvalCircuitArgs, EvalPointArgs, FinalCircuitArgs, NewRequestArgs,
    RequestId,
};
use futures::future::join_all;
use num_bigint::BigUint;
use prio_circuit::Circuit;
use prio_config::AppConfig;
use prio_field::{Field, PrgKey};
use prio_mpc::{random_eval_point, CheckerError, ClientRequest};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, Semaphore};
use tracing::{debug, info, instrument, warn};

/// Result of one request across the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    /// Every server's shares of the output wires, in server order. Empty when
    /// rejected.
    pub output_shares: Vec<Vec<BigUint>>,
}

#[derive(Debug, Default)]
struct Rotation {
    epoch: Option<u64>,
    since_rotation: usize,
}

/// Drives requests through every server of a deployment.
///
/// Each round is broadcast to all peers and every reply is awaited before
/// the next round starts. A failure in any round aborts the request on every
/// server.
pub struct Coordinator {
    field: Arc<Field>,
    big_n: usize,
    peers: Vec<Arc<dyn ServerPeer>>,
    eval_point_rotation: usize,
    rotations: Vec<Mutex<Rotation>>,
    /// Held shared while a request is being admitted, exclusively to rotate.
    admission: Vec<RwLock<()>>,
    in_flight: Vec<Semaphore>,
}

async fn broadcast<'a, T, F, Fut>(
    peers: &'a [Arc<dyn ServerPeer>],
    call: F,
) -> Result<Vec<T>, ServerError>
where
    F: Fn(&'a Arc<dyn ServerPeer>) -> Fut,
    Fut: Future<Output = Result<T, ServerError>> + 'a,
{
    join_all(peers.iter().map(call))
        .await
        .into_iter()
        .collect()
}

impl Coordinator {
    /// At most `max_pending_reqs` requests per leader are in flight at once, so
    /// the servers' checker pools never run dry halfway through a broadcast.
    pub fn new(
        field: Arc<Field>,
        circuit: &Circuit,
        peers: Vec<Arc<dyn ServerPeer>>,
        config: &AppConfig,
    ) -> Self {
        let rotations = (0..peers.len()).map(|_| Mutex::default()).collect();
        let admission = (0..peers.len()).map(|_| RwLock::new(())).collect();
        let in_flight = (0..peers.len())
            .map(|_| Semaphore::new(config.max_pending_reqs))
            .collect();
        Self {
            field,
            big_n: (circuit.num_muls() + 1).next_power_of_two(),
            peers,
            eval_point_rotation: config.eval_point_rotation.max(1),
            rotations,
            admission,
            in_flight,
        }
    }

    pub fn num_servers(&self) -> usize {
        self.peers.len()
    }

    /// Epoch to check the next request led by `leader` under, rotating the
    /// evaluation point first when it is due.
    ///
    /// The returned guard pins the epoch: no rotation for `leader` starts
    /// until it is dropped.
    async fn epoch_for(
        &self,
        leader: usize,
    ) -> Result<(u64, RwLockReadGuard<'_, ()>), ServerError> {
        let mut rotation = self.rotations[leader].lock().await;
        let due = match rotation.epoch {
            None => true,
            Some(_) => rotation.since_rotation >= self.eval_point_rotation,
        };
        if due {
            let _exclusive = self.admission[leader].write().await;
            let epoch = rotation.epoch.map_or(0, |e| e + 1);
            let x = random_eval_point(&self.field, self.big_n, &mut rand::thread_rng());
            broadcast(&self.peers, |p| {
                p.change_eval_point(EvalPointArgs {
                    leader,
                    epoch,
                    x: x.clone(),
                })
            })
            .await?;
            info!(leader, epoch, "Rotated evaluation point");
            rotation.epoch = Some(epoch);
            rotation.since_rotation = 0;
        }
        rotation.since_rotation += 1;
        let epoch = rotation
            .epoch
            .ok_or(ServerError::UnknownEpoch { leader, epoch: 0 })?;
        let pinned = self.admission[leader].read().await;
        Ok((epoch, pinned))
    }

    /// Runs one request through every round and returns the joint verdict.
    ///
    /// `requests` holds one [`ClientRequest`] per server, in server order.
    #[instrument(skip(self, requests))]
    pub async fn submit(
        &self,
        request_id: RequestId,
        leader: usize,
        requests: Vec<ClientRequest>,
    ) -> Result<Verdict, ServerError> {
        if leader >= self.peers.len() {
            return Err(ServerError::LeaderOutOfRange {
                leader,
                num_servers: self.peers.len(),
            });
        }
        if requests.len() != self.peers.len() {
            return Err(CheckerError::WrongShareCount {
                expected: self.peers.len(),
                found: requests.len(),
            }
            .into());
        }

        let _permit = self.in_flight[leader]
            .acquire()
            .await
            .map_err(|_| ServerError::PoolClosed(leader))?;
        let epoch = self.admit(request_id, leader, requests).await?;
        let result = self.run(request_id, leader, epoch).await;
        if let Err(e) = &result {
            warn!(request_id, leader, error = %e, "Aborting request");
            self.abort_on(self.peers.iter(), request_id, leader).await;
        }
        result
    }

    async fn abort_on<'a>(
        &self,
        peers: impl Iterator<Item = &'a Arc<dyn ServerPeer>>,
        request_id: RequestId,
        leader: usize,
    ) {
        let peers: Vec<_> = peers.collect();
        let aborts = join_all(
            peers
                .iter()
                .map(|p| p.abort(AbortArgs { request_id, leader })),
        )
        .await;
        for (peer, abort) in peers.iter().zip(aborts) {
            if let Err(e) = abort {
                warn!(request_id, server = peer.index(), error = %e, "Abort failed");
            }
        }
    }

    /// Hands every server its share of the request. When any server refuses,
    /// the request is withdrawn from the servers that took it and left alone
    /// on the others, so a duplicate id never disturbs the request that owns it.
    async fn admit(
        &self,
        request_id: RequestId,
        leader: usize,
        requests: Vec<ClientRequest>,
    ) -> Result<u64, ServerError> {
        let (epoch, pinned) = self.epoch_for(leader).await?;
        let admitted = join_all(self.peers.iter().zip(requests).map(|(p, request)| {
            p.new_request(NewRequestArgs {
                request_id,
                leader,
                epoch,
                request,
            })
        }))
        .await;
        drop(pinned);

        let Some(error) = admitted.iter().find_map(|r| r.as_ref().err()).cloned() else {
            return Ok(epoch);
        };
        warn!(request_id, leader, error = %error, "Request not admitted");
        let took_it = self
            .peers
            .iter()
            .zip(&admitted)
            .filter(|(_, r)| r.is_ok())
            .map(|(p, _)| p);
        self.abort_on(took_it, request_id, leader).await;
        Err(error)
    }

    async fn run(
        &self,
        request_id: RequestId,
        leader: usize,
        epoch: u64,
    ) -> Result<Verdict, ServerError> {
        let cor_shares = broadcast(&self.peers, |p| {
            p.eval_circuit(EvalCircuitArgs { request_id, leader })
        })
        .await?;

        let key = PrgKey::random(&mut rand::thread_rng());
        let out_shares = broadcast(&self.peers, |p| {
            p.final_circuit(FinalCircuitArgs {
                request_id,
                leader,
                cor_shares: cor_shares.clone(),
                key,
            })
        })
        .await?;

        let replies = broadcast(&self.peers, |p| {
            p.accept(AcceptArgs {
                request_id,
                leader,
                out_shares: out_shares.clone(),
            })
        })
        .await?;

        let accepted = replies[0].accepted;
        if replies.iter().any(|r| r.accepted != accepted) {
            return Err(ServerError::Disagreement(request_id));
        }
        let output_shares = replies
            .into_iter()
            .filter_map(|r| r.output_shares)
            .collect();
        debug!(request_id, leader, epoch, accepted, "Request decided");
        Ok(Verdict {
            accepted,
            output_shares,
        })
    }
}
