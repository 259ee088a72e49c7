// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::compute::ComputePool;
use crate::errors::ServerError;
use crate::eval_points::EvalPoints;
use crate::peer::ServerPeer;
use crate::pool::{CheckerPool, PooledChecker};
use crate::types::{
    AbortArgs, AcceptArgs, AcceptReply, EvalCircuitArgs, EvalPointArgs, FinalCircuitArgs,
    NewRequestArgs, RequestId,
};
use async_trait::async_trait;
use prio_circuit::Circuit;
use prio_config::AppConfig;
use prio_field::Field;
use prio_mpc::{Checker, CheckerPrecomp, CircuitDomain, CorShare, OutShare};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A checker holding a request, plus the evaluation point the request was
/// admitted under.
#[derive(Debug)]
struct Pending {
    checker: PooledChecker,
    precomp: Arc<CheckerPrecomp>,
}

/// Everything a server keeps for requests led by one particular server.
#[derive(Debug)]
struct LeaderSlot {
    pool: CheckerPool,
    pending: Mutex<HashMap<RequestId, Pending>>,
    eval_points: RwLock<EvalPoints>,
}

/// One server of a deployment.
///
/// Requests are tracked per leader: each leader has its own checker pool,
/// pending map and evaluation point.
#[derive(Debug)]
pub struct Server {
    index: usize,
    field: Arc<Field>,
    domain: Arc<CircuitDomain>,
    compute: ComputePool,
    slots: Vec<LeaderSlot>,
}

impl Server {
    pub fn new(
        index: usize,
        field: Arc<Field>,
        circuit: Arc<Circuit>,
        config: &AppConfig,
        compute: ComputePool,
    ) -> Result<Self, ServerError> {
        if index >= config.num_servers {
            return Err(ServerError::LeaderOutOfRange {
                leader: index,
                num_servers: config.num_servers,
            });
        }
        let domain = Arc::new(CircuitDomain::new(&field, &circuit)?);
        let slots = (0..config.num_servers)
            .map(|leader| {
                let checkers = (0..config.max_pending_reqs)
                    .map(|_| {
                        Checker::new(
                            field.clone(),
                            circuit.clone(),
                            index,
                            leader,
                            config.num_servers,
                        )
                    })
                    .collect();
                LeaderSlot {
                    pool: CheckerPool::new(leader, checkers),
                    pending: Mutex::new(HashMap::new()),
                    eval_points: RwLock::new(EvalPoints::default()),
                }
            })
            .collect();
        info!(
            server = index,
            num_servers = config.num_servers,
            interpolation_points = domain.n(),
            "Server ready"
        );
        Ok(Self {
            index,
            field,
            domain,
            compute,
            slots,
        })
    }

    fn slot(&self, leader: usize) -> Result<&LeaderSlot, ServerError> {
        self.slots.get(leader).ok_or(ServerError::LeaderOutOfRange {
            leader,
            num_servers: self.slots.len(),
        })
    }

    /// Checkers free to take a new request led by `leader`.
    pub fn available_checkers(&self, leader: usize) -> Result<usize, ServerError> {
        Ok(self.slot(leader)?.pool.available())
    }

    pub async fn pending_requests(&self, leader: usize) -> Result<usize, ServerError> {
        Ok(self.slot(leader)?.pending.lock().await.len())
    }

    async fn take(&self, leader: usize, request_id: RequestId) -> Result<Pending, ServerError> {
        self.slot(leader)?
            .pending
            .lock()
            .await
            .remove(&request_id)
            .ok_or(ServerError::UnknownRequest(request_id))
    }

    async fn put_back(
        &self,
        leader: usize,
        request_id: RequestId,
        pending: Pending,
    ) -> Result<(), ServerError> {
        self.slot(leader)?
            .pending
            .lock()
            .await
            .insert(request_id, pending);
        Ok(())
    }
}

#[async_trait]
impl ServerPeer for Server {
    fn index(&self) -> usize {
        self.index
    }

    async fn new_request(&self, args: NewRequestArgs) -> Result<(), ServerError> {
        let NewRequestArgs {
            request_id,
            leader,
            epoch,
            request,
        } = args;
        let slot = self.slot(leader)?;
        let Some(precomp) = slot.eval_points.read().await.get(epoch) else {
            return Err(ServerError::UnknownEpoch { leader, epoch });
        };
        if slot.pending.lock().await.contains_key(&request_id) {
            warn!(request_id, leader, server = self.index, "Refusing duplicate request");
            return Err(ServerError::DuplicateRequest(request_id));
        }

        let mut checker = slot.pool.acquire().await?;
        let (checker, result) = self
            .compute
            .spawn("set_req", move || {
                let result = checker.set_req(request);
                (checker, result)
            })
            .await?;
        if let Err(e) = result {
            debug!(request_id, leader, server = self.index, error = %e, "Dropping request");
            return Err(e.into());
        }

        let mut pending = slot.pending.lock().await;
        if pending.contains_key(&request_id) {
            warn!(request_id, leader, server = self.index, "Refusing duplicate request");
            return Err(ServerError::DuplicateRequest(request_id));
        }
        pending.insert(request_id, Pending { checker, precomp });
        Ok(())
    }

    async fn eval_circuit(&self, args: EvalCircuitArgs) -> Result<CorShare, ServerError> {
        let EvalCircuitArgs { request_id, leader } = args;
        let Pending {
            mut checker,
            precomp,
        } = self.take(leader, request_id).await?;
        let (checker, precomp, result) = self
            .compute
            .spawn("cor_share", move || {
                let result = checker.cor_share(&precomp);
                (checker, precomp, result)
            })
            .await?;
        let share = result?;
        self.put_back(leader, request_id, Pending { checker, precomp })
            .await?;
        Ok(share)
    }

    async fn final_circuit(&self, args: FinalCircuitArgs) -> Result<OutShare, ServerError> {
        let FinalCircuitArgs {
            request_id,
            leader,
            cor_shares,
            key,
        } = args;
        let Pending {
            mut checker,
            precomp,
        } = self.take(leader, request_id).await?;
        let (checker, result) = self
            .compute
            .spawn("out_share", move || {
                let result = checker
                    .cor(&cor_shares)
                    .and_then(|cor| checker.out_share(&cor, &key));
                (checker, result)
            })
            .await?;
        let share = result?;
        self.put_back(leader, request_id, Pending { checker, precomp })
            .await?;
        Ok(share)
    }

    async fn accept(&self, args: AcceptArgs) -> Result<AcceptReply, ServerError> {
        let Pending { checker, .. } = self.take(args.leader, args.request_id).await?;
        let accepted = checker.output_is_valid(&args.out_shares)?;
        let output_shares = if accepted {
            Some(checker.output_shares()?)
        } else {
            None
        };
        CheckerPool::release(checker);
        debug!(
            request_id = args.request_id,
            leader = args.leader,
            server = self.index,
            accepted,
            "Request finished"
        );
        Ok(AcceptReply {
            accepted,
            output_shares,
        })
    }

    async fn change_eval_point(&self, args: EvalPointArgs) -> Result<(), ServerError> {
        let EvalPointArgs { leader, epoch, x } = args;
        let slot = self.slot(leader)?;
        let field = self.field.clone();
        let domain = self.domain.clone();
        let precomp = self
            .compute
            .spawn("eval_point", move || CheckerPrecomp::new(&field, domain, x))
            .await?;

        slot.eval_points
            .write()
            .await
            .rotate(epoch, Arc::new(precomp))
            .map_err(|current| ServerError::StaleEpoch {
                leader,
                epoch,
                current,
            })?;
        debug!(leader, epoch, server = self.index, "Evaluation point rotated");
        Ok(())
    }

    async fn abort(&self, args: AbortArgs) -> Result<(), ServerError> {
        let removed = self
            .slot(args.leader)?
            .pending
            .lock()
            .await
            .remove(&args.request_id);
        if let Some(Pending { checker, .. }) = removed {
            CheckerPool::release(checker);
        }
        Ok(())
    }
}
