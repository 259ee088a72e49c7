// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use num_bigint::BigUint;
use prio_config::{AppConfig, FieldConfig};
use prio_field::{Field, FieldPreset};
use prio_mpc::{build_request, build_request_from_inputs, CorShare, FieldValue, OutShare, Schema};
use prio_server::{
    AbortArgs, AcceptArgs, AcceptReply, ComputePool, Coordinator, EvalCircuitArgs, EvalPointArgs,
    FinalCircuitArgs, NewRequestArgs, RequestId, Server, ServerError, ServerPeer,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

struct Deployment {
    field: Arc<Field>,
    schema: Schema,
    servers: Vec<Arc<Server>>,
    config: AppConfig,
    rng: ChaCha20Rng,
}

impl Deployment {
    fn new(config: AppConfig, seed: u64) -> Result<Self> {
        let field = Arc::new(Field::preset(config.field));
        let schema = Schema::from_fields(&field, &config.fields)?;
        let compute = ComputePool::new(2, 16)?;
        let servers = (0..config.num_servers)
            .map(|i| {
                Server::new(
                    i,
                    field.clone(),
                    schema.circuit().clone(),
                    &config,
                    compute.clone(),
                )
                .map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            field,
            schema,
            servers,
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }

    fn peers(&self) -> Vec<Arc<dyn ServerPeer>> {
        self.servers
            .iter()
            .map(|s| s.clone() as Arc<dyn ServerPeer>)
            .collect()
    }

    fn coordinator(&self) -> Coordinator {
        self.coordinator_with(self.peers())
    }

    fn coordinator_with(&self, peers: Vec<Arc<dyn ServerPeer>>) -> Coordinator {
        Coordinator::new(self.field.clone(), self.schema.circuit(), peers, &self.config)
    }

    fn honest(&mut self, values: &[FieldValue], leader: usize) -> Result<Vec<prio_mpc::ClientRequest>> {
        Ok(build_request(
            &self.field,
            &self.schema,
            values,
            self.config.num_servers,
            leader,
            &mut self.rng,
        )?)
    }

    async fn assert_idle(&self) -> Result<()> {
        for server in &self.servers {
            for leader in 0..self.config.num_servers {
                assert_eq!(server.pending_requests(leader).await?, 0);
                assert_eq!(
                    server.available_checkers(leader)?,
                    self.config.max_pending_reqs
                );
            }
        }
        Ok(())
    }
}

fn small_config() -> AppConfig {
    AppConfig {
        field: FieldPreset::P87,
        num_servers: 3,
        max_pending_reqs: 2,
        eval_point_rotation: 3,
        fields: vec![
            FieldConfig::Int {
                name: "age".to_string(),
                int_bits: 7,
            },
            FieldConfig::BoolOr {
                name: "opt_in".to_string(),
            },
        ],
    }
}

#[tokio::test]
async fn valid_submissions_are_accepted_and_aggregate() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 1)?;
    let coordinator = dep.coordinator();

    for id in 0..6u64 {
        let age = 20 + id * 7;
        let leader = (id as usize) % dep.config.num_servers;
        let requests = dep.honest(&[FieldValue::Int(age), FieldValue::Bool(id % 2 == 0)], leader)?;
        let verdict = coordinator.submit(id, leader, requests).await?;
        assert!(verdict.accepted);
        assert_eq!(verdict.output_shares.len(), dep.config.num_servers);

        let age_share = dep
            .field
            .sum(verdict.output_shares.iter().map(|shares| &shares[0]));
        assert_eq!(age_share, BigUint::from(age));
    }
    dep.assert_idle().await
}

#[tokio::test]
async fn invalid_submission_is_rejected() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 2)?;
    let coordinator = dep.coordinator();

    // 7 age bits followed by the flag, with the third bit set to 3
    let inputs: Vec<BigUint> = [1u32, 0, 3, 0, 0, 0, 0, 1]
        .into_iter()
        .map(BigUint::from)
        .collect();
    let requests =
        build_request_from_inputs(&dep.field, dep.schema.circuit(), &inputs, 3, 1, &mut dep.rng)?;
    let verdict = coordinator.submit(10, 1, requests).await?;
    assert!(!verdict.accepted);
    assert!(verdict.output_shares.is_empty());
    dep.assert_idle().await
}

#[tokio::test]
async fn concurrent_submissions_share_the_pools() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 3)?;
    let coordinator = dep.coordinator();

    let mut batches = Vec::new();
    for id in 0..8u64 {
        batches.push((id, dep.honest(&[FieldValue::Int(id), FieldValue::Bool(true)], 0)?));
    }
    let verdicts = futures::future::join_all(
        batches
            .into_iter()
            .map(|(id, requests)| coordinator.submit(id, 0, requests)),
    )
    .await;
    for verdict in verdicts {
        assert!(verdict?.accepted);
    }
    dep.assert_idle().await
}

#[tokio::test]
async fn duplicate_request_ids_are_refused() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 4)?;
    let requests = dep.honest(&[FieldValue::Int(3), FieldValue::Bool(false)], 2)?;
    let server = dep.servers[0].clone();
    server
        .change_eval_point(EvalPointArgs {
            leader: 2,
            epoch: 0,
            x: BigUint::from(99u32),
        })
        .await?;

    let args = NewRequestArgs {
        request_id: 77,
        leader: 2,
        epoch: 0,
        request: requests[0].clone(),
    };
    server.new_request(args.clone()).await?;
    assert_eq!(
        server.new_request(args).await,
        Err(ServerError::DuplicateRequest(77))
    );
    assert_eq!(server.pending_requests(2).await?, 1);
    assert_eq!(server.available_checkers(2)?, 1);

    server
        .abort(AbortArgs {
            request_id: 77,
            leader: 2,
        })
        .await?;
    dep.assert_idle().await
}

#[tokio::test]
async fn a_duplicate_submission_leaves_the_first_one_alone() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 8)?;
    let coordinator = dep.coordinator();

    let first = dep.honest(&[FieldValue::Int(30), FieldValue::Bool(true)], 0)?;
    assert!(coordinator.submit(1, 0, first).await?.accepted);

    // request 9 is already pending on server 0 under the current epoch
    let held = dep.honest(&[FieldValue::Int(4), FieldValue::Bool(true)], 0)?;
    dep.servers[0]
        .new_request(NewRequestArgs {
            request_id: 9,
            leader: 0,
            epoch: 0,
            request: held[0].clone(),
        })
        .await?;

    let second = dep.honest(&[FieldValue::Int(5), FieldValue::Bool(false)], 0)?;
    let result = coordinator.submit(9, 0, second).await;
    assert_eq!(result, Err(ServerError::DuplicateRequest(9)));
    assert_eq!(dep.servers[0].pending_requests(0).await?, 1);
    assert_eq!(dep.servers[1].pending_requests(0).await?, 0);
    assert_eq!(dep.servers[2].pending_requests(0).await?, 0);

    dep.servers[0]
        .abort(AbortArgs {
            request_id: 9,
            leader: 0,
        })
        .await?;
    dep.assert_idle().await
}

#[tokio::test]
async fn evaluation_points_must_be_known_and_fresh() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 5)?;
    let requests = dep.honest(&[FieldValue::Int(1), FieldValue::Bool(true)], 0)?;
    let server = dep.servers[1].clone();

    let err = server
        .new_request(NewRequestArgs {
            request_id: 1,
            leader: 0,
            epoch: 3,
            request: requests[1].clone(),
        })
        .await;
    assert_eq!(err, Err(ServerError::UnknownEpoch { leader: 0, epoch: 3 }));

    let point = |epoch| EvalPointArgs {
        leader: 0,
        epoch,
        x: BigUint::from(12345u32),
    };
    server.change_eval_point(point(4)).await?;
    assert_eq!(
        server.change_eval_point(point(4)).await,
        Err(ServerError::StaleEpoch {
            leader: 0,
            epoch: 4,
            current: 4
        })
    );
    dep.assert_idle().await
}

#[tokio::test]
async fn malformed_requests_are_dropped() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 6)?;
    let mut requests = dep.honest(&[FieldValue::Int(5), FieldValue::Bool(true)], 0)?;
    requests[0].hints.delta.truncate(1);

    let coordinator = dep.coordinator();
    let result = coordinator.submit(3, 0, requests).await;
    assert!(matches!(result, Err(ServerError::Checker(_))));
    dep.assert_idle().await
}

/// Delegates to a real server but fails the first broadcast round.
struct FailingPeer {
    inner: Arc<Server>,
}

#[async_trait]
impl ServerPeer for FailingPeer {
    fn index(&self) -> usize {
        self.inner.index()
    }

    async fn new_request(&self, args: NewRequestArgs) -> Result<(), ServerError> {
        self.inner.new_request(args).await
    }

    async fn eval_circuit(&self, args: EvalCircuitArgs) -> Result<CorShare, ServerError> {
        Err(ServerError::UnknownRequest(args.request_id))
    }

    async fn final_circuit(&self, args: FinalCircuitArgs) -> Result<OutShare, ServerError> {
        self.inner.final_circuit(args).await
    }

    async fn accept(&self, args: AcceptArgs) -> Result<AcceptReply, ServerError> {
        self.inner.accept(args).await
    }

    async fn change_eval_point(&self, args: EvalPointArgs) -> Result<(), ServerError> {
        self.inner.change_eval_point(args).await
    }

    async fn abort(&self, args: AbortArgs) -> Result<(), ServerError> {
        self.inner.abort(args).await
    }
}

/// Delegates to a real server, delaying admission of one request.
struct SlowLink {
    inner: Arc<Server>,
    slow_request: RequestId,
    delay: Duration,
}

#[async_trait]
impl ServerPeer for SlowLink {
    fn index(&self) -> usize {
        self.inner.index()
    }

    async fn new_request(&self, args: NewRequestArgs) -> Result<(), ServerError> {
        if args.request_id == self.slow_request {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.new_request(args).await
    }

    async fn eval_circuit(&self, args: EvalCircuitArgs) -> Result<CorShare, ServerError> {
        self.inner.eval_circuit(args).await
    }

    async fn final_circuit(&self, args: FinalCircuitArgs) -> Result<OutShare, ServerError> {
        self.inner.final_circuit(args).await
    }

    async fn accept(&self, args: AcceptArgs) -> Result<AcceptReply, ServerError> {
        self.inner.accept(args).await
    }

    async fn change_eval_point(&self, args: EvalPointArgs) -> Result<(), ServerError> {
        self.inner.change_eval_point(args).await
    }

    async fn abort(&self, args: AbortArgs) -> Result<(), ServerError> {
        self.inner.abort(args).await
    }
}

#[tokio::test]
async fn rotation_waits_for_slow_admissions() -> Result<()> {
    let _guard = init_tracing();
    let config = AppConfig {
        num_servers: 2,
        max_pending_reqs: 4,
        eval_point_rotation: 1,
        ..small_config()
    };
    let mut dep = Deployment::new(config, 9)?;
    let peers: Vec<Arc<dyn ServerPeer>> = dep
        .servers
        .iter()
        .map(|s| {
            Arc::new(SlowLink {
                inner: s.clone(),
                slow_request: 0,
                delay: Duration::from_millis(300),
            }) as Arc<dyn ServerPeer>
        })
        .collect();
    let coordinator = dep.coordinator_with(peers);

    let mut batches = Vec::new();
    for id in 0..3u64 {
        batches.push((id, dep.honest(&[FieldValue::Int(id + 1), FieldValue::Bool(true)], 0)?));
    }
    let verdicts = futures::future::join_all(
        batches
            .into_iter()
            .map(|(id, requests)| coordinator.submit(id, 0, requests)),
    )
    .await;
    for verdict in verdicts {
        assert!(verdict?.accepted);
    }
    dep.assert_idle().await
}

#[tokio::test]
async fn a_failing_peer_aborts_the_request_everywhere() -> Result<()> {
    let _guard = init_tracing();
    let mut dep = Deployment::new(small_config(), 7)?;
    let mut peers = dep.peers();
    peers[2] = Arc::new(FailingPeer {
        inner: dep.servers[2].clone(),
    });
    let coordinator = dep.coordinator_with(peers);

    let requests = dep.honest(&[FieldValue::Int(9), FieldValue::Bool(false)], 1)?;
    let result = coordinator.submit(5, 1, requests).await;
    assert_eq!(result, Err(ServerError::UnknownRequest(5)));
    dep.assert_idle().await
}
