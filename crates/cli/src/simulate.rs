// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use num_bigint::BigUint;
use prio_config::AppConfig;
use prio_field::Field;
use prio_mpc::{build_request, build_request_from_inputs, ClientRequest, Schema};
use prio_server::{ComputePool, Coordinator, Server, ServerPeer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

struct Submission {
    id: u64,
    leader: usize,
    honest: bool,
    requests: Vec<ClientRequest>,
}

#[derive(Debug, Default)]
struct Tally {
    accepted: usize,
    rejected: usize,
    false_rejects: usize,
    false_accepts: usize,
    errors: usize,
}

pub async fn execute(config: AppConfig, requests: usize, invalid: usize) -> Result<()> {
    let field = Arc::new(Field::preset(config.field));
    let schema = Schema::from_fields(&field, &config.fields).context("Could not build schema")?;
    let circuit = schema.circuit().clone();
    if invalid > 0 && circuit.zero_checks().is_empty() {
        warn!("The schema has no validity checks, so corrupted submissions will be accepted");
    }

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let compute = ComputePool::new(threads, config.max_pending_reqs * config.num_servers)?;
    let peers = (0..config.num_servers)
        .map(|i| {
            Server::new(i, field.clone(), circuit.clone(), &config, compute.clone())
                .map(|s| Arc::new(s) as Arc<dyn ServerPeer>)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let coordinator = Coordinator::new(field.clone(), &circuit, peers, &config);

    let mut rng = StdRng::from_entropy();
    let mut submissions = Vec::with_capacity(requests + invalid);
    for id in 0..(requests + invalid) as u64 {
        let leader = id as usize % config.num_servers;
        let honest = (id as usize) < requests;
        let payload = if honest {
            let values = schema.random_values(&mut rng);
            build_request(&field, &schema, &values, config.num_servers, leader, &mut rng)?
        } else {
            let inputs: Vec<BigUint> = (0..circuit.num_inputs())
                .map(|_| field.random(&mut rng))
                .collect();
            build_request_from_inputs(&field, &circuit, &inputs, config.num_servers, leader, &mut rng)?
        };
        submissions.push(Submission {
            id,
            leader,
            honest,
            requests: payload,
        });
    }
    info!(count = submissions.len(), "Submitting");

    let outcomes = join_all(submissions.into_iter().map(|s| {
        let coordinator = &coordinator;
        async move {
            let verdict = coordinator.submit(s.id, s.leader, s.requests).await;
            (s.honest, verdict)
        }
    }))
    .await;

    let mut tally = Tally::default();
    let mut totals = vec![field.zero(); circuit.outputs().len()];
    for (honest, verdict) in outcomes {
        match verdict {
            Ok(v) if v.accepted => {
                tally.accepted += 1;
                if !honest {
                    tally.false_accepts += 1;
                }
                for shares in &v.output_shares {
                    for (total, share) in totals.iter_mut().zip(shares) {
                        *total = field.add(total, share);
                    }
                }
            }
            Ok(_) => {
                tally.rejected += 1;
                if honest {
                    tally.false_rejects += 1;
                }
            }
            Err(e) => {
                warn!(error = %e, "Submission failed");
                tally.errors += 1;
            }
        }
    }

    println!(
        "accepted: {}  rejected: {}  errors: {}",
        tally.accepted, tally.rejected, tally.errors
    );
    for (name, total) in circuit.output_names().iter().zip(&totals) {
        println!("  {name} = {total}");
    }

    if tally.false_rejects > 0 || tally.errors > 0 {
        bail!(
            "{} valid submissions were rejected and {} failed",
            tally.false_rejects,
            tally.errors
        );
    }
    if tally.false_accepts > 0 {
        warn!(count = tally.false_accepts, "Corrupted submissions were accepted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prio_config::FieldConfig;
    use prio_field::FieldPreset;

    #[tokio::test]
    async fn small_simulation_succeeds() -> Result<()> {
        let config = AppConfig {
            field: FieldPreset::P63,
            num_servers: 2,
            max_pending_reqs: 2,
            eval_point_rotation: 3,
            fields: vec![
                FieldConfig::Int {
                    name: "count".to_string(),
                    int_bits: 3,
                },
                FieldConfig::CountMin {
                    name: "sketch".to_string(),
                    count_min_hashes: 2,
                    count_min_buckets: 2,
                },
            ],
        };
        execute(config, 3, 2).await
    }
}
