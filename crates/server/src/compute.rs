// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ServerError;
use rayon::ThreadPool;
use std::fmt::Debug;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::sleep};
use tracing::{error, warn};

/// Runs checker arithmetic on a rayon pool so it never blocks the async
/// runtime. At most `max_tasks` jobs are queued at once.
///
/// There is no panic handler: a panicking job aborts the process, which is how
/// a desynchronized checker takes the server down.
#[derive(Debug, Clone)]
pub struct ComputePool {
    semaphore: Arc<Semaphore>,
    thread_pool: Arc<ThreadPool>,
}

impl ComputePool {
    pub fn new(threads: usize, max_tasks: usize) -> Result<ComputePool, ServerError> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ServerError::ThreadPool(e.to_string()))?;

        Ok(Self {
            thread_pool: Arc::new(thread_pool),
            semaphore: Arc::new(Semaphore::new(max_tasks)),
        })
    }

    pub async fn spawn<OP, T: Debug + Send + 'static>(
        &self,
        task_name: &str,
        op: OP,
    ) -> Result<T, ServerError>
    where
        OP: FnOnce() -> T + Send + 'static,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ServerError::Compute(task_name.to_owned()))?;

        // Warn of long running jobs
        let name = task_name.to_owned();
        let warning_handle = tokio::spawn(async move {
            sleep(Duration::from_secs(10)).await;
            warn!("Job '{}' has been running for more than 10 seconds", name);
            sleep(Duration::from_secs(30)).await;
            error!("Job '{}' has been running for more than 30 seconds", name);
        });

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.thread_pool.spawn(|| {
            let t = op();
            if let Err(res) = tx.send(t) {
                error!(
                    "There was an error sending the result from the compute pool: result = {:?}",
                    res
                );
            }
        });

        let output = rx.await;
        warning_handle.abort();
        output.map_err(|_| ServerError::Compute(task_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_jobs_off_the_runtime() {
        let pool = ComputePool::new(2, 4).unwrap();
        let jobs = (0..8u64).map(|i| pool.spawn("square", move || i * i));
        let results = futures::future::join_all(jobs).await;
        let squares: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(squares, vec![0, 1, 4, 9, 16, 25, 36, 49]);
    }
}
