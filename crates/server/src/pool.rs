// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ServerError;
use prio_mpc::Checker;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::error;

/// A fixed set of reusable [`Checker`]s for one leader.
///
/// [`CheckerPool::acquire`] waits while every checker is in use, which bounds
/// the number of in-flight requests per leader.
#[derive(Debug, Clone)]
pub struct CheckerPool {
    leader: usize,
    semaphore: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Checker>>>,
}

impl CheckerPool {
    pub fn new(leader: usize, checkers: Vec<Checker>) -> Self {
        Self {
            leader,
            semaphore: Arc::new(Semaphore::new(checkers.len())),
            idle: Arc::new(Mutex::new(checkers)),
        }
    }

    /// Number of checkers not currently serving a request.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn acquire(&self) -> Result<PooledChecker, ServerError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::PoolClosed(self.leader))?;
        let checker = self
            .idle
            .lock()
            .map_err(|_| ServerError::PoolClosed(self.leader))?
            .pop()
            .ok_or(ServerError::PoolClosed(self.leader))?;
        Ok(PooledChecker {
            checker: Some(checker),
            idle: self.idle.clone(),
            _permit: permit,
        })
    }

    /// Returns a checker to the pool. Dropping a [`PooledChecker`] does the same.
    pub fn release(checker: PooledChecker) {
        drop(checker);
    }
}

/// A checker on loan from a [`CheckerPool`]. It is reset and handed back when
/// dropped, whatever state the request ended in.
#[derive(Debug)]
pub struct PooledChecker {
    checker: Option<Checker>,
    idle: Arc<Mutex<Vec<Checker>>>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledChecker {
    type Target = Checker;

    fn deref(&self) -> &Checker {
        match &self.checker {
            Some(c) => c,
            None => unreachable!("checker taken before drop"),
        }
    }
}

impl DerefMut for PooledChecker {
    fn deref_mut(&mut self) -> &mut Checker {
        match &mut self.checker {
            Some(c) => c,
            None => unreachable!("checker taken before drop"),
        }
    }
}

impl Drop for PooledChecker {
    fn drop(&mut self) {
        let Some(mut checker) = self.checker.take() else {
            return;
        };
        checker.reset();
        match self.idle.lock() {
            Ok(mut idle) => idle.push(checker),
            Err(_) => error!("Checker pool lock poisoned, dropping checker"),
        }
    }
}
