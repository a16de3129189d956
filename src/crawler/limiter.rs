//! Concurrency limiter for city page fetches
//!
//! A counting gate over a tokio semaphore. Its size also fixes the batch
//! size, so a batch never holds more fetches than there are permits (or
//! pages in the pool).

use crate::WalkerError;
use std::future::Future;
use std::slice::Chunks;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Admits at most `limit` fetches at once
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Splits `items` into consecutive batches of at most `limit` entries
    pub fn batches<'a, T>(&self, items: &'a [T]) -> Chunks<'a, T> {
        items.chunks(self.limit)
    }

    /// Runs `task` once a permit is available, releasing it afterwards
    pub async fn run<T, F>(&self, task: F) -> Result<T, WalkerError>
    where
        F: Future<Output = Result<T, WalkerError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| WalkerError::LimiterClosed)?;
        task.await
    }

    /// Rejects every later `run` with [`WalkerError::LimiterClosed`]
    ///
    /// Tasks already holding a permit finish normally.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
