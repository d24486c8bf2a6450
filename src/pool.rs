//! Worker recycling.
//!
//! Each encode call checks a [`Worker`] out of the encoder's pool and returns
//! it when the [`PooledWorker`] guard drops, on success and on every early
//! exit alike. Returned workers are reset before they become available again.

use crate::worker::Worker;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Idle workers kept beyond this are dropped on return.
pub(crate) const MAX_IDLE_WORKERS: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct WorkerPool {
    idle: Mutex<Vec<Worker>>,
}

impl WorkerPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Checks out an idle worker, or creates one if none is available.
    pub(crate) fn acquire(&self) -> PooledWorker<'_> {
        let worker = self.idle.lock().pop().unwrap_or_else(Worker::new);
        PooledWorker { pool: self, worker }
    }

    fn release(&self, mut worker: Worker) {
        worker.reset();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_WORKERS {
            idle.push(worker);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

/// A checked-out worker, returned to its pool on drop.
pub(crate) struct PooledWorker<'a> {
    pool: &'a WorkerPool,
    worker: Worker,
}

impl Deref for PooledWorker<'_> {
    type Target = Worker;

    fn deref(&self) -> &Worker {
        &self.worker
    }
}

impl DerefMut for PooledWorker<'_> {
    fn deref_mut(&mut self) -> &mut Worker {
        &mut self.worker
    }
}

impl Drop for PooledWorker<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.worker));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::NativeValues;

    #[test]
    fn test_worker_returns_on_drop() {
        let pool = WorkerPool::new();
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 2);

        let _c = pool.acquire();
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_returned_worker_is_reset() {
        let pool = WorkerPool::new();
        {
            let mut worker = pool.acquire();
            worker.begin(true, Some(NativeValues::new()));
        }
        let worker = pool.acquire();
        assert!(worker.is_clean());
        assert!(worker.namespace_capacity() > 0);
    }

    #[test]
    fn test_idle_workers_are_capped() {
        let pool = WorkerPool::new();
        let workers: Vec<_> = (0..MAX_IDLE_WORKERS + 8).map(|_| pool.acquire()).collect();
        drop(workers);
        assert_eq!(pool.idle_count(), MAX_IDLE_WORKERS);
    }

    #[test]
    fn test_release_on_panic() {
        let pool = WorkerPool::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _worker = pool.acquire();
            panic!("encode aborted");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 1);
    }
}
