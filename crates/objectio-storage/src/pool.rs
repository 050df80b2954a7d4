//! Async I/O worker pool: blocking POSIX calls run off the event loop on
//! a fixed pool of OS threads, with completion delivered back via a
//! oneshot channel. A batch-write primitive joins N child writes and
//! reports success/failure counts without a mutex-counted completion
//! object — the join itself is the synchronization point.

use crate::chunk;
use objectio_common::{Error, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of blocking-I/O worker threads.
pub struct IoPool {
    sender: crossbeam_channel::Sender<Job>,
    workers: Vec<std::thread::JoinHandle<()>>,
    stats: Arc<PoolStats>,
}

#[derive(Debug, Default)]
pub struct PoolStats {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

impl IoPool {
    /// Spawns `worker_count` OS threads (at least the CPU count, per the
    /// scheduling model) that pull jobs off a shared FIFO queue.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let stats = Arc::new(PoolStats::default());
        let worker_count = worker_count.max(1);

        let workers = (0..worker_count)
            .map(|_| {
                let receiver = receiver.clone();
                std::thread::spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
            })
            .collect();

        Self {
            sender,
            workers,
            stats,
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }

    /// Offloads a single blocking write; the caller's buffer is owned by
    /// the closure until the worker finishes, then released through the
    /// returned future.
    pub async fn write_chunk(&self, path: PathBuf, data: Vec<u8>) -> Result<()> {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = tokio::sync::oneshot::channel();
        let stats = self.stats.clone();
        let job: Job = Box::new(move || {
            let result = chunk::write_chunk(&path, &data);
            if result.is_ok() {
                stats.completed.fetch_add(1, Ordering::Relaxed);
            } else {
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
            let _ = tx.send(result);
        });
        self.sender
            .send(job)
            .map_err(|_| Error::internal("io pool is shut down"))?;
        rx.await.map_err(|_| Error::internal("io worker dropped without responding"))?
    }

    pub async fn read_chunk(&self, path: PathBuf) -> Result<Vec<u8>> {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = tokio::sync::oneshot::channel();
        let stats = self.stats.clone();
        let job: Job = Box::new(move || {
            let result = chunk::read_chunk(&path);
            if result.is_ok() {
                stats.completed.fetch_add(1, Ordering::Relaxed);
            } else {
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
            let _ = tx.send(result);
        });
        self.sender
            .send(job)
            .map_err(|_| Error::internal("io pool is shut down"))?;
        rx.await.map_err(|_| Error::internal("io worker dropped without responding"))?
    }

    /// Issues `writes` concurrently and waits for all of them, returning
    /// `(succeeded, failed)` counts. No cancellation: once submitted, a
    /// write runs to completion even if the caller stops polling.
    pub async fn batch_write(&self, writes: Vec<(PathBuf, Vec<u8>)>) -> BatchResult {
        let futures = writes
            .into_iter()
            .map(|(path, data)| self.write_chunk(path, data));
        let results = futures::future::join_all(futures).await;
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let failed = results.len() - succeeded;
        BatchResult {
            succeeded,
            failed,
            errors: results.into_iter().filter_map(Result::err).collect(),
        }
    }
}

impl Drop for IoPool {
    fn drop(&mut self) {
        // Dropping `sender` closes the channel; join to avoid leaking
        // detached threads on shutdown.
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<Error>,
}

impl BatchResult {
    #[must_use]
    pub fn meets_quorum(&self, required: usize) -> bool {
        self.succeeded >= required
    }
}
