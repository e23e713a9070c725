//! Worker pool: a fixed set of threads, each owning one backend context,
//! draining a shared work queue.
//!
//! Work items are opaque to the pool; the owning engine supplies the
//! function that executes a batch on a context. Workers pop with a bounded
//! timeout so teardown is prompt, and `Drop` joins every thread before the
//! contexts are freed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gz_features::BoardFeatures;

use crate::engine::EvalResult;
use crate::queue::ThreadSafeQueue;

/// How long a worker waits for work before re-checking the running flag.
const WORKER_POLL: Duration = Duration::from_secs(1);

struct WorkItem {
    features: Vec<BoardFeatures>,
    result_tx: mpsc::Sender<EvalResult>,
}

pub struct WorkerPool {
    queue: Arc<ThreadSafeQueue<WorkItem>>,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns one named worker thread per context. `run_batch` executes a
    /// full batch on a context and is shared by all workers.
    pub fn spawn<C, F>(name: &str, contexts: Vec<C>, run_batch: F) -> WorkerPool
    where
        C: Send + 'static,
        F: Fn(&mut C, Vec<BoardFeatures>) -> EvalResult + Send + Sync + 'static,
    {
        assert!(!contexts.is_empty(), "worker pool needs at least one context");

        let queue = Arc::new(ThreadSafeQueue::<WorkItem>::new());
        let running = Arc::new(AtomicBool::new(true));
        let run_batch = Arc::new(run_batch);

        let workers = contexts
            .into_iter()
            .enumerate()
            .map(|(i, mut ctx)| {
                let queue = Arc::clone(&queue);
                let running = Arc::clone(&running);
                let run_batch = Arc::clone(&run_batch);
                thread::Builder::new()
                    .name(format!("{name}-{i}"))
                    .spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            if let Some(item) = queue.pop_with_timeout(WORKER_POLL) {
                                let result = run_batch(&mut ctx, item.features);
                                // The submitter may already be gone on teardown.
                                let _ = item.result_tx.send(result);
                            }
                        }
                    })
                    .expect("failed to spawn inference worker thread")
            })
            .collect();

        WorkerPool {
            queue,
            running,
            workers,
        }
    }

    /// Submits one batch and blocks until whichever worker picked it up has
    /// finished.
    pub fn run(&self, features: Vec<BoardFeatures>) -> EvalResult {
        let (result_tx, result_rx) = mpsc::channel();
        self.queue.push(WorkItem {
            features,
            result_tx,
        });
        result_rx
            .recv()
            .expect("worker pool shut down with a batch in flight")
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use gz_features::{zeroed_features, NUM_MOVES};

    use super::*;

    fn echo_pool(contexts: usize) -> WorkerPool {
        WorkerPool::spawn("test-pool", (0..contexts).collect(), |_: &mut usize, features| {
            EvalResult {
                policies: vec![[0.0; NUM_MOVES]; features.len()],
                values: features.iter().map(|f| f[0]).collect(),
                model: "pool-test".to_string(),
            }
        })
    }

    #[test]
    fn runs_a_batch_on_some_worker() {
        let pool = echo_pool(2);
        let mut f = zeroed_features();
        f[0] = 3.0;
        let out = pool.run(vec![f, zeroed_features()]);
        assert_eq!(out.values, vec![3.0, 0.0]);
    }

    #[test]
    fn serves_concurrent_submitters() {
        let pool = Arc::new(echo_pool(4));
        thread::scope(|s| {
            for tag in 1..=8 {
                let pool = Arc::clone(&pool);
                s.spawn(move || {
                    let mut f = zeroed_features();
                    f[0] = tag as f32;
                    let out = pool.run(vec![f]);
                    assert_eq!(out.values, vec![tag as f32]);
                });
            }
        });
    }

    #[test]
    fn drop_joins_cleanly() {
        let pool = echo_pool(3);
        let _ = pool.run(vec![zeroed_features()]);
        drop(pool);
    }
}
