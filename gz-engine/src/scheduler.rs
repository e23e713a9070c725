//! The batching scheduler: coalesces many small per-searcher requests into
//! full fixed-size engine batches and fans the results back out.
//!
//! Many client threads block in [`Client::run`]; whichever thread's
//! submission (or client departure) completes a dispatchable batch executes
//! the engine call itself, with the scheduler mutex released for the
//! duration so peers keep enqueueing. The census of live counted clients
//! gates partial batches: a short batch only launches once every counted
//! client already has a request queued, so padding slots are spent only when
//! nobody is left to fill them.

use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use gz_features::{zeroed_features, BoardFeatures};

use crate::engine::{AnyEngine, Engine, EvalResult};

struct Request {
    features: Vec<BoardFeatures>,
    result_tx: mpsc::Sender<EvalResult>,
}

struct State {
    queue: VecDeque<Request>,
    /// Live counted clients.
    clients: usize,
    /// Features ever enqueued.
    queue_sum: u64,
    /// Features ever dispatched to the engine (padding excluded).
    run_sum: u64,
    /// Batches dispatched, for stats only.
    runs: u64,
}

/// A consistent snapshot of the scheduler counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs: u64,
    pub queue_sum: u64,
    pub run_sum: u64,
    pub queued_requests: usize,
    pub clients: usize,
}

pub struct Scheduler {
    engine: AnyEngine,
    state: Mutex<State>,
}

impl Scheduler {
    pub fn new(engine: AnyEngine) -> Scheduler {
        Scheduler {
            engine,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                clients: 0,
                queue_sum: 0,
                run_sum: 0,
                runs: 0,
            }),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.engine.batch_size()
    }

    pub fn model(&self) -> &str {
        self.engine.model()
    }

    pub fn stats(&self) -> SchedulerStats {
        let s = self.state.lock().unwrap();
        // Queued-but-undispatched features are exactly the queue contents.
        debug_assert_eq!(
            s.queue.iter().map(|r| r.features.len() as u64).sum::<u64>(),
            s.queue_sum - s.run_sum
        );
        SchedulerStats {
            runs: s.runs,
            queue_sum: s.queue_sum,
            run_sum: s.run_sum,
            queued_requests: s.queue.len(),
            clients: s.clients,
        }
    }

    pub(crate) fn register_client(&self, counted: bool) {
        if counted {
            self.state.lock().unwrap().clients += 1;
        }
    }

    pub(crate) fn unregister_client(&self, counted: bool) {
        if counted {
            let mut s = self.state.lock().unwrap();
            s.clients -= 1;
            // A departing peer may be what a short batch was waiting for.
            self.run_batches(s);
        }
    }

    /// Submits one request of `1..=batch_size` feature arrays and blocks
    /// until its results arrive. The returned policies and values have
    /// exactly the submitted length.
    pub fn run(&self, features: Vec<BoardFeatures>) -> EvalResult {
        let n = features.len();
        let batch_size = self.engine.batch_size();
        assert!(n >= 1, "cannot submit an empty feature batch");
        assert!(
            n <= batch_size,
            "submission of {n} features exceeds the batch size {batch_size}"
        );

        let (result_tx, result_rx) = mpsc::channel();
        {
            let mut s = self.state.lock().unwrap();
            s.queue_sum += n as u64;
            s.queue.push_back(Request {
                features,
                result_tx,
            });
            self.run_batches(s);
        }

        // The slot is fulfilled exactly once; if the scheduler is torn down
        // first, the process is already past saving.
        result_rx
            .recv()
            .expect("scheduler dropped a pending result slot")
    }

    /// Forms and dispatches batches until the queue is empty or a short
    /// batch is being held back for absent submitters. Called with the state
    /// lock held; releases it across every engine call.
    fn run_batches<'a>(&'a self, mut s: MutexGuard<'a, State>) {
        let batch_size = self.engine.batch_size();
        loop {
            let available = (s.queue_sum - s.run_sum) as usize;
            let target = available.min(batch_size);
            if target == 0 {
                return;
            }
            // Don't launch a partial batch while some counted client has no
            // request queued: it is expected to submit and fill the gap.
            // (`run` blocks, so each client holds at most one queue entry and
            // the queue length bounds the distinct submitters from below.)
            if target < batch_size && s.clients > s.queue.len() {
                return;
            }

            let mut features = Vec::with_capacity(batch_size);
            let mut waiters = Vec::new();
            let mut space = target;
            while let Some(front) = s.queue.front() {
                let n = front.features.len();
                if n > space {
                    // FIFO: never skip the head to fill the remaining slots.
                    break;
                }
                let request = s.queue.pop_front().unwrap();
                space -= n;
                s.run_sum += n as u64;
                features.extend(request.features);
                waiters.push((n, request.result_tx));
            }
            debug_assert!(!waiters.is_empty());

            // The in-flight batch owns the moved-out features and result
            // slots, so the lock can be released while the engine runs.
            drop(s);

            features.resize(batch_size, zeroed_features());
            let result = self.engine.run_one(features);
            assert_eq!(result.policies.len(), batch_size, "policy output shape mismatch");
            assert_eq!(result.values.len(), batch_size, "value output shape mismatch");

            let mut offset = 0;
            for (n, result_tx) in waiters {
                let slice = EvalResult {
                    policies: result.policies[offset..offset + n].to_vec(),
                    values: result.values[offset..offset + n].to_vec(),
                    model: result.model.clone(),
                };
                offset += n;
                // A send only fails if the client vanished mid-submit, which
                // caller discipline forbids; nothing useful to do here.
                let _ = result_tx.send(slice);
            }
            // Entries past `offset` are padding and are dropped with
            // `result`.

            s = self.state.lock().unwrap();
            s.runs += 1;
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let s = self.state.get_mut().unwrap();
        if s.runs > 0 {
            eprintln!(
                "ran {} batches with an average size of {:.1}",
                s.runs,
                s.run_sum as f64 / s.runs as f64
            );
        }
    }
}

/// A per-searcher handle onto the shared scheduler.
///
/// Counted clients participate in the census that gates partial batches;
/// weak clients (transient helpers) do not.
pub struct Client {
    scheduler: Arc<Scheduler>,
    counted: bool,
}

impl Client {
    pub(crate) fn new(scheduler: Arc<Scheduler>, counted: bool) -> Client {
        scheduler.register_client(counted);
        Client { scheduler, counted }
    }

    /// Evaluates up to a batch's worth of positions, blocking until the
    /// shared engine has produced this submission's results.
    pub fn run(&self, features: Vec<BoardFeatures>) -> EvalResult {
        self.scheduler.run(features)
    }

    pub fn batch_size(&self) -> usize {
        self.scheduler.batch_size()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.scheduler.unregister_client(self.counted);
    }
}
