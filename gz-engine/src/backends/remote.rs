//! Remote engine: ships batches to an inference worker over TCP.
//!
//! Requests go out under a writer lock; a background reader thread routes
//! responses back to the submitting thread by batch id. A lost connection
//! fails every pending slot, and any `run_one` blocked on one of them aborts
//! the process: a faulted batch must never leave a searcher hanging.

use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use rustc_hash::FxHashMap;

use gz_features::{BoardFeatures, Policy, NUM_BOARD_FEATURES, NUM_MOVES};
use gz_remote::{read_response, write_request, BatchResponse, FEATURE_LEN, MAX_BATCH, POLICY_LEN};

use crate::engine::{Engine, EngineError, EvalResult};

type PendingMap = FxHashMap<u64, mpsc::Sender<BatchResponse>>;

pub struct RemoteEngine {
    batch_size: usize,
    model: String,
    writer: Mutex<TcpStream>,
    pending: Arc<Mutex<PendingMap>>,
    next_batch_id: AtomicU64,
    shutdown: Arc<AtomicBool>,
    stream: TcpStream,
    reader: Option<JoinHandle<()>>,
}

impl RemoteEngine {
    pub fn connect(
        addr: impl ToSocketAddrs,
        model: &Path,
        batch_size: usize,
    ) -> Result<RemoteEngine, EngineError> {
        check_invariants()?;
        assert!(batch_size >= 1, "batch size must be at least 1");
        if batch_size > MAX_BATCH as usize {
            return Err(EngineError::Invariant(
                "batch size exceeds the remote wire limit",
            ));
        }

        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true).ok();
        let writer = Mutex::new(stream.try_clone()?);
        let mut reader_stream = stream.try_clone()?;

        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(FxHashMap::default()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let reader = {
            let pending = Arc::clone(&pending);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("gz-remote-reader".to_string())
                .spawn(move || loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let response = match read_response(&mut reader_stream) {
                        Ok(r) => r,
                        Err(_) => {
                            fail_all_pending(&pending);
                            break;
                        }
                    };
                    let slot = pending.lock().unwrap().remove(&response.batch_id);
                    if let Some(slot) = slot {
                        let _ = slot.send(response);
                    }
                })?
        };

        Ok(RemoteEngine {
            batch_size,
            model: model.display().to_string(),
            writer,
            pending,
            next_batch_id: AtomicU64::new(1),
            shutdown,
            stream,
            reader: Some(reader),
        })
    }
}

/// Drops every pending sender so blocked submitters wake with an error.
fn fail_all_pending(pending: &Arc<Mutex<PendingMap>>) {
    pending.lock().unwrap().clear();
}

fn check_invariants() -> Result<(), EngineError> {
    if FEATURE_LEN as usize != NUM_BOARD_FEATURES {
        return Err(EngineError::Invariant(
            "remote FEATURE_LEN != gz_features::NUM_BOARD_FEATURES",
        ));
    }
    if POLICY_LEN as usize != NUM_MOVES {
        return Err(EngineError::Invariant(
            "remote POLICY_LEN != gz_features::NUM_MOVES",
        ));
    }
    Ok(())
}

impl Engine for RemoteEngine {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult {
        assert_eq!(
            features.len(),
            self.batch_size,
            "engine expects exactly the configured batch size"
        );

        let batch_id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        let (slot_tx, slot_rx) = mpsc::channel();
        self.pending.lock().unwrap().insert(batch_id, slot_tx);

        {
            let mut writer = self.writer.lock().unwrap();
            if let Err(e) = write_request(&mut *writer, batch_id, &features) {
                panic!("remote inference connection lost while sending a batch: {e}");
            }
        }

        let response = slot_rx
            .recv()
            .unwrap_or_else(|_| panic!("remote inference worker closed the stream with a batch in flight"));

        let mut policies = Vec::with_capacity(self.batch_size);
        for i in 0..self.batch_size {
            let mut policy: Policy = [0.0; NUM_MOVES];
            policy.copy_from_slice(&response.policies[i * NUM_MOVES..(i + 1) * NUM_MOVES]);
            policies.push(policy);
        }

        EvalResult {
            policies,
            values: response.values,
            model: self.model.clone(),
        }
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl Drop for RemoteEngine {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}
