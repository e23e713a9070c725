//! Engine construction and the client-spawning factory.
//!
//! One engine, one scheduler, many clients: sharing the accelerator queue
//! across every searcher in the process is what makes batching work.

use std::sync::{Arc, Mutex};

use gz_logging::{now_ms, BatchStatsEventV1, EngineInitEventV1, StatsLog};

use crate::backends::remote::RemoteEngine;
use crate::config::EvalConfig;
use crate::engine::{AnyEngine, EngineError};
use crate::fake::FakeEngine;
use crate::scheduler::{Client, Scheduler, SchedulerStats};

/// Builds the configured engine. This is the single point where the engine
/// tag is resolved; everything after construction is static dispatch.
pub fn new_engine(config: &EvalConfig) -> Result<AnyEngine, EngineError> {
    match config.engine.as_str() {
        "fake" => Ok(AnyEngine::Fake(FakeEngine::uniform(config.batch_size))),
        "remote" => Ok(AnyEngine::Remote(RemoteEngine::connect(
            &config.remote.addr,
            &config.model,
            config.batch_size,
        )?)),
        "ort" => {
            #[cfg(feature = "ort")]
            {
                Ok(AnyEngine::Ort(crate::backends::ort::OrtEngine::new(config)?))
            }
            #[cfg(not(feature = "ort"))]
            {
                Err(EngineError::NotCompiled("ort"))
            }
        }
        "tract" => {
            #[cfg(feature = "tract")]
            {
                Ok(AnyEngine::Tract(crate::backends::tract::TractEngine::new(
                    &config.model,
                    config.batch_size,
                )?))
            }
            #[cfg(not(feature = "tract"))]
            {
                Err(EngineError::NotCompiled("tract"))
            }
        }
        other => Err(EngineError::UnknownEngine(other.to_string())),
    }
}

/// Owns the scheduler wrapped around the process's one engine and hands out
/// client handles.
pub struct Factory {
    scheduler: Arc<Scheduler>,
    stats: Option<Mutex<StatsLog>>,
}

impl Factory {
    pub fn from_config(config: &EvalConfig) -> Result<Factory, EngineError> {
        let engine = new_engine(config)?;
        let stats = match &config.stats_path {
            Some(path) => {
                let mut log = StatsLog::open(path)?;
                log.append(&EngineInitEventV1 {
                    event: "engine_init_v1",
                    ts_ms: now_ms(),
                    engine: config.engine.clone(),
                    model: config.model.display().to_string(),
                    batch_size: config.batch_size as u64,
                    num_devices: config.num_devices as u64,
                })?;
                Some(Mutex::new(log))
            }
            None => None,
        };
        Ok(Factory {
            scheduler: Arc::new(Scheduler::new(engine)),
            stats,
        })
    }

    /// Wraps an already-built engine; used by tests and embedders that
    /// construct engines themselves.
    pub fn with_engine(engine: AnyEngine) -> Factory {
        Factory {
            scheduler: Arc::new(Scheduler::new(engine)),
            stats: None,
        }
    }

    /// A client that participates in the batching census.
    pub fn new_client(&self) -> Client {
        Client::new(Arc::clone(&self.scheduler), true)
    }

    /// A client for transient helpers: it can submit work but is never
    /// waited on to fill a batch.
    pub fn new_weak_client(&self) -> Client {
        Client::new(Arc::clone(&self.scheduler), false)
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }
}

impl Drop for Factory {
    fn drop(&mut self) {
        if let Some(log) = &self.stats {
            let stats = self.scheduler.stats();
            let avg_batch = if stats.runs == 0 {
                0.0
            } else {
                stats.run_sum as f64 / stats.runs as f64
            };
            // Teardown logging is best-effort.
            let _ = log.lock().unwrap().append(&BatchStatsEventV1 {
                event: "batch_stats_v1",
                ts_ms: now_ms(),
                model: self.scheduler.model().to_string(),
                runs: stats.runs,
                features_dispatched: stats.run_sum,
                features_queued: stats.queue_sum,
                avg_batch,
            });
        }
    }
}
