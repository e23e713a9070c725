//! gz-engine: batched dual-head position evaluation.
//!
//! Many MCTS searchers, one accelerator-backed model: client handles submit
//! small feature batches, the batching scheduler coalesces them into full
//! fixed-size engine invocations, and the worker pool keeps every device
//! context fed. Backends (onnxruntime, tract, a remote worker, and a fake
//! for tests) share one `Engine` contract.

pub mod backends;
pub mod config;
pub mod engine;
pub mod fake;
pub mod factory;
pub mod pool;
pub mod queue;
pub mod scheduler;

pub use backends::remote::RemoteEngine;
#[cfg(feature = "ort")]
pub use backends::ort::OrtEngine;
#[cfg(feature = "tract")]
pub use backends::tract::TractEngine;
pub use config::{ConfigError, EvalConfig, RemoteConfig};
pub use engine::{AnyEngine, Engine, EngineError, EvalResult};
pub use fake::{FakeEngine, FakeMode};
pub use factory::{new_engine, Factory};
pub use scheduler::{Client, Scheduler, SchedulerStats};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod scheduler_tests;
