//! The engine contract: the innermost inference primitive.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use gz_features::{BoardFeatures, Policy};

use crate::backends::remote::RemoteEngine;
use crate::fake::FakeEngine;
#[cfg(feature = "ort")]
use crate::backends::ort::OrtEngine;
#[cfg(feature = "tract")]
use crate::backends::tract::TractEngine;

/// Dual-head outputs, one policy vector and one value per input.
///
/// Move-only by construction (no `Clone`): a result is produced once by an
/// engine and consumed once by the client it belongs to.
#[derive(Debug)]
pub struct EvalResult {
    pub policies: Vec<Policy>,
    pub values: Vec<f32>,
    pub model: String,
}

/// A backend that evaluates one fixed-size batch at a time.
///
/// `run_one` takes exactly `batch_size()` feature arrays and returns exactly
/// as many policies and values, blocking until the batch has been executed.
/// Implementations must be callable from multiple threads. Execution
/// failures are fatal: an engine either returns a full batch of outputs or
/// panics; it never returns partial results and never hangs its caller.
pub trait Engine: Send + Sync {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult;
    fn batch_size(&self) -> usize;
    fn model(&self) -> &str;
}

/// Construction-time engine failures. Anything that goes wrong after an
/// engine is built aborts the process instead (see [`Engine`]).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unrecognized inference engine {0:?}")]
    UnknownEngine(String),
    #[error("binary wasn't compiled with {0} inference support")]
    NotCompiled(&'static str),
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol/schema mismatch: {0}")]
    Invariant(&'static str),
    #[error("stats log error: {0}")]
    Stats(#[from] gz_logging::StatsLogError),
    #[cfg(feature = "ort")]
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[cfg(feature = "tract")]
    #[error("tract error: {0}")]
    Tract(String),
}

/// The engines compiled into this binary. Picking a variant happens once, in
/// the factory; everything downstream is static dispatch.
pub enum AnyEngine {
    Fake(FakeEngine),
    Remote(RemoteEngine),
    #[cfg(feature = "ort")]
    Ort(OrtEngine),
    #[cfg(feature = "tract")]
    Tract(TractEngine),
}

impl Engine for AnyEngine {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult {
        match self {
            AnyEngine::Fake(e) => e.run_one(features),
            AnyEngine::Remote(e) => e.run_one(features),
            #[cfg(feature = "ort")]
            AnyEngine::Ort(e) => e.run_one(features),
            #[cfg(feature = "tract")]
            AnyEngine::Tract(e) => e.run_one(features),
        }
    }

    fn batch_size(&self) -> usize {
        match self {
            AnyEngine::Fake(e) => e.batch_size(),
            AnyEngine::Remote(e) => e.batch_size(),
            #[cfg(feature = "ort")]
            AnyEngine::Ort(e) => e.batch_size(),
            #[cfg(feature = "tract")]
            AnyEngine::Tract(e) => e.batch_size(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AnyEngine::Fake(e) => e.model(),
            AnyEngine::Remote(e) => e.model(),
            #[cfg(feature = "ort")]
            AnyEngine::Ort(e) => e.model(),
            #[cfg(feature = "tract")]
            AnyEngine::Tract(e) => e.model(),
        }
    }
}
