//! ONNX Runtime backend.
//!
//! Spawns `workers_per_device` threads per accelerator, each owning its own
//! session, all draining one work queue. The runtime wants channel-first
//! input, so each worker transposes the stone-minor feature layout to
//! `[B, planes, N, N]` before invoking the session; nothing outside this
//! module observes the transposition.

use std::path::{Path, PathBuf};

use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;

use gz_board::{N, NUM_POINTS};
use gz_features::{BoardFeatures, Policy, NUM_BOARD_FEATURES, NUM_MOVES, NUM_STONE_FEATURES};

use crate::config::EvalConfig;
use crate::engine::{Engine, EngineError, EvalResult};
use crate::pool::WorkerPool;

pub struct OrtEngine {
    pool: WorkerPool,
    batch_size: usize,
    model: String,
}

impl OrtEngine {
    pub fn new(config: &EvalConfig) -> Result<OrtEngine, EngineError> {
        let model_path = resolve_model_path(&config.model)?;
        let batch_size = config.batch_size;
        assert!(batch_size >= 1, "batch size must be at least 1");

        let _ = ort::init().with_name("gz-engine").commit();

        let use_cuda = config.device == "cuda";
        let device_ids = resolve_device_ids(config.num_devices);
        let workers_per_device = config.workers_per_device.max(1);

        let mut sessions = Vec::with_capacity(device_ids.len() * workers_per_device);
        for &device_id in &device_ids {
            for _ in 0..workers_per_device {
                let mut builder = Session::builder()?;
                if use_cuda {
                    builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                        .with_device_id(device_id as i32)
                        .build()])?;
                }
                sessions.push(builder.commit_from_file(&model_path)?);
            }
        }

        let model = model_path.display().to_string();
        let worker_model = model.clone();
        let pool = WorkerPool::spawn("gz-ort", sessions, move |session, features| {
            run_session_batch(session, features, batch_size, &worker_model)
        });

        Ok(OrtEngine {
            pool,
            batch_size,
            model,
        })
    }
}

impl Engine for OrtEngine {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult {
        assert_eq!(
            features.len(),
            self.batch_size,
            "engine expects exactly the configured batch size"
        );
        self.pool.run(features)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn run_session_batch(
    session: &mut Session,
    features: Vec<BoardFeatures>,
    batch_size: usize,
    model: &str,
) -> EvalResult {
    // Stone-minor (point-major) to channel-first.
    let mut input = vec![0.0f32; batch_size * NUM_BOARD_FEATURES];
    for (i, entry) in features.iter().enumerate() {
        let base = i * NUM_BOARD_FEATURES;
        for p in 0..NUM_POINTS {
            for c in 0..NUM_STONE_FEATURES {
                input[base + c * NUM_POINTS + p] = entry[p * NUM_STONE_FEATURES + c];
            }
        }
    }

    let input = Tensor::<f32>::from_array((vec![batch_size, NUM_STONE_FEATURES, N, N], input))
        .expect("input tensor shape mismatch");

    let outputs = session
        .run(ort::inputs![input])
        .unwrap_or_else(|e| panic!("onnx runtime inference failed: {e}"));

    let (_, policy_flat) = outputs[0]
        .try_extract_tensor::<f32>()
        .expect("policy output must be f32");
    let (_, value_flat) = outputs[1]
        .try_extract_tensor::<f32>()
        .expect("value output must be f32");
    assert_eq!(
        policy_flat.len(),
        batch_size * NUM_MOVES,
        "policy output shape mismatch"
    );
    assert_eq!(value_flat.len(), batch_size, "value output shape mismatch");

    let mut policies = Vec::with_capacity(batch_size);
    for i in 0..batch_size {
        let mut policy: Policy = [0.0; NUM_MOVES];
        policy.copy_from_slice(&policy_flat[i * NUM_MOVES..(i + 1) * NUM_MOVES]);
        policies.push(policy);
    }

    EvalResult {
        policies,
        values: value_flat.to_vec(),
        model: model.to_string(),
    }
}

/// Probes the configured path, falling back to a `.onnx` suffix.
fn resolve_model_path(path: &Path) -> Result<PathBuf, EngineError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let with_ext = path.with_extension("onnx");
    if with_ext.exists() {
        return Ok(with_ext);
    }
    Err(EngineError::ModelNotFound(path.to_path_buf()))
}

/// 0 auto-detects: the visible-device list if one is pinned, else a single
/// device.
fn resolve_device_ids(num_devices: usize) -> Vec<usize> {
    if num_devices > 0 {
        return (0..num_devices).collect();
    }
    let visible = std::env::var("CUDA_VISIBLE_DEVICES")
        .map(|v| v.split(',').filter(|s| !s.trim().is_empty()).count())
        .unwrap_or(0);
    (0..visible.max(1)).collect()
}
