//! tract backend: pure-Rust inference for deployments without an
//! accelerator runtime.
//!
//! The plan is pinned to the fixed channel-last input shape at load time and
//! runs inline on the calling thread; the optimized plan is shareable, so no
//! worker pool is needed here.

use std::path::Path;

use tract_onnx::prelude::*;

use gz_board::N;
use gz_features::{BoardFeatures, Policy, NUM_MOVES, NUM_STONE_FEATURES};

use crate::engine::{Engine, EngineError, EvalResult};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct TractEngine {
    plan: RunnableModel,
    batch_size: usize,
    model: String,
}

impl TractEngine {
    pub fn new(model_path: &Path, batch_size: usize) -> Result<TractEngine, EngineError> {
        assert!(batch_size >= 1, "batch size must be at least 1");
        if !model_path.exists() {
            return Err(EngineError::ModelNotFound(model_path.to_path_buf()));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(
                        f32::datum_type(),
                        tvec!(batch_size, N, N, NUM_STONE_FEATURES),
                    ),
                )
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| EngineError::Tract(e.to_string()))?;

        Ok(TractEngine {
            plan,
            batch_size,
            model: model_path.display().to_string(),
        })
    }
}

impl Engine for TractEngine {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult {
        assert_eq!(
            features.len(),
            self.batch_size,
            "engine expects exactly the configured batch size"
        );

        let mut flat = Vec::with_capacity(self.batch_size * features[0].len());
        for entry in &features {
            flat.extend_from_slice(entry);
        }
        let input = Tensor::from_shape(&[self.batch_size, N, N, NUM_STONE_FEATURES], &flat)
            .expect("input tensor shape mismatch");

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .unwrap_or_else(|e| panic!("tract inference failed: {e}"));
        assert_eq!(outputs.len(), 2, "model must have policy and value heads");

        let first = outputs[0]
            .as_slice::<f32>()
            .expect("model outputs must be f32");
        let second = outputs[1]
            .as_slice::<f32>()
            .expect("model outputs must be f32");

        // Head order is not fixed across exporters; tell them apart by size.
        let (policy_flat, value_flat) = if first.len() == self.batch_size * NUM_MOVES
            && second.len() == self.batch_size
        {
            (first, second)
        } else if second.len() == self.batch_size * NUM_MOVES && first.len() == self.batch_size {
            (second, first)
        } else {
            panic!(
                "inconsistent output tensor shapes: {} and {} for batch size {}",
                first.len(),
                second.len(),
                self.batch_size
            );
        };

        let mut policies = Vec::with_capacity(self.batch_size);
        for i in 0..self.batch_size {
            let mut policy: Policy = [0.0; NUM_MOVES];
            policy.copy_from_slice(&policy_flat[i * NUM_MOVES..(i + 1) * NUM_MOVES]);
            policies.push(policy);
        }

        EvalResult {
            policies,
            values: value_flat.to_vec(),
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
