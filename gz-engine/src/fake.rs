//! A model-free engine for tests and plumbing checks.

use gz_features::{BoardFeatures, Policy, NUM_MOVES};

use crate::engine::{Engine, EvalResult};

/// How the fake derives its outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeMode {
    /// Every entry gets the configured priors and value.
    Constant,
    /// Each entry's value (and first policy slot) echoes its own first
    /// feature, so tests can tag submissions and verify fan-out isolation.
    Echo,
    /// Each entry's value is its slot index within the batch, so tests can
    /// observe FIFO assembly order and demultiplexing offsets.
    SlotIndex,
}

pub struct FakeEngine {
    batch_size: usize,
    priors: Policy,
    value: f32,
    mode: FakeMode,
}

impl FakeEngine {
    /// Uniform priors, zero value.
    pub fn uniform(batch_size: usize) -> FakeEngine {
        FakeEngine::constant(batch_size, [1.0 / NUM_MOVES as f32; NUM_MOVES], 0.0)
    }

    pub fn constant(batch_size: usize, priors: Policy, value: f32) -> FakeEngine {
        assert!(batch_size >= 1, "batch size must be at least 1");
        FakeEngine {
            batch_size,
            priors,
            value,
            mode: FakeMode::Constant,
        }
    }

    pub fn echo(batch_size: usize) -> FakeEngine {
        FakeEngine {
            mode: FakeMode::Echo,
            ..FakeEngine::uniform(batch_size)
        }
    }

    pub fn slot_index(batch_size: usize) -> FakeEngine {
        FakeEngine {
            mode: FakeMode::SlotIndex,
            ..FakeEngine::uniform(batch_size)
        }
    }
}

impl Engine for FakeEngine {
    fn run_one(&self, features: Vec<BoardFeatures>) -> EvalResult {
        assert_eq!(
            features.len(),
            self.batch_size,
            "engine expects exactly the configured batch size"
        );

        let mut policies = vec![self.priors; self.batch_size];
        let values = match self.mode {
            FakeMode::Constant => vec![self.value; self.batch_size],
            FakeMode::Echo => features
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    policies[i][0] = f[0];
                    f[0]
                })
                .collect(),
            FakeMode::SlotIndex => (0..self.batch_size).map(|i| i as f32).collect(),
        };

        EvalResult {
            policies,
            values,
            model: self.model().to_string(),
        }
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn model(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use gz_features::zeroed_features;

    use super::*;

    #[test]
    fn constant_outputs_everywhere() {
        let engine = FakeEngine::constant(3, [0.5; NUM_MOVES], 0.25);
        let out = engine.run_one(vec![zeroed_features(); 3]);
        assert_eq!(out.policies.len(), 3);
        assert_eq!(out.values, vec![0.25; 3]);
        assert_eq!(out.model, "fake");
    }

    #[test]
    fn echo_reflects_first_feature() {
        let engine = FakeEngine::echo(2);
        let mut tagged = zeroed_features();
        tagged[0] = 7.0;
        let out = engine.run_one(vec![tagged, zeroed_features()]);
        assert_eq!(out.values, vec![7.0, 0.0]);
        assert_eq!(out.policies[0][0], 7.0);
    }

    #[test]
    #[should_panic(expected = "batch size")]
    fn wrong_batch_dimension_panics() {
        let engine = FakeEngine::uniform(4);
        engine.run_one(vec![zeroed_features(); 3]);
    }
}
