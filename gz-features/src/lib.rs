//! gz-features: feature schema + canonical board-feature encoding.

pub mod encode;
pub mod schema;

pub use encode::set_features;
pub use schema::{
    zeroed_features, BoardFeatures, Policy, StoneFeatures, FEATURE_SCHEMA_ID, MOVE_HISTORY,
    NUM_BOARD_FEATURES, NUM_MOVES, NUM_STONE_FEATURES, PLAYER_FEATURE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod encode_tests;
