//! Feature schema for the dual-head evaluation network.
//!
//! The input tensor holds 17 binary feature planes per point: for each of
//! the 8 most recent plies, one plane marks the side-to-play's stones and
//! one the opponent's; the final plane is all ones when black is to play.
//! The buffer layout is stone-minor: the 17 floats for a point are
//! contiguous, and successive points are `NUM_STONE_FEATURES` apart.

use gz_board::NUM_POINTS;

/// Increment this whenever the feature layout changes.
pub const FEATURE_SCHEMA_ID: u32 = 1;

/// Plies of board history retained in the stone features.
pub const MOVE_HISTORY: usize = 8;

/// Number of features per point.
pub const NUM_STONE_FEATURES: usize = 2 * MOVE_HISTORY + 1;

/// Index of the per-point feature that marks which color is to play.
pub const PLAYER_FEATURE: usize = 2 * MOVE_HISTORY;

/// Total number of features for the board.
pub const NUM_BOARD_FEATURES: usize = NUM_POINTS * NUM_STONE_FEATURES;

/// Size of the policy head output: one entry per point plus one pass move.
pub const NUM_MOVES: usize = NUM_POINTS + 1;

/// The features for a single point.
pub type StoneFeatures = [f32; NUM_STONE_FEATURES];

/// The features for a whole board, stone-minor.
pub type BoardFeatures = [f32; NUM_BOARD_FEATURES];

/// A policy vector over all moves.
pub type Policy = [f32; NUM_MOVES];

/// A zeroed feature buffer (also used as batch padding).
pub fn zeroed_features() -> BoardFeatures {
    [0.0; NUM_BOARD_FEATURES]
}
