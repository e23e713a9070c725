//! Board-feature encoding.

use gz_board::{Color, Stones, NUM_POINTS};

use crate::schema::{BoardFeatures, MOVE_HISTORY, NUM_STONE_FEATURES, PLAYER_FEATURE};

/// Writes the board features for a position history into `out`.
///
/// `history[0]` is the current board position and `history[j]` is the
/// position from `j` moves ago. For each ply `j`, plane `2j` marks stones of
/// the side to play and plane `2j+1` the opponent's stones; plies beyond the
/// supplied history are zeroed. The final plane is all ones iff black is to
/// play.
///
/// Every element of `out` is overwritten, so repeated calls with the same
/// inputs produce identical bytes.
///
/// Panics if `history` is empty or longer than [`MOVE_HISTORY`].
pub fn set_features(history: &[&Stones], to_play: Color, out: &mut BoardFeatures) {
    assert!(!history.is_empty(), "history must contain the current position");
    assert!(
        history.len() <= MOVE_HISTORY,
        "history of {} plies exceeds the maximum of {}",
        history.len(),
        MOVE_HISTORY
    );

    let my_color = to_play;
    let their_color = to_play.other();

    for (j, snapshot) in history.iter().enumerate() {
        for (p, stone) in snapshot.iter().enumerate() {
            let dst = p * NUM_STONE_FEATURES + 2 * j;
            out[dst] = if *stone == Some(my_color) { 1.0 } else { 0.0 };
            out[dst + 1] = if *stone == Some(their_color) { 1.0 } else { 0.0 };
        }
    }

    // Zero the planes for plies we have no history for.
    for j in history.len()..MOVE_HISTORY {
        for p in 0..NUM_POINTS {
            let dst = p * NUM_STONE_FEATURES + 2 * j;
            out[dst] = 0.0;
            out[dst + 1] = 0.0;
        }
    }

    let to_play_feature = if to_play == Color::Black { 1.0 } else { 0.0 };
    for p in 0..NUM_POINTS {
        out[p * NUM_STONE_FEATURES + PLAYER_FEATURE] = to_play_feature;
    }
}
