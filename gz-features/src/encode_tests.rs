use gz_board::{empty_stones, Color, Coord, Position, Stones};

use crate::encode::set_features;
use crate::schema::{
    zeroed_features, BoardFeatures, StoneFeatures, MOVE_HISTORY, NUM_STONE_FEATURES,
    PLAYER_FEATURE,
};

fn stone_features(features: &BoardFeatures, c: Coord) -> StoneFeatures {
    let mut out = [0.0; NUM_STONE_FEATURES];
    out.copy_from_slice(
        &features[c.index() * NUM_STONE_FEATURES..(c.index() + 1) * NUM_STONE_FEATURES],
    );
    out
}

/// Plays the given moves and collects snapshots most-recent-first.
fn history_of(moves: &[&str]) -> (Vec<Stones>, Color) {
    let mut board = Position::new();
    let mut snapshots = Vec::new();
    for mv in moves {
        board.play_gtp(mv);
        snapshots.insert(0, board.stones());
    }
    (snapshots, board.to_play())
}

#[test]
fn empty_board_black_to_play() {
    let stones = empty_stones();
    let history = [&stones];
    let mut features = zeroed_features();
    set_features(&history, Color::Black, &mut features);

    for p in 0..gz_board::NUM_POINTS {
        let f = stone_features(&features, Coord::from_index(p));
        for &v in &f[..PLAYER_FEATURE] {
            assert_eq!(v, 0.0);
        }
        assert_eq!(f[PLAYER_FEATURE], 1.0);
    }
}

#[test]
fn empty_board_white_to_play() {
    let stones = empty_stones();
    let history = [&stones];
    let mut features = zeroed_features();
    set_features(&history, Color::White, &mut features);

    for p in 0..gz_board::NUM_POINTS {
        let f = stone_features(&features, Coord::from_index(p));
        for &v in &f {
            assert_eq!(v, 0.0);
        }
    }
}

#[cfg(not(feature = "board-19"))]
#[test]
fn encodes_move_history() {
    let (snapshots, to_play) = history_of(&["B9", "H9", "A8", "J9"]);
    assert_eq!(to_play, Color::Black);
    let history: Vec<&Stones> = snapshots.iter().collect();

    let mut features = zeroed_features();
    set_features(&history, to_play, &mut features);

    //             B0   W0   B1   W1   B2   W2   B3   W3   B4-B7/W4-W7 zero         C
    let b9 = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    let h9 = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    let a8 = [1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    let j9 = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];

    assert_eq!(b9, stone_features(&features, Coord::from_gtp("B9").unwrap()));
    assert_eq!(h9, stone_features(&features, Coord::from_gtp("H9").unwrap()));
    assert_eq!(a8, stone_features(&features, Coord::from_gtp("A8").unwrap()));
    assert_eq!(j9, stone_features(&features, Coord::from_gtp("J9").unwrap()));
}

#[cfg(not(feature = "board-19"))]
#[test]
fn encodes_captured_and_retaken_point() {
    let (snapshots, to_play) = history_of(&["J3", "pass", "H2", "J2", "J1", "pass", "J2"]);
    assert_eq!(to_play, Color::White);
    let history: Vec<&Stones> = snapshots.iter().collect();

    let mut features = zeroed_features();
    set_features(&history, to_play, &mut features);

    // From white's point of view: the black stone now on J2 shows in the
    // "theirs" plane at ply 0, and white's own captured J2 stone shows in
    // the "ours" plane at ply 3.
    let j2 = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(j2, stone_features(&features, Coord::from_gtp("J2").unwrap()));
}

#[test]
fn short_history_zeroes_remaining_planes() {
    let (snapshots, to_play) = history_of(&["C3"]);
    let history: Vec<&Stones> = snapshots.iter().collect();

    let mut features = zeroed_features();
    set_features(&history, to_play, &mut features);

    let f = stone_features(&features, Coord::from_gtp("C3").unwrap());
    // C3 is black's stone and white is to play, so it lands in plane 1.
    assert_eq!(f[0], 0.0);
    assert_eq!(f[1], 1.0);
    for j in 1..MOVE_HISTORY {
        assert_eq!(f[2 * j], 0.0);
        assert_eq!(f[2 * j + 1], 0.0);
    }
    assert_eq!(f[PLAYER_FEATURE], 0.0);
}

#[test]
fn encoding_is_idempotent() {
    let (snapshots, to_play) = history_of(&["B9", "H9", "A8", "J9"]);
    let history: Vec<&Stones> = snapshots.iter().collect();

    // Start from different garbage to prove every element is overwritten.
    let mut first = [0.25; crate::schema::NUM_BOARD_FEATURES];
    let mut second = [-1.0; crate::schema::NUM_BOARD_FEATURES];
    set_features(&history, to_play, &mut first);
    set_features(&history, to_play, &mut second);
    assert!(first[..] == second[..]);
}

#[test]
#[should_panic(expected = "history")]
fn empty_history_panics() {
    let mut features = zeroed_features();
    set_features(&[], Color::Black, &mut features);
}

#[test]
#[should_panic(expected = "exceeds")]
fn oversize_history_panics() {
    let stones = empty_stones();
    let history = vec![&stones; MOVE_HISTORY + 1];
    let mut features = zeroed_features();
    set_features(&history, Color::Black, &mut features);
}
