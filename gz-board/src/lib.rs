//! gz-board: board constants, colors, coordinates, and stone-map snapshots.
//!
//! The board side is fixed at build time (like the rest of the evaluation
//! stack): 9x9 by default, 19x19 with the `board-19` cargo feature.

pub mod coord;
pub mod position;

pub use coord::{Coord, Move};
pub use position::Position;

/// Board side length.
#[cfg(not(feature = "board-19"))]
pub const N: usize = 9;
#[cfg(feature = "board-19")]
pub const N: usize = 19;

/// Number of points on the board.
pub const NUM_POINTS: usize = N * N;

/// Stone colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// A snapshot of the stones on the board: `None` for an empty point.
///
/// Index layout is row-major from the top-left corner, matching [`Coord`].
pub type Stones = [Option<Color>; NUM_POINTS];

/// An empty stone map.
pub fn empty_stones() -> Stones {
    [None; NUM_POINTS]
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
