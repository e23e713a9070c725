//! A minimal board position: stone placement with captures.
//!
//! This is just enough of the game to build realistic position histories for
//! feature encoding. Full rules (ko, suicide, scoring) live with the search,
//! not with the evaluation stack.

use crate::coord::Move;
use crate::{empty_stones, Color, Stones, N, NUM_POINTS};

#[derive(Debug, Clone)]
pub struct Position {
    stones: Stones,
    to_play: Color,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// An empty board with black to play.
    pub fn new() -> Position {
        Position {
            stones: empty_stones(),
            to_play: Color::Black,
        }
    }

    pub fn to_play(&self) -> Color {
        self.to_play
    }

    /// Copies out the current stone map.
    pub fn stones(&self) -> Stones {
        self.stones
    }

    /// Plays a move for the side to play, removing any opposing groups left
    /// without liberties. The point must be empty and the move must not be a
    /// suicide.
    pub fn play(&mut self, mv: Move) {
        if let Move::Play(c) = mv {
            let idx = c.index();
            assert!(self.stones[idx].is_none(), "point {c} is occupied");
            let color = self.to_play;
            self.stones[idx] = Some(color);

            let opponent = color.other();
            for n in neighbors(idx) {
                if self.stones[n] == Some(opponent) && !self.has_liberty(n) {
                    self.remove_group(n);
                }
            }
            debug_assert!(self.has_liberty(idx), "suicide at {c}");
        }
        self.to_play = self.to_play.other();
    }

    /// Convenience wrapper for tests and tools: plays "pass" or a GTP
    /// coordinate.
    pub fn play_gtp(&mut self, s: &str) {
        let mv = Move::from_gtp(s).unwrap_or_else(|| panic!("bad move string {s:?}"));
        self.play(mv);
    }

    fn has_liberty(&self, start: usize) -> bool {
        let color = self.stones[start];
        debug_assert!(color.is_some());
        let mut seen = [false; NUM_POINTS];
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(p) = stack.pop() {
            for n in neighbors(p) {
                match self.stones[n] {
                    None => return true,
                    c if c == color && !seen[n] => {
                        seen[n] = true;
                        stack.push(n);
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn remove_group(&mut self, start: usize) {
        let color = self.stones[start];
        let mut stack = vec![start];
        self.stones[start] = None;
        while let Some(p) = stack.pop() {
            for n in neighbors(p) {
                if self.stones[n] == color {
                    self.stones[n] = None;
                    stack.push(n);
                }
            }
        }
    }
}

fn neighbors(idx: usize) -> impl Iterator<Item = usize> {
    let row = idx / N;
    let col = idx % N;
    [
        (row > 0).then(|| idx - N),
        (row + 1 < N).then(|| idx + N),
        (col > 0).then(|| idx - 1),
        (col + 1 < N).then(|| idx + 1),
    ]
    .into_iter()
    .flatten()
}
