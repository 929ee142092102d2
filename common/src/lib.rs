//! Incremental probabilistic minesweeper engine.
//!
//! The engine is told the full clue grid up front and exposes only what the
//! revealed cells prove. Every mine placement consistent with the revealed
//! clues is kept as a leaf of a forest of constraint chains, so each reveal
//! refines the forest instead of solving the board again from scratch.

pub mod chain;
pub mod combinations;
pub mod engine;
pub mod grid;
pub mod host;
pub mod manager;
pub mod message;
pub mod probability;

#[cfg(test)]
mod oracle;

pub use engine::{Engine, Worker, spawn};
pub use grid::{Fingerprint, Grid, Tile};
pub use manager::{ChainManager, Classification};
pub use message::{HostMessage, RequestKind, Response};
pub use probability::Probabilities;

/// Represents a 2D coordinate on the minesweeper board: `x` is the column,
/// `y` the row, both 0-indexed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}
