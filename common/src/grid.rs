//! Grid model: cell adjacency, clue storage and the reveal fingerprint.

use crate::Point;
use std::collections::HashSet;

/// Number of bits packed into each fingerprint word. 53 keeps every word
/// exactly representable as a JavaScript number.
pub const WORD_BITS: usize = 53;

/// The value the engine is told about a cell at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    /// Count of mines among the 8 neighbours; 0 is the "empty" tile.
    Clue(u8),
    Mine,
    /// A cell the engine must not assume anything about.
    Unknown,
}

#[derive(Debug, Clone)]
struct Square {
    tile: Tile,
    revealed: bool,
    neighbors: Vec<usize>,
    /// Neighbours that are still hidden. Shrinks as cells are revealed.
    hidden: HashSet<usize>,
}

/// Adjacency grid addressed by flattened index `y * width + x`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    squares: Vec<Square>,
}

impl Grid {
    /// Builds the grid from rows of tiles. Rows must be non-empty and of equal
    /// length, and clues cannot exceed 8.
    pub fn new(rows: &[Vec<Tile>]) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            anyhow::bail!("empty_grid");
        }
        if rows.iter().any(|row| row.len() != width) {
            anyhow::bail!("ragged_rows");
        }
        if rows.iter().flatten().any(|tile| matches!(tile, Tile::Clue(n) if *n > 8)) {
            anyhow::bail!("clue_out_of_range");
        }

        let squares = rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter().enumerate().map(move |(x, &tile)| {
                    let neighbors: Vec<usize> = neighbors_of(width, height, Point { x, y })
                        .map(|p| p.y * width + p.x)
                        .collect();
                    Square {
                        tile,
                        revealed: false,
                        hidden: neighbors.iter().copied().collect(),
                        neighbors,
                    }
                })
            })
            .collect();

        Ok(Grid {
            width,
            height,
            squares,
        })
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// Flattened index of `point`, or `None` when it lies outside the grid.
    pub fn index(&self, point: Point) -> Option<usize> {
        (point.x < self.width && point.y < self.height).then(|| point.y * self.width + point.x)
    }

    pub fn point(&self, idx: usize) -> Point {
        Point {
            x: idx % self.width,
            y: idx / self.width,
        }
    }

    pub fn tile(&self, idx: usize) -> Tile {
        self.squares[idx].tile
    }

    /// The clue shown by the cell, if it has one.
    pub fn clue(&self, idx: usize) -> Option<usize> {
        match self.squares[idx].tile {
            Tile::Clue(n) => Some(n as usize),
            Tile::Mine | Tile::Unknown => None,
        }
    }

    pub fn is_revealed(&self, idx: usize) -> bool {
        self.squares[idx].revealed
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.squares[idx].neighbors
    }

    pub fn hidden_neighbors(&self, idx: usize) -> &HashSet<usize> {
        &self.squares[idx].hidden
    }

    /// Marks the cell revealed and drops it from each neighbour's hidden set.
    pub fn reveal(&mut self, idx: usize) {
        self.squares[idx].revealed = true;
        for i in 0..self.squares[idx].neighbors.len() {
            let neigh = self.squares[idx].neighbors[i];
            self.squares[neigh].hidden.remove(&idx);
        }
    }
}

/// All valid neighbour coordinates of `point`, clipped at the board edges.
pub fn neighbors_of(width: usize, height: usize, point: Point) -> impl Iterator<Item = Point> {
    (-1..=1).flat_map(move |dy| {
        (-1..=1).filter_map(move |dx| {
            if dx == 0 && dy == 0 {
                return None;
            }

            let nx = point.x as isize + dx;
            let ny = point.y as isize + dy;

            if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                Some(Point {
                    x: nx as usize,
                    y: ny as usize,
                })
            } else {
                None
            }
        })
    })
}

/// Monotonically growing bit-vector of revealed cells. Cell `i` lives in bit
/// `i % WORD_BITS` of word `i / WORD_BITS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint {
    words: Vec<u64>,
}

impl Fingerprint {
    pub fn new(cells: usize) -> Self {
        Fingerprint {
            words: vec![0; cells.div_ceil(WORD_BITS)],
        }
    }

    pub fn mark(&mut self, idx: usize) {
        self.words[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
    }

    pub fn is_marked(&self, idx: usize) -> bool {
        self.words
            .get(idx / WORD_BITS)
            .is_some_and(|word| word & (1u64 << (idx % WORD_BITS)) != 0)
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl From<Vec<u64>> for Fingerprint {
    fn from(words: Vec<u64>) -> Self {
        Fingerprint { words }
    }
}
