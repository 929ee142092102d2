//! Owns the chain forest and runs the incremental reveal algorithm.

use crate::Point;
use crate::chain::{Chain, ChainId, Clue, Forest};
use crate::grid::{Grid, Tile};
use std::collections::{HashMap, HashSet};

/// Tolerance for the unused-cell density comparisons.
pub const EPSILON: f64 = 1e-4;

/// The outcome of one classification pass. Point lists are sorted by row,
/// then column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Cells that are mine-free in every consistent placement.
    pub safe: Vec<Point>,
    /// Cells that are a mine in every consistent placement.
    pub flag: Vec<Point>,
    /// Cells with the lowest estimated mine probability.
    pub lowest: Vec<Point>,
    /// Number of consistent placements (leaf chains).
    pub total: usize,
    /// Frontier cell -> number of placements in which it is a mine.
    pub weights: HashMap<Point, usize>,
    /// Estimated mine density of the unused cells, if there are any.
    pub density: Option<f64>,
}

impl Classification {
    /// Estimated mine probability of `point`: exact for frontier cells, the
    /// unused density otherwise. `None` for cells outside both.
    pub fn probability(&self, point: Point, unused: bool) -> Option<f64> {
        match self.weights.get(&point) {
            Some(&weight) => Some(weight as f64 / self.total as f64),
            None if unused => self.density,
            None => None,
        }
    }
}

pub struct ChainManager {
    grid: Grid,
    forest: Forest,
    /// Cell -> chains whose new mines include the cell.
    index: HashMap<usize, HashSet<ChainId>>,
    /// Hidden cells next to a revealed clue.
    frontier: HashSet<usize>,
    revealed: HashSet<usize>,
    /// Hidden cells with no revealed clue next to them.
    unused: HashSet<usize>,
}

impl ChainManager {
    pub fn new(max_mines: usize, grid: Grid) -> Self {
        let unused = (0..grid.len()).collect();
        ChainManager {
            grid,
            forest: Forest::new(max_mines),
            index: HashMap::new(),
            frontier: HashSet::new(),
            revealed: HashSet::new(),
            unused,
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn max_mines(&self) -> usize {
        self.forest.max_mines()
    }

    pub fn frontier(&self) -> Vec<Point> {
        self.points(&self.frontier)
    }

    pub fn unused(&self) -> Vec<Point> {
        self.points(&self.unused)
    }

    pub fn is_unused(&self, point: Point) -> bool {
        self.grid
            .index(point)
            .is_some_and(|idx| self.unused.contains(&idx))
    }

    fn points(&self, cells: &HashSet<usize>) -> Vec<Point> {
        let mut points: Vec<Point> = cells.iter().map(|&idx| self.grid.point(idx)).collect();
        points.sort_by_key(|p| (p.y, p.x));
        points
    }

    /// Keeps the cells of `batch` that are on the board, not yet revealed and
    /// not mines, in batch order and without duplicates.
    ///
    /// A revealed mine ends the game; it carries no clue and must not
    /// invalidate the chains that predicted it.
    pub fn fresh(&self, batch: &[Point]) -> Vec<usize> {
        let mut seen = HashSet::new();
        batch
            .iter()
            .filter_map(|&point| self.grid.index(point))
            .filter(|&idx| !self.revealed.contains(&idx) && self.grid.tile(idx) != Tile::Mine)
            .filter(|&idx| seen.insert(idx))
            .collect()
    }

    /// Processes a batch of revealed cells and reclassifies the frontier.
    ///
    /// Returns `None` if nothing in the batch was newly revealed, in which case
    /// no state changes.
    pub fn reveal(&mut self, batch: &[Point]) -> Option<Classification> {
        let cells = self.fresh(batch);
        if cells.is_empty() {
            return None;
        }

        self.invalidate(&cells);
        self.forest.count_leaves();

        let clues = self.uncover(&cells);
        if !clues.is_empty() {
            self.grow(&clues);
            self.forest.count_leaves();
        }

        Some(self.classify(self.mean_mines()))
    }

    /// Removes every chain that asserted one of `cells` is a mine.
    fn invalidate(&mut self, cells: &[usize]) {
        for cell in cells {
            let mut ids: Vec<ChainId> = match self.index.get(cell) {
                Some(ids) => ids.iter().copied().collect(),
                None => continue,
            };
            ids.sort_unstable();

            for id in ids {
                if self.forest.contains(id) {
                    let removed = self.forest.remove(id);
                    self.sweep(removed);
                }
            }
        }
    }

    fn sweep(&mut self, removed: Vec<(ChainId, Chain)>) {
        for (id, chain) in removed {
            for cell in chain.new_mines {
                if let Some(ids) = self.index.get_mut(&cell) {
                    ids.remove(&id);
                    if ids.is_empty() {
                        self.index.remove(&cell);
                    }
                }
            }
        }
    }

    /// Reveals `cells` on the grid, moves their hidden neighbours into the
    /// frontier, and returns the clues the batch uncovered.
    fn uncover(&mut self, cells: &[usize]) -> Vec<Clue> {
        for &cell in cells {
            self.grid.reveal(cell);
            self.revealed.insert(cell);
            self.frontier.remove(&cell);
            self.unused.remove(&cell);
        }

        let mut clues = Vec::new();
        for &cell in cells {
            let Some(value) = self.grid.clue(cell) else {
                continue;
            };

            let mut hidden: Vec<usize> = self.grid.hidden_neighbors(cell).iter().copied().collect();
            hidden.sort_unstable();
            for &neigh in &hidden {
                self.frontier.insert(neigh);
                self.unused.remove(&neigh);
            }
            clues.push(Clue { value, hidden });
        }
        clues
    }

    /// Extends every leaf with the batch's clues, dropping leaves the batch
    /// contradicts.
    fn grow(&mut self, clues: &[Clue]) {
        for leaf in self.forest.leaves() {
            if !self.forest.contains(leaf) {
                continue;
            }

            let extensions = self.forest.extend(leaf, clues);
            if extensions.is_empty() {
                let removed = self.forest.remove(leaf);
                self.sweep(removed);
                continue;
            }

            for extension in extensions {
                let child = self.forest.attach(leaf, extension);
                for &cell in &self.forest.get(child).new_mines {
                    self.index.entry(cell).or_default().insert(child);
                }
            }
        }
    }

    fn mean_mines(&self) -> f64 {
        let leaves = self.forest.leaves();
        let mines: usize = leaves
            .iter()
            .map(|&id| self.forest.get(id).mines.len())
            .sum();
        mines as f64 / leaves.len() as f64
    }

    /// Number of placements in which `cell` is a mine.
    fn weight(&self, cell: usize) -> usize {
        self.index.get(&cell).map_or(0, |ids| {
            ids.iter().map(|&id| self.forest.get(id).leaves).sum()
        })
    }

    /// Classifies the frontier exactly and the unused cells by their average
    /// density, given the mean mine count of the current leaves.
    pub fn classify(&self, mean_mines: f64) -> Classification {
        let total = self.forest.total_chains();
        let mut weights = HashMap::new();
        let mut safe = Vec::new();
        let mut flag = Vec::new();
        let mut lowest = Vec::new();

        // A degenerate forest carries no constraints, so nothing is classified.
        let mut min_weight = None;
        if total > 0 {
            for &cell in &self.frontier {
                weights.insert(self.grid.point(cell), self.weight(cell));
            }
            min_weight = weights.values().copied().min();
            for (&point, &weight) in &weights {
                if weight == 0 {
                    safe.push(point);
                }
                if weight == total {
                    flag.push(point);
                }
                if Some(weight) == min_weight {
                    lowest.push(point);
                }
            }
        }

        let density = (!self.unused.is_empty())
            .then(|| (self.max_mines() as f64 - mean_mines) / self.unused.len() as f64);

        if let Some(density) = density {
            let unused = self.unused();
            match min_weight {
                Some(min) => {
                    let min_probability = min as f64 / total as f64;
                    if (density - min_probability).abs() < EPSILON {
                        lowest.extend(unused.iter().copied());
                    } else if min_probability > density {
                        lowest = unused.clone();
                    }
                }
                None => lowest = unused.clone(),
            }
            if density.abs() < EPSILON {
                safe.extend(unused.iter().copied());
            }
            if (density - 1.0).abs() < EPSILON {
                flag.extend(unused.iter().copied());
            }
        }

        for points in [&mut safe, &mut flag, &mut lowest] {
            points.sort_by_key(|p| (p.y, p.x));
        }

        Classification {
            safe,
            flag,
            lowest,
            total,
            weights,
            density,
        }
    }
}
