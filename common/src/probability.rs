//! Keeps the latest classification and answers requests from it.

use crate::Point;
use crate::grid::{Fingerprint, Grid, Tile};
use crate::manager::{ChainManager, Classification};
use crate::message::{RequestKind, Response};

pub struct Probabilities {
    manager: ChainManager,
    latest: Classification,
    fingerprint: Fingerprint,
}

impl Probabilities {
    /// Seeds the engine for a new game from the mine budget and clue rows.
    pub fn new(max_mines: usize, rows: &[Vec<Tile>]) -> anyhow::Result<Self> {
        let grid = Grid::new(rows)?;
        if max_mines > grid.len() {
            anyhow::bail!("mine_budget_exceeds_board");
        }
        let fingerprint = Fingerprint::new(grid.len());
        Ok(Probabilities {
            manager: ChainManager::new(max_mines, grid),
            latest: Classification::default(),
            fingerprint,
        })
    }

    pub fn manager(&self) -> &ChainManager {
        &self.manager
    }

    pub fn latest(&self) -> &Classification {
        &self.latest
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Feeds newly revealed cells to the engine. Cells that are off the board
    /// or already revealed are ignored; a batch with nothing new is a no-op.
    pub fn add_squares(&mut self, batch: &[Point]) {
        if batch.is_empty() {
            return;
        }

        let fresh = self.manager.fresh(batch);
        if let Some(classification) = self.manager.reveal(batch) {
            self.latest = classification;
            for idx in fresh {
                self.fingerprint.mark(idx);
            }
        }
    }

    /// The cells for `kind` from the latest classification. Never recomputes.
    pub fn fulfill_request(&self, kind: RequestKind) -> Response {
        let cells = match kind {
            RequestKind::Safes => &self.latest.safe,
            RequestKind::Flags => &self.latest.flag,
            RequestKind::Lowest => &self.latest.lowest,
        };
        Response {
            kind,
            fingerprint: self.fingerprint.words().to_vec(),
            cells: cells.clone(),
        }
    }

    /// Estimated mine probability of a hidden cell, exact on the frontier.
    pub fn mine_probability(&self, point: Point) -> Option<f64> {
        self.latest
            .probability(point, self.manager.is_unused(point))
    }
}
