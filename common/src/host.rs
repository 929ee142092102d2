//! The host side of the boundary: a concrete board to play on and the
//! bookkeeping needed to drop stale engine responses.

use crate::Point;
use crate::grid::{Fingerprint, Tile, neighbors_of};
use crate::message::{HostMessage, RequestKind, Response};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

/// A fully known board, as the host game holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub rows: Vec<Vec<Tile>>,
}

impl Board {
    /// Places `mines` mines at random, keeping `first_click` and its
    /// neighbours clear so the opening move always cascades.
    pub fn random<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        mines: usize,
        first_click: Point,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let safe_area: HashSet<Point> = neighbors_of(width, height, first_click)
            .chain(std::iter::once(first_click))
            .collect();

        let mut candidates: Vec<Point> = (0..height)
            .flat_map(|y| (0..width).map(move |x| Point { x, y }))
            .filter(|p| !safe_area.contains(p))
            .collect();
        if candidates.len() < mines {
            anyhow::bail!("too_many_mines");
        }

        candidates.shuffle(rng);
        Ok(Board::from_mines(width, height, &candidates[..mines]))
    }

    /// Builds a board with mines at exactly the given points.
    pub fn from_mines(width: usize, height: usize, mines: &[Point]) -> Self {
        let mines: HashSet<Point> = mines.iter().copied().collect();
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let point = Point { x, y };
                        if mines.contains(&point) {
                            Tile::Mine
                        } else {
                            let count = neighbors_of(width, height, point)
                                .filter(|n| mines.contains(n))
                                .count();
                            Tile::Clue(count as u8)
                        }
                    })
                    .collect()
            })
            .collect();

        Board {
            width,
            height,
            mines: mines.len(),
            rows,
        }
    }

    pub fn tile(&self, point: Point) -> Tile {
        self.rows[point.y][point.x]
    }

    pub fn is_mine(&self, point: Point) -> bool {
        self.tile(point) == Tile::Mine
    }

    /// The cells revealed by clicking `start`: the cell itself and, through
    /// empty tiles, everything reachable. Cells in `revealed` are skipped.
    pub fn cascade(&self, start: Point, revealed: &HashSet<Point>) -> Vec<Point> {
        let mut batch = Vec::new();
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);

        while let Some(point) = queue.pop_front() {
            if revealed.contains(&point) {
                continue;
            }
            batch.push(point);

            if self.tile(point) == Tile::Clue(0) {
                for neighbor in neighbors_of(self.width, self.height, point) {
                    if !revealed.contains(&neighbor) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        batch
    }
}

/// Tracks what the host has revealed and which request is live, so that
/// answers computed against an older game state can be discarded.
#[derive(Debug, Clone)]
pub struct Tally {
    width: usize,
    height: usize,
    fingerprint: Fingerprint,
    pending: Option<RequestKind>,
}

impl Tally {
    pub fn new(width: usize, height: usize) -> Self {
        Tally {
            width,
            height,
            fingerprint: Fingerprint::new(width * height),
            pending: None,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn pending(&self) -> Option<RequestKind> {
        self.pending
    }

    /// Records revealed cells and builds the notification for the engine.
    pub fn reveal(&mut self, points: &[Point]) -> HostMessage {
        for p in points {
            if p.x < self.width && p.y < self.height {
                self.fingerprint.mark(p.y * self.width + p.x);
            }
        }
        HostMessage::Reveal(points.to_vec())
    }

    /// Makes `kind` the live request, superseding any earlier one.
    pub fn request(&mut self, kind: RequestKind) -> HostMessage {
        self.pending = Some(kind);
        HostMessage::Request(kind)
    }

    /// The response's cells if it answers the live request against the
    /// current reveals; `None` if it is stale.
    pub fn accept(&mut self, response: Response) -> Option<Vec<Point>> {
        if self.pending != Some(response.kind) {
            return None;
        }
        if self.fingerprint.words() != response.fingerprint.as_slice() {
            return None;
        }
        self.pending = None;
        Some(response.cells)
    }
}
