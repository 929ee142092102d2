//! SAT oracle for the exact half of the classification.
//!
//! Encodes the revealed clues and the mine budget as CNF and asks, for every
//! frontier cell, whether it can be a mine and whether it can be safe.

use crate::Point;
use crate::grid::{Tile, neighbors_of};
use crate::host::Board;
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap, HashSet};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduced {
    Mine,
    Safe,
    Either,
}

/// Deduces every hidden cell next to a revealed clue, using only the
/// revealed clues and an upper bound of `budget` mines among those cells.
pub fn deduce(board: &Board, revealed: &HashSet<Point>, budget: usize) -> HashMap<Point, Deduced> {
    let hidden_neighbors = |point: Point| -> Vec<Point> {
        neighbors_of(board.width, board.height, point)
            .filter(|n| !revealed.contains(n))
            .collect()
    };

    let clues: Vec<(usize, Vec<Point>)> = revealed
        .iter()
        .filter_map(|&point| match board.tile(point) {
            Tile::Clue(n) => Some((n as usize, hidden_neighbors(point))),
            Tile::Mine | Tile::Unknown => None,
        })
        .collect();
    let frontier: BTreeSet<Point> = clues
        .iter()
        .flat_map(|(_, cells)| cells.iter().copied())
        .collect();

    let mut solver = Solver::new();
    let var_map: HashMap<Point, Var> = frontier.iter().map(|&p| (p, solver.new_var())).collect();
    let lit = |p: &Point| Lit::from_var(var_map[p], true);

    let mut formula = CnfFormula::new();
    for (value, cells) in &clues {
        let lits: Vec<Lit> = cells.iter().map(lit).collect();
        encode_exactly_k(&mut formula, &lits, *value);
    }
    let all: Vec<Lit> = frontier.iter().map(lit).collect();
    encode_at_most_k(&mut formula, &mut solver, &all, budget);
    solver.add_formula(&formula);

    assert!(solver.solve().unwrap(), "revealed clues are unsatisfiable");

    let mut deductions = HashMap::new();
    for point in &frontier {
        let mine = lit(point);

        solver.assume(&[mine]);
        let mine_possible = solver.solve().unwrap();
        solver.assume(&[!mine]);
        let safe_possible = solver.solve().unwrap();
        solver.assume(&[]);

        let state = match (mine_possible, safe_possible) {
            (true, true) => Deduced::Either,
            (true, false) => Deduced::Mine,
            (false, true) => Deduced::Safe,
            (false, false) => unreachable!("satisfiable formula with no model for {point:?}"),
        };
        deductions.insert(*point, state);
    }
    deductions
}

/// Exactly `k` of `lits` are true. Clue neighbourhoods hold at most 8 cells,
/// so the naive subset encoding is small.
fn encode_exactly_k(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    let n = lits.len();
    if k > n {
        formula.add_clause(&[]);
        return;
    }
    // At most k: any k + 1 of them contain a false one.
    for combo in lits.iter().copied().combinations(k + 1) {
        let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
        formula.add_clause(&clause);
    }
    // At least k: any n - k + 1 of them contain a true one.
    if k > 0 {
        for combo in lits.iter().copied().combinations(n - k + 1) {
            formula.add_clause(&combo);
        }
    }
}

/// At most `k` of `lits` are true, as a sequential counter: `s[i][j]` holds
/// when at least `j + 1` of the first `i + 1` literals are true.
fn encode_at_most_k(formula: &mut CnfFormula, solver: &mut Solver, lits: &[Lit], k: usize) {
    let n = lits.len();
    if k >= n {
        return;
    }
    if k == 0 {
        for &lit in lits {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    let mut s: Vec<Vec<Lit>> = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let mut row = Vec::with_capacity(k);
        for _ in 0..k {
            row.push(Lit::from_var(solver.new_var(), true));
        }
        s.push(row);
    }

    formula.add_clause(&[!lits[0], s[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!s[0][j]]);
    }
    for i in 1..n - 1 {
        formula.add_clause(&[!lits[i], s[i][0]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!lits[i], !s[i - 1][j - 1], s[i][j]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
        }
        formula.add_clause(&[!lits[i], !s[i - 1][k - 1]]);
    }
    formula.add_clause(&[!lits[n - 1], !s[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::manager::ChainManager;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;

    #[test]
    fn test_oracle_simple() {
        // A "1" over a single hidden neighbour forces it
        let board = Board::from_mines(3, 1, &[Point::new(1, 0)]);
        let revealed = HashSet::from([Point::new(0, 0)]);
        let deductions = deduce(&board, &revealed, 1);
        assert_eq!(deductions.len(), 1);
        assert_eq!(deductions[&Point::new(1, 0)], Deduced::Mine);
    }

    #[test]
    fn test_oracle_budget_binds() {
        // Two "1"s sharing the middle cell: either the middle is the one
        // mine, or both ends are mines
        let board = Board::from_mines(5, 1, &[Point::new(2, 0)]);
        let revealed = HashSet::from([Point::new(1, 0), Point::new(3, 0)]);

        let open = deduce(&board, &revealed, 2);
        assert_eq!(open.len(), 3);
        assert!(open.values().all(|&d| d == Deduced::Either));

        // A budget of one rules out the two-mine placement
        let tight = deduce(&board, &revealed, 1);
        assert_eq!(tight[&Point::new(0, 0)], Deduced::Safe);
        assert_eq!(tight[&Point::new(2, 0)], Deduced::Mine);
        assert_eq!(tight[&Point::new(4, 0)], Deduced::Safe);

        // The chain engine prunes the same placement
        let mut manager = ChainManager::new(1, Grid::new(&board.rows).unwrap());
        let result = manager.reveal(&[Point::new(1, 0), Point::new(3, 0)]).unwrap();
        assert_eq!(result.flag, vec![Point::new(2, 0)]);
        assert_eq!(result.safe, vec![Point::new(0, 0), Point::new(4, 0)]);
    }

    #[test]
    fn test_at_most_k_counter() {
        // Six free literals, at most two true: three true is rejected
        let mut solver = Solver::new();
        let lits: Vec<Lit> = (0..6).map(|_| Lit::from_var(solver.new_var(), true)).collect();
        let mut formula = CnfFormula::new();
        encode_at_most_k(&mut formula, &mut solver, &lits, 2);
        solver.add_formula(&formula);

        solver.assume(&[lits[0], lits[3]]);
        assert!(solver.solve().unwrap());
        solver.assume(&[lits[0], lits[3], lits[5]]);
        assert!(!solver.solve().unwrap());
        solver.assume(&[lits[1], lits[4], !lits[0], !lits[2], !lits[3], !lits[5]]);
        assert!(solver.solve().unwrap());
    }

    #[test]
    fn test_engine_matches_oracle() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(100 + seed);
            let start = Point::new(0, 0);
            let mines = 6 + (seed as usize % 3);
            let board = Board::random(6, 6, mines, start, &mut rng).unwrap();
            let mut manager = ChainManager::new(mines, Grid::new(&board.rows).unwrap());
            let mut revealed = HashSet::new();
            let mut next = Some(start);

            while let Some(at) = next {
                let batch = board.cascade(at, &revealed);
                revealed.extend(batch.iter().copied());
                let result = manager.reveal(&batch).unwrap();

                let deductions = deduce(&board, &revealed, mines);
                assert_eq!(
                    deductions.keys().copied().collect::<BTreeSet<_>>(),
                    manager.frontier().into_iter().collect::<BTreeSet<_>>(),
                    "seed {seed}"
                );
                for (point, deduced) in &deductions {
                    let flagged = result.flag.contains(point);
                    let safe = result.safe.contains(point);
                    match deduced {
                        Deduced::Mine => assert!(flagged && !safe, "seed {seed}: {point:?}"),
                        Deduced::Safe => assert!(safe && !flagged, "seed {seed}: {point:?}"),
                        Deduced::Either => assert!(!safe && !flagged, "seed {seed}: {point:?}"),
                    }
                }

                let hidden: Vec<Point> = (0..6)
                    .flat_map(|y| (0..6).map(move |x| Point::new(x, y)))
                    .filter(|p| !revealed.contains(p) && !board.is_mine(*p))
                    .collect();
                next = hidden.choose(&mut rng).copied();
            }
        }
    }
}
