//! The forest of constraint chains.
//!
//! Each chain is one internally consistent partial mine assignment. A child
//! refines its parent with the clues of one reveal batch, so every leaf is a
//! complete candidate placement for the frontier processed so far. Chains live
//! in an arena and are addressed by [`ChainId`]; the parent link is a plain
//! handle, and removing a chain removes its whole subtree.

use crate::combinations::choose;
use std::collections::HashSet;

/// Handle of a chain in the [`Forest`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(usize);

#[derive(Debug, Clone)]
pub struct Chain {
    /// Every cell this branch asserts is a mine, including inherited ones.
    pub mines: HashSet<usize>,
    /// Mines asserted at this node only.
    pub new_mines: Vec<usize>,
    /// Every cell this branch asserts is safe.
    pub safes: HashSet<usize>,
    pub parent: Option<ChainId>,
    pub children: Vec<ChainId>,
    /// Number of leaf descendants, or 1 for a leaf. Only valid after
    /// [`Forest::count_leaves`].
    pub leaves: usize,
}

impl Chain {
    fn root() -> Self {
        Chain {
            mines: HashSet::new(),
            new_mines: Vec::new(),
            safes: HashSet::new(),
            parent: None,
            children: Vec::new(),
            leaves: 1,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A revealed clue as seen by the extension step: the clue value and the
/// cell's hidden neighbours at the time of extension.
#[derive(Debug, Clone)]
pub struct Clue {
    pub value: usize,
    pub hidden: Vec<usize>,
}

/// Cells a pending child adds on top of its parent chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
    pub mines: HashSet<usize>,
    pub safes: HashSet<usize>,
}

#[derive(Debug)]
pub struct Forest {
    nodes: Vec<Option<Chain>>,
    free: Vec<usize>,
    max_mines: usize,
}

impl Forest {
    pub fn new(max_mines: usize) -> Self {
        Forest {
            nodes: vec![Some(Chain::root())],
            free: Vec::new(),
            max_mines,
        }
    }

    pub fn root(&self) -> ChainId {
        ChainId(0)
    }

    pub fn max_mines(&self) -> usize {
        self.max_mines
    }

    pub fn contains(&self, id: ChainId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    /// Panics if `id` was removed; handles are only held while they are live.
    pub fn get(&self, id: ChainId) -> &Chain {
        match self.nodes.get(id.0) {
            Some(Some(chain)) => chain,
            _ => panic!("chain {id:?} is not in the forest"),
        }
    }

    fn get_mut(&mut self, id: ChainId) -> &mut Chain {
        match self.nodes.get_mut(id.0) {
            Some(Some(chain)) => chain,
            _ => panic!("chain {id:?} is not in the forest"),
        }
    }

    /// All live chains, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|chain| (ChainId(i), chain)))
    }

    /// Leaf count of the root, or 0 when the root has no children.
    pub fn total_chains(&self) -> usize {
        let root = self.get(self.root());
        if root.is_leaf() { 0 } else { root.leaves }
    }

    pub fn leaves(&self) -> Vec<ChainId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let chain = self.get(id);
            if chain.is_leaf() {
                leaves.push(id);
            } else {
                stack.extend(chain.children.iter().rev());
            }
        }
        leaves
    }

    /// Every way the clues of one reveal batch can extend `id`.
    ///
    /// Clues are folded in order: each one refines all partial extensions
    /// produced by the clues before it. An empty result means the chain
    /// contradicts the batch.
    pub fn extend(&self, id: ChainId, clues: &[Clue]) -> Vec<Extension> {
        let chain = self.get(id);
        let mut partials = vec![Extension::default()];

        for clue in clues {
            partials = partials
                .into_iter()
                .flat_map(|partial| self.refine(chain, partial, clue))
                .collect();
            if partials.is_empty() {
                break;
            }
        }

        partials
    }

    fn refine(&self, chain: &Chain, partial: Extension, clue: &Clue) -> Vec<Extension> {
        let is_mine = |cell: &usize| chain.mines.contains(cell) || partial.mines.contains(cell);
        let is_safe = |cell: &usize| chain.safes.contains(cell) || partial.safes.contains(cell);

        let adj_mines = clue.hidden.iter().filter(|c| is_mine(c)).count();
        let available: Vec<usize> = clue
            .hidden
            .iter()
            .copied()
            .filter(|c| !is_mine(c) && !is_safe(c))
            .collect();

        let Some(needed) = clue.value.checked_sub(adj_mines) else {
            return Vec::new();
        };
        if chain.mines.len() + partial.mines.len() + needed > self.max_mines {
            return Vec::new();
        }
        let Some(splits) = choose(&available, needed) else {
            return Vec::new();
        };

        splits
            .into_iter()
            .map(|split| {
                let mut next = partial.clone();
                next.mines.extend(split.chosen);
                next.safes.extend(split.rest);
                next
            })
            .collect()
    }

    /// Adds a child under `parent` carrying `extension` on top of the
    /// parent's assignment.
    pub fn attach(&mut self, parent: ChainId, extension: Extension) -> ChainId {
        let base = self.get(parent);
        let mut mines = base.mines.clone();
        let mut safes = base.safes.clone();
        let mut new_mines: Vec<usize> = extension.mines.into_iter().collect();
        new_mines.sort_unstable();
        mines.extend(new_mines.iter().copied());
        safes.extend(extension.safes);

        let child = Chain {
            mines,
            new_mines,
            safes,
            parent: Some(parent),
            children: Vec::new(),
            leaves: 1,
        };

        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(child);
                ChainId(slot)
            }
            None => {
                self.nodes.push(Some(child));
                ChainId(self.nodes.len() - 1)
            }
        };
        self.get_mut(parent).children.push(id);
        id
    }

    /// Removes `id` and its subtree. If that would leave its parent without
    /// children, the parent is removed instead, and so on up to a node with
    /// other children or the root. Returns every removed chain.
    ///
    /// Panics if the root itself would be removed: the revealed clues then
    /// contradict each other, which a consistent board cannot produce.
    pub fn remove(&mut self, id: ChainId) -> Vec<(ChainId, Chain)> {
        let mut target = id;
        loop {
            let parent = self.get(target).parent;
            match parent {
                None => panic!("root chain removed: revealed clues are contradictory"),
                Some(parent) if parent != self.root() && self.get(parent).children.len() == 1 => {
                    target = parent;
                }
                Some(parent) => {
                    self.get_mut(parent).children.retain(|&c| c != target);
                    break;
                }
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![target];
        while let Some(next) = stack.pop() {
            if let Some(chain) = self.nodes[next.0].take() {
                stack.extend(chain.children.iter().copied());
                self.free.push(next.0);
                removed.push((next, chain));
            }
        }
        removed
    }

    /// Recomputes every chain's leaf count bottom-up.
    pub fn count_leaves(&mut self) {
        let mut order = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(id).children.iter().copied());
        }

        // Children always come after their parent in `order`.
        for &id in order.iter().rev() {
            let chain = self.get(id);
            let leaves = if chain.is_leaf() {
                1
            } else {
                chain.children.iter().map(|&c| self.get(c).leaves).sum()
            };
            self.get_mut(id).leaves = leaves;
        }
    }
}
