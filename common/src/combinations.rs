//! Enumerates every way of choosing `k` items out of `n`.

use itertools::Itertools;

/// One way of splitting a candidate list: `chosen` holds exactly `k` items,
/// `rest` holds the other `n - k`, both in candidate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<T> {
    pub chosen: Vec<T>,
    pub rest: Vec<T>,
}

/// Every `(chosen, rest)` split of `items` with exactly `k` chosen.
///
/// Returns `None` when `k > items.len()`. `k == 0` yields a single split with
/// nothing chosen, so an empty result is never produced for a valid `k`.
pub fn choose<T: Clone>(items: &[T], k: usize) -> Option<Vec<Split<T>>> {
    let n = items.len();
    if k > n {
        return None;
    }
    if k == 0 {
        return Some(vec![Split {
            chosen: Vec::new(),
            rest: items.to_vec(),
        }]);
    }

    let splits = (0..n)
        .combinations(k)
        .map(|picked| {
            let mut chosen = Vec::with_capacity(k);
            let mut rest = Vec::with_capacity(n - k);
            let mut picked = picked.into_iter().peekable();
            for (i, item) in items.iter().enumerate() {
                if picked.next_if_eq(&i).is_some() {
                    chosen.push(item.clone());
                } else {
                    rest.push(item.clone());
                }
            }
            Split { chosen, rest }
        })
        .collect();

    Some(splits)
}
