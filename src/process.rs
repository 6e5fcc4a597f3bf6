// SPDX-License-Identifier: MIT
// Scorer selection and top-K extraction over a candidate partition.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::blocking::Candidate;
use crate::fuzz::{ratio, token_set_ratio, token_sort_ratio};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Ratio,
    #[default]
    TokenSortRatio,
    TokenSetRatio,
}

impl ScorerKind {
    pub fn score(self, s1: &str, s2: &str) -> u8 {
        match self {
            ScorerKind::Ratio => ratio(s1, s2),
            ScorerKind::TokenSortRatio => token_sort_ratio(s1, s2),
            ScorerKind::TokenSetRatio => token_set_ratio(s1, s2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScorerKind::Ratio => "ratio",
            ScorerKind::TokenSortRatio => "token_sort_ratio",
            ScorerKind::TokenSetRatio => "token_set_ratio",
        }
    }
}

/// A candidate together with its score against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored<'p> {
    pub candidate: &'p Candidate,
    pub score: u8,
}

// Higher score first, then earlier position in the partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScoreItem {
    score: u8,
    idx: usize,
}

impl Ord for ScoreItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for ScoreItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const SMALL_PARTITION: usize = 256;

/// Best `limit` candidates for `query`, highest score first. Equal scores keep
/// their partition order, so the result does not depend on how the batch was
/// split. Returns fewer than `limit` entries when the partition is smaller,
/// and nothing for an empty partition.
pub fn extract<'p>(query: &str, choices: &'p [Candidate], scorer: ScorerKind, limit: usize) -> Vec<Scored<'p>> {
    if limit == 0 || choices.is_empty() {
        return Vec::new();
    }

    if choices.len() <= SMALL_PARTITION || limit >= choices.len() {
        let mut results: Vec<Scored<'p>> = choices
            .iter()
            .map(|candidate| Scored { candidate, score: scorer.score(query, &candidate.text) })
            .collect();
        // stable: ties stay in partition order
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.truncate(limit);
        return results;
    }

    let mut heap: BinaryHeap<Reverse<ScoreItem>> = BinaryHeap::with_capacity(limit);
    for (idx, candidate) in choices.iter().enumerate() {
        let item = ScoreItem { score: scorer.score(query, &candidate.text), idx };
        if heap.len() < limit {
            heap.push(Reverse(item));
        } else if let Some(mut worst) = heap.peek_mut() {
            if item > worst.0 {
                worst.0 = item;
            }
        }
    }

    let mut items: Vec<ScoreItem> = heap.into_iter().map(|Reverse(item)| item).collect();
    items.sort_unstable_by(|a, b| b.cmp(a));
    items
        .into_iter()
        .map(|item| Scored { candidate: &choices[item.idx], score: item.score })
        .collect()
}
