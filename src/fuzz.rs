// SPDX-License-Identifier: MIT
// Fuzz scorers: ratio, token_sort_ratio, token_set_ratio.
// Scores are integers in 0..=100, computed without floating point so that
// every run and every thread produces the same value.

use crate::algorithms as alg;
use crate::types::{dispatch_pair, Seq};

/// Indel similarity scaled to 0..=100, rounded half up.
fn indel_score(s1: &str, s2: &str) -> u8 {
    let a = Seq::new(s1);
    let b = Seq::new(s2);
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    let lensum = a.len() + b.len();
    let dist = dispatch_pair!(alg::indel_distance, &a, &b);
    let kept = lensum - dist;
    ((200 * kept + lensum) / (2 * lensum)) as u8
}

/// Empty handling shared by every scorer: two empties are identical, a single
/// empty side matches nothing.
fn degenerate(s1: &str, s2: &str) -> Option<u8> {
    match (s1.is_empty(), s2.is_empty()) {
        (true, true) => Some(100),
        (true, false) | (false, true) => Some(0),
        _ => None,
    }
}

fn lower_tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_lowercase).collect()
}

/// Lower-cased whitespace tokens, sorted and joined by a single space.
pub fn tokens_sort_key(s: &str) -> String {
    let mut tokens = lower_tokens(s);
    tokens.sort_unstable();
    tokens.join(" ")
}

// ===========================================================================
// ratio
// ===========================================================================

/// Plain indel ratio on trimmed, lower-cased text. Word order matters.
pub fn ratio(s1: &str, s2: &str) -> u8 {
    let a = s1.trim().to_lowercase();
    let b = s2.trim().to_lowercase();
    degenerate(&a, &b).unwrap_or_else(|| indel_score(&a, &b))
}

// ===========================================================================
// token_sort_ratio
// ===========================================================================

/// Ratio of the sorted token strings, so "Main St 1" and "1 main st" score 100.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u8 {
    let a = tokens_sort_key(s1);
    let b = tokens_sort_key(s2);
    degenerate(&a, &b).unwrap_or_else(|| indel_score(&a, &b))
}

// ===========================================================================
// token_set_ratio
// ===========================================================================

fn tokens_to_set_intersection_diff(s1: &str, s2: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut tokens1 = lower_tokens(s1);
    let mut tokens2 = lower_tokens(s2);
    tokens1.sort_unstable();
    tokens1.dedup();
    tokens2.sort_unstable();
    tokens2.dedup();

    let intersection: Vec<String> = tokens1
        .iter()
        .filter(|t| tokens2.binary_search(t).is_ok())
        .cloned()
        .collect();
    let diff1: Vec<String> = tokens1
        .iter()
        .filter(|t| tokens2.binary_search(t).is_err())
        .cloned()
        .collect();
    let diff2: Vec<String> = tokens2
        .into_iter()
        .filter(|t| tokens1.binary_search(t).is_err())
        .collect();
    (intersection, diff1, diff2)
}

fn join_nonempty(head: &str, tail: &[String]) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (_, true) => head.to_string(),
        (true, false) => tail.join(" "),
        (false, false) => format!("{} {}", head, tail.join(" ")),
    }
}

/// Best of the three pairwise ratios between the shared tokens and each
/// side's shared-plus-remaining tokens. A string whose tokens are a subset of
/// the other's scores 100.
pub fn token_set_ratio(s1: &str, s2: &str) -> u8 {
    let (intersection, diff1, diff2) = tokens_to_set_intersection_diff(s1, s2);
    let set1_empty = intersection.is_empty() && diff1.is_empty();
    let set2_empty = intersection.is_empty() && diff2.is_empty();
    if let Some(score) = degenerate_sets(set1_empty, set2_empty) {
        return score;
    }

    let sect = intersection.join(" ");
    let combined1 = join_nonempty(&sect, &diff1);
    let combined2 = join_nonempty(&sect, &diff2);

    let mut best = indel_score(&combined1, &combined2);
    if !sect.is_empty() {
        best = best
            .max(indel_score(&sect, &combined1))
            .max(indel_score(&sect, &combined2));
    }
    best
}

fn degenerate_sets(empty1: bool, empty2: bool) -> Option<u8> {
    match (empty1, empty2) {
        (true, true) => Some(100),
        (true, false) | (false, true) => Some(0),
        _ => None,
    }
}
