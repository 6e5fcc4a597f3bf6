// SPDX-License-Identifier: MIT
// Result assembly: ranked matches joined back to reference metadata and
// flattened into fixed-width output rows.

use std::collections::hash_map::Entry;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::config::MatchConfig;
use crate::normalize::Normalizer;
use crate::orchestrator::{MatchResult, MatchStatus};
use crate::record::{FieldValue, InputRecord, ReferenceRecord};

/// Reference metadata keyed by (blocking key, normalized match text). A
/// candidate is only ever matched inside its own block, so lookups stay in
/// that block too; when several records of a block share a text the first one
/// wins.
#[derive(Debug, Default)]
pub struct ReferenceLookup {
    by_text: FxHashMap<(String, String), (FieldValue, FieldValue)>,
}

impl ReferenceLookup {
    pub fn build(references: &[ReferenceRecord], normalizer: &Normalizer) -> Self {
        let mut by_text: FxHashMap<(String, String), (FieldValue, FieldValue)> = FxHashMap::default();
        let mut dropped = 0usize;
        for record in references {
            let key = normalizer.normalize_key(&record.blocking);
            let text = normalizer.normalize_text(&record.match_parts);
            match by_text.entry((key, text)) {
                Entry::Occupied(kept) => {
                    dropped += 1;
                    let (kept_id, _) = kept.get();
                    if *kept_id != record.id {
                        debug!(
                            "Reference text {:?} in block {:?} is shared by ids {:?} and {:?}; keeping the first",
                            kept.key().1,
                            kept.key().0,
                            kept_id,
                            record.id
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert((record.id.clone(), record.label.clone()));
                }
            }
        }
        if dropped > 0 {
            info!("Reference lookup dropped {} duplicate match texts", dropped);
        }
        ReferenceLookup { by_text }
    }

    /// Identifier and label of the first reference in block `key` with `text`.
    pub fn get(&self, key: &str, text: &str) -> Option<(&FieldValue, &FieldValue)> {
        self.by_text
            .get(&(key.to_string(), text.to_string()))
            .map(|(id, label)| (id, label))
    }

    pub fn len(&self) -> usize {
        self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }
}

/// One rank of an output row. `ref_id`/`ref_label` are `None` when the
/// matched text could not be resolved in the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RankSlot {
    pub matched: String,
    pub score: u8,
    pub ref_id: Option<FieldValue>,
    pub ref_label: Option<FieldValue>,
}

/// Flattened output for one input record.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub passthrough: Vec<FieldValue>,
    /// The normalized text the record was matched with.
    pub merge_value: String,
    /// Exactly k slots; `None` where there was no candidate for that rank.
    pub ranks: Vec<Option<RankSlot>>,
    pub status: MatchStatus,
}

impl JoinedRow {
    /// Cell values in [`OutputSchema`] column order.
    pub fn cells(&self) -> Vec<FieldValue> {
        let mut cells = Vec::with_capacity(self.passthrough.len() + 2 + 4 * self.ranks.len());
        cells.extend(self.passthrough.iter().cloned());
        cells.push(FieldValue::Text(self.merge_value.clone()));
        for slot in &self.ranks {
            match slot {
                Some(slot) => {
                    cells.push(FieldValue::Text(slot.matched.clone()));
                    cells.push(FieldValue::Integer(i64::from(slot.score)));
                    cells.push(slot.ref_id.clone().unwrap_or_default());
                    cells.push(slot.ref_label.clone().unwrap_or_default());
                }
                None => cells.extend(std::iter::repeat(FieldValue::Null).take(4)),
            }
        }
        cells.push(FieldValue::Text(self.status.to_string()));
        cells
    }
}

/// Column names of the joined output:
/// `passthrough..., Merge <match>, Match i, Score i, <id> i, <label> i, ..., status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    pub columns: Vec<String>,
}

impl OutputSchema {
    pub fn from_config(config: &MatchConfig) -> Self {
        let mut columns = config.passthrough_fields.clone();
        columns.push(format!("Merge {}", config.match_field));
        for rank in 1..=config.k {
            columns.push(format!("Match {}", rank));
            columns.push(format!("Score {}", rank));
            columns.push(format!("{} {}", config.id_field, rank));
            columns.push(format!("{} {}", config.label_field, rank));
        }
        columns.push("status".to_string());
        OutputSchema { columns }
    }
}

/// Joins each result with reference metadata. `inputs[i]` must be the record
/// `results[i]` was produced from; output row i corresponds to both. There is
/// always one row per result: a result without its input gets null
/// passthrough cells.
pub fn assemble(results: &[MatchResult], lookup: &ReferenceLookup, inputs: &[InputRecord], k: usize) -> Vec<JoinedRow> {
    if results.len() != inputs.len() {
        warn!(
            "Assembling {} results against {} input records; unpaired rows get null passthrough",
            results.len(),
            inputs.len()
        );
    }
    let passthrough_width = inputs.first().map_or(0, |r| r.passthrough.len());
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let mut ranks: Vec<Option<RankSlot>> = result
                .matches
                .iter()
                .take(k)
                .map(|m| {
                    let meta = lookup.get(&result.key, &m.text);
                    if meta.is_none() {
                        debug!("No reference metadata for matched text {:?}", m.text);
                    }
                    Some(RankSlot {
                        matched: m.text.clone(),
                        score: m.score,
                        ref_id: meta.map(|(id, _)| id.clone()),
                        ref_label: meta.map(|(_, label)| label.clone()),
                    })
                })
                .collect();
            ranks.resize(k, None);
            let passthrough = match inputs.get(i) {
                Some(input) => input.passthrough.clone(),
                None => vec![FieldValue::Null; passthrough_width],
            };
            JoinedRow {
                passthrough,
                merge_value: result.query.clone(),
                ranks,
                status: result.status.clone(),
            }
        })
        .collect()
}

/// Row counts per outcome for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub matched: usize,
    pub no_candidates: usize,
    pub degraded: usize,
    pub lookup_misses: usize,
}

impl BatchSummary {
    pub fn from_rows(rows: &[JoinedRow]) -> Self {
        let mut summary = BatchSummary { rows: rows.len(), ..Default::default() };
        for row in rows {
            match row.status {
                MatchStatus::Matched => summary.matched += 1,
                MatchStatus::NoCandidates => summary.no_candidates += 1,
                MatchStatus::Degraded(_) => summary.degraded += 1,
            }
            summary.lookup_misses += row
                .ranks
                .iter()
                .flatten()
                .filter(|slot| slot.ref_id.is_none())
                .count();
        }
        summary
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows: {} matched, {} without candidates, {} degraded, {} lookup misses",
            self.rows, self.matched, self.no_candidates, self.degraded, self.lookup_misses
        )
    }
}
