// SPDX-License-Identifier: MIT
// Parallel match orchestration.
//
// The input set is cut into contiguous chunks, one rayon task per chunk. Tasks
// only read the candidate pool; their outputs are concatenated in chunk order
// after the join, so results line up with the input regardless of which task
// finishes first.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::blocking::CandidatePool;
use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::normalize::Normalizer;
use crate::process::extract;
use crate::record::InputRecord;

/// One ranked candidate for an input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the matched record in the reference dataset.
    pub position: usize,
    /// Normalized match text of the reference record.
    pub text: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStatus {
    Matched,
    /// No reference record shares the blocking key.
    NoCandidates,
    /// The record could not be matched; carries the reason.
    Degraded(String),
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Matched => f.write_str("matched"),
            MatchStatus::NoCandidates => f.write_str("no_candidates"),
            MatchStatus::Degraded(reason) => write!(f, "degraded: {}", reason),
        }
    }
}

/// Outcome for a single input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Normalized blocking key the record was looked up under.
    pub key: String,
    /// Normalized match text used as the query.
    pub query: String,
    /// Up to k matches, best first.
    pub matches: Vec<Match>,
    pub status: MatchStatus,
}

impl MatchResult {
    fn degraded(query: String, reason: String) -> Self {
        MatchResult {
            key: String::new(),
            query,
            matches: Vec::new(),
            status: MatchStatus::Degraded(reason),
        }
    }
}

/// Size of each contiguous chunk so that there are at most `workers` chunks
/// and never more chunks than records.
pub fn chunk_size(len: usize, workers: usize) -> usize {
    let chunks = workers.clamp(1, len.max(1));
    len.div_ceil(chunks).max(1)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct Orchestrator<'a> {
    pool: &'a CandidatePool,
    config: &'a MatchConfig,
    normalizer: Normalizer,
}

impl<'a> Orchestrator<'a> {
    pub fn new(pool: &'a CandidatePool, config: &'a MatchConfig) -> Self {
        Orchestrator {
            pool,
            config,
            normalizer: Normalizer::from_config(config),
        }
    }

    fn try_match(&self, record: &InputRecord) -> Result<MatchResult> {
        let key = self
            .normalizer
            .try_normalize_key(&self.config.blocking_field, &record.blocking)?;
        let query = self
            .normalizer
            .try_normalize_text(&self.config.match_field, &record.match_parts)?;

        let partition = self.pool.partition(&key);
        if partition.is_empty() {
            return Ok(MatchResult {
                key,
                query,
                matches: Vec::new(),
                status: MatchStatus::NoCandidates,
            });
        }

        let matches = extract(&query, partition, self.config.scorer, self.config.k)
            .into_iter()
            .map(|scored| Match {
                position: scored.candidate.position,
                text: scored.candidate.text.clone(),
                score: scored.score,
            })
            .collect();
        Ok(MatchResult {
            key,
            query,
            matches,
            status: MatchStatus::Matched,
        })
    }

    /// Matches one record. Errors and panics are contained here: the record
    /// gets an empty, degraded result and the rest of the batch carries on.
    pub fn match_record(&self, index: usize, record: &InputRecord) -> MatchResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_match(record))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Record {}: {}; emitting an empty match", index, e);
                let query = self
                    .normalizer
                    .try_normalize_text(&self.config.match_field, &record.match_parts)
                    .unwrap_or_default();
                MatchResult::degraded(query, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Record {} panicked during matching: {}", index, message);
                MatchResult::degraded(String::new(), format!("panic: {}", message))
            }
        }
    }

    /// One result per input record, in input order.
    pub fn run(&self, inputs: &[InputRecord]) -> Result<Vec<MatchResult>> {
        if inputs.is_empty() {
            info!("No input records to match");
            return Ok(Vec::new());
        }

        let workers = self.config.effective_workers().max(1);
        let size = chunk_size(inputs.len(), workers);
        let chunks: Vec<(usize, &[InputRecord])> = inputs
            .chunks(size)
            .enumerate()
            .map(|(i, chunk)| (i * size, chunk))
            .collect();
        debug!(
            "Dispatching {} records as {} chunks of up to {} on {} workers",
            inputs.len(),
            chunks.len(),
            size,
            workers
        );

        // one thread per chunk; never more than there is work for
        let threads = chunks.len();
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| MatchError::WorkerPool(e.to_string()))?;

        let started = Instant::now();
        let per_chunk: Vec<Vec<MatchResult>> = thread_pool.install(|| {
            chunks
                .par_iter()
                .map(|&(offset, chunk)| {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(i, record)| self.match_record(offset + i, record))
                        .collect::<Vec<_>>()
                })
                .collect()
        });

        let results: Vec<MatchResult> = per_chunk.into_iter().flatten().collect();
        info!(
            "Matched {} records in {} chunks on {} threads in {:.2?}",
            results.len(),
            chunks.len(),
            threads,
            started.elapsed()
        );
        Ok(results)
    }
}

/// Validates `config` and matches every input record against `pool`.
pub fn run(inputs: &[InputRecord], pool: &CandidatePool, config: &MatchConfig) -> Result<Vec<MatchResult>> {
    config.validate()?;
    Orchestrator::new(pool, config).run(inputs)
}
