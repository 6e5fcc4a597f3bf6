// SPDX-License-Identifier: MIT
// Blocking index: reference records grouped by normalized blocking key.

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::ConfigError;
use crate::normalize::Normalizer;
use crate::record::ReferenceRecord;

/// One reference record as seen by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Index of the record in the reference dataset.
    pub position: usize,
    /// Normalized match text.
    pub text: String,
}

/// Read-only map from blocking key to the candidates sharing it, each list in
/// reference order. Records without a blocking value sit under `""`.
#[derive(Debug, Default)]
pub struct CandidatePool {
    blocks: FxHashMap<String, Vec<Candidate>>,
    size: usize,
}

impl CandidatePool {
    pub fn build(references: &[ReferenceRecord], normalizer: &Normalizer) -> Result<Self, ConfigError> {
        if references.is_empty() {
            return Err(ConfigError::EmptyReference);
        }

        let mut blocks: FxHashMap<String, Vec<Candidate>> = FxHashMap::default();
        for (position, record) in references.iter().enumerate() {
            let key = normalizer.normalize_key(&record.blocking);
            let text = normalizer.normalize_text(&record.match_parts);
            blocks.entry(key).or_default().push(Candidate { position, text });
        }

        let pool = CandidatePool { blocks, size: references.len() };
        info!(
            "Built candidate pool: {} references in {} blocks ({} unblocked)",
            pool.size,
            pool.block_count(),
            pool.partition("").len()
        );
        if let Some((key, largest)) = pool.blocks.iter().max_by_key(|(_, c)| c.len()) {
            debug!("Largest block {:?} holds {} candidates", key, largest.len());
        }
        Ok(pool)
    }

    /// Candidates sharing `key`; empty when no reference has that key.
    pub fn partition(&self, key: &str) -> &[Candidate] {
        self.blocks.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
