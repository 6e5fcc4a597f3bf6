// SPDX-License-Identifier: MIT
//! Blocked fuzzy record linkage.
//!
//! Input records are resolved against a reference catalog: each record is
//! compared only with the references sharing its normalized blocking key
//! (typically a postal code), candidates are ranked by fuzzy similarity of a
//! text field and the best `k` are joined back to reference metadata.
//!
//! ```no_run
//! use blocklink::{link, KeyFormat, MatchConfig, Row};
//!
//! # fn load(_: &str) -> Vec<Row> { Vec::new() }
//! let config = MatchConfig::new("ZIP", "Address").with_key_format(KeyFormat::postal_code());
//! let linkage = link(&load("unmapped.json"), &load("accounts.json"), &config)?;
//! for row in &linkage.rows {
//!     println!("{:?}", row.cells());
//! }
//! # Ok::<(), blocklink::MatchError>(())
//! ```

mod algorithms;
mod types;

pub mod blocking;
pub mod config;
pub mod error;
pub mod fuzz;
pub mod join;
pub mod normalize;
pub mod orchestrator;
pub mod process;
pub mod record;

use log::info;

pub use blocking::{Candidate, CandidatePool};
pub use config::MatchConfig;
pub use error::{ConfigError, Dataset, MatchError, Result};
pub use join::{assemble, BatchSummary, JoinedRow, OutputSchema, RankSlot, ReferenceLookup};
pub use normalize::{KeyFormat, Normalizer, TextStyle};
pub use orchestrator::{Match, MatchResult, MatchStatus, Orchestrator};
pub use process::{extract, ScorerKind, Scored};
pub use record::{FieldValue, InputRecord, ReferenceRecord, Row};

/// Output of a complete linkage run.
#[derive(Debug, Clone)]
pub struct Linkage {
    pub schema: OutputSchema,
    pub rows: Vec<JoinedRow>,
    pub summary: BatchSummary,
}

/// Runs the whole pipeline over raw rows: validate, map rows to records,
/// build the candidate pool, match in parallel and assemble the output.
///
/// Only configuration problems are errors; per-record trouble shows up in the
/// `status` of the affected row.
pub fn link(inputs: &[Row], references: &[Row], config: &MatchConfig) -> Result<Linkage> {
    config.validate()?;
    let references = record::reference_records(references, config)?;
    let inputs = record::input_records(inputs, config)?;

    let normalizer = Normalizer::from_config(config);
    let pool = CandidatePool::build(&references, &normalizer)?;
    let lookup = ReferenceLookup::build(&references, &normalizer);

    let results = Orchestrator::new(&pool, config).run(&inputs)?;
    let rows = assemble(&results, &lookup, &inputs, config.k);
    let summary = BatchSummary::from_rows(&rows);
    info!("Linkage finished with {} using {}", summary, config.scorer.name());

    Ok(Linkage {
        schema: OutputSchema::from_config(config),
        rows,
        summary,
    })
}
