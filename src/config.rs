// SPDX-License-Identifier: MIT
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::join::OutputSchema;
use crate::normalize::{KeyFormat, TextStyle};
use crate::process::ScorerKind;

fn default_k() -> usize {
    2
}

fn default_id_field() -> String {
    "Account Number".to_string()
}

fn default_label_field() -> String {
    "Account Name".to_string()
}

/// Everything a linkage run needs to know, passed explicitly to each stage.
///
/// Both datasets are expected to use the same column names for the blocking
/// and match fields; renaming source columns is the loader's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Column whose normalized value selects the candidate partition.
    pub blocking_field: String,
    /// Column compared fuzzily.
    pub match_field: String,
    /// Further columns appended to the match text (e.g. a second address line).
    #[serde(default)]
    pub extra_match_fields: Vec<String>,
    /// Reference column holding the identifier reported per rank.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Reference column holding the display label reported per rank.
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// Input columns copied unchanged to the front of each output row.
    #[serde(default)]
    pub passthrough_fields: Vec<String>,
    /// Matches kept per input record.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Parallelism; `None` uses every available core.
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default)]
    pub key_format: Option<KeyFormat>,
    #[serde(default)]
    pub text_style: TextStyle,
    #[serde(default)]
    pub scorer: ScorerKind,
}

impl MatchConfig {
    pub fn new(blocking_field: impl Into<String>, match_field: impl Into<String>) -> Self {
        MatchConfig {
            blocking_field: blocking_field.into(),
            match_field: match_field.into(),
            extra_match_fields: Vec::new(),
            id_field: default_id_field(),
            label_field: default_label_field(),
            passthrough_fields: Vec::new(),
            k: default_k(),
            worker_count: None,
            key_format: None,
            text_style: TextStyle::default(),
            scorer: ScorerKind::default(),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = Some(workers);
        self
    }

    pub fn with_key_format(mut self, format: KeyFormat) -> Self {
        self.key_format = Some(format);
        self
    }

    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = style;
        self
    }

    pub fn with_scorer(mut self, scorer: ScorerKind) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_passthrough(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.passthrough_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Worker count to use, falling back to the number of cores.
    pub fn effective_workers(&self) -> usize {
        self.worker_count.unwrap_or_else(num_cpus::get)
    }

    /// Checks the preconditions that do not depend on the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k < 1 {
            return Err(ConfigError::InvalidK(self.k));
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.key_format.is_some_and(|f| f.width == 0) {
            return Err(ConfigError::ZeroKeyWidth);
        }
        for (name, value) in [
            ("blocking", &self.blocking_field),
            ("match", &self.match_field),
            ("id", &self.id_field),
            ("label", &self.label_field),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyFieldName(name));
            }
        }
        let schema = OutputSchema::from_config(self);
        let mut seen = FxHashSet::default();
        for column in &schema.columns {
            if !seen.insert(column.as_str()) {
                return Err(ConfigError::DuplicateColumn(column.clone()));
            }
        }
        Ok(())
    }
}
