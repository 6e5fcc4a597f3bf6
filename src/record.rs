// SPDX-License-Identifier: MIT
// Raw rows as handed over by a loading adapter, and the fixed-shape records
// the engine works on.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::error::{ConfigError, Dataset};

/// One cell of a tabular dataset. Spreadsheet exports mix numbers and text in
/// the same column (postal codes read as integers or floats), so every shape
/// is accepted and coerced to text on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text form of the value. `Ok(None)` means missing (null or NaN); floats
    /// holding whole numbers print without a fractional part so `2139.0`
    /// becomes `"2139"`.
    pub fn coerce(&self) -> Result<Option<Cow<'_, str>>, &'static str> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Bool(b) => Ok(Some(Cow::Borrowed(if *b { "true" } else { "false" }))),
            FieldValue::Integer(i) => Ok(Some(Cow::Owned(i.to_string()))),
            FieldValue::Float(f) if f.is_nan() => Ok(None),
            FieldValue::Float(f) if f.is_infinite() => Err("non-finite number"),
            FieldValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                Ok(Some(Cow::Owned((*f as i64).to_string())))
            }
            FieldValue::Float(f) => Ok(Some(Cow::Owned(f.to_string()))),
            FieldValue::Text(s) => Ok(Some(Cow::Borrowed(s.as_str()))),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

/// A row keyed by column name.
pub type Row = BTreeMap<String, FieldValue>;

fn required(row: &Row, field: &str, dataset: Dataset, index: usize) -> Result<FieldValue, ConfigError> {
    row.get(field).cloned().ok_or_else(|| ConfigError::MissingField {
        dataset,
        field: field.to_string(),
        row: index,
    })
}

fn match_parts(row: &Row, config: &MatchConfig, dataset: Dataset, index: usize) -> Result<Vec<FieldValue>, ConfigError> {
    let mut parts = Vec::with_capacity(1 + config.extra_match_fields.len());
    parts.push(required(row, &config.match_field, dataset, index)?);
    parts.extend(
        config
            .extra_match_fields
            .iter()
            .map(|f| row.get(f).cloned().unwrap_or_default()),
    );
    Ok(parts)
}

/// A record to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    pub blocking: FieldValue,
    pub match_parts: Vec<FieldValue>,
    pub passthrough: Vec<FieldValue>,
}

impl InputRecord {
    pub fn new(blocking: impl Into<FieldValue>, match_text: impl Into<FieldValue>) -> Self {
        InputRecord {
            blocking: blocking.into(),
            match_parts: vec![match_text.into()],
            passthrough: Vec::new(),
        }
    }

    /// Picks the configured columns out of `row`. The blocking and match
    /// columns must be present (null is fine); passthrough columns default to
    /// null.
    pub fn from_row(row: &Row, index: usize, config: &MatchConfig) -> Result<Self, ConfigError> {
        Ok(InputRecord {
            blocking: required(row, &config.blocking_field, Dataset::Input, index)?,
            match_parts: match_parts(row, config, Dataset::Input, index)?,
            passthrough: config
                .passthrough_fields
                .iter()
                .map(|f| row.get(f).cloned().unwrap_or_default())
                .collect(),
        })
    }
}

/// A catalog entry candidates are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub blocking: FieldValue,
    pub match_parts: Vec<FieldValue>,
    pub id: FieldValue,
    pub label: FieldValue,
}

impl ReferenceRecord {
    pub fn new(
        blocking: impl Into<FieldValue>,
        match_text: impl Into<FieldValue>,
        id: impl Into<FieldValue>,
        label: impl Into<FieldValue>,
    ) -> Self {
        ReferenceRecord {
            blocking: blocking.into(),
            match_parts: vec![match_text.into()],
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn from_row(row: &Row, index: usize, config: &MatchConfig) -> Result<Self, ConfigError> {
        Ok(ReferenceRecord {
            blocking: required(row, &config.blocking_field, Dataset::Reference, index)?,
            match_parts: match_parts(row, config, Dataset::Reference, index)?,
            id: required(row, &config.id_field, Dataset::Reference, index)?,
            label: required(row, &config.label_field, Dataset::Reference, index)?,
        })
    }
}

/// Maps every input row, failing on the first one missing a required column.
pub fn input_records(rows: &[Row], config: &MatchConfig) -> Result<Vec<InputRecord>, ConfigError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| InputRecord::from_row(row, i, config))
        .collect()
}

/// Maps every reference row; an empty reference dataset is rejected.
pub fn reference_records(rows: &[Row], config: &MatchConfig) -> Result<Vec<ReferenceRecord>, ConfigError> {
    if rows.is_empty() {
        return Err(ConfigError::EmptyReference);
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| ReferenceRecord::from_row(row, i, config))
        .collect()
}
