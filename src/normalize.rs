// SPDX-License-Identifier: MIT
// Canonical forms for blocking keys and match text.
//
// Normalization never fails at the public surface: a value that cannot be
// rendered degrades to "" so one bad cell cannot stop a batch. The `try_`
// variants report the problem so the caller can flag the record.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::record::FieldValue;

/// Fixed-width code layout, e.g. five digit postal codes padded with `'0'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFormat {
    pub width: usize,
    #[serde(default = "default_fill")]
    pub fill: char,
}

fn default_fill() -> char {
    '0'
}

impl KeyFormat {
    pub fn postal_code() -> Self {
        KeyFormat { width: 5, fill: '0' }
    }
}

/// How the match field is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// Free text; internal spacing is kept.
    #[default]
    Address,
    /// Names; all whitespace is removed so "Acme Dental" equals "AcmeDental".
    Name,
}

/// Trims, truncates to the format width and left-pads with the fill
/// character. Blank input is the unblocked key `""` and is never padded.
pub fn canonical_key(raw: &str, format: Option<&KeyFormat>) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match format {
        None => trimmed.to_string(),
        Some(fmt) => {
            let kept: String = trimmed.chars().take(fmt.width).collect();
            let pad = fmt.width - kept.chars().count();
            let mut key = String::with_capacity(kept.len() + pad);
            key.extend(std::iter::repeat(fmt.fill).take(pad));
            key.push_str(&kept);
            key
        }
    }
}

/// Joins the non-blank parts with one space and trims. `Name` style then
/// drops every whitespace character.
pub fn canonical_text<'a>(parts: impl IntoIterator<Item = &'a str>, style: TextStyle) -> String {
    let joined = parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match style {
        TextStyle::Address => joined,
        TextStyle::Name => joined.chars().filter(|c| !c.is_whitespace()).collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    key_format: Option<KeyFormat>,
    text_style: TextStyle,
}

impl Normalizer {
    pub fn new(key_format: Option<KeyFormat>, text_style: TextStyle) -> Self {
        Normalizer { key_format, text_style }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Normalizer::new(config.key_format, config.text_style)
    }

    pub fn try_normalize_key(&self, field: &str, raw: &FieldValue) -> Result<String> {
        let text = raw.coerce().map_err(|reason| MatchError::MalformedField {
            field: field.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(text
            .map(|t| canonical_key(&t, self.key_format.as_ref()))
            .unwrap_or_default())
    }

    pub fn try_normalize_text(&self, field: &str, parts: &[FieldValue]) -> Result<String> {
        let mut rendered = Vec::with_capacity(parts.len());
        for part in parts {
            let text = part.coerce().map_err(|reason| MatchError::MalformedField {
                field: field.to_string(),
                reason: reason.to_string(),
            })?;
            if let Some(t) = text {
                rendered.push(t);
            }
        }
        Ok(canonical_text(rendered.iter().map(|t| &**t), self.text_style))
    }

    pub fn normalize_key(&self, raw: &FieldValue) -> String {
        self.try_normalize_key("blocking", raw).unwrap_or_else(|e| {
            warn!("{}; using the unblocked key", e);
            String::new()
        })
    }

    pub fn normalize_text(&self, parts: &[FieldValue]) -> String {
        self.try_normalize_text("match", parts).unwrap_or_else(|e| {
            warn!("{}; comparing as empty text", e);
            String::new()
        })
    }
}
