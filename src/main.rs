// SPDX-License-Identifier: MIT
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use serde_json::{Map, Value};

use blocklink::{link, KeyFormat, Linkage, MatchConfig, Row, ScorerKind, TextStyle};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScorerArg {
    Ratio,
    TokenSort,
    TokenSet,
}

impl From<ScorerArg> for ScorerKind {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Ratio => ScorerKind::Ratio,
            ScorerArg::TokenSort => ScorerKind::TokenSortRatio,
            ScorerArg::TokenSet => ScorerKind::TokenSetRatio,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleArg {
    Address,
    Name,
}

impl From<StyleArg> for TextStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Address => TextStyle::Address,
            StyleArg::Name => TextStyle::Name,
        }
    }
}

/// Match records against a reference catalog within shared blocking keys.
///
/// Both datasets are JSON arrays of objects. The output is a JSON array with
/// one object per input record, in input order.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Records to resolve
    #[arg(short, long)]
    input: PathBuf,

    /// Reference catalog
    #[arg(short, long)]
    reference: PathBuf,

    /// JSON file holding a full match configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the joined rows (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    blocking_field: Option<String>,

    #[arg(long)]
    match_field: Option<String>,

    /// Extra columns appended to the match text, repeatable
    #[arg(long = "extra-match-field")]
    extra_match_fields: Vec<String>,

    #[arg(long)]
    id_field: Option<String>,

    #[arg(long)]
    label_field: Option<String>,

    /// Input columns copied to the output, repeatable
    #[arg(long = "passthrough")]
    passthrough_fields: Vec<String>,

    /// Matches kept per record
    #[arg(short)]
    k: Option<usize>,

    /// Worker threads (defaults to the number of cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fixed width of the blocking key; shorter keys are left-padded
    #[arg(long)]
    key_width: Option<usize>,

    /// Padding character for the blocking key (default '0', or the config file's)
    #[arg(long)]
    key_fill: Option<char>,

    #[arg(long, value_enum)]
    text_style: Option<StyleArg>,

    #[arg(long, value_enum)]
    scorer: Option<ScorerArg>,

    /// Verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    fn match_config(&self) -> Result<MatchConfig> {
        let base = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str::<MatchConfig>(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => {
                let blocking = self
                    .blocking_field
                    .clone()
                    .context("--blocking-field is required without --config")?;
                let matching = self
                    .match_field
                    .clone()
                    .context("--match-field is required without --config")?;
                MatchConfig::new(blocking, matching)
            }
        };
        Ok(self.apply_overrides(base))
    }

    /// Flags win over whatever `config` already holds.
    fn apply_overrides(&self, mut config: MatchConfig) -> MatchConfig {
        if let Some(field) = &self.blocking_field {
            config.blocking_field = field.clone();
        }
        if let Some(field) = &self.match_field {
            config.match_field = field.clone();
        }
        if !self.extra_match_fields.is_empty() {
            config.extra_match_fields = self.extra_match_fields.clone();
        }
        if let Some(field) = &self.id_field {
            config.id_field = field.clone();
        }
        if let Some(field) = &self.label_field {
            config.label_field = field.clone();
        }
        if !self.passthrough_fields.is_empty() {
            config.passthrough_fields = self.passthrough_fields.clone();
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(workers) = self.workers {
            config.worker_count = Some(workers);
        }
        let fill = self
            .key_fill
            .or(config.key_format.map(|f| f.fill))
            .unwrap_or('0');
        if let Some(width) = self.key_width {
            config.key_format = Some(KeyFormat { width, fill });
        } else if let Some(format) = config.key_format.as_mut() {
            format.fill = fill;
        }
        if let Some(style) = self.text_style {
            config.text_style = style.into();
        }
        if let Some(scorer) = self.scorer {
            config.scorer = scorer.into();
        }
        config
    }
}

fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rows: Vec<Row> = serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {} as a JSON array of objects", path.display()))?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn to_json(linkage: &Linkage) -> Result<Value> {
    let mut out = Vec::with_capacity(linkage.rows.len());
    for row in &linkage.rows {
        let mut object = Map::new();
        for (column, cell) in linkage.schema.columns.iter().zip(row.cells()) {
            object.insert(column.clone(), serde_json::to_value(cell)?);
        }
        out.push(Value::Object(object));
    }
    Ok(Value::Array(out))
}

fn write_output(value: &Value, path: Option<&Path>) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to write output")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level())).init();

    let started = Instant::now();
    let config = args.match_config()?;
    info!(
        "Blocking on {:?}, matching on {:?}, k = {}, scorer {}",
        config.blocking_field,
        config.match_field,
        config.k,
        config.scorer.name()
    );

    let inputs = read_rows(&args.input)?;
    let references = read_rows(&args.reference)?;
    let linkage = link(&inputs, &references, &config).context("Linkage failed")?;

    write_output(&to_json(&linkage)?, args.output.as_deref())?;
    info!("Wrote {} rows in {:.2?}", linkage.rows.len(), started.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocklink::FieldValue;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["blocklink", "--input", "in.json", "--reference", "ref.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn row(pairs: &[(&str, FieldValue)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn flags_build_config_without_file() {
        let config = args(&["--blocking-field", "ZIP", "--match-field", "Address", "-k", "3"])
            .match_config()
            .unwrap();
        assert_eq!(config.blocking_field, "ZIP");
        assert_eq!(config.match_field, "Address");
        assert_eq!(config.k, 3);
        assert_eq!(config.key_format, None);
        assert!(args(&["--match-field", "Address"]).match_config().is_err());
    }

    #[test]
    fn flags_override_file_config() {
        let file = MatchConfig::new("ZIP", "Address")
            .with_key_format(KeyFormat { width: 5, fill: 'x' })
            .with_passthrough(["Practice Name"])
            .with_scorer(ScorerKind::Ratio);

        let config = args(&["--match-field", "Street 1", "--extra-match-field", "Street 2", "--scorer", "token-set", "-w", "3"])
            .apply_overrides(file.clone());
        assert_eq!(config.blocking_field, "ZIP");
        assert_eq!(config.match_field, "Street 1");
        assert_eq!(config.extra_match_fields, vec!["Street 2".to_string()]);
        assert_eq!(config.passthrough_fields, vec!["Practice Name".to_string()]);
        assert_eq!(config.scorer, ScorerKind::TokenSetRatio);
        assert_eq!(config.worker_count, Some(3));
        assert_eq!(config.key_format, Some(KeyFormat { width: 5, fill: 'x' }));
    }

    #[test]
    fn key_width_keeps_configured_fill() {
        let file = MatchConfig::new("ZIP", "Address").with_key_format(KeyFormat { width: 5, fill: 'x' });

        let widened = args(&["--key-width", "9"]).apply_overrides(file.clone());
        assert_eq!(widened.key_format, Some(KeyFormat { width: 9, fill: 'x' }));

        let refilled = args(&["--key-fill", "#"]).apply_overrides(file.clone());
        assert_eq!(refilled.key_format, Some(KeyFormat { width: 5, fill: '#' }));

        let fresh = args(&["--key-width", "4"]).apply_overrides(MatchConfig::new("ZIP", "Address"));
        assert_eq!(fresh.key_format, Some(KeyFormat { width: 4, fill: '0' }));
    }

    #[test]
    fn json_objects_keep_schema_column_order() {
        let inputs = vec![
            row(&[("Practice Name", "Smile".into()), ("ZIP", "2139".into()), ("Address", "1 Main Street".into())]),
            row(&[("Practice Name", "Lost".into()), ("ZIP", "99999".into()), ("Address", "9 Nowhere Rd".into())]),
        ];
        let references = vec![row(&[
            ("ZIP", "02139".into()),
            ("Address", "1 Main St".into()),
            ("Account Number", FieldValue::Integer(17)),
            ("Account Name", "Acme Dental".into()),
        ])];
        let config = MatchConfig::new("ZIP", "Address")
            .with_key_format(KeyFormat::postal_code())
            .with_passthrough(["Practice Name"]);
        let linkage = link(&inputs, &references, &config).unwrap();

        let value = to_json(&linkage).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_object().unwrap();
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, linkage.schema.columns.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(keys.len(), 11);
        assert_eq!(keys[0], "Practice Name");
        assert_eq!(keys[1], "Merge Address");
        assert_eq!(keys[10], "status");
        assert_eq!(first["Match 1"], Value::from("1 Main St"));
        assert_eq!(first["Account Number 1"], Value::from(17));
        assert_eq!(first["Account Name 1"], Value::from("Acme Dental"));
        assert!(first["Match 2"].is_null());
        assert_eq!(first["status"], Value::from("matched"));

        let second = rows[1].as_object().unwrap();
        assert_eq!(second.len(), 11);
        assert!(second["Score 1"].is_null());
        assert_eq!(second["status"], Value::from("no_candidates"));
    }
}
