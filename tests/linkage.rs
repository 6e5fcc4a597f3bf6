// SPDX-License-Identifier: MIT
use blocklink::{link, ConfigError, FieldValue, KeyFormat, MatchConfig, MatchError, MatchStatus, Row};

fn row(pairs: &[(&str, FieldValue)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn account(zip: &str, address: &str, number: &str, name: &str) -> Row {
    row(&[
        ("ZIP", zip.into()),
        ("Address", address.into()),
        ("Account Number", number.into()),
        ("Account Name", name.into()),
    ])
}

fn unmapped(practice: &str, zip: FieldValue, address: &str) -> Row {
    row(&[("Practice Name", practice.into()), ("ZIP", zip), ("Address", address.into())])
}

fn accounts() -> Vec<Row> {
    vec![
        account("02139", "1 Main St", "A1", "Acme Dental"),
        account("02139", "2 Main St", "A2", "Beta Ortho"),
        account("10001", "5 Broadway", "B1", "Gamma Clinic"),
    ]
}

fn config() -> MatchConfig {
    MatchConfig::new("ZIP", "Address")
        .with_key_format(KeyFormat::postal_code())
        .with_passthrough(["Practice Name"])
}

#[test]
fn best_candidate_ranks_first_within_block() {
    let inputs = vec![unmapped("Smile", "02139".into(), "1 Main Street")];
    let linkage = link(&inputs, &accounts(), &config()).unwrap();

    assert_eq!(linkage.rows.len(), 1);
    let row = &linkage.rows[0];
    assert_eq!(row.status, MatchStatus::Matched);
    let first = row.ranks[0].as_ref().unwrap();
    let second = row.ranks[1].as_ref().unwrap();
    assert_eq!(first.matched, "1 Main St");
    assert_eq!(first.ref_id, Some(FieldValue::from("A1")));
    assert_eq!(second.matched, "2 Main St");
    assert!(first.score > second.score);
}

#[test]
fn numeric_short_zip_is_padded_into_block() {
    let inputs = vec![
        unmapped("Smile", FieldValue::Integer(2139), "1 Main Street"),
        unmapped("Smile", FieldValue::Float(2139.0), "1 Main Street"),
        unmapped("Smile", "2139".into(), "1 Main Street"),
    ];
    let linkage = link(&inputs, &accounts(), &config()).unwrap();
    for row in &linkage.rows {
        assert_eq!(row.status, MatchStatus::Matched);
        assert_eq!(row.ranks[0].as_ref().unwrap().ref_label, Some(FieldValue::from("Acme Dental")));
    }
}

#[test]
fn unknown_zip_yields_null_columns() {
    let inputs = vec![unmapped("Lost", "99999".into(), "1 Main St")];
    let linkage = link(&inputs, &accounts(), &config()).unwrap();

    let row = &linkage.rows[0];
    assert_eq!(row.status, MatchStatus::NoCandidates);
    assert!(row.ranks.iter().all(Option::is_none));

    let cells = row.cells();
    assert_eq!(cells.len(), linkage.schema.columns.len());
    assert_eq!(cells[0], FieldValue::from("Lost"));
    assert_eq!(cells[1], FieldValue::from("1 Main St"));
    assert!(cells[2..10].iter().all(FieldValue::is_null));
}

#[test]
fn single_candidate_block_leaves_second_rank_empty() {
    let inputs = vec![unmapped("Midtown", "10001".into(), "5 Broadway Ave")];
    let linkage = link(&inputs, &accounts(), &config()).unwrap();
    let row = &linkage.rows[0];
    assert_eq!(row.ranks.len(), 2);
    assert_eq!(row.ranks[0].as_ref().unwrap().ref_id, Some(FieldValue::from("B1")));
    assert!(row.ranks[1].is_none());
}

#[test]
fn duplicate_reference_text_resolves_to_first_account() {
    let mut refs = accounts();
    refs.push(account("02139", "1 Main St", "A9", "Acme Duplicate"));
    let inputs = vec![unmapped("Smile", "02139".into(), "1 Main St")];
    let linkage = link(&inputs, &refs, &config().with_k(3)).unwrap();

    let ranks: Vec<_> = linkage.rows[0].ranks.iter().flatten().collect();
    assert_eq!(ranks.len(), 3);
    assert_eq!(ranks[0].score, 100);
    assert_eq!(ranks[1].score, 100);
    assert_eq!(ranks[0].ref_id, Some(FieldValue::from("A1")));
    assert_eq!(ranks[1].ref_id, Some(FieldValue::from("A1")));
}

#[test]
fn shared_text_resolves_within_its_own_block() {
    let refs = vec![
        account("10001", "1 Main St", "NYC", "New York Office"),
        account("02139", "1 Main St", "CAM", "Cambridge Office"),
    ];
    let inputs = vec![
        unmapped("Smile", "02139".into(), "1 Main St"),
        unmapped("Midtown", "10001".into(), "1 Main St"),
    ];
    let linkage = link(&inputs, &refs, &config()).unwrap();
    assert_eq!(linkage.rows[0].ranks[0].as_ref().unwrap().ref_id, Some(FieldValue::from("CAM")));
    assert_eq!(linkage.rows[1].ranks[0].as_ref().unwrap().ref_id, Some(FieldValue::from("NYC")));
    assert_eq!(linkage.summary.lookup_misses, 0);
}

#[test]
fn huge_worker_count_on_tiny_batch() {
    let inputs = vec![unmapped("Smile", "02139".into(), "1 Main St")];
    let linkage = link(&inputs, &accounts(), &config().with_workers(10_000)).unwrap();
    assert_eq!(linkage.rows.len(), 1);
    assert_eq!(linkage.rows[0].status, MatchStatus::Matched);
}

#[test]
fn passthrough_colliding_with_output_column_is_rejected() {
    let inputs = vec![unmapped("Smile", "02139".into(), "1 Main St")];
    let err = link(&inputs, &accounts(), &config().with_passthrough(["status"])).unwrap_err();
    assert!(matches!(
        err,
        MatchError::Configuration(ConfigError::DuplicateColumn(ref c)) if c == "status"
    ));
}

#[test]
fn output_is_identical_across_worker_counts() {
    let refs: Vec<Row> = (0..200)
        .map(|i| {
            let zip = format!("{:05}", i % 20);
            account(&zip, &format!("{} Elm Street Suite {}", i, i % 7), &format!("R{}", i), "Ref")
        })
        .collect();
    let inputs: Vec<Row> = (0..1000)
        .map(|i| {
            let zip = if i % 11 == 0 { FieldValue::from("77777") } else { FieldValue::Integer(i % 20) };
            unmapped(&format!("P{}", i), zip, &format!("{} elm st ste {}", i % 200, i % 7))
        })
        .collect();

    let single = link(&inputs, &refs, &config().with_workers(1)).unwrap();
    let parallel = link(&inputs, &refs, &config().with_workers(4)).unwrap();
    assert_eq!(single.rows, parallel.rows);
    assert_eq!(single.summary, parallel.summary);

    for (i, row) in parallel.rows.iter().enumerate() {
        assert_eq!(row.passthrough[0], FieldValue::from(format!("P{}", i)));
    }
    assert_eq!(parallel.summary.rows, 1000);
    assert_eq!(parallel.summary.no_candidates, 91);
}

#[test]
fn malformed_cell_only_affects_its_row() {
    let inputs = vec![
        unmapped("Good", "02139".into(), "1 Main St"),
        unmapped("Bad", FieldValue::Float(f64::INFINITY), "2 Main St"),
        unmapped("Also good", "10001".into(), "5 Broadway"),
    ];
    let linkage = link(&inputs, &accounts(), &config()).unwrap();
    assert_eq!(linkage.summary.matched, 2);
    assert_eq!(linkage.summary.degraded, 1);
    assert!(matches!(linkage.rows[1].status, MatchStatus::Degraded(_)));
    assert!(linkage.rows[1].ranks.iter().all(Option::is_none));
}

#[test]
fn empty_reference_is_a_configuration_error() {
    let inputs = vec![unmapped("Smile", "02139".into(), "1 Main St")];
    let err = link(&inputs, &[], &config()).unwrap_err();
    assert!(matches!(err, MatchError::Configuration(ConfigError::EmptyReference)));
}

#[test]
fn empty_input_is_not_an_error() {
    let linkage = link(&[], &accounts(), &config()).unwrap();
    assert!(linkage.rows.is_empty());
    assert_eq!(linkage.summary.rows, 0);
}

#[test]
fn config_round_trips_through_json() {
    let parsed: MatchConfig = serde_json::from_str(
        r#"{
            "blocking_field": "ZIP",
            "match_field": "Address",
            "passthrough_fields": ["Practice Name"],
            "key_format": {"width": 5},
            "scorer": "token_set_ratio",
            "text_style": "name"
        }"#,
    )
    .unwrap();
    assert_eq!(parsed.k, 2);
    assert_eq!(parsed.id_field, "Account Number");
    assert_eq!(parsed.key_format, Some(KeyFormat::postal_code()));
    assert_eq!(parsed.scorer, blocklink::ScorerKind::TokenSetRatio);
    assert_eq!(parsed.text_style, blocklink::TextStyle::Name);
}
