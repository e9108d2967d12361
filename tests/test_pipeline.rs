//! End-to-end pipeline tests: normalize, transform, score

mod common;

use churnscore::artifacts::model::sigmoid;
use churnscore::pipeline::{load_dataset, save_dataset, score_table, PROBABILITY_COLUMN};
use common::{
    create_temp_csv, create_temp_parquet, fixture_artifacts, raw_customers,
    raw_customers_with_unseen,
};

#[test]
fn test_score_table_scores_every_clean_row() {
    let artifacts = fixture_artifacts();

    let scored = score_table(&artifacts, raw_customers()).unwrap();

    assert_eq!(scored.source_rows, vec![0, 1, 2, 3]);
    assert!(scored.rejected.is_empty());
    assert!(scored
        .table
        .get_column_names()
        .iter()
        .any(|n| n.as_str() == PROBABILITY_COLUMN));

    let probabilities = scored.probabilities().unwrap();
    assert_eq!(probabilities.len(), 4);
    for p in &probabilities {
        assert!((0.0..=1.0).contains(p), "probability {} out of range", p);
    }
}

#[test]
fn test_known_scores_match_hand_computed_raw_sums() {
    let artifacts = fixture_artifacts();

    let scored = score_table(&artifacts, raw_customers()).unwrap();
    let probabilities = scored.probabilities().unwrap();

    // Row 0: month-to-month (+0.9), low tenure (+0.5), fiber (+0.6), base -0.3
    assert!((probabilities[0] - sigmoid(1.7)).abs() < 1e-9);
    // Row 1: two-year (-0.8), long tenure (-0.6), DSL (-0.2), base -0.3
    assert!((probabilities[1] - sigmoid(-1.9)).abs() < 1e-9);
}

#[test]
fn test_month_to_month_scores_above_two_year() {
    let artifacts = fixture_artifacts();

    let scored = score_table(&artifacts, raw_customers()).unwrap();
    let probabilities = scored.probabilities().unwrap();

    // Row 0: new month-to-month fiber customer; row 1: settled two-year customer
    assert!(probabilities[0] > probabilities[1]);
}

#[test]
fn test_scoring_is_bitwise_deterministic() {
    let artifacts = fixture_artifacts();

    let first = score_table(&artifacts, raw_customers()).unwrap();
    let second = score_table(&artifacts, raw_customers()).unwrap();

    let p1 = first.probabilities().unwrap();
    let p2 = second.probabilities().unwrap();
    assert_eq!(p1.len(), p2.len());
    for (a, b) in p1.iter().zip(p2.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_rejected_rows_are_skipped_and_order_preserved() {
    let artifacts = fixture_artifacts();

    let scored = score_table(&artifacts, raw_customers_with_unseen()).unwrap();

    // Input row 1 carried "Satellite"; rows 0 and 2 survive in input order
    assert_eq!(scored.source_rows, vec![0, 2]);
    assert_eq!(scored.rejected.len(), 1);
    assert_eq!(scored.rejected[0].row, 1);

    let probabilities = scored.probabilities().unwrap();
    assert_eq!(probabilities.len(), 2);

    // The surviving rows score identically to a batch that never contained
    // the rejected row
    let clean = score_table(&artifacts, raw_customers()).unwrap();
    let clean_probabilities = clean.probabilities().unwrap();
    assert_eq!(probabilities[0].to_bits(), clean_probabilities[0].to_bits());
    assert_eq!(probabilities[1].to_bits(), clean_probabilities[1].to_bits());
}

#[test]
fn test_score_record_is_strict_about_rejections() {
    use churnscore::pipeline::{normalize, score_record, transform, PipelineError};
    use polars::prelude::*;

    let artifacts = fixture_artifacts();

    let clean = df! {
        "tenure" => [2i64],
        "monthly_charges" => [70.7f64],
        "total_charges" => [151.65f64],
        "contract" => ["Month-to-month"],
        "internet_service" => ["Fiber optic"],
        "payment_method" => ["Electronic check"],
    }
    .unwrap();
    let transformed = transform(&artifacts, &normalize(clean).unwrap()).unwrap();
    let probability = score_record(&artifacts, &transformed).unwrap();
    assert!((probability - sigmoid(1.7)).abs() < 1e-9);

    let dirty = df! {
        "tenure" => [2i64],
        "monthly_charges" => [70.7f64],
        "total_charges" => [151.65f64],
        "contract" => ["Weekly"],
        "internet_service" => ["Fiber optic"],
        "payment_method" => ["Electronic check"],
    }
    .unwrap();
    let transformed = transform(&artifacts, &normalize(dirty).unwrap()).unwrap();
    let err = score_record(&artifacts, &transformed).unwrap_err();
    match err {
        PipelineError::RecordRejected { column, value, .. } => {
            assert_eq!(column, "contract");
            assert_eq!(value, "Weekly");
        }
        other => panic!("expected RecordRejected, got {other}"),
    }
}

#[test]
fn test_csv_round_trip_through_loader() {
    let mut raw = raw_customers();
    let (_dir, csv_path) = create_temp_csv(&mut raw);

    let loaded = load_dataset(&csv_path).unwrap();
    assert_eq!(loaded.height(), 4);

    let artifacts = fixture_artifacts();
    let mut scored = score_table(&artifacts, loaded).unwrap();

    let out_path = csv_path.with_file_name("customers_scored.csv");
    save_dataset(&mut scored.table, &out_path).unwrap();
    assert!(out_path.exists());

    let reloaded = load_dataset(&out_path).unwrap();
    assert_eq!(reloaded.height(), 4);
    assert!(reloaded
        .get_column_names()
        .iter()
        .any(|n| n.as_str() == PROBABILITY_COLUMN));
}

#[test]
fn test_parquet_round_trip_through_loader() {
    let mut raw = raw_customers();
    let (_dir, parquet_path) = create_temp_parquet(&mut raw);

    let loaded = load_dataset(&parquet_path).unwrap();
    let artifacts = fixture_artifacts();
    let scored = score_table(&artifacts, loaded).unwrap();

    assert_eq!(scored.source_rows.len(), 4);
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let path = std::path::Path::new("customers.xlsx");
    assert!(load_dataset(path).is_err());
}
