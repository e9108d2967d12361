//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use churnscore::artifacts::{
    Artifacts, EncoderColumn, FeatureSelector, GbdtModel, Node, OneHotEncoder, Scaler,
    StandardColumn, Tree,
};

/// Selected feature order shared by the fixture selector and model
pub const FIXTURE_FEATURES: [&str; 7] = [
    "tenure",
    "monthly_charges",
    "total_charges",
    "contract_month_to_month",
    "contract_two_year",
    "internet_service_fiber_optic",
    "payment_method_electronic_check",
];

/// Build a small but fully consistent artifact bundle
///
/// The trees are hand-designed so that a month-to-month fiber customer with
/// low tenure scores high and a long-tenure two-year customer scores low:
/// - tree 0 splits on `contract_month_to_month`
/// - tree 1 splits on scaled `tenure` at the training mean
/// - tree 2 splits on `internet_service_fiber_optic`
pub fn fixture_artifacts() -> Artifacts {
    let encoder = OneHotEncoder {
        columns: vec![
            EncoderColumn {
                column: "contract".to_string(),
                categories: vec![
                    "Month-to-month".to_string(),
                    "One year".to_string(),
                    "Two year".to_string(),
                ],
            },
            EncoderColumn {
                column: "internet_service".to_string(),
                categories: vec![
                    "DSL".to_string(),
                    "Fiber optic".to_string(),
                    "No".to_string(),
                ],
            },
            EncoderColumn {
                column: "payment_method".to_string(),
                categories: vec![
                    "Electronic check".to_string(),
                    "Mailed check".to_string(),
                    "Bank transfer (automatic)".to_string(),
                    "Credit card (automatic)".to_string(),
                ],
            },
        ],
    };

    let scaler = Scaler::Standard {
        columns: vec![
            StandardColumn {
                name: "tenure".to_string(),
                mean: 32.0,
                scale: 24.0,
            },
            StandardColumn {
                name: "monthly_charges".to_string(),
                mean: 65.0,
                scale: 30.0,
            },
            StandardColumn {
                name: "total_charges".to_string(),
                mean: 2280.0,
                scale: 2265.0,
            },
        ],
    };

    let selector = FeatureSelector::new(
        FIXTURE_FEATURES.iter().map(|s| s.to_string()).collect(),
    );

    // Feature indices follow FIXTURE_FEATURES
    let tree_contract = Tree::new(vec![
        Node::internal(3, 0.5, 1, 2, 100.0),
        Node::leaf(-0.8, 60.0),
        Node::leaf(0.9, 40.0),
    ]);
    let tree_tenure = Tree::new(vec![
        Node::internal(0, 0.0, 1, 2, 100.0),
        Node::leaf(0.5, 50.0),
        Node::leaf(-0.6, 50.0),
    ]);
    let tree_fiber = Tree::new(vec![
        Node::internal(5, 0.5, 1, 2, 100.0),
        Node::leaf(-0.2, 70.0),
        Node::leaf(0.6, 30.0),
    ]);

    let model = GbdtModel::new(
        selector.features.clone(),
        vec![tree_contract, tree_tenure, tree_fiber],
        -0.3,
    );

    Artifacts {
        encoder,
        scaler,
        selector,
        model,
    }
}

/// Write the fixture artifact bundle into a fresh temporary directory
pub fn write_fixture_artifacts() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let artifacts = fixture_artifacts();

    let dir = temp_dir.path();
    std::fs::write(
        dir.join("encoder.json"),
        serde_json::to_string_pretty(&artifacts.encoder).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("scaler.json"),
        serde_json::to_string_pretty(&artifacts.scaler).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("selected_features.json"),
        serde_json::to_string_pretty(&artifacts.selector).unwrap(),
    )
    .unwrap();
    artifacts.model.save_json(dir.join("model.json")).unwrap();

    temp_dir
}

/// A raw customer table as exported by the billing system: camelCase headers,
/// text `TotalCharges` with a blank, a 0/1 `SeniorCitizen` flag, and the
/// placeholder category values
pub fn raw_customers() -> DataFrame {
    df! {
        "customerID" => ["7590-VHVEG", "5575-GNVDE", "3668-QPYBK", "9237-HQITU"],
        "SeniorCitizen" => [0i64, 0, 1, 0],
        "tenure" => [2i64, 60, 8, 45],
        "Contract" => ["Month-to-month", "Two year", "Month-to-month", "One year"],
        "InternetService" => ["Fiber optic", "DSL", "Fiber optic", "No"],
        "PaymentMethod" => [
            "Electronic check",
            "Credit card (automatic)",
            "Electronic check",
            "Mailed check",
        ],
        "MonthlyCharges" => [70.7f64, 56.15, 99.65, 42.3],
        "TotalCharges" => ["151.65", "3487.95", "", "1840.75"],
        "Churn" => ["Yes", "No", "Yes", "No"],
    }
    .unwrap()
}

/// Same shape as `raw_customers` but row 1 carries a category the encoder
/// never saw at fit time
pub fn raw_customers_with_unseen() -> DataFrame {
    df! {
        "customerID" => ["7590-VHVEG", "0000-UNSEEN", "5575-GNVDE"],
        "SeniorCitizen" => [0i64, 0, 0],
        "tenure" => [2i64, 12, 60],
        "Contract" => ["Month-to-month", "Month-to-month", "Two year"],
        "InternetService" => ["Fiber optic", "Satellite", "DSL"],
        "PaymentMethod" => [
            "Electronic check",
            "Electronic check",
            "Credit card (automatic)",
        ],
        "MonthlyCharges" => [70.7f64, 80.0, 56.15],
        "TotalCharges" => ["151.65", "960.0", "3487.95"],
        "Churn" => ["Yes", "No", "No"],
    }
    .unwrap()
}

/// Write a DataFrame to a CSV file inside a fresh temporary directory
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("customers.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Write a DataFrame to a Parquet file inside a fresh temporary directory
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("customers.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}
