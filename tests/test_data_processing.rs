//! Integration tests for data processing: loading, scaling, and feature preparation

use fraud_iforest::error::PipelineError;
use fraud_iforest::preprocessing::{FeaturePreparer, FeatureTransform, StandardScaler};
use fraud_iforest::utils::{column_to_f64, DataLoader};
use polars::prelude::*;
use std::io::Write;

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const SAMPLE: &str = "\
Time,V1,V2,Amount,Class
0,-1.36,-0.07,149.62,0
0,1.19,0.26,2.69,0
1,-1.36,-1.34,378.66,0
1,-0.97,-0.19,123.50,0
2,-1.16,0.88,69.99,1
";

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_csv_infers_numeric_columns() {
    let file = write_file(SAMPLE);
    let df = DataLoader::new().load_csv(file.path()).unwrap();

    assert_eq!(df.height(), 5);
    assert_eq!(df.width(), 5);
    assert_eq!(df.column("Amount").unwrap().dtype(), &DataType::Float64);
    assert!(df.column("Class").unwrap().dtype().is_integer());
}

#[test]
fn test_load_semicolon_separated() {
    let file = write_file("a;b\n1.5;2\n3.5;4\n");
    let df = DataLoader::new()
        .with_separator(b';')
        .load_csv(file.path())
        .unwrap();
    assert_eq!(column_to_f64(&df, "a").unwrap(), vec![1.5, 3.5]);
}

#[test]
fn test_file_info() {
    let file = write_file(SAMPLE);
    let info = DataLoader::new().get_file_info(file.path()).unwrap();
    assert_eq!(info.n_rows, 5);
    assert_eq!(info.n_cols(), 5);
    assert!(info.file_size > 0);
    assert_eq!(info.columns[0], "Time");
}

#[test]
fn test_ragged_csv_is_data_error() {
    let file = write_file("Time,V1,Amount,Class\n0,1.5,10.0,0\n1,2.5,20.0,0,7,8\n");
    let err = DataLoader::new().load_csv(file.path()).unwrap_err();
    assert!(matches!(err, PipelineError::DataError(_)));
}

#[test]
fn test_infinite_feature_is_data_error() {
    let file = write_file("Time,V1,Amount,Class\n0,1.5,10.0,0\n9,inf,10.0,1\n");
    let df = DataLoader::new().load_csv(file.path()).unwrap();

    let err = FeaturePreparer::default()
        .prepare(&df, &mut StandardScaler::new())
        .unwrap_err();
    assert!(matches!(err, PipelineError::DataError(_)));
}

#[test]
fn test_missing_file() {
    let err = DataLoader::new()
        .load_csv("/definitely/not/here/creditcard.csv")
        .unwrap_err();
    assert!(matches!(err, PipelineError::IoError(_)));
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_prepare_loaded_table() {
    let file = write_file(SAMPLE);
    let df = DataLoader::new().load_csv(file.path()).unwrap();

    let mut scaler = StandardScaler::new();
    let prepared = FeaturePreparer::default().prepare(&df, &mut scaler).unwrap();

    assert_eq!(prepared.feature_names, vec!["V1", "V2", "Amount"]);
    assert_eq!(prepared.n_rows(), 5);
    assert_eq!(prepared.n_features(), 3);

    let amount = prepared.matrix.column(2);
    let mean = amount.sum() / 5.0;
    let var = amount.mapv(|v| (v - mean).powi(2)).sum() / 5.0;
    assert!(mean.abs() < 1e-10);
    assert!((var.sqrt() - 1.0).abs() < 1e-10);

    // untouched feature
    assert_eq!(prepared.matrix[[1, 0]], 1.19);
}

#[test]
fn test_scaler_reused_on_new_rows() {
    let train = df!("Amount" => &[10.0, 20.0, 30.0]).unwrap();
    let fresh = df!("Amount" => &[20.0, 40.0]).unwrap();

    let mut scaler = StandardScaler::new();
    scaler.fit(&train, &["Amount"]).unwrap();
    let out = scaler.transform(&fresh).unwrap();

    let values = column_to_f64(&out, "Amount").unwrap();
    let std = (200.0f64 / 3.0).sqrt();
    assert!(values[0].abs() < 1e-12);
    assert!((values[1] - 20.0 / std).abs() < 1e-12);
}

#[test]
fn test_custom_drop_and_scale_lists() {
    let df = df!(
        "id" => &[1i64, 2, 3],
        "x" => &[1.0, 2.0, 3.0],
        "y" => &[5.0, 5.0, 5.0],
        "Class" => &[0i64, 1, 0]
    )
    .unwrap();

    let preparer = FeaturePreparer::new()
        .with_drop_columns(&["id"])
        .with_scale_columns(&["x", "y"]);
    let prepared = preparer.prepare(&df, &mut StandardScaler::new()).unwrap();

    assert_eq!(prepared.feature_names, vec!["x", "y"]);
    // constant column maps to zero
    assert!(prepared.matrix.column(1).iter().all(|&v| v == 0.0));
}
