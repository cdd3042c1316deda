//! End-to-end fraud detection run

use super::config::PipelineConfig;
use crate::anomaly::{AnomalyDetector, IsolationForest, INLIER, OUTLIER};
use crate::error::{PipelineError, Result};
use crate::evaluation::{
    evaluate, fraud_in_top_n, ClassificationReport, ConfusionMatrix, FRAUD, NORMAL,
};
use crate::preprocessing::{FeaturePreparer, FeatureTransform, StandardScaler};
use crate::utils::DataLoader;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Counts describing one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub n_rows: usize,
    pub n_features: usize,
    pub n_fraud: usize,
    pub n_flagged: usize,
    /// Decision offset fitted by the detector
    pub offset: f64,
    pub elapsed_ms: u64,
}

/// Everything a run reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub confusion_matrix: ConfusionMatrix,
    /// Text rendering of `report`
    pub classification_report: String,
    pub report: ClassificationReport,
    pub top_n: usize,
    pub fraud_in_top_n: usize,
    pub summary: RunSummary,
    /// Decision score per row (lower = more anomalous)
    pub scores: Vec<f64>,
    /// Binary anomaly flag per row (1 = flagged)
    pub flags: Vec<u8>,
    /// Ground-truth label per row
    pub labels: Vec<u8>,
}

/// Map a raw detector label onto the 0/1 fraud encoding
pub fn remap_prediction(raw: i32) -> Result<u8> {
    match raw {
        OUTLIER => Ok(FRAUD),
        INLIER => Ok(NORMAL),
        other => Err(PipelineError::ValidationError(format!(
            "detector returned label {}, expected {} or {}",
            other, OUTLIER, INLIER
        ))),
    }
}

/// Read `column` as 0/1 labels.
///
/// Integer and float columns are both accepted; nulls, fractions and any
/// other value are rejected.
pub fn extract_labels(df: &DataFrame, column: &str) -> Result<Vec<u8>> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::FeatureNotFound(column.to_string()))?
        .cast(&DataType::Float64)?;

    col.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v == 0.0 => Ok(NORMAL),
            Some(v) if v == 1.0 => Ok(FRAUD),
            Some(v) => Err(PipelineError::ValidationError(format!(
                "label column '{}' has value {} at row {}",
                column, v, row
            ))),
            None => Err(PipelineError::ValidationError(format!(
                "label column '{}' is missing a value at row {}",
                column, row
            ))),
        })
        .collect()
}

/// Prepare, fit, score and evaluate with pluggable components.
///
/// The detector is fit and evaluated on the same rows; there is no
/// train/test split.
pub struct AnomalyPipeline<T: FeatureTransform, D: AnomalyDetector> {
    preparer: FeaturePreparer,
    transform: T,
    detector: D,
}

impl<T: FeatureTransform, D: AnomalyDetector> AnomalyPipeline<T, D> {
    pub fn new(transform: T, detector: D) -> Self {
        Self {
            preparer: FeaturePreparer::default(),
            transform,
            detector,
        }
    }

    pub fn with_preparer(mut self, preparer: FeaturePreparer) -> Self {
        self.preparer = preparer;
        self
    }

    /// Read labels from `name` and keep it out of the features
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.preparer.label_column = name.into();
        self
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Run every stage on an already loaded table
    pub fn run_on_frame(&mut self, df: &DataFrame, top_n: usize) -> Result<PipelineResult> {
        let start = Instant::now();

        let labels = extract_labels(df, &self.preparer.label_column)?;
        let prepared = self.preparer.prepare(df, &mut self.transform)?;

        let stage = Instant::now();
        self.detector.fit(&prepared.matrix)?;
        let detection = self.detector.detect(&prepared.matrix)?;
        debug!(
            elapsed_ms = stage.elapsed().as_millis() as u64,
            anomalies = detection.n_anomalies,
            "Detector fit and scored"
        );

        let flags = detection
            .labels
            .iter()
            .map(|&raw| remap_prediction(raw))
            .collect::<Result<Vec<u8>>>()?;
        let scores = detection.scores.to_vec();

        let (confusion_matrix, report) = evaluate(&labels, &flags)?;
        let fraud_in_top_n = fraud_in_top_n(&scores, &labels, top_n)?;

        let summary = RunSummary {
            n_rows: prepared.n_rows(),
            n_features: prepared.n_features(),
            n_fraud: confusion_matrix.support(FRAUD),
            n_flagged: detection.n_anomalies,
            offset: detection.offset,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            rows = summary.n_rows,
            fraud = summary.n_fraud,
            flagged = summary.n_flagged,
            top_n,
            fraud_in_top_n,
            elapsed_ms = summary.elapsed_ms,
            "Pipeline run complete"
        );

        Ok(PipelineResult {
            classification_report: report.to_string(),
            confusion_matrix,
            report,
            top_n,
            fraud_in_top_n,
            summary,
            scores,
            flags,
            labels,
        })
    }
}

/// Load the configured CSV and run the standard scaler + Isolation Forest pipeline
pub fn run_isolation_forest(config: &PipelineConfig) -> Result<PipelineResult> {
    info!(
        path = %config.data_path().display(),
        n_estimators = config.model.n_estimators,
        contamination = %config.model.contamination,
        random_state = config.model.random_state,
        "Starting isolation forest run"
    );

    let df = DataLoader::new().load_from_dir(&config.data_dir, &config.file_name)?;

    let mut pipeline = AnomalyPipeline::new(
        StandardScaler::new(),
        IsolationForest::from_config(config.model.clone()),
    )
    .with_preparer(config.features.clone());

    pipeline.run_on_frame(&df, config.top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_prediction() {
        assert_eq!(remap_prediction(-1).unwrap(), 1);
        assert_eq!(remap_prediction(1).unwrap(), 0);
        assert!(matches!(
            remap_prediction(0),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_extract_labels_casts_floats() {
        let df = df!("Class" => &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(extract_labels(&df, "Class").unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn test_extract_labels_rejects_other_values() {
        let df = df!("Class" => &[0i64, 2, 1]).unwrap();
        assert!(matches!(
            extract_labels(&df, "Class"),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_extract_labels_rejects_fractions() {
        for labels in [[0.0, 0.5], [1.7, 0.0]] {
            let df = df!("Class" => &labels).unwrap();
            assert!(matches!(
                extract_labels(&df, "Class"),
                Err(PipelineError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_extract_labels_rejects_text() {
        let df = df!("Class" => &["0", "fraud"]).unwrap();
        assert!(matches!(
            extract_labels(&df, "Class"),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_extract_labels_rejects_null() {
        let df = df!("Class" => &[Some(0i64), None, Some(1)]).unwrap();
        assert!(matches!(
            extract_labels(&df, "Class"),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_extract_labels_missing_column() {
        let df = df!("Amount" => &[1.0, 2.0]).unwrap();
        assert!(matches!(
            extract_labels(&df, "Class"),
            Err(PipelineError::FeatureNotFound(_))
        ));
    }
}
