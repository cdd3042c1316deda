//! Evaluation of anomaly flags and rankings against fraud labels

mod confusion;
mod ranking;
mod report;

pub use confusion::ConfusionMatrix;
pub use ranking::{fraud_in_top_n, ranked_indices};
pub use report::{AverageMetrics, ClassMetrics, ClassificationReport};

use crate::error::{PipelineError, Result};

/// Label of a normal transaction
pub const NORMAL: u8 = 0;
/// Label of a fraudulent transaction
pub const FRAUD: u8 = 1;
/// Display names for classes 0 and 1
pub const TARGET_NAMES: [&str; 2] = ["Normal", "Fraud"];

pub(crate) fn check_lengths(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PipelineError::ShapeError {
            expected: format!("{} rows", expected),
            actual: format!("{} rows", actual),
        });
    }
    Ok(())
}

pub(crate) fn check_binary(what: &str, values: &[u8]) -> Result<()> {
    match values.iter().find(|&&v| v != NORMAL && v != FRAUD) {
        Some(v) => Err(PipelineError::ValidationError(format!(
            "{} must be 0 or 1, found {}",
            what, v
        ))),
        None => Ok(()),
    }
}

/// Confusion matrix and report in one pass
pub fn evaluate(y_true: &[u8], y_pred: &[u8]) -> Result<(ConfusionMatrix, ClassificationReport)> {
    let cm = ConfusionMatrix::from_labels(y_true, y_pred)?;
    let report = ClassificationReport::from_confusion(&cm, TARGET_NAMES);
    Ok((cm, report))
}
