//! Binary confusion matrix

use super::{check_binary, check_lengths, FRAUD, NORMAL};
use crate::error::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2×2 confusion matrix over the fixed label set `[0, 1]`.
///
/// Entry `(i, j)` counts rows whose true class is `i` and predicted class is `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Tally true labels against predicted flags, aligned by position
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;
        check_binary("true labels", y_true)?;
        check_binary("predictions", y_pred)?;

        let mut matrix = Array2::<usize>::zeros((2, 2));
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            matrix[[t as usize, p as usize]] += 1;
        }

        Ok(Self { matrix })
    }

    #[inline]
    pub fn get(&self, actual: u8, predicted: u8) -> usize {
        self.matrix[[actual as usize, predicted as usize]]
    }

    pub fn total(&self) -> usize {
        self.matrix.sum()
    }

    pub fn true_negatives(&self) -> usize {
        self.get(NORMAL, NORMAL)
    }

    pub fn false_positives(&self) -> usize {
        self.get(NORMAL, FRAUD)
    }

    pub fn false_negatives(&self) -> usize {
        self.get(FRAUD, NORMAL)
    }

    pub fn true_positives(&self) -> usize {
        self.get(FRAUD, FRAUD)
    }

    /// Rows predicted as `class`
    pub fn predicted(&self, class: u8) -> usize {
        self.matrix.column(class as usize).sum()
    }

    /// Rows whose true class is `class`
    pub fn support(&self, class: u8) -> usize {
        self.matrix.row(class as usize).sum()
    }

    /// Correctly classified rows
    pub fn correct(&self) -> usize {
        self.true_negatives() + self.true_positives()
    }
}

/// Bracketed rows, every cell padded to the widest count
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .matrix
            .iter()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);

        for (i, row) in self.matrix.rows().into_iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>width$}", v)).collect();
            let open = if i == 0 { "[[" } else { " [" };
            let close = if i + 1 == self.matrix.nrows() { "]]" } else { "]\n" };
            write!(f, "{}{}{}", open, cells.join(" "), close)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_cells() {
        let y_true = [0, 0, 0, 0, 0, 1, 1, 1];
        let y_pred = [0, 0, 0, 0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();

        assert_eq!(cm.true_negatives(), 4);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.total(), 8);
        assert_eq!(cm.support(FRAUD), 3);
        assert_eq!(cm.predicted(FRAUD), 3);
    }

    #[test]
    fn test_single_class_still_2x2() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(cm.matrix.shape(), &[2, 2]);
        assert_eq!(cm.true_negatives(), 3);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn test_length_mismatch() {
        let err = ConfusionMatrix::from_labels(&[0, 1], &[0]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }

    #[test]
    fn test_non_binary_label() {
        let err = ConfusionMatrix::from_labels(&[0, 2], &[0, 1]).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
    }

    #[test]
    fn test_display_pads_cells() {
        let mut y_true = vec![0u8; 1200];
        let mut y_pred = vec![0u8; 1200];
        y_true.extend_from_slice(&[1, 1, 1]);
        y_pred.extend_from_slice(&[1, 1, 0]);
        y_pred[0] = 1;

        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();
        assert_eq!(cm.to_string(), "[[1199    1]\n [   1    2]]");
    }
}
