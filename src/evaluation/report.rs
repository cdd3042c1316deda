//! Per-class precision / recall / F1 report

use super::confusion::ConfusionMatrix;
use super::{FRAUD, NORMAL};
use serde::{Deserialize, Serialize};
use std::fmt;

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];
const MACRO_AVG: &str = "macro avg";
const WEIGHTED_AVG: &str = "weighted avg";

/// Scores for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged scores across classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Classification report over the two transaction classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// Decimal places in the text rendering
    pub digits: usize,
}

/// `num / den`, or 0.0 when the denominator is empty
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

impl ClassificationReport {
    /// Build the report; `target_names` label class 0 and class 1
    pub fn from_confusion(cm: &ConfusionMatrix, target_names: [&str; 2]) -> Self {
        let classes: Vec<ClassMetrics> = [NORMAL, FRAUD]
            .iter()
            .zip(target_names.iter())
            .map(|(&class, name)| {
                let tp = cm.get(class, class);
                let precision = ratio(tp, cm.predicted(class));
                let recall = ratio(tp, cm.support(class));
                ClassMetrics {
                    name: name.to_string(),
                    precision,
                    recall,
                    f1_score: f1(precision, recall),
                    support: cm.support(class),
                }
            })
            .collect();

        let total = cm.total();
        let n_classes = classes.len() as f64;

        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total,
        };

        Self {
            accuracy: ratio(cm.correct(), total),
            classes,
            macro_avg,
            weighted_avg,
            digits: 2,
        }
    }

    /// Metrics for the class called `name`
    pub fn class(&self, name: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    /// Total rows evaluated
    pub fn total_support(&self) -> usize {
        self.macro_avg.support
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    digits: usize,
    name: &str,
    scores: [f64; 3],
    support: usize,
) -> fmt::Result {
    write!(f, "{:>width$} ", name)?;
    for score in scores {
        write!(f, " {:>9.digits$}", score)?;
    }
    writeln!(f, " {:>9}", support)
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits;
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain([WEIGHTED_AVG.len(), d])
            .max()
            .unwrap_or(WEIGHTED_AVG.len());

        write!(f, "{:>width$} ", "")?;
        for header in HEADERS {
            write!(f, " {:>9}", header)?;
        }
        writeln!(f)?;
        writeln!(f)?;

        for c in &self.classes {
            let scores = [c.precision, c.recall, c.f1_score];
            write_row(f, width, d, &c.name, scores, c.support)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.d$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support()
        )?;

        for (name, avg) in [(MACRO_AVG, &self.macro_avg), (WEIGHTED_AVG, &self.weighted_avg)] {
            let scores = [avg.precision, avg.recall, avg.f1_score];
            write_row(f, width, d, name, scores, avg.support)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> ClassificationReport {
        let y_true = [0, 0, 0, 0, 0, 1, 1, 1];
        let y_pred = [0, 0, 0, 0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();
        ClassificationReport::from_confusion(&cm, ["Normal", "Fraud"])
    }

    #[test]
    fn test_per_class_metrics() {
        let report = example();

        let normal = report.class("Normal").unwrap();
        assert!((normal.precision - 0.8).abs() < 1e-12);
        assert!((normal.recall - 0.8).abs() < 1e-12);
        assert_eq!(normal.support, 5);

        let fraud = report.class("Fraud").unwrap();
        assert!((fraud.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((fraud.f1_score - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(fraud.support, 3);

        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.precision - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_text_layout() {
        let expected = concat!(
            "              precision    recall  f1-score   support\n",
            "\n",
            "      Normal       0.80      0.80      0.80         5\n",
            "       Fraud       0.67      0.67      0.67         3\n",
            "\n",
            "    accuracy                           0.75         8\n",
            "   macro avg       0.73      0.73      0.73         8\n",
            "weighted avg       0.75      0.75      0.75         8\n",
        );
        assert_eq!(example().to_string(), expected);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // nothing predicted as fraud, no fraud present
        let cm = ConfusionMatrix::from_labels(&[0, 0, 0], &[0, 0, 0]).unwrap();
        let report = ClassificationReport::from_confusion(&cm, ["Normal", "Fraud"]);

        let fraud = report.class("Fraud").unwrap();
        assert_eq!(fraud.precision, 0.0);
        assert_eq!(fraud.recall, 0.0);
        assert_eq!(fraud.f1_score, 0.0);
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_string(&example()).unwrap();
        assert!(json.contains("\"name\":\"Fraud\""));
    }
}
