//! Anomaly detection module
//!
//! Scores follow the "higher is more normal" convention: `score_samples`
//! returns values in `[-1, 0]`, `decision_function` shifts them by the fitted
//! offset so that negative values mark anomalies, and `predict` returns
//! `1` for inliers and `-1` for anomalies.

mod isolation_forest;

pub use isolation_forest::{
    average_path_length, IsolationForest, IsolationForestConfig, IsolationTree,
};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw model label for an inlier
pub const INLIER: i32 = 1;
/// Raw model label for an anomaly
pub const OUTLIER: i32 = -1;

/// Anomaly detection result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyResult {
    /// Decision function values (lower = more anomalous)
    pub scores: Array1<f64>,
    /// Raw labels (-1 = anomaly, 1 = normal)
    pub labels: Array1<i32>,
    /// Offset subtracted from `score_samples`
    pub offset: f64,
    /// Number of anomalies detected
    pub n_anomalies: usize,
}

/// Fit/score capability for unsupervised detectors
pub trait AnomalyDetector: Send + Sync {
    /// Fit the detector on training data
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Raw normality score per row (higher = more normal)
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Offset that separates inliers from anomalies
    fn offset(&self) -> Result<f64>;

    /// `score_samples - offset`; negative values are anomalies
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let offset = self.offset()?;
        Ok(self.score_samples(x)? - offset)
    }

    /// Predict labels (-1 = anomaly, 1 = normal)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        Ok(self
            .decision_function(x)?
            .mapv(|d| if d < 0.0 { OUTLIER } else { INLIER }))
    }

    /// Fit and predict in one step
    fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        self.predict(x)
    }

    /// Decision scores and labels together
    fn detect(&self, x: &Array2<f64>) -> Result<AnomalyResult> {
        let offset = self.offset()?;
        let scores = self.decision_function(x)?;
        let labels = scores.mapv(|d| if d < 0.0 { OUTLIER } else { INLIER });
        let n_anomalies = labels.iter().filter(|&&l| l == OUTLIER).count();

        Ok(AnomalyResult {
            scores,
            labels,
            offset,
            n_anomalies,
        })
    }
}

/// Expected share of anomalies, used to place the decision offset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ParamRepr", into = "ParamRepr")]
pub enum Contamination {
    /// Fixed offset of -0.5 from the original Isolation Forest paper
    #[default]
    Auto,
    /// Fraction in `(0, 0.5]`
    Fraction(f64),
}

impl Contamination {
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            Contamination::Auto => Ok(()),
            Contamination::Fraction(c) if c > 0.0 && c <= 0.5 => Ok(()),
            Contamination::Fraction(c) => Err(PipelineError::invalid_parameter(
                "contamination",
                c,
                "must be 'auto' or a fraction in (0, 0.5]",
            )),
        }
    }
}

impl fmt::Display for Contamination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contamination::Auto => write!(f, "auto"),
            Contamination::Fraction(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for Contamination {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Contamination::Auto);
        }
        s.parse::<f64>()
            .map(Contamination::Fraction)
            .map_err(|_| format!("expected 'auto' or a number, got '{}'", s))
    }
}

/// Rows drawn to build each tree
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ParamRepr", into = "ParamRepr")]
pub enum MaxSamples {
    /// `min(256, n_samples)`
    #[default]
    Auto,
    /// Absolute row count, clamped to `n_samples`
    Count(usize),
    /// Fraction of `n_samples` in `(0, 1]`
    Fraction(f64),
}

impl MaxSamples {
    /// Resolve against the number of training rows
    pub fn resolve(&self, n_samples: usize) -> Result<usize> {
        match *self {
            MaxSamples::Auto => Ok(n_samples.min(256)),
            MaxSamples::Count(0) => Err(PipelineError::invalid_parameter(
                "max_samples",
                0,
                "must be at least 1",
            )),
            MaxSamples::Count(n) => {
                if n > n_samples {
                    tracing::warn!(
                        max_samples = n,
                        n_samples,
                        "max_samples exceeds the number of rows, using all rows"
                    );
                }
                Ok(n.min(n_samples))
            }
            MaxSamples::Fraction(f) if f > 0.0 && f <= 1.0 => {
                Ok(((f * n_samples as f64) as usize).max(1))
            }
            MaxSamples::Fraction(f) => Err(PipelineError::invalid_parameter(
                "max_samples",
                f,
                "fraction must be in (0, 1]",
            )),
        }
    }
}

/// Wire form shared by `Contamination` and `MaxSamples`: `"auto"` or a number
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ParamRepr {
    Text(String),
    Count(u64),
    Number(f64),
}

impl TryFrom<ParamRepr> for Contamination {
    type Error = String;

    fn try_from(repr: ParamRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ParamRepr::Text(s) => s.parse(),
            ParamRepr::Count(n) => Ok(Contamination::Fraction(n as f64)),
            ParamRepr::Number(c) => Ok(Contamination::Fraction(c)),
        }
    }
}

impl From<Contamination> for ParamRepr {
    fn from(c: Contamination) -> Self {
        match c {
            Contamination::Auto => ParamRepr::Text("auto".to_string()),
            Contamination::Fraction(c) => ParamRepr::Number(c),
        }
    }
}

impl TryFrom<ParamRepr> for MaxSamples {
    type Error = String;

    fn try_from(repr: ParamRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ParamRepr::Text(s) if s.eq_ignore_ascii_case("auto") => Ok(MaxSamples::Auto),
            ParamRepr::Text(s) => Err(format!("expected 'auto' or a number, got '{}'", s)),
            ParamRepr::Count(n) => Ok(MaxSamples::Count(n as usize)),
            ParamRepr::Number(f) => Ok(MaxSamples::Fraction(f)),
        }
    }
}

impl From<MaxSamples> for ParamRepr {
    fn from(m: MaxSamples) -> Self {
        match m {
            MaxSamples::Auto => ParamRepr::Text("auto".to_string()),
            MaxSamples::Count(n) => ParamRepr::Count(n as u64),
            MaxSamples::Fraction(f) => ParamRepr::Number(f),
        }
    }
}
