//! Isolation Forest anomaly detection

use super::{AnomalyDetector, Contamination, MaxSamples};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points:
/// `c(n) = 2 * (ln(n - 1) + γ) - 2 * (n - 1) / n` for `n > 2`
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n_f = n as f64;
            2.0 * ((n_f - 1.0).ln() + EULER_GAMMA) - 2.0 * (n_f - 1.0) / n_f
        }
    }
}

/// Isolation Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IsolationTree {
    /// Internal node with split
    Internal {
        /// Column index into the full feature matrix
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left subtree (values <= threshold)
        left: Box<IsolationTree>,
        /// Right subtree (values > threshold)
        right: Box<IsolationTree>,
    },
    /// External (leaf) node
    External {
        /// Number of training samples that reached this leaf
        size: usize,
    },
}

impl IsolationTree {
    /// Build an isolation tree over `indices`, splitting only on `features`
    pub fn build(
        x: &Array2<f64>,
        indices: &[usize],
        features: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();

        if depth >= max_depth || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        // Draw features until one is non-constant on this node
        let mut candidates = features.to_vec();
        while !candidates.is_empty() {
            let feature = candidates.swap_remove(rng.gen_range(0..candidates.len()));

            let (min_val, max_val) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| {
                    let v = x[[i, feature]];
                    (lo.min(v), hi.max(v))
                },
            );

            if !(max_val > min_val) {
                continue;
            }

            // Convex combination stays finite even when `max - min` overflows
            let u: f64 = rng.gen();
            let mut threshold = min_val * (1.0 - u) + max_val * u;
            if threshold >= max_val {
                threshold = min_val;
            }

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature]] <= threshold);

            if left_indices.is_empty() || right_indices.is_empty() {
                return IsolationTree::External { size: n_samples };
            }

            let left = Box::new(Self::build(
                x,
                &left_indices,
                features,
                depth + 1,
                max_depth,
                rng,
            ));
            let right = Box::new(Self::build(
                x,
                &right_indices,
                features,
                depth + 1,
                max_depth,
                rng,
            ));

            return IsolationTree::Internal {
                feature,
                threshold,
                left,
                right,
            };
        }

        IsolationTree::External { size: n_samples }
    }

    /// Depth at which `sample` lands, plus the expected remaining depth of its leaf
    pub fn path_length(&self, sample: ArrayView1<f64>, current_depth: usize) -> f64 {
        match self {
            IsolationTree::External { size } => current_depth as f64 + average_path_length(*size),
            IsolationTree::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.path_length(sample, current_depth + 1)
                } else {
                    right.path_length(sample, current_depth + 1)
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        match self {
            IsolationTree::External { .. } => 1,
            IsolationTree::Internal { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }
}

/// Isolation Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Rows drawn per tree
    #[serde(default)]
    pub max_samples: MaxSamples,
    /// Expected proportion of anomalies
    #[serde(default)]
    pub contamination: Contamination,
    /// Fraction of features drawn per tree, in `(0, 1]`
    #[serde(default = "default_max_features")]
    pub max_features: f64,
    /// Draw rows with replacement
    #[serde(default)]
    pub bootstrap: bool,
    /// Seed for the tree ensemble
    pub random_state: u64,
}

fn default_max_features() -> f64 {
    1.0
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: MaxSamples::Auto,
            contamination: Contamination::Auto,
            max_features: default_max_features(),
            bootstrap: false,
            random_state: 13,
        }
    }
}

impl IsolationForestConfig {
    /// Reject values the forest cannot be fit with
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }
        if !(self.max_features > 0.0 && self.max_features <= 1.0) {
            return Err(PipelineError::invalid_parameter(
                "max_features",
                self.max_features,
                "must be a fraction in (0, 1]",
            ));
        }
        self.contamination.validate()
    }
}

/// Isolation Forest anomaly detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    /// Fitted trees
    trees: Option<Vec<IsolationTree>>,
    /// Resolved rows per tree
    max_samples: Option<usize>,
    /// Width of the training matrix
    n_features: Option<usize>,
    /// Fitted decision offset
    offset: Option<f64>,
}

impl IsolationForest {
    /// Create new Isolation Forest with default parameters
    pub fn new() -> Self {
        Self::from_config(IsolationForestConfig::default())
    }

    pub fn from_config(config: IsolationForestConfig) -> Self {
        Self {
            config,
            trees: None,
            max_samples: None,
            n_features: None,
            offset: None,
        }
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    /// Set rows drawn per tree
    pub fn with_max_samples(mut self, max_samples: MaxSamples) -> Self {
        self.config.max_samples = max_samples;
        self
    }

    /// Set contamination
    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.config.contamination = contamination;
        self
    }

    /// Set fraction of features per tree
    pub fn with_max_features(mut self, fraction: f64) -> Self {
        self.config.max_features = fraction;
        self
    }

    /// Sample rows with replacement
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    /// Set random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.config.random_state = seed;
        self
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Fitted trees, if any
    pub fn trees(&self) -> Option<&[IsolationTree]> {
        self.trees.as_deref()
    }

    /// Rows each tree was built from
    pub fn max_samples(&self) -> Option<usize> {
        self.max_samples
    }

    fn draw_rows(&self, n_samples: usize, max_samples: usize, rng: &mut StdRng) -> Vec<usize> {
        if self.config.bootstrap {
            (0..max_samples).map(|_| rng.gen_range(0..n_samples)).collect()
        } else {
            index::sample(rng, n_samples, max_samples).into_vec()
        }
    }

    fn draw_features(n_features: usize, n_tree_features: usize, rng: &mut StdRng) -> Vec<usize> {
        if n_tree_features >= n_features {
            (0..n_features).collect()
        } else {
            index::sample(rng, n_features, n_tree_features).into_vec()
        }
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &Array1<f64>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        self.config.validate()?;

        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(PipelineError::ValidationError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }
        if n_features == 0 {
            return Err(PipelineError::ValidationError(
                "cannot fit on a matrix with no features".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::ValidationError(
                "cannot fit on a matrix with NaN or infinite values".to_string(),
            ));
        }

        let start = Instant::now();
        let max_samples = self.config.max_samples.resolve(n_samples)?;
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;
        let n_tree_features = ((self.config.max_features * n_features as f64) as usize).max(1);

        let mut rng = StdRng::seed_from_u64(self.config.random_state);

        let trees: Vec<IsolationTree> = (0..self.config.n_estimators)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let rows = self.draw_rows(n_samples, max_samples, &mut tree_rng);
                let features = Self::draw_features(n_features, n_tree_features, &mut tree_rng);
                IsolationTree::build(x, &rows, &features, 0, max_depth, &mut tree_rng)
            })
            .collect();

        debug!(
            trees = trees.len(),
            nodes = trees.iter().map(IsolationTree::node_count).sum::<usize>(),
            max_depth,
            "Built isolation trees"
        );

        self.trees = Some(trees);
        self.max_samples = Some(max_samples);
        self.n_features = Some(n_features);

        let offset = match self.config.contamination {
            Contamination::Auto => -0.5,
            Contamination::Fraction(c) => percentile(&self.score_samples(x)?, 100.0 * c),
        };
        self.offset = Some(offset);

        info!(
            n_estimators = self.config.n_estimators,
            max_samples,
            n_features,
            contamination = %self.config.contamination,
            offset,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Isolation forest fitted"
        );

        Ok(())
    }

    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let trees = self.trees.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        let n_features = self.n_features.ok_or(PipelineError::ModelNotFitted)?;
        let max_samples = self.max_samples.ok_or(PipelineError::ModelNotFitted)?;

        if x.ncols() != n_features {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let c_n = average_path_length(max_samples.max(2));
        let n_trees = trees.len() as f64;

        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let avg_path_length: f64 = trees
                    .iter()
                    .map(|tree| tree.path_length(row, 0))
                    .sum::<f64>()
                    / n_trees;

                -(2.0_f64.powf(-avg_path_length / c_n))
            })
            .collect())
    }

    fn offset(&self) -> Result<f64> {
        self.offset.ok_or(PipelineError::ModelNotFitted)
    }
}
