//! fraud-iforest - Unsupervised credit-card fraud detection
//!
//! Loads a transaction table, standardizes the amount column, fits an
//! Isolation Forest on every row and evaluates its anomaly flags against the
//! known fraud labels.
//!
//! # Modules
//!
//! - [`utils`] - CSV loading and DataFrame to ndarray conversion
//! - [`preprocessing`] - Column dropping and standard scaling
//! - [`anomaly`] - Isolation Forest and the detector trait
//! - [`evaluation`] - Confusion matrix, classification report, top-N ranking
//! - [`pipeline`] - Configuration and the end-to-end run
//! - [`cli`] - Command-line interface

pub mod error;

pub mod anomaly;
pub mod evaluation;
pub mod pipeline;
pub mod preprocessing;
pub mod utils;

pub mod cli;

pub use error::{PipelineError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::anomaly::{
        AnomalyDetector, AnomalyResult, Contamination, IsolationForest, IsolationForestConfig,
        MaxSamples,
    };
    pub use crate::error::{PipelineError, Result};
    pub use crate::evaluation::{
        evaluate, fraud_in_top_n, ClassificationReport, ConfusionMatrix,
    };
    pub use crate::pipeline::{
        run_isolation_forest, AnomalyPipeline, PipelineConfig, PipelineResult,
    };
    pub use crate::preprocessing::{FeaturePreparer, FeatureTransform, StandardScaler};
    pub use crate::utils::DataLoader;
}
