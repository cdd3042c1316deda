//! Pipeline configuration

use crate::anomaly::{Contamination, IsolationForestConfig, MaxSamples};
use crate::error::Result;
use crate::preprocessing::FeaturePreparer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything one pipeline run needs; there is no process-wide state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the dataset
    pub data_dir: PathBuf,

    /// CSV file name inside `data_dir`
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Lowest-scored rows inspected by the top-N analysis
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Isolation Forest hyperparameters
    #[serde(default)]
    pub model: IsolationForestConfig,

    /// Label column plus the columns dropped and scaled before fitting
    #[serde(default)]
    pub features: FeaturePreparer,
}

fn default_file_name() -> String {
    "creditcard.csv".to_string()
}

fn default_top_n() -> usize {
    1000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_name: default_file_name(),
            top_n: default_top_n(),
            model: IsolationForestConfig::default(),
            features: FeaturePreparer::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Full path of the dataset
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Ground-truth column (0 = normal, 1 = fraud); never used as a feature
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.features.label_column = name.into();
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.model.n_estimators = n;
        self
    }

    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.model.contamination = contamination;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.model.random_state = seed;
        self
    }

    pub fn with_max_samples(mut self, max_samples: MaxSamples) -> Self {
        self.model.max_samples = max_samples;
        self
    }

    pub fn with_model(mut self, model: IsolationForestConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_features(mut self, features: FeaturePreparer) -> Self {
        self.features = features;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_path(), PathBuf::from("data/creditcard.csv"));
        assert_eq!(config.top_n, 1000);
        assert_eq!(config.model.n_estimators, 100);
        assert_eq!(config.model.random_state, 13);
        assert_eq!(config.model.contamination, Contamination::Auto);
        assert!(!config.model.bootstrap);
        assert_eq!(config.features.label_column, "Class");
        assert_eq!(config.features.drop_columns, vec!["Time"]);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_data_dir("/tmp/fraud")
            .with_file_name("sample.csv")
            .with_n_estimators(25)
            .with_contamination(Contamination::Fraction(0.01))
            .with_random_state(7)
            .with_top_n(50);

        assert_eq!(config.data_path(), PathBuf::from("/tmp/fraud/sample.csv"));
        assert_eq!(config.model.n_estimators, 25);
        assert_eq!(config.model.contamination, Contamination::Fraction(0.01));
        assert_eq!(config.model.random_state, 7);
        assert_eq!(config.top_n, 50);
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"data_dir": "/srv/data", "top_n": 20,
                "model": {{"n_estimators": 10, "random_state": 1, "contamination": 0.02}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.file_name, "creditcard.csv");
        assert_eq!(config.top_n, 20);
        assert_eq!(config.model.n_estimators, 10);
        assert_eq!(config.model.contamination, Contamination::Fraction(0.02));
        assert_eq!(config.model.max_samples, MaxSamples::Auto);
        assert_eq!(config.model.max_features, 1.0);
        assert_eq!(config.features.label_column, "Class");
    }

    #[test]
    fn test_label_column_in_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"data_dir": "data", "features": {"label_column": "Fraud"}}"#,
        )
        .unwrap();
        assert_eq!(config.features.label_column, "Fraud");
        assert_eq!(config.features.drop_columns, vec!["Time"]);
        assert_eq!(config.features.scale_columns, vec!["Amount"]);

        let built = PipelineConfig::new().with_label_column("Fraud");
        assert_eq!(built.features.label_column, "Fraud");
    }
}
