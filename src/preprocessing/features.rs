//! Feature matrix preparation for the transaction table

use super::FeatureTransform;
use crate::error::Result;
use crate::utils::{columns_to_array2, DataLoader};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which columns leave the table and which get scaled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturePreparer {
    /// Ground-truth column; always removed from the features
    pub label_column: String,
    /// Other columns removed before modeling (timestamp)
    pub drop_columns: Vec<String>,
    /// Columns overwritten with their scaled values
    pub scale_columns: Vec<String>,
}

impl Default for FeaturePreparer {
    fn default() -> Self {
        Self {
            label_column: "Class".to_string(),
            drop_columns: vec!["Time".to_string()],
            scale_columns: vec!["Amount".to_string()],
        }
    }
}

/// Model-ready features, row-aligned with the source table
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    pub frame: DataFrame,
    pub feature_names: Vec<String>,
    pub matrix: Array2<f64>,
}

impl PreparedFeatures {
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }
}

impl FeaturePreparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    pub fn with_drop_columns(mut self, columns: &[&str]) -> Self {
        self.drop_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_scale_columns(mut self, columns: &[&str]) -> Self {
        self.scale_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Drop the label and the other non-feature columns, then fit `transform`
    /// on the scale columns and apply it to the same rows.
    pub fn prepare<T: FeatureTransform>(
        &self,
        df: &DataFrame,
        transform: &mut T,
    ) -> Result<PreparedFeatures> {
        let mut drop: Vec<&str> = self.drop_columns.iter().map(String::as_str).collect();
        if !drop.contains(&self.label_column.as_str()) {
            drop.push(&self.label_column);
        }
        let scale: Vec<&str> = self.scale_columns.iter().map(String::as_str).collect();
        DataLoader::require_columns(df, &drop)?;
        DataLoader::require_columns(df, &scale)?;

        let mut features = df.clone();
        for name in &drop {
            features = features.drop(name)?;
        }

        let frame = transform.fit_transform(&features, &scale)?;

        let feature_names: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let matrix = columns_to_array2(&frame, &feature_names)?;

        debug!(
            rows = matrix.nrows(),
            features = matrix.ncols(),
            scaled = ?scale,
            "Prepared feature matrix"
        );

        Ok(PreparedFeatures {
            frame,
            feature_names,
            matrix,
        })
    }
}
