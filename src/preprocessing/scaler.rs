//! Column standardization

use super::FeatureTransform;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted centre/scale for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

/// Z-score scaler: `(x - mean) / std` with the population standard deviation.
///
/// A column with zero variance keeps a scale of 1.0, so it maps to all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted parameters, in the order the columns were given to `fit`
    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Undo the scaling on every fitted column
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| v * p.scale + p.mean)
    }

    fn compute_params(df: &DataFrame, col_name: &str) -> Result<ScalerParams> {
        let column = df
            .column(col_name)
            .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
        let column_f64 = column.cast(&DataType::Float64)?;
        let ca = column_f64.f64()?;

        let mean = ca.mean().unwrap_or(0.0);
        let std = ca.std(0).unwrap_or(0.0);

        Ok(ScalerParams {
            column: col_name.to_string(),
            mean,
            scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
        })
    }

    /// Build every replacement column first, then swap them in on one clone
    fn apply<F>(&self, df: &DataFrame, f: F) -> Result<DataFrame>
    where
        F: Fn(f64, &ScalerParams) -> f64,
    {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|params| {
                let column = df
                    .column(&params.column)
                    .map_err(|_| PipelineError::FeatureNotFound(params.column.clone()))?;
                let column_f64 = column.cast(&DataType::Float64)?;
                let ca = column_f64.f64()?;

                let scaled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| opt.map(|v| f(v, params)))
                    .collect();

                Ok(scaled.with_name(column.name().clone()).into_series())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }
}

impl FeatureTransform for StandardScaler {
    fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<()> {
        self.params = columns
            .iter()
            .map(|name| Self::compute_params(df, name))
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| (v - p.mean) / p.scale)
    }
}
