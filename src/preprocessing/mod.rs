//! Data preprocessing module
//!
//! - [`FeatureTransform`]: fit/transform capability over named columns
//! - [`StandardScaler`]: z-score standardization
//! - [`FeaturePreparer`]: turns the transaction table into a feature matrix

mod features;
mod scaler;

pub use features::{FeaturePreparer, PreparedFeatures};
pub use scaler::{ScalerParams, StandardScaler};

use crate::error::Result;
use polars::prelude::*;

/// A column transform that is fit on a table and then applied to it.
///
/// `transform` replaces the fitted columns and leaves the rest of the table
/// (and its row order) untouched.
pub trait FeatureTransform {
    /// Learn transform parameters for `columns`
    fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<()>;

    /// Apply the fitted transform
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}
