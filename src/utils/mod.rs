//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, FileInfo};

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Every column is cast to Float64; nulls and non-finite values are rejected
/// rather than filled.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| column_to_f64(df, col_name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Read a single column as `Vec<f64>`; every value must be present and finite
pub fn column_to_f64(df: &DataFrame, col_name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
    let column_f64 = column.cast(&DataType::Float64)?;

    column_f64
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(PipelineError::DataError(format!(
                "non-finite value {} in column '{}' at row {}",
                v, col_name, row
            ))),
            None => Err(PipelineError::DataError(format!(
                "null value in column '{}' at row {}",
                col_name, row
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_to_array2_row_major() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[10i64, 20, 30]
        )
        .unwrap();

        let x = columns_to_array2(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[1, 0]], 2.0);
        assert_eq!(x[[2, 1]], 30.0);
    }

    #[test]
    fn test_missing_column() {
        let df = df!("a" => &[1.0]).unwrap();
        let err = columns_to_array2(&df, &["z".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::FeatureNotFound(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let df = df!("a" => &[1.0, bad, 3.0]).unwrap();
            let err = columns_to_array2(&df, &["a".to_string()]).unwrap_err();
            assert!(matches!(err, PipelineError::DataError(_)));
        }
    }

    #[test]
    fn test_null_rejected() {
        let df = df!("a" => &[Some(1.0), None]).unwrap();
        let err = column_to_f64(&df, "a").unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }
}
