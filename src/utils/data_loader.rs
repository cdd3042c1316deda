//! Data loading utilities

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// CSV loader for transaction tables
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Separator byte
    separator: u8,
    /// Rows scanned for schema inference (`None` scans the whole file)
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader for comma-separated files with a header row
    pub fn new() -> Self {
        Self {
            separator: b',',
            infer_schema_length: None,
        }
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Limit schema inference to the first `n` rows
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    /// Load `file_name` from inside `data_dir`
    pub fn load_from_dir(&self, data_dir: impl AsRef<Path>, file_name: &str) -> Result<DataFrame> {
        let path: PathBuf = data_dir.as_ref().join(file_name);
        self.load_csv(&path)
    }

    /// Load a CSV file.
    ///
    /// A missing or unreadable file surfaces as [`PipelineError::IoError`];
    /// content the parser rejects surfaces as [`PipelineError::DataError`].
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        Ok(df)
    }

    /// Fail with [`PipelineError::FeatureNotFound`] on the first absent column
    pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
        for name in columns {
            if df.column(name).is_err() {
                return Err(PipelineError::FeatureNotFound(name.to_string()));
            }
        }
        debug!(columns = ?columns, "Required columns present");
        Ok(())
    }

    /// Get file info without loading full data
    pub fn get_file_info(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        let path = path.as_ref();
        let file_size = std::fs::metadata(path)?.len();

        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let separator = char::from(self.separator);
        let columns: Vec<String> = header
            .split(separator)
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut n_rows = 0;
        for line in lines {
            if !line?.trim().is_empty() {
                n_rows += 1;
            }
        }

        Ok(FileInfo {
            path: path.to_path_buf(),
            file_size,
            n_rows,
            columns,
        })
    }
}

/// File information gathered without parsing the full table
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub n_rows: usize,
    pub columns: Vec<String>,
}

impl FileInfo {
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}
