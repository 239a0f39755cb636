//! Dataset loading and saving

use super::{records_from_frame, records_to_frame, LaunchRecord};
use crate::error::{LandingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// An in-memory launch table, the input of the feature pipeline
#[derive(Debug, Clone)]
pub struct LaunchTable {
    frame: DataFrame,
}

impl LaunchTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// A table with no rows and no columns
    pub fn empty() -> Self {
        Self { frame: DataFrame::empty() }
    }

    pub fn from_records(records: &[LaunchRecord]) -> Result<Self> {
        Ok(Self::new(records_to_frame(records)?))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Typed records, see [`records_from_frame`]
    pub fn records(&self) -> Result<Vec<LaunchRecord>> {
        records_from_frame(&self.frame)
    }
}

impl From<DataFrame> for LaunchTable {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

/// Reads and writes delimited launch tables
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Field separator
    delimiter: u8,
    /// Rows scanned for schema inference
    infer_schema_length: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 1000,
        }
    }

    /// Set the field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a delimited file with a header row.
    /// `.tsv` files default to tab separation.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LaunchTable> {
        let path = path.as_ref();
        let start = Instant::now();

        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") => b'\t',
            _ => self.delimiter,
        };

        let file = File::open(path).map_err(|e| {
            LandingError::Data(format!("cannot open '{}': {}", path.display(), e))
        })?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        info!(
            path = %path.display(),
            rows = frame.height(),
            cols = frame.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded launch table"
        );

        Ok(LaunchTable::new(frame))
    }

    /// Write a table as CSV with a header row, creating parent directories
    pub fn save(&self, table: &LaunchTable, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)?;
        let mut frame = table.frame().clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(self.delimiter)
            .finish(&mut frame)?;

        debug!(path = %path.display(), rows = frame.height(), "Saved launch table");
        Ok(path.to_path_buf())
    }
}
