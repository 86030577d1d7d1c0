//! Aggregate income comparison CSV

use loanflow_domain::{ComparisonRow, ComparisonTable};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name of the comparison table inside the aggregate directory.
pub const COMPARISON_FILE: &str = "income_comparison_latest.csv";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write report {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Write `table` to `<dir>/income_comparison_latest.csv`, replacing it.
pub fn write_comparison_csv(table: &ComparisonTable, dir: &Path) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(COMPARISON_FILE);
    let csv_error = |source: csv::Error| ReportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
    writer
        .write_record(ComparisonRow::COLUMNS)
        .map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row.values()).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|e| csv_error(csv::Error::from(e)))?;

    info!("Wrote {} comparison rows to {}", table.rows.len(), path.display());
    Ok(path)
}
