//! Export the metrics table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! a fixed header `Model,AIC,RMSE,Mean_Bias,MAE` and one row per converged model.
//! Floats are written in shortest round-trip form, so reading the file back
//! reproduces the in-memory values exactly.

use std::path::Path;

use crate::domain::MetricRecord;
use crate::error::AppError;

/// Write the metrics table, replacing any existing file at `path`.
pub fn write_metrics_csv(path: &Path, records: &[MetricRecord]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    // Written explicitly so an empty table still carries the header.
    writer
        .write_record(["Model", "AIC", "RMSE", "Mean_Bias", "MAE"])
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV '{}': {e}", path.display())))?;

    Ok(())
}

/// Read a metrics table written by [`write_metrics_csv`].
pub fn read_metrics_csv(path: &Path) -> Result<Vec<MetricRecord>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to open metrics CSV '{}': {e}", path.display())))?;

    reader
        .deserialize::<MetricRecord>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| AppError::new(2, format!("Invalid metrics CSV row {}: {e}", i + 1)))
        })
        .collect()
}
