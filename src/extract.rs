//! Identifier extraction from the input spreadsheet.

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Read the identifier column from a CSV file, failing on the first problem.
pub fn read_user_ids(path: &Path, column: &str) -> Result<Vec<i64>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    parse_user_ids(file, column)
}

/// Parse a header row plus records and pull the integer ids out of `column`.
pub fn parse_user_ids<R: Read>(source: R, column: &str) -> Result<Vec<i64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers().context("failed to read CSV headers")?;
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| anyhow!("column '{}' not found in header", column))?;

    let mut ids = Vec::new();
    // Row numbers count the header as row 1.
    for (row, record) in reader.records().enumerate() {
        let row = row + 2;
        let record = record.with_context(|| format!("row {}: CSV parse error", row))?;
        let raw = record
            .get(index)
            .ok_or_else(|| anyhow!("row {}: missing '{}' value", row, column))?;
        let id = raw
            .parse::<i64>()
            .with_context(|| format!("row {}: '{}' is not an integer id", row, raw))?;
        ids.push(id);
    }
    debug!(count = ids.len(), column, "parsed identifier column");
    Ok(ids)
}

/// Extract phase entry point: any failure is logged and yields no ids.
pub fn extract_user_ids(path: &Path, column: &str) -> Vec<i64> {
    match read_user_ids(path, column) {
        Ok(ids) => {
            println!("EXTRACT: {} ids read from {}", ids.len(), path.display());
            ids
        }
        Err(e) => {
            warn!(path = %path.display(), "identifier extraction failed: {:#}", e);
            println!("Extraction error: {:#}", e);
            Vec::new()
        }
    }
}
