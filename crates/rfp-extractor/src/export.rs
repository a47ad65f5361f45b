//! JSON import and export of final records

use crate::error::ExtractorError;
use rfp_domain::Record;
use std::fs;
use std::path::Path;
use tracing::info;

/// Serialize records as a pretty-printed JSON array
pub fn to_json(records: &[Record]) -> Result<String, ExtractorError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse records from a JSON array
pub fn from_json(json: &str) -> Result<Vec<Record>, ExtractorError> {
    Ok(serde_json::from_str(json)?)
}

/// Write records to `path`, replacing any existing file
pub fn write_records(path: impl AsRef<Path>, records: &[Record]) -> Result<(), ExtractorError> {
    let path = path.as_ref();
    fs::write(path, to_json(records)?)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read records previously written with [`write_records`]
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>, ExtractorError> {
    let path = path.as_ref();
    let records = from_json(&fs::read_to_string(path)?)?;
    info!("Imported {} records from {}", records.len(), path.display());
    Ok(records)
}
