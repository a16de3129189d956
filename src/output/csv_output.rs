//! CSV sink
//!
//! Writes a `State,City,Stores` header followed by one row per record.

use crate::model::StoreRecord;
use crate::output::traits::{ensure_parent, OutputResult, RecordSink};
use std::path::{Path, PathBuf};

/// Rewrites a CSV file with the full record set
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for CsvSink {
    fn format(&self) -> &'static str {
        "CSV"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[StoreRecord]) -> OutputResult<()> {
        ensure_parent(&self.path)?;

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reads records back from a CSV file written by [`CsvSink`]
pub fn read_csv(path: &Path) -> OutputResult<Vec<StoreRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<StoreRecord>, csv::Error>>()?;
    Ok(records)
}
