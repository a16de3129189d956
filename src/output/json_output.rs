//! JSON sink
//!
//! Writes the records as a pretty-printed array of
//! `{"State", "City", "Stores"}` objects.

use crate::model::StoreRecord;
use crate::output::traits::{ensure_parent, OutputResult, RecordSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for JsonSink {
    fn format(&self) -> &'static str {
        "JSON"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[StoreRecord]) -> OutputResult<()> {
        ensure_parent(&self.path)?;

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads records back from a JSON file written by [`JsonSink`]
pub fn read_json(path: &Path) -> OutputResult<Vec<StoreRecord>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
