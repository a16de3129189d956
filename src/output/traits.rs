//! Output sink trait and error types
//!
//! A sink owns one output file and rewrites it in full from the record
//! slice it is given. Sinks never append, so writing the same records
//! twice leaves the file byte-identical.

use crate::model::StoreRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
pub trait RecordSink: Send + Sync {
    /// Short format name for log lines
    fn format(&self) -> &'static str;

    /// File this sink writes
    fn path(&self) -> &Path;

    /// Replaces the file contents with `records`, in order
    ///
    /// # Arguments
    ///
    /// * `records` - The complete record set accumulated so far
    fn write_all(&self, records: &[StoreRecord]) -> OutputResult<()>;
}

/// Creates the parent directory of `path` if it has one
pub(crate) fn ensure_parent(path: &Path) -> OutputResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}
