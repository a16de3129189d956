//! Result accumulator
//!
//! Holds every record collected so far, in the order states and cities
//! were walked, and rewrites each sink from the full set on `persist`.
//! The walker is the only writer; it owns the accumulator for the run.

use crate::config::OutputConfig;
use crate::model::StoreRecord;
use crate::output::traits::{OutputResult, RecordSink};
use crate::output::{CsvSink, JsonSink};

pub struct ResultAccumulator {
    records: Vec<StoreRecord>,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl ResultAccumulator {
    /// Creates an accumulator writing to the given sinks
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self {
            records: Vec::new(),
            sinks,
        }
    }

    /// Creates an accumulator writing the configured CSV and JSON files
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(vec![
            Box::new(CsvSink::new(&config.csv_path)),
            Box::new(JsonSink::new(&config.json_path)),
        ])
    }

    /// Appends a batch of records, dropping any without stores
    pub fn extend(&mut self, records: impl IntoIterator<Item = StoreRecord>) {
        let before = self.records.len();
        self.records
            .extend(records.into_iter().filter(|r| !r.is_empty()));
        tracing::debug!("Accumulated {} new records", self.records.len() - before);
    }

    /// Rewrites every sink from the complete record set
    ///
    /// Does nothing (beyond a warning) while no records have been collected,
    /// so an empty run never leaves empty files behind.
    pub fn persist(&self) -> OutputResult<()> {
        if self.records.is_empty() {
            tracing::warn!("No data to save");
            return Ok(());
        }

        for sink in &self.sinks {
            sink.write_all(&self.records)?;
            tracing::info!(
                "Saved {} records to {} ({})",
                self.records.len(),
                sink.path().display(),
                sink.format()
            );
        }
        Ok(())
    }

    pub fn records(&self) -> &[StoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
