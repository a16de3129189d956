//! Output module for persisting scraped records
//!
//! This module handles:
//! - Accumulating store records across the walk
//! - Rewriting the CSV and JSON outputs from the full record set

mod accumulator;
mod csv_output;
mod json_output;
mod traits;

pub use accumulator::ResultAccumulator;
pub use csv_output::{read_csv, CsvSink};
pub use json_output::{read_json, JsonSink};
pub use traits::{OutputError, OutputResult, RecordSink};
