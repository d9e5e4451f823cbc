//! # Empirist Writers
//!
//! Sinks for merged observations. `Report` forwards every record to each of its
//! writers through the `ReportWriter` trait.
//!
//! - `CsvWriter`: one delimited file per stream (`;` by default), header
//!   written lazily from the first record.
//! - `MemoryWriter`: numeric arrays per stream and field in a shared `MemorySink`,
//!   optionally capped to a ring of the most recent values.
//! - `NullWriter`: discards everything.

pub mod csv_file;
pub mod error;
pub mod memory;
pub mod null;

pub use csv_file::CsvWriter;
pub use error::WriterError;
pub use memory::{MemorySink, MemoryStore, MemoryWriter};
pub use null::NullWriter;

use core_types::{Parameter, Record};

/// The contract every sink implements.
pub trait ReportWriter {
    /// Persists or accumulates one merged record of `stream`.
    fn record(&mut self, stream: &str, record: &Record) -> Result<(), WriterError>;

    /// Flushes and releases whatever the writer holds. Called once, at the end
    /// of the reporting session.
    fn finish(&mut self) -> Result<(), WriterError> {
        Ok(())
    }

    /// Notification that `Report` registered a parameter.
    fn on_parameter_added(&mut self, _parameter: &Parameter) {}
}
