use crate::{ReportWriter, WriterError};
use core_types::Record;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Numeric series kept in memory: stream name -> field name -> values, oldest first.
///
/// Duplicate stream names are aliases of a canonical stream and read the same
/// series.
#[derive(Debug, Default)]
pub struct MemoryStore {
    streams: HashMap<String, HashMap<String, VecDeque<f64>>>,
    aliases: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn canonical<'a>(&'a self, stream: &'a str) -> &'a str {
        self.aliases.get(stream).map(String::as_str).unwrap_or(stream)
    }

    /// All series of `stream` (or of the stream it aliases).
    pub fn stream(&self, stream: &str) -> Option<&HashMap<String, VecDeque<f64>>> {
        self.streams.get(self.canonical(stream))
    }

    pub fn field(&self, stream: &str, field: &str) -> Option<&VecDeque<f64>> {
        self.stream(stream)?.get(field)
    }

    /// A copy of one series, oldest value first.
    pub fn values(&self, stream: &str, field: &str) -> Option<Vec<f64>> {
        self.field(stream, field).map(|v| v.iter().copied().collect())
    }

    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().chain(self.aliases.keys()).map(String::as_str)
    }
}

/// The handle shared between a `MemoryWriter` and whoever reads its series.
/// Access is confined to the reporting thread.
pub type MemorySink = Rc<RefCell<MemoryStore>>;

/// Accumulates the allow-listed numeric fields of each stream into a `MemorySink`.
pub struct MemoryWriter {
    sink: MemorySink,
    /// Stream name -> fields kept for that stream.
    streams_mapping: HashMap<String, Vec<String>>,
    caps: HashMap<String, usize>,
}

impl MemoryWriter {
    /// Creates the writer and an empty series for every listed stream and field
    /// that the sink does not already hold.
    pub fn new(sink: MemorySink, streams_mapping: HashMap<String, Vec<String>>) -> Self {
        let writer = Self {
            sink,
            streams_mapping,
            caps: HashMap::new(),
        };
        writer.init_mapping();
        writer
    }

    pub fn sink(&self) -> MemorySink {
        Rc::clone(&self.sink)
    }

    fn init_mapping(&self) {
        let mut store = self.sink.borrow_mut();
        for (stream, fields) in &self.streams_mapping {
            let series = store.streams.entry(stream.clone()).or_default();
            for field in fields {
                series.entry(field.clone()).or_default();
            }
        }
    }

    /// Caps every series of `stream` at `cap` values. Once full, each new value
    /// evicts the oldest one; series already longer than `cap` are trimmed.
    pub fn set_capping(&mut self, stream: &str, cap: usize) {
        let mut store = self.sink.borrow_mut();
        let canonical = store.canonical(stream).to_string();

        if let Some(series) = store.streams.get_mut(&canonical) {
            for values in series.values_mut() {
                while values.len() > cap {
                    values.pop_front();
                }
            }
        }
        self.caps.insert(canonical, cap);
    }

    /// Makes `duplicate` an alias of `stream`: records on either name land in
    /// the same series, filtered by `stream`'s field list. Series previously
    /// held under `duplicate` are dropped.
    pub fn add_duplicate_stream(&mut self, stream: &str, duplicate: &str) {
        let mut store = self.sink.borrow_mut();
        store.streams.remove(duplicate);
        store
            .aliases
            .insert(duplicate.to_string(), stream.to_string());
        self.streams_mapping.remove(duplicate);
        tracing::debug!(stream, duplicate, "Registered duplicate memory stream");
    }
}

impl ReportWriter for MemoryWriter {
    fn record(&mut self, stream: &str, record: &Record) -> Result<(), WriterError> {
        let mut store = self.sink.borrow_mut();
        let canonical = store.canonical(stream).to_string();

        let Some(fields) = self.streams_mapping.get(&canonical) else {
            return Ok(());
        };
        let cap = self.caps.get(&canonical).copied();

        // Every kept value is resolved before any series grows, so a rejected
        // record leaves the series aligned.
        let kept = record
            .iter()
            .filter(|(name, _)| fields.iter().any(|f| f == *name))
            .map(|(name, value)| {
                value
                    .as_f64()
                    .map(|v| (name, v))
                    .ok_or_else(|| WriterError::NonNumericValue {
                        stream: stream.to_string(),
                        field: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let series = store.streams.entry(canonical).or_default();
        for (name, value) in kept {
            let values = series.entry(name.to_string()).or_default();
            if let Some(cap) = cap {
                if cap == 0 {
                    continue;
                }
                if values.len() >= cap {
                    values.pop_front();
                }
            }
            values.push_back(value);
        }
        Ok(())
    }
}
