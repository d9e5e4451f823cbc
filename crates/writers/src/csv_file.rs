use crate::{ReportWriter, WriterError};
use core_types::Record;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

/// Placeholder replaced by the stream name in a `CsvWriter` filename template.
pub const STREAM_PLACEHOLDER: &str = "{stream}";

const DEFAULT_SEPARATOR: u8 = b';';

struct CsvFile {
    path: PathBuf,
    out: csv::Writer<BufWriter<File>>,
}

/// Writes one delimited text file per stream.
///
/// A stream's file is created on its first record, and the header row is built
/// from that first record's field names. Later rows carry values only, so a
/// stream whose field set changes between observations gets rows that no longer
/// line up with its header. Fields holding the separator, quotes or line breaks
/// are quoted.
pub struct CsvWriter {
    template: String,
    separator: u8,
    files: HashMap<String, CsvFile>,
    finished: bool,
}

impl CsvWriter {
    /// `template` is a path in which `{stream}` is replaced by the stream name,
    /// e.g. `data/trial-{stream}.csv`.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        tracing::debug!(template = %template, "CSV writer configured");
        Self {
            template,
            separator: DEFAULT_SEPARATOR,
            files: HashMap::new(),
            finished: false,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// The path the records of `stream` go to.
    pub fn path_for(&self, stream: &str) -> PathBuf {
        PathBuf::from(self.template.replace(STREAM_PLACEHOLDER, stream))
    }

    /// Paths of every file opened so far, keyed by stream name.
    pub fn opened_files(&self) -> HashMap<&str, &PathBuf> {
        self.files
            .iter()
            .map(|(stream, file)| (stream.as_str(), &file.path))
            .collect()
    }

    fn open_file(&self, stream: &str, header: &Record) -> Result<CsvFile, WriterError> {
        let path = self.path_for(stream);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut out = csv::WriterBuilder::new()
            .delimiter(self.separator)
            .has_headers(false)
            .flexible(true)
            .from_writer(BufWriter::new(File::create(&path)?));
        out.write_record(header.names())?;

        tracing::info!(stream, path = %path.display(), "Opened stream output file");
        Ok(CsvFile { path, out })
    }
}

impl ReportWriter for CsvWriter {
    fn record(&mut self, stream: &str, record: &Record) -> Result<(), WriterError> {
        if self.finished {
            return Err(WriterError::AlreadyFinished);
        }

        if !self.files.contains_key(stream) {
            let file = self.open_file(stream, record)?;
            self.files.insert(stream.to_string(), file);
        }

        if let Some(file) = self.files.get_mut(stream) {
            file.out.write_record(record.values().map(ToString::to_string))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        if self.finished {
            return Err(WriterError::AlreadyFinished);
        }
        self.finished = true;

        for (stream, mut file) in self.files.drain() {
            file.out.flush()?;
            tracing::debug!(stream = %stream, path = %file.path.display(), "Closed stream output file");
        }
        Ok(())
    }
}
