use crate::error::ConfigError;
use core_types::Scalar;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub output: Output,
    pub reporting: Reporting,
    pub experiment: ExperimentSettings,
    pub logging: Logging,
}

/// Where and how stream files are written.
#[derive(Debug, Clone, Deserialize)]
pub struct Output {
    /// The folder stream files and trial metadata are written to.
    pub directory: PathBuf,
    /// The field separator of the stream files. Must be a single ASCII character.
    pub separator: String,
}

impl Output {
    /// The separator as the byte the CSV writer expects.
    pub fn delimiter(&self) -> u8 {
        self.separator.as_bytes().first().copied().unwrap_or(b';')
    }
}

/// Parameters of the reporting engine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct Reporting {
    /// Number of observations averaged by sliding error streams.
    pub window_capacity: usize,
}

/// Parameters of an experiment session.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentSettings {
    /// How many times the experiment body is executed.
    pub runs: usize,
    /// Project name recorded with every trial.
    pub project: String,
    /// Extra parameters registered on the report before the experiment
    /// configures it, keyed by name. Their values become the defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, Scalar>,
}

/// Parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// Default filter directive, used when `RUST_LOG` is not set (e.g. "info").
    pub level: String,
    /// Optional file the log is written to instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.experiment.runs == 0 {
            return Err(invalid("experiment.runs", "must be at least 1"));
        }
        if self.reporting.window_capacity == 0 {
            return Err(invalid("reporting.window_capacity", "must be at least 1"));
        }
        if self.output.separator.len() != 1 || !self.output.separator.is_ascii() {
            return Err(invalid("output.separator", "must be a single ASCII character"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
