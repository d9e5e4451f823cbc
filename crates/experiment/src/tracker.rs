use crate::error::ExperimentError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Trial options: parameter name -> value, plus the `__`-prefixed bookkeeping keys.
pub type TrialOptions = Map<String, Value>;

/// The service that tracks trials and keeps their output files.
///
/// The runner needs a folder to write stream files into, a trial identifier to
/// name them by, a way to signal success, and a way to hand the produced files
/// over once the session is done.
pub trait TrialTracker {
    /// The folder stream files must be written to.
    fn data_folder(&self) -> &Path;

    /// Registers a new trial described by `options` and returns its identifier.
    fn create_trial(&mut self, options: &TrialOptions) -> Result<String, ExperimentError>;

    /// Marks the current trial as successful.
    fn set_success(&mut self) -> Result<(), ExperimentError>;

    /// Hands over the files of the given streams. Returns the files that existed.
    fn upload_data(&mut self, stream_names: &[String]) -> Result<Vec<PathBuf>, ExperimentError>;
}

/// Stream file name used by both the runner and the trackers.
pub fn stream_file_name(trial_id: &str, stream: &str) -> String {
    format!("{}-{}.csv", trial_id, stream)
}

/// A tracker that keeps everything in a local folder.
///
/// Each trial gets a UUID and a `<id>.trial.json` metadata file holding its
/// options; success rewrites that file with `__successful: true`. Uploading
/// leaves the stream files where they are and only reports them.
#[derive(Debug)]
pub struct LocalTracker {
    folder: PathBuf,
    trial: Option<(String, TrialOptions)>,
}

impl LocalTracker {
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self, ExperimentError> {
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        Ok(Self { folder, trial: None })
    }

    pub fn trial_id(&self) -> Option<&str> {
        self.trial.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn metadata_path(&self, trial_id: &str) -> PathBuf {
        self.folder.join(format!("{}.trial.json", trial_id))
    }

    fn current_trial(&mut self) -> Result<&mut (String, TrialOptions), ExperimentError> {
        self.trial
            .as_mut()
            .ok_or_else(|| ExperimentError::Tracker("no trial has been created".to_string()))
    }

    fn write_metadata(&self, trial_id: &str, options: &TrialOptions) -> Result<(), ExperimentError> {
        let json = serde_json::to_string_pretty(options)?;
        fs::write(self.metadata_path(trial_id), json)?;
        Ok(())
    }
}

impl TrialTracker for LocalTracker {
    fn data_folder(&self) -> &Path {
        &self.folder
    }

    fn create_trial(&mut self, options: &TrialOptions) -> Result<String, ExperimentError> {
        let trial_id = Uuid::new_v4().to_string();
        self.write_metadata(&trial_id, options)?;
        tracing::info!(trial_id = %trial_id, folder = %self.folder.display(), "Created trial");

        self.trial = Some((trial_id.clone(), options.clone()));
        Ok(trial_id)
    }

    fn set_success(&mut self) -> Result<(), ExperimentError> {
        let (trial_id, options) = self.current_trial()?;
        options.insert("__successful".to_string(), Value::Bool(true));
        let (trial_id, options) = (trial_id.clone(), options.clone());

        self.write_metadata(&trial_id, &options)?;
        tracing::info!(trial_id = %trial_id, "Trial marked successful");
        Ok(())
    }

    fn upload_data(&mut self, stream_names: &[String]) -> Result<Vec<PathBuf>, ExperimentError> {
        let trial_id = self.current_trial()?.0.clone();

        let mut files = Vec::new();
        for stream in stream_names {
            let path = self.folder.join(stream_file_name(&trial_id, stream));
            if path.is_file() {
                tracing::info!(stream = %stream, path = %path.display(), "Stream data kept in local store");
                files.push(path);
            } else {
                tracing::debug!(stream = %stream, "No data file for stream; nothing to upload");
            }
        }
        Ok(files)
    }
}
