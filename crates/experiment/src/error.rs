use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Report error: {0}")]
    Report(#[from] reporting::ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize trial metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Trial tracker error: {0}")]
    Tracker(String),

    #[error("Experiment failed: {0}")]
    Experiment(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<indicatif::style::TemplateError> for ExperimentError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        ExperimentError::ProgressBarTemplate(error.to_string())
    }
}
