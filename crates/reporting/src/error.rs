use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Data stream not found: {0}")]
    UnknownStream(String),

    #[error("Parameter not found: {0}")]
    UnknownParameter(String),

    #[error("Making '{stream}' depend on '{master}' would create a dependency cycle")]
    DependencyCycle { stream: String, master: String },

    #[error("Stream error: {0}")]
    Stream(#[from] streams::StreamError),

    #[error("Writer error: {0}")]
    Writer(#[from] writers::WriterError),
}
