use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("I/O error while writing report output: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error while writing report output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Field '{field}' of stream '{stream}' is not numeric and cannot be kept in memory")]
    NonNumericValue { stream: String, field: String },

    #[error("Writer has already been finished")]
    AlreadyFinished,
}
