use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error("Positional data has {actual} values but the stream schema declares {expected} fields")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Field '{0}' is required by the stream schema but was not supplied")]
    MissingField(String),

    #[error("Field '{0}' must be numeric to compute a derived metric")]
    NonNumericField(String),
}
