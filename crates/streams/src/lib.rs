//! # Empirist Streams
//!
//! A stream is a named channel of observations with a fixed, ordered schema of
//! field names. This crate defines the `DataStream` trait that the `Report`
//! registry drives, plus the concrete streams:
//!
//! - `BasicStream`: a plain schema with no derivation.
//! - `SlidingErrorStream`: derives the running mean squared error between pairs of
//!   fields of its master stream, over a fixed-size `SlidingWindow`.

pub mod basic;
pub mod error;
pub mod sliding_error;
pub mod window;

pub use basic::BasicStream;
pub use error::StreamError;
pub use sliding_error::SlidingErrorStream;
pub use window::{DEFAULT_WINDOW_CAPACITY, SlidingWindow};

use core_types::{ObservationInput, Record, Scalar};

/// The core trait every stream implements.
///
/// `Report` owns its streams as `Box<dyn DataStream>`. `observation` takes
/// `&mut self` because derived streams keep state (their sliding windows)
/// between observations.
pub trait DataStream {
    /// The ordered field names an observation on this stream must supply.
    fn scheme(&self) -> &[String];

    /// Resolves caller data into ordered `(field, value)` pairs.
    ///
    /// A mapping must contain every schema field (extra keys are ignored); a
    /// positional list must have exactly one value per schema field. Sequence
    /// values are flattened into `field0, field1, ...`.
    fn to_record(&self, data: &ObservationInput) -> Result<Vec<(String, Scalar)>, StreamError> {
        let scheme = self.scheme();
        let mut out = Vec::with_capacity(scheme.len());

        match data {
            ObservationInput::Mapping(fields) => {
                for field in scheme {
                    let value = fields
                        .get(field)
                        .ok_or_else(|| StreamError::MissingField(field.clone()))?;
                    value.flatten_into(field, &mut out);
                }
            }
            ObservationInput::Positional(values) => {
                if values.len() != scheme.len() {
                    return Err(StreamError::SchemaMismatch {
                        expected: scheme.len(),
                        actual: values.len(),
                    });
                }
                for (field, value) in scheme.iter().zip(values) {
                    value.flatten_into(field, &mut out);
                }
            }
        }

        Ok(out)
    }

    /// Derivation hook invoked when this stream depends on a master stream.
    ///
    /// Receives the master's merged record and returns the data to observe on
    /// this stream, or `None` when the stream derives nothing.
    fn observation(&mut self, _merged: &Record) -> Result<Option<ObservationInput>, StreamError> {
        Ok(None)
    }
}
