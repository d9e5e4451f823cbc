//! # Empirist Core Types
//!
//! The shared vocabulary of the reporting engine. Every other crate in the
//! workspace speaks in terms of these types.
//!
//! - `Scalar`: a single recorded value (int, float, bool or text).
//! - `FieldValue`: what a caller may supply for one schema field; sequences are
//!   flattened into `field0, field1, ...` when a record is built.
//! - `ObservationInput`: the mapping-or-positional shape of the data handed to
//!   `Report::observation`.
//! - `Record`: the ordered `(field, value)` list that writers receive.
//! - `Parameter`: a named, resettable piece of experiment state.

pub mod parameter;
pub mod record;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use parameter::Parameter;
pub use record::Record;
pub use value::{FieldValue, ObservationInput, Scalar};
