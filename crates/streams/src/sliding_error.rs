use crate::error::StreamError;
use crate::window::{DEFAULT_WINDOW_CAPACITY, SlidingWindow};
use crate::DataStream;
use core_types::{FieldValue, ObservationInput, Record};
use std::collections::HashMap;

/// One tracked metric: the squared error between two fields of the master record.
#[derive(Debug, Clone)]
struct ErrorMetric {
    output: String,
    value_field: String,
    prediction_field: String,
    window: SlidingWindow,
}

/// A derived stream that emits, for each registered metric, the mean of the
/// squared error `(value - prediction)^2` over the last `capacity` observations
/// of its master stream.
///
/// Its schema should name the metric outputs, since the derived mapping it
/// produces is keyed by them.
#[derive(Debug, Clone)]
pub struct SlidingErrorStream {
    scheme: Vec<String>,
    errors: Vec<ErrorMetric>,
}

impl SlidingErrorStream {
    pub fn new<I, S>(scheme: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scheme: scheme.into_iter().map(Into::into).collect(),
            errors: Vec::new(),
        }
    }

    /// Tracks the squared error between `value_field` and `prediction_field`
    /// under `output`, over a zero-filled window of the default capacity.
    pub fn add_error(
        &mut self,
        value_field: impl Into<String>,
        prediction_field: impl Into<String>,
        output: impl Into<String>,
    ) {
        self.add_error_with_capacity(value_field, prediction_field, output, DEFAULT_WINDOW_CAPACITY);
    }

    /// Same as `add_error` with an explicit window capacity. Registering an
    /// existing output again replaces it with a fresh window.
    pub fn add_error_with_capacity(
        &mut self,
        value_field: impl Into<String>,
        prediction_field: impl Into<String>,
        output: impl Into<String>,
        capacity: usize,
    ) {
        let metric = ErrorMetric {
            output: output.into(),
            value_field: value_field.into(),
            prediction_field: prediction_field.into(),
            window: SlidingWindow::new(capacity),
        };

        match self.errors.iter_mut().find(|m| m.output == metric.output) {
            Some(existing) => *existing = metric,
            None => self.errors.push(metric),
        }
    }

    /// The window behind `output`, if that metric is registered.
    pub fn window(&self, output: &str) -> Option<&SlidingWindow> {
        self.errors
            .iter()
            .find(|m| m.output == output)
            .map(|m| &m.window)
    }
}

fn numeric_field(record: &Record, field: &str) -> Result<f64, StreamError> {
    record
        .get(field)
        .ok_or_else(|| StreamError::MissingField(field.to_string()))?
        .as_f64()
        .ok_or_else(|| StreamError::NonNumericField(field.to_string()))
}

impl DataStream for SlidingErrorStream {
    fn scheme(&self) -> &[String] {
        &self.scheme
    }

    fn observation(&mut self, merged: &Record) -> Result<Option<ObservationInput>, StreamError> {
        // Resolve every input before touching a window so a bad record leaves
        // all windows unchanged.
        let squared_errors = self
            .errors
            .iter()
            .map(|m| {
                let value = numeric_field(merged, &m.value_field)?;
                let prediction = numeric_field(merged, &m.prediction_field)?;
                Ok((value - prediction).powi(2))
            })
            .collect::<Result<Vec<f64>, StreamError>>()?;

        let mut result = HashMap::with_capacity(self.errors.len());
        for (metric, squared_error) in self.errors.iter_mut().zip(squared_errors) {
            metric.window.push(squared_error);
            let mean = metric.window.mean();
            tracing::trace!(output = %metric.output, squared_error, mean, "Sliding error updated");
            result.insert(metric.output.clone(), FieldValue::from(mean));
        }

        Ok(Some(ObservationInput::Mapping(result)))
    }
}
