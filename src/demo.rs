use core_types::{ObservationInput, Parameter};
use experiment::{Experiment, ExperimentError, RUN_PARAMETER, TrialOptions};
use reporting::Report;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use streams::{BasicStream, SlidingErrorStream};
use writers::{MemorySink, MemoryWriter};

/// Stream of raw observations.
pub const SIGNAL_STREAM: &str = "default";
/// Sliding error stream derived from `SIGNAL_STREAM`.
pub const ERROR_STREAM: &str = "error";

/// Tracks a sine wave with an exponential-smoothing predictor and compares it
/// with a naive "same as last value" predictor.
///
/// Each run shifts the phase of the signal by half a radian.
pub struct SineTracking {
    steps: usize,
    alpha: f64,
    window: usize,
    memory: MemorySink,
    smoothed: f64,
    last_value: f64,
}

impl SineTracking {
    pub fn new(steps: usize, alpha: f64, window: usize) -> Self {
        Self {
            steps,
            alpha,
            window,
            memory: MemorySink::default(),
            smoothed: 0.0,
            last_value: 0.0,
        }
    }

    fn recent_mean(&self, field: &str) -> Option<f64> {
        let store = self.memory.borrow();
        let values = store.field(ERROR_STREAM, field)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl Experiment for SineTracking {
    fn name(&self) -> &str {
        "SineTracking"
    }

    fn configure(&mut self, report: &mut Report) -> Result<(), ExperimentError> {
        report.add_parameter(Parameter::new("alpha", self.alpha));
        report.add_stream(
            SIGNAL_STREAM,
            BasicStream::new(["step", "value", "prediction", "naive"]),
        );

        let mut errors = SlidingErrorStream::new(["mse", "mse_naive"]);
        errors.add_error_with_capacity("value", "prediction", "mse", self.window);
        errors.add_error_with_capacity("value", "naive", "mse_naive", self.window);
        report.add_stream(ERROR_STREAM, errors);
        report.add_dependent_stream(ERROR_STREAM, SIGNAL_STREAM)?;

        let mut memory = MemoryWriter::new(
            Rc::clone(&self.memory),
            HashMap::from([(
                ERROR_STREAM.to_string(),
                vec!["mse".to_string(), "mse_naive".to_string()],
            )]),
        );
        memory.set_capping(ERROR_STREAM, self.steps);
        report.add_writer(memory);
        Ok(())
    }

    fn pre_experiment(&mut self, _report: &mut Report) -> Result<(), ExperimentError> {
        self.smoothed = 0.0;
        self.last_value = 0.0;
        Ok(())
    }

    fn experiment(&mut self, report: &mut Report) -> Result<(), ExperimentError> {
        let run = report
            .parameter(RUN_PARAMETER)?
            .value()
            .as_f64()
            .ok_or_else(|| ExperimentError::Experiment(format!("parameter '{RUN_PARAMETER}' is not numeric")))?;

        for step in 0..self.steps {
            let value = (step as f64 * 0.1 + run * 0.5).sin();
            report.observation(
                SIGNAL_STREAM,
                &ObservationInput::mapping([
                    ("step", step as f64),
                    ("value", value),
                    ("prediction", self.smoothed),
                    ("naive", self.last_value),
                ]),
            )?;

            self.smoothed += self.alpha * (value - self.smoothed);
            self.last_value = value;
        }
        Ok(())
    }

    fn post_experiment(&mut self, _report: &mut Report) -> Result<(), ExperimentError> {
        tracing::info!(
            mse = ?self.recent_mean("mse"),
            mse_naive = ?self.recent_mean("mse_naive"),
            "Run complete"
        );
        Ok(())
    }

    fn options(&self) -> TrialOptions {
        let mut options = TrialOptions::new();
        options.insert("steps".to_string(), Value::from(self.steps));
        options.insert("alpha".to_string(), Value::from(self.alpha));
        options.insert("window".to_string(), Value::from(self.window));
        options
    }
}
