//! # Empirist Experiments
//!
//! The driver around the reporting engine. An `Experiment` declares its streams
//! and parameters once and then emits observations from its run hooks; the
//! `ExperimentRunner` repeats those hooks for the configured number of runs,
//! stamping the run index onto every observation, and reports the resulting
//! trial to a `TrialTracker`.

pub mod error;
pub mod runner;
pub mod tracker;

pub use error::ExperimentError;
pub use runner::{ExperimentRunner, RUN_PARAMETER, TrialSummary};
pub use tracker::{LocalTracker, TrialOptions, TrialTracker, stream_file_name};

use reporting::Report;

/// A repeatable experiment.
///
/// `configure` is called once per trial to register streams, dependent streams,
/// parameters and extra writers. Then, for every run, `pre_experiment`,
/// `experiment` and `post_experiment` are called in that order.
pub trait Experiment {
    /// The name recorded with the trial.
    fn name(&self) -> &str;

    fn configure(&mut self, report: &mut Report) -> Result<(), ExperimentError>;

    fn pre_experiment(&mut self, _report: &mut Report) -> Result<(), ExperimentError> {
        Ok(())
    }

    /// The body of one run.
    fn experiment(&mut self, report: &mut Report) -> Result<(), ExperimentError>;

    fn post_experiment(&mut self, _report: &mut Report) -> Result<(), ExperimentError> {
        Ok(())
    }

    /// Options describing this trial, typically the parsed command-line values.
    fn options(&self) -> TrialOptions {
        TrialOptions::new()
    }
}
