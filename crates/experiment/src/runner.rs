use crate::error::ExperimentError;
use crate::tracker::{TrialOptions, TrialTracker, stream_file_name};
use crate::Experiment;
use chrono::Local;
use core_types::{Parameter, Record};
use indicatif::{ProgressBar, ProgressStyle};
use reporting::Report;
use serde_json::Value;
use std::path::PathBuf;
use writers::CsvWriter;

/// Name of the parameter carrying the zero-based index of the current run.
pub const RUN_PARAMETER: &str = "Run";

/// What a completed trial produced.
#[derive(Debug, Clone)]
pub struct TrialSummary {
    pub trial_id: String,
    pub runs: usize,
    /// Files handed to the tracker.
    pub files: Vec<PathBuf>,
    /// The last merged record of every observed stream, sorted by stream name.
    pub last_observations: Vec<(String, Record)>,
}

/// Drives an `Experiment` through a trial: creates the trial, wires the report,
/// executes the runs and hands the results to the tracker.
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    runs: usize,
    project: String,
    separator: u8,
    parameters: Vec<Parameter>,
    add_run: bool,
    show_progress: bool,
}

impl ExperimentRunner {
    pub fn new(runs: usize, project: impl Into<String>) -> Self {
        Self {
            runs,
            project: project.into(),
            separator: b';',
            parameters: Vec::new(),
            add_run: true,
            show_progress: false,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Parameters registered after `Run` and before the experiment configures
    /// the report. They are also recorded in the trial options.
    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Whether the `Run` parameter is registered and advanced each run.
    pub fn with_run_parameter(mut self, add_run: bool) -> Self {
        self.add_run = add_run;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn trial_options<E: Experiment>(&self, experiment: &E) -> Result<TrialOptions, ExperimentError> {
        let mut options = experiment.options();
        for parameter in &self.parameters {
            options.insert(parameter.name().to_string(), serde_json::to_value(parameter.default_value())?);
        }
        options.insert("runs".to_string(), Value::from(self.runs));
        options.insert(
            "__timestamp".to_string(),
            Value::from(Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string()),
        );
        options.insert("__project".to_string(), Value::from(self.project.clone()));
        options.insert("__experiment".to_string(), Value::from(experiment.name()));
        Ok(options)
    }

    /// Runs the whole trial.
    ///
    /// The report is finished on every exit path, so stream files are flushed
    /// even when a run fails. Success is only signalled, and files only handed
    /// over, when every run completed.
    pub fn run<E, T>(&self, experiment: &mut E, tracker: &mut T) -> Result<TrialSummary, ExperimentError>
    where
        E: Experiment,
        T: TrialTracker,
    {
        let trial_id = tracker.create_trial(&self.trial_options(experiment)?)?;
        let template = tracker
            .data_folder()
            .join(stream_file_name(&trial_id, "{stream}"));

        let mut report = Report::with_writer(
            CsvWriter::new(template.to_string_lossy()).with_separator(self.separator),
        );
        if self.add_run {
            report.add_parameter(Parameter::new(RUN_PARAMETER, 1));
        }
        for parameter in &self.parameters {
            report.add_parameter(parameter.clone());
        }

        let outcome = experiment
            .configure(&mut report)
            .and_then(|_| self.execute(experiment, &mut report));
        let finished = report.finish();
        outcome?;
        finished?;

        let mut stream_names: Vec<String> = report.stream_names().map(str::to_string).collect();
        stream_names.sort();

        tracker.set_success()?;
        let files = tracker.upload_data(&stream_names)?;

        let mut last_observations = Vec::new();
        for name in &stream_names {
            if let Some(record) = report.last_observation(name)? {
                last_observations.push((name.clone(), record.clone()));
            }
        }

        tracing::info!(trial_id = %trial_id, runs = self.runs, files = files.len(), "Trial complete");
        Ok(TrialSummary {
            trial_id,
            runs: self.runs,
            files,
            last_observations,
        })
    }

    fn execute<E: Experiment>(&self, experiment: &mut E, report: &mut Report) -> Result<(), ExperimentError> {
        let progress_bar = if self.show_progress {
            ProgressBar::new(self.runs as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs ({eta})")?
                .progress_chars("=>-"),
        );

        for run in 0..self.runs {
            if self.add_run {
                report.set_parameter(RUN_PARAMETER, run)?;
            }
            tracing::debug!(run, "Starting run");

            experiment.pre_experiment(report)?;
            experiment.experiment(report)?;
            experiment.post_experiment(report)?;
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(())
    }
}
