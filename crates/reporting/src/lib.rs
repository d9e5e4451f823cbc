//! # Empirist Reporting
//!
//! The `Report` registry binds together the experiment's parameters, its streams,
//! the dependency edges between streams, and the writers that receive every
//! observation.
//!
//! ## Observation cascade
//!
//! `Report::observation` merges the current parameter values with the stream's
//! schema-resolved data, feeds the merged record to every dependent stream's
//! derivation hook, observes the derived data on those dependents (recursively),
//! and only then hands the triggering stream's record to the writers. Writers
//! therefore see dependents before their master, depth first.
//!
//! An error aborts the cascade where it happens. Records already handed to
//! writers by finished dependents are not rolled back.

pub mod error;

pub use error::ReportError;

use core_types::{ObservationInput, Parameter, Record, Scalar};
use std::collections::{HashMap, HashSet};
use streams::DataStream;
use writers::ReportWriter;

/// The central registry and orchestrator of a reporting session.
pub struct Report {
    /// In declaration order; this is the order parameters lead every record.
    parameters: Vec<Parameter>,
    streams: HashMap<String, Box<dyn DataStream>>,
    /// Master stream name -> dependent stream names, in registration order.
    dependent_streams: HashMap<String, Vec<String>>,
    writers: Vec<Box<dyn ReportWriter>>,
    last_observations: HashMap<String, Option<Record>>,
    finished: bool,
}

impl Report {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            streams: HashMap::new(),
            dependent_streams: HashMap::new(),
            writers: Vec::new(),
            last_observations: HashMap::new(),
            finished: false,
        }
    }

    /// Creates a report with a single writer attached.
    pub fn with_writer(writer: impl ReportWriter + 'static) -> Self {
        let mut report = Self::new();
        report.add_writer(writer);
        report
    }

    /// Attaches a writer. Parameters registered so far are replayed to its
    /// `on_parameter_added` hook.
    pub fn add_writer(&mut self, writer: impl ReportWriter + 'static) {
        let mut writer: Box<dyn ReportWriter> = Box::new(writer);
        for parameter in &self.parameters {
            writer.on_parameter_added(parameter);
        }
        self.writers.push(writer);
    }

    /// Registers a parameter and notifies every writer. A parameter with the same
    /// name is replaced in place, keeping its position.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        for writer in &mut self.writers {
            writer.on_parameter_added(&parameter);
        }

        match self.parameters.iter_mut().find(|p| p.name() == parameter.name()) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter, ReportError> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ReportError::UnknownParameter(name.to_string()))
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, ReportError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ReportError::UnknownParameter(name.to_string()))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn set_parameter(&mut self, name: &str, value: impl Into<Scalar>) -> Result<(), ReportError> {
        self.parameter_mut(name)?.set_value(value);
        Ok(())
    }

    pub fn reset_parameter(&mut self, name: &str) -> Result<(), ReportError> {
        self.parameter_mut(name)?.reset();
        Ok(())
    }

    /// Registers (or replaces) a stream. Its last observation starts out empty.
    pub fn add_stream(&mut self, name: impl Into<String>, stream: impl DataStream + 'static) {
        let name = name.into();
        tracing::debug!(stream = %name, scheme = ?stream.scheme(), "Registered stream");
        self.last_observations.insert(name.clone(), None);
        self.streams.insert(name, Box::new(stream));
    }

    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Makes `stream` derive its observations from `master`. Both must already be
    /// registered, and the edge must not close a cycle.
    pub fn add_dependent_stream(&mut self, stream: &str, master: &str) -> Result<(), ReportError> {
        if !self.streams.contains_key(master) {
            return Err(ReportError::UnknownStream(master.to_string()));
        }
        if !self.streams.contains_key(stream) {
            return Err(ReportError::UnknownStream(stream.to_string()));
        }
        if stream == master || self.reaches(stream, master) {
            return Err(ReportError::DependencyCycle {
                stream: stream.to_string(),
                master: master.to_string(),
            });
        }

        self.dependent_streams
            .entry(master.to_string())
            .or_default()
            .push(stream.to_string());
        tracing::debug!(stream, master, "Registered dependent stream");
        Ok(())
    }

    /// Whether `target` is reachable from `from` by following dependent edges.
    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(dependents) = self.dependent_streams.get(current) {
                stack.extend(dependents.iter().map(String::as_str));
            }
        }
        false
    }

    /// Records one observation on `stream` and cascades it through the
    /// stream's dependents.
    pub fn observation(&mut self, stream: &str, data: &ObservationInput) -> Result<(), ReportError> {
        self.observe(stream, Some(data))
    }

    fn observe(&mut self, stream_name: &str, data: Option<&ObservationInput>) -> Result<(), ReportError> {
        let stream = self
            .streams
            .get(stream_name)
            .ok_or_else(|| ReportError::UnknownStream(stream_name.to_string()))?;

        let mut record: Record = self
            .parameters
            .iter()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect();
        if let Some(data) = data {
            record.extend(stream.to_record(data)?);
        }

        self.last_observations
            .insert(stream_name.to_string(), Some(record.clone()));

        if let Some(dependents) = self.dependent_streams.get(stream_name).cloned() {
            for dependent in dependents {
                let derived = self
                    .streams
                    .get_mut(&dependent)
                    .ok_or_else(|| ReportError::UnknownStream(dependent.clone()))?
                    .observation(&record)?;
                tracing::debug!(master = stream_name, stream = %dependent, "Cascading observation");
                self.observe(&dependent, derived.as_ref())?;
            }
        }

        for writer in &mut self.writers {
            writer.record(stream_name, &record)?;
        }
        Ok(())
    }

    /// The merged record of the latest observation on `stream`, or `None` if
    /// the stream has not been observed yet.
    pub fn last_observation(&self, stream: &str) -> Result<Option<&Record>, ReportError> {
        self.last_observations
            .get(stream)
            .map(Option::as_ref)
            .ok_or_else(|| ReportError::UnknownStream(stream.to_string()))
    }

    /// Finishes every writer in registration order. Later calls do nothing.
    ///
    /// Every writer is finished even if an earlier one fails; the first error is
    /// returned.
    pub fn finish(&mut self) -> Result<(), ReportError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let mut first_error = None;
        for writer in &mut self.writers {
            if let Err(e) = writer.finish() {
                tracing::error!(error = %e, "Writer failed to finish");
                first_error.get_or_insert(e);
            }
        }
        tracing::info!(writers = self.writers.len(), "Report finished");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Report {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Report dropped without finish; finishing writers now.");
            if let Err(e) = self.finish() {
                tracing::error!(error = %e, "Failed to finish report on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streams::BasicStream;
    use writers::NullWriter;

    #[test]
    fn test_merged_record_without_parameters_matches_schema() {
        let mut report = Report::with_writer(NullWriter::new());
        report.add_stream("s", BasicStream::new(["a", "b"]));

        report
            .observation("s", &ObservationInput::positional([1, 2]))
            .unwrap();

        let record = report.last_observation("s").unwrap().unwrap();
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_parameters_lead_in_declaration_order() {
        let mut report = Report::new();
        report.add_parameter(Parameter::new("Run", 1));
        report.add_parameter(Parameter::new("alpha", 0.5));
        report.add_stream("s", BasicStream::new(["x"]));

        report.set_parameter("alpha", 0.25).unwrap();
        report
            .observation("s", &ObservationInput::mapping([("x", 7)]))
            .unwrap();

        let record = report.last_observation("s").unwrap().unwrap();
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["Run", "alpha", "x"]);
        assert_eq!(record.get("alpha"), Some(&Scalar::Float(0.25)));
    }

    #[test]
    fn test_re_adding_parameter_keeps_position() {
        let mut report = Report::new();
        report.add_parameter(Parameter::new("a", 1));
        report.add_parameter(Parameter::new("b", 2));
        report.add_parameter(Parameter::new("a", 10));

        let names: Vec<&str> = report.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(report.parameter("a").unwrap().value(), &Scalar::Int(10));
    }

    #[test]
    fn test_unknown_parameter_fails() {
        let mut report = Report::new();
        assert!(matches!(
            report.set_parameter("nope", 1),
            Err(ReportError::UnknownParameter(name)) if name == "nope"
        ));
        assert!(matches!(report.parameter("nope"), Err(ReportError::UnknownParameter(_))));
        assert!(matches!(report.reset_parameter("nope"), Err(ReportError::UnknownParameter(_))));
    }

    #[test]
    fn test_reset_parameter_restores_default() {
        let mut report = Report::new();
        report.add_parameter(Parameter::new("Run", 1));
        report.set_parameter("Run", 4).unwrap();
        report.reset_parameter("Run").unwrap();
        assert_eq!(report.parameter("Run").unwrap().value(), &Scalar::Int(1));
    }

    #[test]
    fn test_last_observation_lifecycle() {
        let mut report = Report::new();
        report.add_stream("s", BasicStream::new(["x"]));

        assert!(report.last_observation("s").unwrap().is_none());
        assert!(matches!(report.last_observation("t"), Err(ReportError::UnknownStream(_))));
    }

    #[test]
    fn test_dependency_cycles_are_rejected() {
        let mut report = Report::new();
        for name in ["a", "b", "c"] {
            report.add_stream(name, BasicStream::new(["x"]));
        }
        report.add_dependent_stream("b", "a").unwrap();
        report.add_dependent_stream("c", "b").unwrap();

        assert!(matches!(
            report.add_dependent_stream("a", "c"),
            Err(ReportError::DependencyCycle { .. })
        ));
        assert!(matches!(
            report.add_dependent_stream("a", "a"),
            Err(ReportError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut report = Report::with_writer(NullWriter::new());
        report.finish().unwrap();
        report.finish().unwrap();
        assert!(report.is_finished());
    }
}
