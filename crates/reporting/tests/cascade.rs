use core_types::{ObservationInput, Parameter, Record, Scalar};
use reporting::{Report, ReportError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;
use streams::{BasicStream, SlidingErrorStream, StreamError};
use tempfile::tempdir;
use writers::{CsvWriter, MemorySink, MemoryWriter, ReportWriter, WriterError};

type Log = Rc<RefCell<Vec<(String, Record)>>>;

/// Keeps every record it receives, in arrival order.
#[derive(Default)]
struct RecordingWriter {
    log: Log,
    parameters: Rc<RefCell<Vec<String>>>,
    finished: Rc<RefCell<usize>>,
}

impl ReportWriter for RecordingWriter {
    fn record(&mut self, stream: &str, record: &Record) -> Result<(), WriterError> {
        self.log.borrow_mut().push((stream.to_string(), record.clone()));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriterError> {
        *self.finished.borrow_mut() += 1;
        Ok(())
    }

    fn on_parameter_added(&mut self, parameter: &Parameter) {
        self.parameters.borrow_mut().push(parameter.name().to_string());
    }
}

fn prediction_report(writer: RecordingWriter) -> Report {
    let mut report = Report::with_writer(writer);
    report.add_parameter(Parameter::new("Run", 0));
    report.add_stream("A", BasicStream::new(["value", "prediction"]));

    let mut errors = SlidingErrorStream::new(["mse"]);
    errors.add_error("value", "prediction", "mse");
    report.add_stream("B", errors);
    report.add_dependent_stream("B", "A").unwrap();
    report
}

fn streams_in(log: &Log) -> Vec<String> {
    log.borrow().iter().map(|(s, _)| s.clone()).collect()
}

#[test]
fn test_dependent_is_written_before_master() {
    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = prediction_report(writer);

    report
        .observation("A", &ObservationInput::positional([3.0, 1.0]))
        .unwrap();

    assert_eq!(streams_in(&log), vec!["B", "A"]);

    let entries = log.borrow();
    let (_, derived) = &entries[0];
    assert_eq!(derived.names().collect::<Vec<_>>(), vec!["Run", "mse"]);
    assert_eq!(derived.get("mse"), Some(&Scalar::Float(0.4)));
}

#[test]
fn test_cascade_is_depth_first() {
    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = Report::with_writer(writer);

    for name in ["root", "left", "leaf", "right"] {
        report.add_stream(name, BasicStream::new(Vec::<String>::new()));
    }
    report.add_dependent_stream("left", "root").unwrap();
    report.add_dependent_stream("right", "root").unwrap();
    report.add_dependent_stream("leaf", "left").unwrap();

    report
        .observation("root", &ObservationInput::Positional(vec![]))
        .unwrap();

    assert_eq!(streams_in(&log), vec!["leaf", "left", "right", "root"]);
}

#[test]
fn test_sliding_mean_through_report() {
    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = prediction_report(writer);

    // Squared errors 4 and 16: (4 + 16 + 8 zeros) / 10.
    report
        .observation("A", &ObservationInput::mapping([("value", 2.0), ("prediction", 0.0)]))
        .unwrap();
    report
        .observation("A", &ObservationInput::mapping([("value", 0.0), ("prediction", 4.0)]))
        .unwrap();

    let last = report.last_observation("B").unwrap().unwrap();
    assert_eq!(last.get("mse"), Some(&Scalar::Float(2.0)));
    assert_eq!(log.borrow().len(), 4);
}

#[test]
fn test_plain_dependent_records_parameters_only() {
    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = Report::with_writer(writer);
    report.add_parameter(Parameter::new("Run", 2));
    report.add_stream("A", BasicStream::new(["x"]));
    report.add_stream("echo", BasicStream::new(["x"]));
    report.add_dependent_stream("echo", "A").unwrap();

    report
        .observation("A", &ObservationInput::positional([1]))
        .unwrap();

    let entries = log.borrow();
    assert_eq!(entries[0].0, "echo");
    assert_eq!(entries[0].1.names().collect::<Vec<_>>(), vec!["Run"]);
}

#[test]
fn test_unregistered_streams_fail() {
    let mut report = Report::new();
    report.add_stream("A", BasicStream::new(["x"]));

    assert!(matches!(
        report.add_dependent_stream("X", "A"),
        Err(ReportError::UnknownStream(name)) if name == "X"
    ));
    assert!(matches!(
        report.add_dependent_stream("A", "X"),
        Err(ReportError::UnknownStream(name)) if name == "X"
    ));
    assert!(matches!(
        report.observation("X", &ObservationInput::positional([1])),
        Err(ReportError::UnknownStream(name)) if name == "X"
    ));
}

#[test]
fn test_schema_mismatch_aborts_before_any_write() {
    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = prediction_report(writer);

    let err = report
        .observation("A", &ObservationInput::positional([1.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        ReportError::Stream(StreamError::SchemaMismatch { expected: 2, actual: 1 })
    ));
    assert!(log.borrow().is_empty());
    assert!(report.last_observation("A").unwrap().is_none());
}

#[test]
fn test_failure_in_master_write_keeps_dependent_writes() {
    struct FailOn(&'static str);
    impl ReportWriter for FailOn {
        fn record(&mut self, stream: &str, _record: &Record) -> Result<(), WriterError> {
            if stream == self.0 {
                return Err(WriterError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    let writer = RecordingWriter::default();
    let log = Rc::clone(&writer.log);
    let mut report = prediction_report(writer);
    report.add_writer(FailOn("A"));

    let err = report
        .observation("A", &ObservationInput::positional([1.0, 0.0]))
        .unwrap_err();
    assert!(matches!(err, ReportError::Writer(WriterError::Io(_))));
    // B reached both writers; A reached the recording writer before the failure.
    assert_eq!(streams_in(&log), vec!["B", "A"]);
}

#[test]
fn test_writers_hear_about_parameters() {
    let writer = RecordingWriter::default();
    let parameters = Rc::clone(&writer.parameters);
    let mut report = Report::new();
    report.add_parameter(Parameter::new("Run", 0));
    report.add_writer(writer);
    report.add_parameter(Parameter::new("alpha", 0.1));

    assert_eq!(*parameters.borrow(), vec!["Run".to_string(), "alpha".to_string()]);
}

#[test]
fn test_drop_finishes_writers_once() {
    let writer = RecordingWriter::default();
    let finished = Rc::clone(&writer.finished);
    {
        let _report = Report::with_writer(writer);
    }
    assert_eq!(*finished.borrow(), 1);

    let writer = RecordingWriter::default();
    let finished = Rc::clone(&writer.finished);
    {
        let mut report = Report::with_writer(writer);
        report.finish().unwrap();
    }
    assert_eq!(*finished.borrow(), 1);
}

#[test]
fn test_csv_and_memory_outputs() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("trial-{stream}.csv");

    let sink = MemorySink::default();
    let mut memory = MemoryWriter::new(
        Rc::clone(&sink),
        HashMap::from([("B".to_string(), vec!["mse".to_string()])]),
    );
    memory.set_capping("B", 2);

    let mut report = Report::with_writer(CsvWriter::new(template.to_string_lossy()));
    report.add_writer(memory);
    report.add_parameter(Parameter::new("Run", 0));
    report.add_stream("A", BasicStream::new(["value", "prediction"]));
    let mut errors = SlidingErrorStream::new(["mse"]);
    errors.add_error("value", "prediction", "mse");
    report.add_stream("B", errors);
    report.add_dependent_stream("B", "A").unwrap();

    for (run, value) in [(0, 1.0), (1, 2.0), (2, 3.0)] {
        report.set_parameter("Run", run).unwrap();
        report
            .observation("A", &ObservationInput::positional([value, 0.0]))
            .unwrap();
    }
    report.finish().unwrap();

    let a = fs::read_to_string(dir.path().join("trial-A.csv")).unwrap();
    assert_eq!(a, "Run;value;prediction\n0;1.0;0.0\n1;2.0;0.0\n2;3.0;0.0\n");

    let b = fs::read_to_string(dir.path().join("trial-B.csv")).unwrap();
    let lines: Vec<&str> = b.lines().collect();
    assert_eq!(lines[0], "Run;mse");
    assert_eq!(lines.len(), 4);

    // Running means 0.1, 0.5, 1.4; the cap keeps the last two.
    assert_eq!(sink.borrow().values("B", "mse"), Some(vec![0.5, 1.4]));
}
