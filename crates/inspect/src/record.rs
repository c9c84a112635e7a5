//! Record — append one run's measurements to a comma-separated results file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::diag::DiagnosticSink;
use crate::error::{InspectError, InspectResult};

/// Ordered `(column, value)` pairs for a single results row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementRecord {
    columns: Vec<(String, String)>,
}

impl MeasurementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.columns.push((name.into(), value.to_string()));
        self
    }

    /// Parse `NAME=VALUE`.
    pub fn parse_column(spec: &str) -> InspectResult<(String, String)> {
        match spec.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
            _ => Err(InspectError::InvalidConfig(format!("expected NAME=VALUE, got {:?}", spec))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn header(&self) -> String {
        self.columns.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>().join(",")
    }

    pub fn line(&self) -> String {
        self.columns.iter().map(|(_, v)| v.as_str()).collect::<Vec<_>>().join(",")
    }
}

impl FromIterator<(String, String)> for MeasurementRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Append `record` to `path`, writing the header first when the file is new.
pub fn append_record(record: &MeasurementRecord, path: &Path, sink: &dyn DiagnosticSink) -> InspectResult<()> {
    if record.is_empty() {
        return Err(InspectError::InvalidConfig("measurement record has no columns".to_string()));
    }
    let header = record.header();
    let line = record.line();

    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if is_new {
        writeln!(file, "{}", header)?;
    }
    writeln!(file, "{}", line)?;

    sink.info(&format!("\n{}\n{}", header, line));
    Ok(())
}
