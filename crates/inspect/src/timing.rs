//! Timing — extract time-to-started and time-to-stopped from a process log.
//!
//! Single pass over the file. The searcher only hands over lines containing a
//! ` started in ` or ` stopped in ` marker; each slot latches on its first
//! successful match and is never overwritten.

use std::io::Read;
use std::path::{Path, PathBuf};

use grep_searcher::{sinks::Lossy, Searcher};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::diag::DiagnosticSink;
use crate::error::{InspectError, InspectResult};
use crate::pattern::{Event, TimingPatterns};

/// Seconds until the process reported it had started / stopped.
///
/// Serialized with [`DurationPair::UNSET`] in place of a missing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DurationPair {
    #[serde(serialize_with = "unset_as_sentinel")]
    pub started: Option<f64>,
    #[serde(serialize_with = "unset_as_sentinel")]
    pub stopped: Option<f64>,
}

fn unset_as_sentinel<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.unwrap_or(DurationPair::UNSET))
}

impl DurationPair {
    /// Boundary sentinel for an unset slot.
    pub const UNSET: f64 = -1.0;

    pub fn is_complete(&self) -> bool {
        self.started.is_some() && self.stopped.is_some()
    }

    /// `[started, stopped]` with [`Self::UNSET`] for missing values.
    pub fn as_array(&self) -> [f64; 2] {
        [
            self.started.unwrap_or(Self::UNSET),
            self.stopped.unwrap_or(Self::UNSET),
        ]
    }

    fn slot_mut(&mut self, event: Event) -> &mut Option<f64> {
        match event {
            Event::Started => &mut self.started,
            Event::Stopped => &mut self.stopped,
        }
    }
}

/// Scan the log at `path` for start/stop durations.
///
/// A slot left unset is not an error: the process may have been killed
/// before it wrote that line. A severe note is sent to `sink` instead.
pub fn extract_durations(path: &Path, sink: &dyn DiagnosticSink) -> InspectResult<DurationPair> {
    let patterns = TimingPatterns::compile()?;
    let mut latch = Latch::new(&patterns);

    Searcher::new()
        .search_path(
            patterns.marker(),
            path,
            Lossy(|line_number, line| Ok(latch.feed(line_number, line))),
        )
        .map_err(|source| InspectError::LogUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let pair = latch.finish()?;
    report_unset(&pair, &display_name(path), sink);
    Ok(pair)
}

/// Same as [`extract_durations`] over an arbitrary reader. `name` is only
/// used in diagnostics and error messages.
pub fn extract_durations_from_reader<R: Read>(
    reader: R,
    name: &str,
    sink: &dyn DiagnosticSink,
) -> InspectResult<DurationPair> {
    let patterns = TimingPatterns::compile()?;
    let mut latch = Latch::new(&patterns);

    Searcher::new()
        .search_reader(
            patterns.marker(),
            reader,
            Lossy(|line_number, line| Ok(latch.feed(line_number, line))),
        )
        .map_err(|source| InspectError::LogUnreadable {
            path: PathBuf::from(name),
            source,
        })?;

    let pair = latch.finish()?;
    report_unset(&pair, name, sink);
    Ok(pair)
}

/// Per-scan latch state.
struct Latch<'p> {
    patterns: &'p TimingPatterns,
    pair: DurationPair,
    failure: Option<InspectError>,
}

impl<'p> Latch<'p> {
    fn new(patterns: &'p TimingPatterns) -> Self {
        Self {
            patterns,
            pair: DurationPair::default(),
            failure: None,
        }
    }

    /// Feed one candidate line. Returns whether the search should continue.
    fn feed(&mut self, line_number: u64, line: &str) -> bool {
        for event in [Event::Started, Event::Stopped] {
            if self.pair.slot_mut(event).is_some() {
                continue;
            }
            let Some((variant, text)) = self.patterns.recognize(event, line.as_bytes()) else {
                continue;
            };
            match parse_seconds(text) {
                Ok(seconds) => {
                    debug!(line_number, event = event.as_str(), ?variant, seconds, "latched duration");
                    *self.pair.slot_mut(event) = Some(seconds);
                }
                Err(e) => {
                    self.failure = Some(e);
                    return false;
                }
            }
            // A line that latched one event is not examined for the other.
            break;
        }
        !self.pair.is_complete()
    }

    fn finish(self) -> InspectResult<DurationPair> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.pair),
        }
    }
}

fn parse_seconds(text: &[u8]) -> InspectResult<f64> {
    let malformed = || InspectError::MalformedDuration {
        text: String::from_utf8_lossy(text).into_owned(),
    };
    std::str::from_utf8(text)
        .map_err(|_| malformed())?
        .parse::<f64>()
        .map_err(|_| malformed())
}

fn report_unset(pair: &DurationPair, name: &str, sink: &dyn DiagnosticSink) {
    if pair.started.is_none() {
        sink.severe(&format!(
            "Parsing start time from log failed. Might not be the right time to call this method. \
             The process might have been killed before it wrote to log. Find {} in your target dir.",
            name
        ));
    }
    if pair.stopped.is_none() {
        sink.severe(&format!(
            "Parsing stop time from log failed. Might not be the right time to call this method. \
             The process might have been killed before it wrote to log. Find {} in your target dir.",
            name
        ));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write log");
        file
    }

    #[test]
    fn test_plain_start_and_stop() {
        let log = log_file(
            "__  ____  __  _____   ___  __ ____  ______\n\
             2026-01-30 10:00:00,001 INFO  [io.quarkus] (main) app 1.0 on JVM started in 1.778s. Listening on: http://0.0.0.0:8080\n\
             2026-01-30 10:00:05,100 INFO  [io.quarkus] (Shutdown thread) app stopped in 0.024s\n",
        );
        let sink = MemorySink::new();
        let pair = extract_durations(log.path(), &sink).unwrap();
        assert_eq!(pair.started, Some(1.778));
        assert_eq!(pair.stopped, Some(0.024));
        assert!(pair.is_complete());
        assert_eq!(sink.severe_count(), 0);
    }

    #[test]
    fn test_ansi_and_plain_yield_same_value() {
        let plain = log_file("INFO (main) app started in 1.778s.\n");
        let ansi = log_file("INFO (main) app started in \x1b[38;5;188m1.778\x1b[39ms.\n");
        let sink = MemorySink::new();
        let a = extract_durations(plain.path(), &sink).unwrap();
        let b = extract_durations(ansi.path(), &sink).unwrap();
        assert_eq!(a.started, Some(1.778));
        assert_eq!(a.started, b.started);
    }

    #[test]
    fn test_ansi_stop_line() {
        let log = log_file(
            "x started in \x1b[38;5;188m1.228\x1b[39ms.\n\
             x stopped in \x1b[38;5;188m0.024\x1b[39ms\x1b[39m\x1b[38;5;203m\x1b[39m\x1b[38;5;227m\n",
        );
        let pair = extract_durations(log.path(), &MemorySink::new()).unwrap();
        assert_eq!(pair.started, Some(1.228));
        assert_eq!(pair.stopped, Some(0.024));
    }

    #[test]
    fn test_first_match_latches() {
        let log = log_file(
            "app started in 2.5s\n\
             app started in 9.9s\n\
             app stopped in 0.1s\n\
             app stopped in 7.7s\n",
        );
        let pair = extract_durations(log.path(), &MemorySink::new()).unwrap();
        assert_eq!(pair.started, Some(2.5));
        assert_eq!(pair.stopped, Some(0.1));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let log = log_file("a started in 1.5s\nb stopped in 0.5s\n");
        let first = extract_durations(log.path(), &MemorySink::new()).unwrap();
        let second = extract_durations(log.path(), &MemorySink::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_stop_is_not_an_error() {
        let log = log_file("a started in 1.5s\nException in thread main\n");
        let sink = MemorySink::new();
        let pair = extract_durations(log.path(), &sink).unwrap();
        assert_eq!(pair.started, Some(1.5));
        assert_eq!(pair.stopped, None);
        assert_eq!(pair.as_array(), [1.5, DurationPair::UNSET]);
        let notes = sink.notes();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Parsing stop time from log failed"));
    }

    #[test]
    fn test_empty_log_reports_both_slots() {
        let log = log_file("");
        let sink = MemorySink::new();
        let pair = extract_durations(log.path(), &sink).unwrap();
        assert_eq!(pair, DurationPair::default());
        assert_eq!(sink.severe_count(), 2);
    }

    #[test]
    fn test_unreadable_log() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.log");
        let err = extract_durations(&missing, &MemorySink::new()).unwrap_err();
        assert!(matches!(err, InspectError::LogUnreadable { .. }));
    }

    #[test]
    fn test_malformed_duration_is_fatal() {
        let log = log_file("app started in 1.2.3s\n");
        let err = extract_durations(log.path(), &MemorySink::new()).unwrap_err();
        match err {
            InspectError::MalformedDuration { text } => assert_eq!(text, "1.2.3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_start_and_stop_on_same_line_latches_start_only() {
        let log = log_file("a started in 1.0s then stopped in 2.0s\nz stopped in 3.0s\n");
        let pair = extract_durations(log.path(), &MemorySink::new()).unwrap();
        assert_eq!(pair.started, Some(1.0));
        assert_eq!(pair.stopped, Some(3.0));
    }

    #[test]
    fn test_crlf_line_endings() {
        let log = log_file("a started in 0.75s.\r\nb stopped in 0.05s\r\n");
        let pair = extract_durations(log.path(), &MemorySink::new()).unwrap();
        assert_eq!(pair.as_array(), [0.75, 0.05]);
    }

    #[test]
    fn test_json_uses_sentinel_for_unset_slot() {
        let pair = DurationPair {
            started: Some(1.5),
            stopped: None,
        };
        let json = serde_json::to_value(pair).unwrap();
        assert_eq!(json, serde_json::json!({ "started": 1.5, "stopped": -1.0 }));
    }

    #[test]
    fn test_from_reader() {
        let content = b"a started in 3.25s\n".as_slice();
        let sink = MemorySink::new();
        let pair = extract_durations_from_reader(content, "stdin", &sink).unwrap();
        assert_eq!(pair.started, Some(3.25));
        assert!(sink.notes()[0].message.contains("Find stdin"));
    }
}
