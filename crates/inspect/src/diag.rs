//! Diagnostics — side channel for notes that never affect control flow.
//!
//! Callers inject a [`DiagnosticSink`]; the binary uses [`TracingSink`],
//! tests use [`MemorySink`] to assert on what was reported.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub severity: Severity,
    pub message: String,
}

pub trait DiagnosticSink: Send + Sync {
    fn info(&self, message: &str);
    fn severe(&self, message: &str);
}

/// Forwards notes to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn severe(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Keeps every note in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    notes: Mutex<Vec<Note>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn severe_count(&self) -> usize {
        self.notes()
            .iter()
            .filter(|n| n.severity == Severity::Severe)
            .count()
    }

    fn push(&self, severity: Severity, message: &str) {
        if let Ok(mut notes) = self.notes.lock() {
            notes.push(Note {
                severity,
                message: message.to_string(),
            });
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn severe(&self, message: &str) {
        self.push(Severity::Severe, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.info("first");
        sink.severe("second");
        let notes = sink.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message, "first");
        assert_eq!(notes[1].severity, Severity::Severe);
        assert_eq!(sink.severe_count(), 1);
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sinks: Vec<Box<dyn DiagnosticSink>> = vec![Box::new(TracingSink), Box::new(MemorySink::new())];
        for s in &sinks {
            s.info("ok");
        }
    }
}
