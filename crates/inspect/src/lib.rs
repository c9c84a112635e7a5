// Log inspection for start/stop integration tests.

// Core recognition and scanning
pub mod pattern;
pub mod ansi;
pub mod diag;
pub mod error;

// Checks
pub mod timing;
pub mod scan;
pub mod threshold;

// Evidence and results
pub mod archive;
pub mod record;

// Configuration and binary support
pub mod conf;
pub mod runtime;

pub use diag::{DiagnosticSink, MemorySink, TracingSink};
pub use error::{InspectError, InspectResult};
pub use scan::{check_log, scan_errors, AllowList, ScanContext, ScanReport};
pub use threshold::{check_threshold, evaluate, MeasurementSet, Mode, Platform, ThresholdTable};
pub use timing::{extract_durations, DurationPair};
