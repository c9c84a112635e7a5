//! Threshold module — per-platform, per-mode ceilings for startup latency,
//! memory footprint and reload latency.

pub mod eval;
pub mod model;

pub use eval::{check_threshold, evaluate, Evaluation, Verdict};
pub use model::{key_prefix, MeasurementSet, Metric, Mode, Platform, ThresholdTable, SKIP};
