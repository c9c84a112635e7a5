//! Eval — compare one run's measurements with the configured ceilings.

use serde::Serialize;
use tracing::debug;

use super::model::{MeasurementSet, Metric, Mode, Platform, ThresholdTable};
use crate::error::{InspectError, InspectResult};

/// Outcome for one evaluated metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub metric: Metric,
    pub key: String,
    pub measured: u64,
    pub threshold: u64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub app: String,
    pub mode: Mode,
    pub platform: Platform,
    pub verdicts: Vec<Verdict>,
}

impl Evaluation {
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }

    /// Turn the first failing verdict into [`InspectError::ThresholdExceeded`].
    pub fn ensure_passed(self) -> InspectResult<Self> {
        if let Some(v) = self.failures().next() {
            return Err(InspectError::ThresholdExceeded {
                metric: v.metric,
                measured: v.measured,
                threshold: v.threshold,
                message: v.message.clone().unwrap_or_default(),
            });
        }
        Ok(self)
    }
}

/// Evaluate every measured (non-skipped) metric in order: first OK request,
/// RSS, reload. Skipped metrics never touch the table.
///
/// A missing threshold is fatal unless an earlier metric already failed; in
/// that case evaluation stops there and the failure is reported.
pub fn evaluate(
    measurements: &MeasurementSet,
    mode: Mode,
    platform: Platform,
    table: &ThresholdTable,
    app: &str,
) -> InspectResult<Evaluation> {
    let mut verdicts = Vec::new();

    for metric in Metric::ALL {
        let Some(measured) = measurements.get(metric) else {
            debug!(%metric, "skipped");
            continue;
        };
        let key = metric.key(platform, mode);
        let threshold = match table.get(&key) {
            Ok(threshold) => threshold,
            Err(_) if verdicts.iter().any(|v: &Verdict| !v.passed) => {
                debug!(%metric, key = %key, "no threshold after a failed metric; stopping");
                break;
            }
            Err(err) => return Err(err),
        };
        let passed = measured <= threshold;
        debug!(%metric, measured, threshold, passed, "evaluated");

        verdicts.push(Verdict {
            metric,
            message: (!passed).then(|| failure_message(metric, app, mode, measured, threshold)),
            key,
            measured,
            threshold,
            passed,
        });
    }

    Ok(Evaluation {
        app: app.to_string(),
        mode,
        platform,
        verdicts,
    })
}

/// [`evaluate`] followed by [`Evaluation::ensure_passed`].
pub fn check_threshold(
    measurements: &MeasurementSet,
    mode: Mode,
    platform: Platform,
    table: &ThresholdTable,
    app: &str,
) -> InspectResult<Evaluation> {
    evaluate(measurements, mode, platform, table, app)?.ensure_passed()
}

fn failure_message(metric: Metric, app: &str, mode: Mode, measured: u64, threshold: u64) -> String {
    match metric {
        Metric::TimeToFirstOkRequest => format!(
            "Application {} in {} mode took {} ms to get the first OK request, which is over {} ms threshold.",
            app, mode, measured, threshold
        ),
        Metric::Rss => format!(
            "Application {} in {} consumed {} kB, which is over {} kB threshold.",
            app, mode, measured, threshold
        ),
        Metric::TimeToReload => format!(
            "Application {} in {} mode took {} ms to get the first OK request after dev mode reload, \
             which is over {} ms threshold.",
            app, mode, measured, threshold
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::model::SKIP;

    const FIRST: &str = "linux.jvm.time.to.first.ok.request.threshold.ms";

    fn jvm_table() -> ThresholdTable {
        let mut t = ThresholdTable::new();
        t.insert(FIRST, 1000);
        t.insert("linux.jvm.RSS.threshold.kB", 120_000);
        t.insert("linux.jvm.time.to.reload.threshold.ms", 2500);
        t
    }

    fn first_only(ms: u64) -> MeasurementSet {
        MeasurementSet {
            time_to_first_ok_request_ms: Some(ms),
            ..MeasurementSet::default()
        }
    }

    #[test]
    fn test_under_threshold_passes() {
        let eval = check_threshold(&first_only(900), Mode::Jvm, Platform::Linux, &jvm_table(), "getting-started").unwrap();
        assert!(eval.passed());
        assert_eq!(eval.verdicts.len(), 1);
        assert_eq!(eval.verdicts[0].key, FIRST);
        assert_eq!(eval.verdicts[0].threshold, 1000);
    }

    #[test]
    fn test_equal_to_threshold_passes() {
        let eval = evaluate(&first_only(1000), Mode::Jvm, Platform::Linux, &jvm_table(), "app").unwrap();
        assert!(eval.passed());
    }

    #[test]
    fn test_over_threshold_fails_with_message() {
        let err = check_threshold(&first_only(1100), Mode::Jvm, Platform::Linux, &jvm_table(), "getting-started")
            .unwrap_err();
        match err {
            InspectError::ThresholdExceeded { metric, measured, threshold, message } => {
                assert_eq!(metric, Metric::TimeToFirstOkRequest);
                assert_eq!(measured, 1100);
                assert_eq!(threshold, 1000);
                assert_eq!(
                    message,
                    "Application getting-started in JVM mode took 1100 ms to get the first OK request, \
                     which is over 1000 ms threshold."
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skipped_metric_is_never_looked_up() {
        // Reload is present in neither the measurements nor the table.
        let mut table = ThresholdTable::new();
        table.insert(FIRST, 1000);
        let m = MeasurementSet::from_raw(SKIP, 900, SKIP).unwrap();
        let eval = check_threshold(&m, Mode::Jvm, Platform::Linux, &table, "app").unwrap();
        assert_eq!(eval.verdicts.len(), 1);
    }

    #[test]
    fn test_skipped_metric_cannot_fail_even_if_configured() {
        let mut table = jvm_table();
        table.insert("linux.jvm.time.to.reload.threshold.ms", 0);
        let eval = check_threshold(&first_only(10), Mode::Jvm, Platform::Linux, &table, "app").unwrap();
        assert!(eval.verdicts.iter().all(|v| v.metric != Metric::TimeToReload));
    }

    #[test]
    fn test_missing_threshold_is_fatal() {
        let m = MeasurementSet {
            rss_kb: Some(10),
            ..MeasurementSet::default()
        };
        let err = evaluate(&m, Mode::Native, Platform::Linux, &jvm_table(), "app").unwrap_err();
        assert!(matches!(err, InspectError::MissingThreshold { ref key } if key == "linux.native.RSS.threshold.kB"));
    }

    #[test]
    fn test_earlier_failure_wins_over_later_missing_threshold() {
        let mut table = ThresholdTable::new();
        table.insert(FIRST, 1000);
        let m = MeasurementSet {
            time_to_first_ok_request_ms: Some(1100),
            rss_kb: Some(10),
            ..MeasurementSet::default()
        };

        let eval = evaluate(&m, Mode::Jvm, Platform::Linux, &table, "app").unwrap();
        assert_eq!(eval.verdicts.len(), 1);
        assert!(!eval.passed());

        let err = check_threshold(&m, Mode::Jvm, Platform::Linux, &table, "app").unwrap_err();
        assert!(matches!(
            err,
            InspectError::ThresholdExceeded { metric: Metric::TimeToFirstOkRequest, measured: 1100, threshold: 1000, .. }
        ));
    }

    #[test]
    fn test_missing_threshold_after_passing_metric_is_fatal() {
        let mut table = ThresholdTable::new();
        table.insert(FIRST, 1000);
        let m = MeasurementSet {
            time_to_first_ok_request_ms: Some(900),
            rss_kb: Some(10),
            ..MeasurementSet::default()
        };
        let err = check_threshold(&m, Mode::Jvm, Platform::Linux, &table, "app").unwrap_err();
        assert!(matches!(err, InspectError::MissingThreshold { ref key } if key == "linux.jvm.RSS.threshold.kB"));
    }

    #[test]
    fn test_windows_generator_prefix() {
        let mut table = ThresholdTable::new();
        table.insert("windows.generated.dev.time.to.reload.threshold.ms", 3000);
        let m = MeasurementSet {
            time_to_reload_ms: Some(3500),
            ..MeasurementSet::default()
        };
        let eval = evaluate(&m, Mode::Generator, Platform::Windows, &table, "app").unwrap();
        assert!(!eval.passed());
        let failure = eval.failures().next().unwrap();
        assert!(failure.message.as_deref().unwrap().contains("after dev mode reload"));
    }

    #[test]
    fn test_all_metrics_evaluated_in_order() {
        let m = MeasurementSet::from_raw(130_000, 900, 2000).unwrap();
        let eval = evaluate(&m, Mode::Jvm, Platform::Linux, &jvm_table(), "app").unwrap();
        let metrics: Vec<_> = eval.verdicts.iter().map(|v| v.metric).collect();
        assert_eq!(metrics, Metric::ALL.to_vec());
        assert_eq!(eval.failures().count(), 1);
        let err = eval.ensure_passed().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Application app in JVM consumed 130000 kB, which is over 120000 kB threshold."
        );
    }
}
