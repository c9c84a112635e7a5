//! Scan — find `ERROR` lines that the application's allow-list does not cover.
//!
//! Every line of the log is evaluated once. All violations are collected; the
//! caller-visible failure built by [`ScanReport::ensure_clean`] cites the
//! first one and the total count.

use std::borrow::Cow;
use std::path::Path;

use grep_searcher::{sinks::Lossy, Searcher};
use serde::Serialize;

use crate::ansi::strip_ansi_codes;
use crate::archive::{archived_log_hint, require_non_blank};
use crate::diag::DiagnosticSink;
use crate::error::{InspectError, InspectResult};
use crate::pattern::{error_matcher, is_error_line};
use crate::threshold::Mode;

/// Who is asking. Only used for messages and the archived-log hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanContext {
    pub test_class: String,
    pub test_method: String,
    pub app: String,
    pub mode: Mode,
}

impl ScanContext {
    pub fn new(
        test_class: impl Into<String>,
        test_method: impl Into<String>,
        app: impl Into<String>,
        mode: Mode,
    ) -> Self {
        Self {
            test_class: test_class.into(),
            test_method: test_method.into(),
            app: app.into(),
            mode,
        }
    }

    pub fn validate(&self) -> InspectResult<()> {
        require_non_blank("test_class", &self.test_class)?;
        require_non_blank("test_method", &self.test_method)
    }
}

/// Literal substrings that mark an `ERROR` line as expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// First member contained in `line` (case-sensitive).
    pub fn matching(&self, line: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(String::as_str)
            .find(|entry| line.contains(entry))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub line_number: u64,
    pub line: String,
}

impl Violation {
    /// The line without colour sequences.
    pub fn display_line(&self) -> Cow<'_, str> {
        strip_ansi_codes(&self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exemption {
    pub line_number: u64,
    pub line: String,
    pub allowed_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Lines containing `error` in any casing.
    pub flagged: usize,
    pub exempted: Vec<Exemption>,
    pub violations: Vec<Violation>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn first_violation(&self) -> Option<&Violation> {
        self.violations.first()
    }

    /// Fail with [`InspectError::UnexpectedErrorLine`] if anything was found.
    pub fn ensure_clean(self, ctx: &ScanContext, log: &Path) -> InspectResult<Self> {
        if self.is_clean() {
            return Ok(self);
        }
        let first = &self.violations[0];
        Err(InspectError::UnexpectedErrorLine {
            mode: ctx.mode.to_string(),
            method: ctx.test_method.clone(),
            line_number: first.line_number,
            line: first.display_line().into_owned(),
            violations: self.violations.len(),
            hint: archived_log_hint(&ctx.test_class, &ctx.test_method, log),
        })
    }
}

/// Scan `path` line by line, collecting every unexempted error line.
pub fn scan_errors(
    path: &Path,
    allow_list: &AllowList,
    ctx: &ScanContext,
    sink: &dyn DiagnosticSink,
) -> InspectResult<ScanReport> {
    ctx.validate()?;
    let matcher = error_matcher()?;
    let mut report = ScanReport::default();

    Searcher::new()
        .search_path(
            &matcher,
            path,
            Lossy(|line_number, raw| {
                let line = raw.trim_end_matches(['\r', '\n']);
                // The searcher already filtered on the matcher; re-check so the
                // classification does not depend on searcher internals.
                if !is_error_line(&matcher, line.as_bytes()) {
                    return Ok(true);
                }
                report.flagged += 1;
                match allow_list.matching(line) {
                    Some(entry) => {
                        sink.info(&format!(
                            "{} log for {} contains allow-listed error: `{}'",
                            ctx.mode, ctx.test_method, line
                        ));
                        report.exempted.push(Exemption {
                            line_number,
                            line: line.to_string(),
                            allowed_by: entry.to_string(),
                        });
                    }
                    None => report.violations.push(Violation {
                        line_number,
                        line: line.to_string(),
                    }),
                }
                Ok(true)
            }),
        )
        .map_err(|source| InspectError::LogUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        log = %path.display(),
        flagged = report.flagged,
        exempted = report.exempted.len(),
        violations = report.violations.len(),
        "error scan finished"
    );
    Ok(report)
}

/// [`scan_errors`] followed by [`ScanReport::ensure_clean`].
pub fn check_log(
    path: &Path,
    allow_list: &AllowList,
    ctx: &ScanContext,
    sink: &dyn DiagnosticSink,
) -> InspectResult<ScanReport> {
    scan_errors(path, allow_list, ctx, sink)?.ensure_clean(ctx, path)
}
