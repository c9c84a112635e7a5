//! Archive — keep finished process logs where a failed check can point to them.
//!
//! Layout: `<base>/testsuite/target/archived-logs/<test class>/<test method>/<log file>`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::diag::DiagnosticSink;
use crate::error::{InspectError, InspectResult};

const ARCHIVE_SEGMENTS: [&str; 3] = ["testsuite", "target", "archived-logs"];

/// `<base>/testsuite/target/archived-logs/<test_class>`, created on demand.
pub fn logs_dir(base: &Path, test_class: &str) -> InspectResult<PathBuf> {
    require_non_blank("test_class", test_class)?;
    let dir = ARCHIVE_SEGMENTS
        .iter()
        .fold(base.to_path_buf(), |p, s| p.join(s))
        .join(test_class);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// `<logs_dir>/<test_method>`, created on demand.
pub fn method_logs_dir(base: &Path, test_class: &str, test_method: &str) -> InspectResult<PathBuf> {
    require_non_blank("test_method", test_method)?;
    let dir = logs_dir(base, test_class)?.join(test_method);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Copy `log` into the archive for `(test_class, test_method)`.
///
/// A missing log is reported to `sink` and skipped (`Ok(None)`); blank test
/// identifiers are a setup error. An earlier archive with the same file name
/// is replaced so the hint always points at the latest run.
pub fn archive_log(
    base: &Path,
    test_class: &str,
    test_method: &str,
    log: &Path,
    sink: &dyn DiagnosticSink,
) -> InspectResult<Option<PathBuf>> {
    if !log.is_file() {
        sink.severe("log must be a valid, existing file. Skipping operation.");
        return Ok(None);
    }
    require_non_blank("test_class", test_class)?;
    require_non_blank("test_method", test_method)?;

    let file_name = log
        .file_name()
        .ok_or_else(|| InspectError::InvalidConfig(format!("log path has no file name: {}", log.display())))?;
    let dest = method_logs_dir(base, test_class, test_method)?.join(file_name);
    std::fs::copy(log, &dest)?;
    debug!(from = %log.display(), to = %dest.display(), "archived log");
    Ok(Some(dest))
}

/// Relative location of an archived log, as quoted in failure messages.
pub fn archived_log_hint(test_class: &str, test_method: &str, log: &Path) -> String {
    let file_name = log
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut parts: Vec<&str> = ARCHIVE_SEGMENTS.to_vec();
    parts.extend([test_class, test_method, file_name.as_str()]);
    parts.join(std::path::MAIN_SEPARATOR_STR)
}

pub(crate) fn require_non_blank(name: &str, value: &str) -> InspectResult<()> {
    if value.trim().is_empty() {
        return Err(InspectError::InvalidConfig(format!("{} must not be blank", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use tempfile::tempdir;

    #[test]
    fn test_archive_copies_into_method_dir() {
        let base = tempdir().unwrap();
        let work = tempdir().unwrap();
        let log = work.path().join("app-jvm-run.log");
        std::fs::write(&log, "ERROR: disk full\n").unwrap();

        let dest = archive_log(base.path(), "StartStopTest", "jakartaRESTMinimal", &log, &MemorySink::new())
            .unwrap()
            .expect("archived");

        let expected = base
            .path()
            .join("testsuite")
            .join("target")
            .join("archived-logs")
            .join("StartStopTest")
            .join("jakartaRESTMinimal")
            .join("app-jvm-run.log");
        assert_eq!(dest, expected);
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "ERROR: disk full\n");
    }

    #[test]
    fn test_archive_overwrites_previous_copy() {
        let base = tempdir().unwrap();
        let work = tempdir().unwrap();
        let log = work.path().join("run.log");
        std::fs::write(&log, "first\n").unwrap();
        archive_log(base.path(), "C", "m", &log, &MemorySink::new()).unwrap();
        std::fs::write(&log, "second\n").unwrap();
        let dest = archive_log(base.path(), "C", "m", &log, &MemorySink::new()).unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "second\n");
    }

    #[test]
    fn test_missing_log_is_skipped_with_note() {
        let base = tempdir().unwrap();
        let sink = MemorySink::new();
        let result = archive_log(base.path(), "C", "m", &base.path().join("missing.log"), &sink).unwrap();
        assert!(result.is_none());
        assert_eq!(sink.severe_count(), 1);
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        let base = tempdir().unwrap();
        let log = base.path().join("run.log");
        std::fs::write(&log, "x\n").unwrap();
        let sink = MemorySink::new();
        assert!(matches!(
            archive_log(base.path(), "  ", "m", &log, &sink),
            Err(InspectError::InvalidConfig(_))
        ));
        assert!(matches!(
            archive_log(base.path(), "C", "", &log, &sink),
            Err(InspectError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hint_uses_platform_separator() {
        let hint = archived_log_hint("StartStopTest", "fullMicroProfile", Path::new("/tmp/x/dev-run.log"));
        let sep = std::path::MAIN_SEPARATOR_STR;
        assert_eq!(
            hint,
            format!("testsuite{sep}target{sep}archived-logs{sep}StartStopTest{sep}fullMicroProfile{sep}dev-run.log")
        );
    }
}
