//! Model — modes, platforms, metrics, measurements and the threshold table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{InspectError, InspectResult};

/// Raw "not measured this run" value used by harness callers.
pub const SKIP: i64 = -1;

/// Build/run variant of the application under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// JVM-compiled jar
    Jvm,
    /// Natively compiled executable
    Native,
    /// Interactive development mode
    Dev,
    /// Development mode on a generator-created project
    Generator,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Jvm, Mode::Native, Mode::Dev, Mode::Generator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Jvm => "JVM",
            Mode::Native => "NATIVE",
            Mode::Dev => "DEV",
            Mode::Generator => "GENERATOR",
        }
    }

    /// Key fragment appended to the platform name.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Mode::Jvm => ".jvm",
            Mode::Native => ".native",
            Mode::Dev => ".dev",
            Mode::Generator => ".generated.dev",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jvm" => Ok(Mode::Jvm),
            "native" => Ok(Mode::Native),
            "dev" => Ok(Mode::Dev),
            "generator" | "generated.dev" | "generated_dev" => Ok(Mode::Generator),
            _ => Err(InspectError::UnknownMode(s.to_string())),
        }
    }
}

/// Windows family vs. everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => Err(InspectError::UnknownPlatform(s.to_string())),
        }
    }
}

/// `<platform><mode suffix>`, e.g. `linux.jvm` or `windows.generated.dev`.
pub fn key_prefix(platform: Platform, mode: Mode) -> String {
    format!("{}{}", platform.as_str(), mode.key_suffix())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TimeToFirstOkRequest,
    Rss,
    TimeToReload,
}

impl Metric {
    /// Evaluation order.
    pub const ALL: [Metric; 3] = [Metric::TimeToFirstOkRequest, Metric::Rss, Metric::TimeToReload];

    pub fn key_suffix(&self) -> &'static str {
        match self {
            Metric::TimeToFirstOkRequest => ".time.to.first.ok.request.threshold.ms",
            Metric::Rss => ".RSS.threshold.kB",
            Metric::TimeToReload => ".time.to.reload.threshold.ms",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::TimeToFirstOkRequest | Metric::TimeToReload => "ms",
            Metric::Rss => "kB",
        }
    }

    pub fn key(&self, platform: Platform, mode: Mode) -> String {
        format!("{}{}", key_prefix(platform, mode), self.key_suffix())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::TimeToFirstOkRequest => "time to first OK request",
            Metric::Rss => "RSS",
            Metric::TimeToReload => "time to reload",
        };
        f.write_str(name)
    }
}

/// One run's measurements. `None` means "not evaluated this run".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementSet {
    pub time_to_first_ok_request_ms: Option<u64>,
    pub rss_kb: Option<u64>,
    pub time_to_reload_ms: Option<u64>,
}

impl MeasurementSet {
    /// Convert raw harness values where [`SKIP`] marks an absent measurement.
    pub fn from_raw(rss_kb: i64, time_to_first_ok_request_ms: i64, time_to_reload_ms: i64) -> InspectResult<Self> {
        Ok(Self {
            time_to_first_ok_request_ms: raw_value("time to first OK request", time_to_first_ok_request_ms)?,
            rss_kb: raw_value("RSS", rss_kb)?,
            time_to_reload_ms: raw_value("time to reload", time_to_reload_ms)?,
        })
    }

    pub fn get(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::TimeToFirstOkRequest => self.time_to_first_ok_request_ms,
            Metric::Rss => self.rss_kb,
            Metric::TimeToReload => self.time_to_reload_ms,
        }
    }
}

fn raw_value(name: &str, value: i64) -> InspectResult<Option<u64>> {
    if value == SKIP {
        return Ok(None);
    }
    u64::try_from(value)
        .map(Some)
        .map_err(|_| InspectError::InvalidConfig(format!("{} measurement must not be negative: {}", name, value)))
}

/// Dotted key → ceiling. Missing keys have no default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThresholdTable {
    entries: BTreeMap<String, u64>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> InspectResult<u64> {
        self.entries
            .get(key)
            .copied()
            .ok_or_else(|| InspectError::MissingThreshold { key: key.to_string() })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from `other` replace entries with the same key.
    pub fn merge(&mut self, other: ThresholdTable) {
        self.entries.extend(other.entries);
    }

    /// Parse a TOML document. Nested tables and dotted keys are flattened back
    /// into dotted strings, so a plain `key=value` threshold file such as
    /// `linux.jvm.RSS.threshold.kB=120000` is accepted unchanged.
    pub fn from_toml_str(s: &str) -> InspectResult<Self> {
        let table: toml::Table = toml::from_str(s)?;
        Self::from_toml_table(&table)
    }

    pub fn from_toml_table(table: &toml::Table) -> InspectResult<Self> {
        let mut out = Self::new();
        flatten("", table, &mut out)?;
        Ok(out)
    }

    pub fn load(path: &Path) -> InspectResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

impl FromIterator<(String, u64)> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut ThresholdTable) -> InspectResult<()> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out)?,
            toml::Value::Integer(n) => {
                let n = u64::try_from(*n).map_err(|_| {
                    InspectError::InvalidConfig(format!("threshold {} must not be negative", key))
                })?;
                out.insert(key, n);
            }
            other => {
                return Err(InspectError::InvalidConfig(format!(
                    "threshold {} must be an integer, got {}",
                    key,
                    other.type_str()
                )))
            }
        }
    }
    Ok(())
}
