//! Model — InspectConfig and per-application profiles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InspectError, InspectResult};
use crate::scan::AllowList;
use crate::threshold::{Platform, ThresholdTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Root under which `testsuite/target/archived-logs` is created.
    pub base_dir: String,
    /// Overrides the platform detected from the build target.
    pub platform: Option<String>,
    pub measurements_file: String,
    pub apps: BTreeMap<String, AppProfile>,
    /// Directory relative paths in the file are resolved against.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// Per-application allow-list and thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppProfile {
    pub allow_list: Vec<String>,
    pub thresholds_file: Option<String>,
    /// Inline thresholds; these win over `thresholds_file`.
    pub thresholds: toml::Table,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            platform: None,
            measurements_file: "measurements.csv".to_string(),
            apps: BTreeMap::new(),
            config_dir: PathBuf::from("."),
        }
    }
}

impl InspectConfig {
    /// Validate configuration values (no I/O)
    pub fn validate(&self) -> Result<(), String> {
        if self.base_dir.trim().is_empty() {
            return Err("base_dir must not be empty".to_string());
        }
        if self.measurements_file.trim().is_empty() {
            return Err("measurements_file must not be empty".to_string());
        }
        if let Some(platform) = &self.platform {
            platform.parse::<Platform>().map_err(|e| e.to_string())?;
        }
        if let Some(name) = self.apps.keys().find(|name| name.trim().is_empty()) {
            return Err(format!("app name must not be blank: {:?}", name));
        }
        Ok(())
    }

    pub fn platform(&self) -> InspectResult<Platform> {
        match &self.platform {
            Some(p) => p.parse(),
            None => Ok(Platform::current()),
        }
    }

    pub fn app(&self, name: &str) -> InspectResult<&AppProfile> {
        self.apps
            .get(name)
            .ok_or_else(|| InspectError::InvalidConfig(format!("unknown app: {}", name)))
    }

    pub fn base_dir(&self) -> PathBuf {
        self.resolve(&self.base_dir)
    }

    pub fn measurements_path(&self) -> PathBuf {
        self.resolve(&self.measurements_file)
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

impl AppProfile {
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allow_list.clone())
    }

    /// Thresholds file (if any) with inline entries layered on top.
    pub fn threshold_table(&self, config: &InspectConfig) -> InspectResult<ThresholdTable> {
        let mut table = match &self.thresholds_file {
            Some(file) => ThresholdTable::load(&config.resolve(file))?,
            None => ThresholdTable::new(),
        };
        table.merge(ThresholdTable::from_toml_table(&self.thresholds)?);
        Ok(table)
    }
}
