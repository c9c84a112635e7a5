//! Load — config loading from file and environment variables.

use std::path::Path;

use super::model::InspectConfig;
use crate::error::{InspectError, InspectResult};

pub const CONFIG_FILE_VAR: &str = "INSPECT_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "startstop-inspect.toml";

impl InspectConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> InspectResult<Self> {
        let config_path = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(Path::new(&config_path))?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };
        config.finish()
    }

    /// Load from an explicit path. Unlike [`InspectConfig::load`], a missing
    /// file is an error.
    pub fn load_from(path: &Path) -> InspectResult<Self> {
        tracing::info!("Loading configuration from: {}", path.display());
        Self::from_file(path)?.finish()
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> InspectResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: InspectConfig = toml::from_str(&contents)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.config_dir = dir.to_path_buf();
        }
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Environment variables override file config
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup("INSPECT_BASE_DIR") {
            self.base_dir = base;
        }
        if let Some(platform) = lookup("INSPECT_PLATFORM") {
            self.platform = Some(platform);
        }
        if let Some(file) = lookup("INSPECT_MEASUREMENTS_FILE") {
            self.measurements_file = file;
        }
    }

    fn finish(mut self) -> InspectResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok());
        self.validate().map_err(InspectError::InvalidConfig)?;
        Ok(self)
    }
}
