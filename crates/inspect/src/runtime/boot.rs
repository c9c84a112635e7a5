//! Boot — logging init and configuration load.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::InspectConfig;
use crate::error::InspectResult;

/// Initialise the tracing / logging subsystem.
///
/// Logs go to stderr so stdout stays machine-readable for `--json`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startstop_inspect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from `--config` if given, otherwise file-or-env.
pub fn load_config(path: Option<&Path>) -> InspectResult<InspectConfig> {
    let config = match path {
        Some(p) => InspectConfig::load_from(p)?,
        None => InspectConfig::load()?,
    };
    info!(
        "Loaded configuration: base_dir={}, apps={}",
        config.base_dir,
        config.apps.len()
    );
    Ok(config)
}
