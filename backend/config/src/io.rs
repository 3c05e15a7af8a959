//! Settings file loading.

use crate::schema::AppConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default settings file location, relative to the working directory.
const SETTINGS_FILE: &str = "config/settings.yaml";

/// Environment variable overriding the settings file location.
const SETTINGS_ENV: &str = "PROMPTGATE_CONFIG";

/// Resolve the settings file path: `PROMPTGATE_CONFIG` env if set, otherwise
/// `config/settings.yaml`.
pub fn settings_path() -> PathBuf {
    match std::env::var(SETTINGS_ENV) {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(SETTINGS_FILE),
    }
}

/// Load and parse the settings from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run);
/// a present-but-malformed file is an error, not silently defaulted.
pub async fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Settings file does not exist; using defaults");
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let config: AppConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse settings YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded settings");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let cfg = load_config(Path::new("does/not/exist.yaml")).await.unwrap();
        assert_eq!(cfg.server.port, 8000);
    }
}
