//! `promptgate-config` — PromptGate settings management.
//!
//! Provides:
//! - Typed settings schema (server, proxy, fake streaming, generation defaults)
//! - YAML loading with tolerant missing-file defaults
//! - Field-path validation

pub mod io;
pub mod schema;
pub mod validation;

pub use io::{load_config, settings_path};
pub use schema::{AppConfig, FakeStreamingConfig, ProxyConfig, ServerConfig};
pub use validation::{validate, SettingsValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load and validate a settings file. This is the main entry point for
/// startup; validation errors are fatal here rather than logged and ignored.
pub async fn load_and_validate(path: &Path) -> Result<AppConfig> {
    let config = load_config(path).await?;

    let report = validate(&config);
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Settings error");
        }
        bail!(
            "invalid settings in {}: {} error(s)",
            path.display(),
            report.errors.len()
        );
    }

    Ok(config)
}
