//! Settings validation with field-path error messages.

use crate::schema::AppConfig;
use thiserror::Error;

/// A settings validation error with field path and message.
#[derive(Debug, Error)]
#[error("Settings validation error at '{path}': {message}")]
pub struct SettingsValidationError {
    pub path: String,
    pub message: String,
}

/// All errors found in one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<SettingsValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(SettingsValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the settings and return a report of all errors.
pub fn validate(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.proxy.fake_streaming.heartbeat_interval_secs == 0 {
        report.error(
            "proxy.fake_streaming.heartbeat_interval_secs",
            "heartbeat interval must be >= 1 second",
        );
    }
    if config.proxy.upstream_timeout_secs < 10 {
        report.error(
            "proxy.upstream_timeout_secs",
            "upstream timeout must be >= 10 seconds",
        );
    }
    if config.proxy.template_with_input.trim().is_empty() {
        report.error("proxy.template_with_input", "template path cannot be empty");
    }
    if config.proxy.template_without_input.trim().is_empty() {
        report.error(
            "proxy.template_without_input",
            "template path cannot be empty",
        );
    }

    let gen = &config.proxy.generation;
    if !(0.0..=2.0).contains(&gen.temperature) {
        report.error("proxy.generation.temperature", "must be within [0, 2]");
    }
    if !(0.0..=1.0).contains(&gen.top_p) {
        report.error("proxy.generation.top_p", "must be within [0, 1]");
    }
    if gen.max_tokens == 0 {
        report.error("proxy.generation.max_tokens", "must be >= 1");
    }
    for (path, v) in [
        ("proxy.generation.frequency_penalty", gen.frequency_penalty),
        ("proxy.generation.presence_penalty", gen.presence_penalty),
    ] {
        if !(-2.0..=2.0).contains(&v) {
            report.error(path, "must be within [-2, 2]");
        }
    }

    report
}
