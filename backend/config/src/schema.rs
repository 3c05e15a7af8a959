//! PromptGate runtime configuration schema.
//!
//! Typed for serde YAML deserialization; every field has a default so a
//! missing or partial settings file still yields a runnable configuration.

use promptgate_core::GenerationDefaults;
use serde::{Deserialize, Serialize};

/// Root configuration for PromptGate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct AppConfig {
    /// Application name, used as the logging target prefix.
    pub app_name: AppName,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: LogLevel,

    /// Listener configuration.
    pub server: ServerConfig,

    /// Proxy core configuration.
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(pub String);

impl Default for AppName {
    fn default() -> Self {
        Self("promptgate".into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Core proxy behavior: template locations, streaming simulation, upstream
/// call bounds, and the generation defaults that replace caller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ProxyConfig {
    /// Template used when the latest user turn has content.
    pub template_with_input: String,

    /// Template used when the latest user turn is empty or absent.
    pub template_without_input: String,

    pub fake_streaming: FakeStreamingConfig,

    /// Upstream request timeout in seconds.
    pub upstream_timeout_secs: u64,

    /// Generation parameters sent upstream in place of whatever the caller
    /// supplied.
    pub generation: GenerationDefaults,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            template_with_input: "templates/with_input.yaml".into(),
            template_without_input: "templates/without_input.yaml".into(),
            fake_streaming: FakeStreamingConfig::default(),
            upstream_timeout_secs: 60,
            generation: GenerationDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FakeStreamingConfig {
    /// When enabled, `stream: true` requests are served from a buffered
    /// upstream call presented as a simulated event stream.
    pub enabled: bool,

    /// Heartbeat interval in seconds while the buffered call is in flight.
    pub heartbeat_interval_secs: u64,
}

impl Default for FakeStreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_interval_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_mapping() {
        let cfg: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.proxy.upstream_timeout_secs, 60);
        assert!(cfg.proxy.fake_streaming.enabled);
        assert_eq!(cfg.proxy.fake_streaming.heartbeat_interval_secs, 1);
        assert_eq!(cfg.proxy.generation.max_tokens, 4096);
    }

    #[test]
    fn partial_override_keeps_sibling_defaults() {
        let cfg: AppConfig = serde_yaml::from_str(
            r#"
proxy:
  upstream_timeout_secs: 120
  generation:
    temperature: 0.3
"#,
        )
        .unwrap();
        assert_eq!(cfg.proxy.upstream_timeout_secs, 120);
        assert_eq!(cfg.proxy.generation.temperature, 0.3);
        assert_eq!(cfg.proxy.generation.top_p, 1.0);
        assert_eq!(cfg.proxy.template_with_input, "templates/with_input.yaml");
    }
}
