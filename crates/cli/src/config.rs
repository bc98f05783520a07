//! Runtime configuration.
//!
//! Loaded once at startup from a TOML file (`classhub.toml` by default) and
//! validated before anything is constructed; the process never starts with
//! an invalid configuration.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize)]
pub struct GithubConfig {
    /// API root; override for GitHub Enterprise installs.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// The application's administrative token.
    pub admin_token: String,
    /// Login of the automation identity whose pushes trigger repository
    /// bootstrap (e.g. `"classhub[bot]"`).
    pub bot_login: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Shared secret every delivery's signature is verified against.
    pub secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; span export is disabled when unset.
    pub otlp_endpoint: Option<String>,
}

fn default_api_url() -> String {
    github::DEFAULT_API_URL.to_owned()
}

fn default_bind_addr() -> SocketAddr {
    // Webhook deliveries arrive from the public platform; bind wide by
    // default and let deployment narrow it.
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Reads and parses the configuration file.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("parsing configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [github]
            admin_token = "ghs_example"
            bot_login = "classhub[bot]"

            [webhook]
            secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.github.api_url, github::DEFAULT_API_URL);
        assert_eq!(config.webhook.bind_addr, default_bind_addr());
        assert!(config.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn missing_secret_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [github]
            admin_token = "ghs_example"
            bot_login = "classhub[bot]"

            [webhook]
            "#,
        );
        assert!(result.is_err());
    }
}
