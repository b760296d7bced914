//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.incident-rca.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".incident-rca.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hackathon API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Monitoring payload analysis settings.
    #[serde(default)]
    pub datadog: DatadogConfig,

    /// Slack Web API settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Hackathon API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the scenario API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header; the gateway rejects requests without it.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional `Authorization` header value, e.g. `Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Attempts per GET request.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Linear backoff step between attempts, in seconds.
    #[serde(default = "default_backoff")]
    pub backoff_seconds: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            auth: None,
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            backoff_seconds: default_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "https://sre-api-service-ext.bestegg.com".to_string()
}

fn default_user_agent() -> String {
    "Hackathon 8.2025".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_retries() -> usize {
    3
}

fn default_backoff() -> f64 {
    0.8
}

/// Monitoring payload analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatadogConfig {
    /// Scenario analysed when none is given on the command line.
    #[serde(default = "default_scenario_id")]
    pub scenario_id: String,

    /// Environment label written into reports.
    #[serde(default = "default_env")]
    pub env: String,

    /// Length of the reported time window.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,

    /// Local payload file used when the live API is unreachable.
    #[serde(default = "default_mock_file")]
    pub mock_file: String,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            scenario_id: default_scenario_id(),
            env: default_env(),
            window_minutes: default_window_minutes(),
            mock_file: default_mock_file(),
        }
    }
}

fn default_scenario_id() -> String {
    "22222222-2222-2222-2222-222222222222".to_string()
}

fn default_env() -> String {
    "prod".to_string()
}

fn default_window_minutes() -> i64 {
    30
}

fn default_mock_file() -> String {
    "mock_datadog.json".to_string()
}

/// Slack Web API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Endpoint for `chat.postMessage`.
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,

    /// Bot token. Prefer the SLACK_BOT_TOKEN environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Default channel for `slack-post`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: default_slack_api_url(),
            bot_token: None,
            channel_id: None,
        }
    }
}

fn default_slack_api_url() -> String {
    "https://slack.com/api/chat.postMessage".to_string()
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.incident-rca.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user actually supplied (flag or environment) override
    /// the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = args.user_agent {
            self.api.user_agent = user_agent.clone();
        }
        if let Some(ref auth) = args.auth {
            self.api.auth = Some(auth.clone());
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.api.retries = retries;
        }

        // Trailing slashes would double up when joined with endpoint paths
        self.api.base_url = self.api.base_url.trim_end_matches('/').to_string();
    }

    /// Reject settings no request or report can work with.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_seconds == 0 {
            bail!("[api].timeout_seconds must be at least 1");
        }
        if self.api.retries == 0 {
            bail!("[api].retries must be at least 1");
        }
        if self.datadog.window_minutes < 1 {
            bail!(
                "[datadog].window_minutes must be at least 1, got {}",
                self.datadog.window_minutes
            );
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.user_agent, "Hackathon 8.2025");
        assert_eq!(config.api.retries, 3);
        assert_eq!(config.api.backoff_seconds, 0.8);
        assert_eq!(config.datadog.window_minutes, 30);
        assert_eq!(config.datadog.env, "prod");
        assert!(config.api.auth.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
base_url = "http://localhost:8080/"
auth = "Bearer abc"
retries = 5

[datadog]
scenario_id = "33333333-3333-3333-3333-333333333333"
window_minutes = 60

[slack]
channel_id = "C123"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/");
        assert_eq!(config.api.auth.as_deref(), Some("Bearer abc"));
        assert_eq!(config.api.retries, 5);
        assert_eq!(config.api.timeout_seconds, 20);
        assert_eq!(
            config.datadog.scenario_id,
            "33333333-3333-3333-3333-333333333333"
        );
        assert_eq!(config.datadog.window_minutes, 60);
        assert_eq!(config.datadog.mock_file, "mock_datadog.json");
        assert_eq!(config.slack.channel_id.as_deref(), Some("C123"));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[datadog]"));
        assert!(toml_str.contains("[slack]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api.base_url, Config::default().api.base_url);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[output]\npretty = false\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(!config.output.pretty);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[api\nbroken").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::try_parse_from([
            "incident-rca",
            "--base-url",
            "http://127.0.0.1:9000/",
            "--user-agent",
            "rca-tests",
            "--auth",
            "Bearer t",
            "--timeout",
            "7",
            "init-config",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.user_agent, "rca-tests");
        assert_eq!(config.api.auth.as_deref(), Some("Bearer t"));
        assert_eq!(config.api.timeout_seconds, 7);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[datadog]\nwindow_minutes = -10\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[api]\nretries = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[api]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
