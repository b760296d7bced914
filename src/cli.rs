//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// incident-rca - hackathon incident scenario toolkit
///
/// Pulls simulated incident data (Slack transcripts and monitoring
/// payloads) from the hackathon API and summarizes it as JSON.
///
/// Examples:
///   incident-rca datadog checkout-api http.errors
///   incident-rca datadog checkout-api http.errors --style analysis --format text
///   incident-rca fetch-scenarios --out scenarios_full.json --per-file-dir scenarios/
///   incident-rca slack-dump --out slack.json
///   incident-rca slack-post --channel C0123 --text "RCA ready"
///   incident-rca init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the hackathon API
    #[arg(long, global = true, value_name = "URL", env = "HACK_BASE")]
    pub base_url: Option<String>,

    /// User-Agent header sent to the API gateway
    #[arg(long, global = true, value_name = "UA", env = "HACK_UA")]
    pub user_agent: Option<String>,

    /// Authorization header value forwarded as-is (e.g. "Bearer <token>")
    #[arg(long, global = true, value_name = "VALUE", env = "AUTH", hide_env_values = true)]
    pub auth: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Attempts per GET request
    #[arg(long, global = true, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .incident-rca.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bars)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Summarize a scenario's monitoring payloads for root cause analysis
    Datadog(DatadogArgs),

    /// Download the full payload of every scenario
    FetchScenarios(FetchScenariosArgs),

    /// Dump Slack transcripts of all scenarios with UTC timestamps
    SlackDump(SlackDumpArgs),

    /// Post a message to a Slack channel
    SlackPost(SlackPostArgs),

    /// Generate a default .incident-rca.toml configuration file
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DatadogArgs {
    /// Service name written into the report
    pub service: String,

    /// Error metric name written into the report
    pub metric: String,

    /// Scenario to analyse (defaults to the configured scenario)
    #[arg(long, value_name = "ID", env = "SCENARIO_ID")]
    pub scenario: Option<String>,

    /// Length of the reported time window
    #[arg(long, value_name = "MINUTES")]
    pub window_minutes: Option<i64>,

    /// Payload file used when the live API is unreachable
    #[arg(long, value_name = "FILE")]
    pub mock_file: Option<PathBuf>,

    /// Report layout
    #[arg(long, default_value = "compact", value_name = "STYLE")]
    pub style: ReportStyle,

    /// Output format (json, text)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Attach field semantics and documentation links (compact style)
    #[arg(long)]
    pub include_meta: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FetchScenariosArgs {
    /// Write the combined JSON to this file
    #[arg(long, default_value = "scenarios_full.json", value_name = "FILE")]
    pub out: PathBuf,

    /// Also write one JSON file per scenario into this directory
    #[arg(long, value_name = "DIR")]
    pub per_file_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SlackDumpArgs {
    /// Write the output to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Reset/seed scenarios before dumping
    #[arg(long)]
    pub reset: bool,

    /// Only dump this scenario
    #[arg(long, value_name = "ID")]
    pub scenario: Option<String>,

    /// Output format (json, text)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SlackPostArgs {
    /// Channel to post to
    #[arg(long, value_name = "ID", env = "SLACK_CHANNEL_ID")]
    pub channel: Option<String>,

    /// Message text
    #[arg(long)]
    pub text: String,

    /// Bot token
    #[arg(long, value_name = "TOKEN", env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON (default)
    #[default]
    Json,
    /// Human-readable text
    Text,
}

/// Layout of the `datadog` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportStyle {
    /// Buckets, synthetic metric series, and spans sample
    #[default]
    Compact,
    /// Ranked facets, dependency/operation listings, and insights
    Analysis,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(retries) = self.retries {
            if retries == 0 {
                return Err("Retries must be at least 1".to_string());
            }
        }

        match &self.command {
            Command::Datadog(args) => {
                if args.service.trim().is_empty() {
                    return Err("Service name must not be empty".to_string());
                }
                if let Some(minutes) = args.window_minutes {
                    if minutes <= 0 {
                        return Err("Window must be at least 1 minute".to_string());
                    }
                }
            }
            Command::SlackPost(args) => {
                if args.text.trim().is_empty() {
                    return Err("Message text must not be empty".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
