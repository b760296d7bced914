//! incident-rca - hackathon incident scenario toolkit
//!
//! Pulls simulated incident data (Slack transcripts and monitoring
//! payloads) from the hackathon API and reshapes it into summarized JSON
//! for root cause analysis.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, file I/O, empty listing, etc.)
//!   2 - Upstream API error (HTTP status, connection, decode)

mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod slack;

use anyhow::{bail, Context, Result};
use api::HackathonClient;
use chrono::Utc;
use cli::{Args, Command, DatadogArgs, FetchScenariosArgs, OutputFormat, ReportStyle};
use cli::{SlackDumpArgs, SlackPostArgs};
use config::{Config, CONFIG_FILE_NAME};
use error::ApiError;
use report::ReportInput;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("incident-rca v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

/// Handle init-config: generate a default .incident-rca.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the API endpoint, scenario, and Slack settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries report output only.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Upstream failures exit with 2, everything else with 1.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<ApiError>()) {
        2
    } else {
        1
    }
}

/// Dispatch the parsed subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;
    debug!("API base URL: {}", config.api.base_url);

    match &args.command {
        Command::Datadog(dd) => run_datadog(&config, dd).await,
        Command::FetchScenarios(fetch) => run_fetch_scenarios(&config, fetch, !args.quiet).await,
        Command::SlackDump(dump) => run_slack_dump(&config, dump).await,
        Command::SlackPost(post) => run_slack_post(&config, post).await,
        Command::InitConfig => handle_init_config(),
    }
}

/// Summarize a scenario's monitoring payloads.
async fn run_datadog(config: &Config, args: &DatadogArgs) -> Result<()> {
    let client = HackathonClient::new(&config.api)?;

    let scenario_id = args
        .scenario
        .clone()
        .unwrap_or_else(|| config.datadog.scenario_id.clone());
    let mock_file = args
        .mock_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.datadog.mock_file));
    let window_minutes = args.window_minutes.unwrap_or(config.datadog.window_minutes);

    let records = api::datadog_payloads(&client, &scenario_id, &mock_file).await?;
    info!("Loaded {} monitoring payloads", records.len());

    let summary = analysis::aggregate(&records);
    let input = ReportInput {
        service: &args.service,
        metric: &args.metric,
        env: &config.datadog.env,
        window_minutes,
        now: Utc::now(),
    };

    let output = match (args.format, args.style) {
        (OutputFormat::Text, _) => {
            report::render_summary_text(&report::build_analysis_report(&input, &summary)?)
        }
        (OutputFormat::Json, ReportStyle::Compact) => report::generate_json_report(
            &report::build_compact_report(&input, &summary, args.include_meta)?,
            config.output.pretty,
        )?,
        (OutputFormat::Json, ReportStyle::Analysis) => report::generate_json_report(
            &report::build_analysis_report(&input, &summary)?,
            config.output.pretty,
        )?,
    };

    report::write_output(args.output.as_deref(), &output)?;
    if let Some(ref path) = args.output {
        info!("Report saved to {}", path.display());
    }

    Ok(())
}

/// Download every scenario's full payload.
async fn run_fetch_scenarios(
    config: &Config,
    args: &FetchScenariosArgs,
    show_progress: bool,
) -> Result<()> {
    let client = HackathonClient::new(&config.api)?;
    let scenarios = api::fetch_all_scenarios(&client, show_progress).await?;

    if let Some(ref dir) = args.per_file_dir {
        let written = report::write_scenario_files(dir, &scenarios, config.output.pretty)?;
        info!("Also wrote {} per-scenario files to {}", written, dir.display());
    }

    let content = report::generate_json_report(&scenarios, config.output.pretty)?;
    report::write_output(Some(args.out.as_path()), &content)?;
    info!("Wrote {} scenarios to {}", scenarios.len(), args.out.display());

    Ok(())
}

/// Dump Slack transcripts with normalized scenario timestamps.
async fn run_slack_dump(config: &Config, args: &SlackDumpArgs) -> Result<()> {
    let client = HackathonClient::new(&config.api)?;

    if args.reset {
        info!("Seeding scenarios...");
        let result = client.reset().await?;
        info!("Seed result: {}", result);
    }

    let dumps = api::dump_slack(&client, args.scenario.as_deref()).await?;
    if dumps.is_empty() {
        match args.scenario.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => bail!("No scenario found with ID: {}", id),
            None => bail!("No scenarios found."),
        }
    }

    let messages: usize = dumps.iter().map(|d| d.slack_conversation.len()).sum();
    info!("Collected {} messages across {} scenarios", messages, dumps.len());

    let content = match args.format {
        OutputFormat::Json => report::generate_json_report(&dumps, config.output.pretty)?,
        OutputFormat::Text => report::render_conversations(&dumps),
    };

    report::write_output(args.out.as_deref(), &content)
}

/// Post a message to Slack.
async fn run_slack_post(config: &Config, args: &SlackPostArgs) -> Result<()> {
    let token = args
        .token
        .clone()
        .or_else(|| config.slack.bot_token.clone())
        .context("No Slack bot token: set SLACK_BOT_TOKEN or [slack].bot_token")?;
    let channel = args
        .channel
        .clone()
        .or_else(|| config.slack.channel_id.clone())
        .context("No Slack channel: pass --channel or set [slack].channel_id")?;

    let slack = slack::SlackClient::new(&config.slack.api_url, &token, config.api.timeout_seconds)?;
    let ts = slack.post_message(&channel, &args.text).await?;
    debug!("Slack message ts: {:?}", ts);

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
