//! Scenario workflows built on the API client.
//!
//! Each workflow walks the scenario listing one entry at a time. Failures of
//! a single scenario are logged and isolated; only a failed listing aborts.

use crate::analysis::to_utc_with_offset;
use crate::api::client::{DatadogEnvelope, HackathonClient};
use crate::error::ApiError;
use crate::models::{MonitoringRecord, ScenarioDump, ScenarioPayload};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

/// Fetch the full payload of every listed scenario, in listing order.
///
/// Entries without a `scenario_id` are skipped.
pub async fn fetch_all_scenarios(
    client: &HackathonClient,
    show_progress: bool,
) -> Result<Vec<ScenarioPayload>, ApiError> {
    let summaries = client.list_scenarios().await?;
    let ids: Vec<&str> = summaries
        .iter()
        .filter_map(|s| s.scenario_id.as_deref())
        .filter(|id| !id.is_empty())
        .collect();
    info!("Listed {} scenarios ({} with ids)", summaries.len(), ids.len());

    let progress = progress_bar(ids.len() as u64, show_progress);
    let mut full = Vec::with_capacity(ids.len());

    for id in ids {
        progress.set_message(id.to_string());
        info!("Fetching {}", id);
        full.push(client.fetch_scenario(id).await?);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(full)
}

/// Collect Slack transcripts with UTC-normalized scenario timestamps.
///
/// With `only`, stops after the matching scenario.
pub async fn dump_slack(
    client: &HackathonClient,
    only: Option<&str>,
) -> Result<Vec<ScenarioDump>, ApiError> {
    let only = only.map(str::trim).filter(|id| !id.is_empty());
    let scenarios = client.list_scenarios().await?;
    let mut dumps = Vec::new();

    for summary in &scenarios {
        let Some(sid) = summary.scenario_id.as_deref().filter(|id| !id.is_empty()) else {
            warn!("Skipping scenario without id ({:?})", summary.title);
            continue;
        };
        if only.is_some_and(|wanted| wanted != sid) {
            continue;
        }
        let title = summary.title.as_deref().unwrap_or("");

        let (started_at_utc, updated_at_utc) = match client.fetch_scenario_times(sid).await {
            Ok(times) => (
                normalize_or_null(sid, "created_at", times.created_at.as_deref()),
                normalize_or_null(sid, "updated_at", times.updated_at.as_deref()),
            ),
            Err(e) => {
                warn!("Failed to fetch meta for {} ({}): {}", sid, title, e);
                (None, None)
            }
        };

        let slack_conversation = match client.fetch_slack(sid).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to fetch slack for {} ({}): {}", sid, title, e);
                Vec::new()
            }
        };

        dumps.push(ScenarioDump {
            scenario_id: summary.scenario_id.clone(),
            title: summary.title.clone(),
            started_at_utc,
            updated_at_utc,
            slack_conversation,
        });

        if only.is_some() {
            break;
        }
    }

    Ok(dumps)
}

/// Monitoring payloads from the live API, falling back to `mock_file`.
pub async fn datadog_payloads(
    client: &HackathonClient,
    scenario_id: &str,
    mock_file: &Path,
) -> Result<Vec<MonitoringRecord>> {
    info!("Fetching monitoring payloads for scenario {}", scenario_id);

    match client.fetch_datadog(scenario_id).await {
        Ok(records) => Ok(records),
        Err(e) => {
            warn!(
                "API request failed ({}). Falling back to local mock file {}",
                e,
                mock_file.display()
            );
            load_mock_payloads(mock_file)
        }
    }
}

/// Read `datadog_payloads` from a local JSON file.
pub fn load_mock_payloads(path: &Path) -> Result<Vec<MonitoringRecord>> {
    if !path.exists() {
        bail!("Mock file not found: {}", path.display());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mock file: {}", path.display()))?;
    let envelope: DatadogEnvelope = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse mock file: {}", path.display()))?;

    Ok(envelope.datadog_payloads.unwrap_or_default())
}

/// Malformed timestamps become `None` for this one scenario.
fn normalize_or_null(scenario_id: &str, field: &str, raw: Option<&str>) -> Option<String> {
    match to_utc_with_offset(raw) {
        Ok(normalized) => normalized,
        Err(e) => {
            warn!("Scenario {}: {} dropped: {}", scenario_id, field, e);
            None
        }
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
