//! Report assembly and rendering.
//!
//! This module turns facet summaries into the compact and analysis JSON
//! reports, renders plain-text digests, and writes results to disk.

use crate::analysis::timestamp::TimestampError;
use crate::analysis::{named_counts, window_ending_at, FacetSummary, TOP_K};
use crate::models::{
    AnalysisReport, AnalysisSection, CompactReport, MetricCheck, MetricSeries, NamedCount,
    RankedEntry, ScenarioDump, ScenarioPayload, SpansSample,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Caller-supplied context shared by both report styles.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub service: &'a str,
    pub metric: &'a str,
    pub env: &'a str,
    pub window_minutes: i64,
    /// End of the analysis window.
    pub now: DateTime<Utc>,
}

/// Build the compact RCA report.
pub fn build_compact_report(
    input: &ReportInput<'_>,
    summary: &FacetSummary,
    include_meta: bool,
) -> Result<CompactReport, TimestampError> {
    // Whole seconds, scaled to millis
    let end_millis = input.now.timestamp() * 1000;

    let series = summary
        .buckets
        .by_version
        .iter()
        .map(|entry| MetricSeries {
            key: entry.value.clone(),
            points: vec![[end_millis, entry.count as i64]],
        })
        .collect();

    Ok(CompactReport {
        time_window: window_ending_at(input.now, input.window_minutes)?,
        service: input.service.to_string(),
        env: input.env.to_string(),
        logs_top_buckets: summary.buckets.clone(),
        metric_check: MetricCheck {
            metric: input.metric.to_string(),
            split_by: "version".to_string(),
            series,
        },
        events_near_spike: Vec::new(),
        spans_sample: SpansSample {
            top_dependency: summary.dependencies.top().map(|(v, _)| v.to_string()),
            top_operation: summary.operations.top().map(|(v, _)| v.to_string()),
            sample: Vec::new(),
        },
        meta: include_meta.then(|| report_meta(input.window_minutes)),
    })
}

/// Build the analysis report with insights.
pub fn build_analysis_report(
    input: &ReportInput<'_>,
    summary: &FacetSummary,
) -> Result<AnalysisReport, TimestampError> {
    Ok(AnalysisReport {
        time_window: window_ending_at(input.now, input.window_minutes)?,
        service: input.service.to_string(),
        metric: input.metric.to_string(),
        env: input.env.to_string(),
        analysis: AnalysisSection {
            top_versions: summary.buckets.by_version.clone(),
            top_hosts: summary.buckets.by_host.clone(),
            error_codes: summary.buckets.by_error_code.clone(),
            dependencies: named_counts(&summary.dependencies, TOP_K),
            operations: named_counts(&summary.operations, TOP_K),
        },
        insights: insights(summary),
    })
}

/// One-line findings about the top error code and dependency.
pub fn insights(summary: &FacetSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(top_error) = summary.buckets.by_error_code.first() {
        lines.push(format!(
            "Top error code: {} ({} occurrences)",
            top_error.value, top_error.count
        ));
    }

    if let Some((dependency, count)) = summary.dependencies.top() {
        lines.push(format!(
            "Most active dependency: {} ({} calls)",
            dependency, count
        ));
    }

    lines
}

/// Field semantics and documentation links attached on request.
fn report_meta(window_minutes: i64) -> Value {
    json!({
        "window_minutes": window_minutes,
        "semantics": {
            "logs_top_buckets": {
                "by_version": "Top version tags observed among monitor payloads in the time window.",
                "by_host": "Top host tags observed among monitor payloads in the time window.",
                "by_error_code": "Top error.code tags or inferred categories when tags are absent."
            },
            "counts_meaning":
                "count = number of monitor items matching the facet within the window (NOT request volume).",
            "metric_check":
                "Synthetic per-version magnitude using the bucket counts as a single point for visualization/localization.",
            "spans_sample":
                "Heuristic summary of likely dependency/operation from tags or monitor names; no raw spans in mock."
        },
        "sources": {
            "datadog_monitors": "https://docs.datadoghq.com/monitors/",
            "datadog_tags": "https://docs.datadoghq.com/getting_started/tagging/",
            "logs_analytics_api": "https://docs.datadoghq.com/api/latest/logs/",
            "metrics_timeseries_api": "https://docs.datadoghq.com/api/latest/metrics/",
            "events_api": "https://docs.datadoghq.com/api/latest/events/",
            "spans_search_api": "https://docs.datadoghq.com/api/latest/spans/",
            "latency_pXX_explainer": "https://docs.datadoghq.com/dashboards/guide/percentiles/",
            "http_error_rates": "https://docs.datadoghq.com/monitors/types/metric/#anomaly-and-outliers"
        }
    })
}

/// Plain-text digest of an analysis report.
pub fn render_summary_text(report: &AnalysisReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("RCA summary for {} ({})", report.service, report.env));
    lines.push(format!("Metric: {}", report.metric));
    lines.push(format!(
        "Window: {} -> {}",
        report.time_window.from, report.time_window.to
    ));

    push_ranked(&mut lines, "Top versions", &report.analysis.top_versions);
    push_ranked(&mut lines, "Top hosts", &report.analysis.top_hosts);
    push_ranked(&mut lines, "Error codes", &report.analysis.error_codes);
    push_named(&mut lines, "Dependencies", &report.analysis.dependencies);
    push_named(&mut lines, "Operations", &report.analysis.operations);

    if !report.insights.is_empty() {
        lines.push(String::new());
        lines.push("Insights:".to_string());
        for insight in &report.insights {
            lines.push(format!("- {}", insight));
        }
    }

    lines.join("\n")
}

fn push_ranked(lines: &mut Vec<String>, heading: &str, entries: &[RankedEntry]) {
    lines.push(String::new());
    lines.push(format!("{}:", heading));
    if entries.is_empty() {
        lines.push("- none".to_string());
    }
    for entry in entries {
        lines.push(format!("- {}: {} ({}%)", entry.value, entry.count, entry.pct));
    }
}

fn push_named(lines: &mut Vec<String>, heading: &str, entries: &[NamedCount]) {
    lines.push(String::new());
    lines.push(format!("{}:", heading));
    if entries.is_empty() {
        lines.push("- none".to_string());
    }
    for entry in entries {
        lines.push(format!("- {}: {}", entry.name, entry.count));
    }
}

/// Plain-text transcript of scenario conversations.
pub fn render_conversations(dumps: &[ScenarioDump]) -> String {
    dumps
        .iter()
        .map(render_conversation)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn render_conversation(dump: &ScenarioDump) -> String {
    let mut out = format!(
        "Scenario: {} (ID: {})\nCreated: {}\nUpdated: {}\n",
        dump.title.as_deref().unwrap_or("Untitled"),
        dump.scenario_id.as_deref().unwrap_or(""),
        dump.started_at_utc.as_deref().unwrap_or("None"),
        dump.updated_at_utc.as_deref().unwrap_or("None"),
    );

    if dump.slack_conversation.is_empty() {
        out.push_str("No Slack messages found for this scenario.\n");
        return out;
    }

    out.push_str("Slack Conversation:\n");
    for msg in &dump.slack_conversation {
        out.push_str(&format!(
            "{} - {}: {}\n",
            msg.ts.as_deref().unwrap_or(""),
            msg.user.as_deref().unwrap_or("Unknown"),
            msg.text.as_deref().unwrap_or("")
        ));
    }

    out
}

/// Serialize any report to JSON.
pub fn generate_json_report<T: Serialize>(report: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.context("Failed to serialize report to JSON")
}

/// Write `content` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            ensure_parent_dir(path)?;
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))
        }
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// File name for a scenario's standalone JSON file.
pub fn scenario_file_name(payload: &ScenarioPayload) -> String {
    format!(
        "{}.json",
        payload.scenario_id().unwrap_or_else(|| "unknown".to_string())
    )
}

/// Write one JSON file per scenario into `dir`. Returns the number written.
pub fn write_scenario_files(
    dir: &Path,
    scenarios: &[ScenarioPayload],
    pretty: bool,
) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    for payload in scenarios {
        let path = dir.join(scenario_file_name(payload));
        let content = generate_json_report(payload, pretty)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(scenarios.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::{MonitoringRecord, SlackMessage};
    use chrono::TimeZone;

    fn sample_summary() -> FacetSummary {
        let records: Vec<MonitoringRecord> = serde_json::from_value(json!([
            {"tags": ["version:2.1", "host:web-1", "error.code:502", "peer.service:payments"]},
            {"tags": ["version:2.1", "host:web-2", "error.code:502", "db.instance:orders"]},
            {"tags": ["version:2.0", "host:web-1", "peer.service:payments"], "name": "latency"}
        ]))
        .unwrap();
        aggregate(&records)
    }

    fn input() -> ReportInput<'static> {
        ReportInput {
            service: "checkout",
            metric: "http.errors",
            env: "prod",
            window_minutes: 30,
            now: Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_compact_report() {
        let report = build_compact_report(&input(), &sample_summary(), false).unwrap();

        assert_eq!(report.time_window.from, "2024-01-01T10:00:00+00:00");
        assert_eq!(report.time_window.to, "2024-01-01T10:30:00+00:00");
        assert_eq!(report.metric_check.split_by, "version");
        assert_eq!(report.metric_check.series.len(), 2);
        assert_eq!(report.metric_check.series[0].key, "2.1");
        assert_eq!(report.metric_check.series[0].points, vec![[1704105000000, 2]]);
        assert_eq!(report.spans_sample.top_dependency.as_deref(), Some("payments"));
        assert_eq!(report.spans_sample.top_operation.as_deref(), Some("latency"));
        assert!(report.events_near_spike.is_empty());

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("meta").is_none());
        assert_eq!(value["logs_top_buckets"]["by_error_code"][0]["pct"], json!(100.0));
    }

    #[test]
    fn test_compact_report_with_meta() {
        let report = build_compact_report(&input(), &sample_summary(), true).unwrap();
        let meta = report.meta.unwrap();
        assert_eq!(meta["window_minutes"], json!(30));
        assert!(meta["sources"]["datadog_tags"].is_string());
    }

    #[test]
    fn test_compact_report_empty() {
        let report = build_compact_report(&input(), &FacetSummary::default(), false).unwrap();
        assert!(report.metric_check.series.is_empty());
        assert_eq!(report.spans_sample.top_dependency, None);
        assert_eq!(report.spans_sample.top_operation, None);
    }

    #[test]
    fn test_analysis_report_insights() {
        let report = build_analysis_report(&input(), &sample_summary()).unwrap();

        assert_eq!(report.metric, "http.errors");
        assert_eq!(report.analysis.dependencies[0].name, "payments");
        assert_eq!(report.analysis.dependencies[0].count, 2);
        assert_eq!(report.analysis.dependencies[1].name, "orders");
        assert_eq!(
            report.insights,
            vec![
                "Top error code: 502 (2 occurrences)".to_string(),
                "Most active dependency: payments (2 calls)".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_insights_without_data() {
        assert!(insights(&FacetSummary::default()).is_empty());
    }

    #[test]
    fn test_render_summary_text() {
        let report = build_analysis_report(&input(), &sample_summary()).unwrap();
        let text = render_summary_text(&report);

        assert!(text.starts_with("RCA summary for checkout (prod)"));
        assert!(text.contains("- web-1: 2 (66.67%)"));
        assert!(text.contains("- payments: 2"));
        assert!(text.contains("- Top error code: 502 (2 occurrences)"));
    }

    #[test]
    fn test_render_conversations() {
        let dumps = vec![
            ScenarioDump {
                scenario_id: Some("s1".to_string()),
                title: Some("DB outage".to_string()),
                started_at_utc: Some("2024-01-01T10:00:00+00:00".to_string()),
                updated_at_utc: None,
                slack_conversation: vec![SlackMessage {
                    user: Some("alice".to_string()),
                    text: Some("db is down".to_string()),
                    ts: Some("10:01".to_string()),
                    ..SlackMessage::default()
                }],
            },
            ScenarioDump {
                scenario_id: Some("s2".to_string()),
                title: None,
                started_at_utc: None,
                updated_at_utc: None,
                slack_conversation: Vec::new(),
            },
        ];

        let text = render_conversations(&dumps);
        assert_eq!(
            text,
            "Scenario: DB outage (ID: s1)\nCreated: 2024-01-01T10:00:00+00:00\nUpdated: None\n\
             Slack Conversation:\n10:01 - alice: db is down\n\
             \n\n---\n\n\
             Scenario: Untitled (ID: s2)\nCreated: None\nUpdated: None\n\
             No Slack messages found for this scenario.\n"
        );
    }

    #[test]
    fn test_report_rejects_oversized_window() {
        let mut wide = input();
        wide.window_minutes = 200_000_000_000;
        assert!(build_compact_report(&wide, &sample_summary(), false).is_err());
        assert!(build_analysis_report(&wide, &sample_summary()).is_err());
    }

    #[test]
    fn test_write_scenario_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("per-scenario");
        let scenarios = vec![
            ScenarioPayload(json!({"scenario_id": "abc", "created_at": null, "rank": 1})),
            ScenarioPayload(json!({"title": "no id"})),
        ];

        let written = write_scenario_files(&target, &scenarios, true).unwrap();
        assert_eq!(written, 2);
        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(target.join("abc.json")).unwrap())
                .unwrap();
        assert_eq!(saved, json!({"scenario_id": "abc", "created_at": null, "rank": 1}));
        assert!(target.join("unknown.json").exists());
    }

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.json");
        write_output(Some(path.as_path()), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_generate_json_report_compact() {
        let json = generate_json_report(&json!({"a": 1}), false).unwrap();
        assert_eq!(json, r#"{"a":1}"#);
    }
}
