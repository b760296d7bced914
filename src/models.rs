//! Data models for incident scenarios and RCA reports.
//!
//! Upstream payloads are read optimistically: the record types below accept
//! missing, null, or oddly-typed fields and expose them through accessors,
//! so extraction code never has to guess at a field's shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single monitoring payload as delivered by the `/datadog` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringRecord {
    /// `prefix:value` tags, in upstream order.
    #[serde(default, deserialize_with = "lenient_strings")]
    tags: Vec<String>,
    /// Monitor name, used as the fallback operation label.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    name: Option<String>,
    /// Every other field, passed through untouched.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl MonitoringRecord {
    /// Creates a record from tags and an optional name.
    #[cfg(test)]
    pub fn new<I, S>(tags: I, name: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            name: name.map(str::to_string),
            extra: Map::new(),
        }
    }

    /// Tags of this record; empty when upstream sent none.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Monitor name, if one was present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Accepts any JSON value; keeps the string elements of an array.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts any JSON value; strings pass through, numbers become their text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One row of a ranked facet bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub value: String,
    pub count: usize,
    /// Share of the facet's total, rounded to two decimals.
    pub pct: f64,
}

/// Top-K buckets for the facets that are embedded directly in reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsTopBuckets {
    pub by_version: Vec<RankedEntry>,
    pub by_host: Vec<RankedEntry>,
    pub by_error_code: Vec<RankedEntry>,
}

/// Analysis window, both ends as RFC 3339 UTC strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

/// A single synthetic metric series keyed by version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub key: String,
    /// `[epoch_millis, value]` pairs.
    pub points: Vec<[i64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub metric: String,
    pub split_by: String,
    pub series: Vec<MetricSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpansSample {
    pub top_dependency: Option<String>,
    pub top_operation: Option<String>,
    pub sample: Vec<Value>,
}

/// Compact RCA report, the default `datadog` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactReport {
    pub time_window: TimeWindow,
    pub service: String,
    pub env: String,
    pub logs_top_buckets: LogsTopBuckets,
    pub metric_check: MetricCheck,
    pub events_near_spike: Vec<Value>,
    pub spans_sample: SpansSample,
    /// Field semantics and documentation links, only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A `{name, count}` pair used for dependency and operation listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub top_versions: Vec<RankedEntry>,
    pub top_hosts: Vec<RankedEntry>,
    pub error_codes: Vec<RankedEntry>,
    pub dependencies: Vec<NamedCount>,
    pub operations: Vec<NamedCount>,
}

/// Analysis-style report with human-readable insights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub time_window: TimeWindow,
    pub service: String,
    pub metric: String,
    pub env: String,
    pub analysis: AnalysisSection,
    pub insights: Vec<String>,
}

/// Entry of the scenario listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSummary {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scenario_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full scenario object exactly as the API returned it.
///
/// Nothing is reinterpreted: nulls, numbers, and unknown fields are written
/// back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioPayload(pub Value);

impl ScenarioPayload {
    /// The payload's `scenario_id` as text; numbers become their decimal form.
    pub fn scenario_id(&self) -> Option<String> {
        match self.0.get("scenario_id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Timestamps read from a full scenario object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioTimes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
}

/// One message of a scenario's Slack transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ts: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scenario's Slack transcript with its UTC-normalized timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDump {
    pub scenario_id: Option<String>,
    pub title: Option<String>,
    /// Scenario start time, `+00:00` offset.
    pub started_at_utc: Option<String>,
    /// Last update time, `+00:00` offset.
    pub updated_at_utc: Option<String>,
    pub slack_conversation: Vec<SlackMessage>,
}
