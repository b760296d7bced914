//! HTTP client for the hackathon scenario API.
//!
//! Every request carries the gateway's required User-Agent, asks for JSON,
//! and forwards the optional Authorization value untouched. GET requests are
//! retried with a linear backoff.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{
    MonitoringRecord, ScenarioPayload, ScenarioSummary, ScenarioTimes, SlackMessage,
};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Envelope of `GET /hackathon/scenarios/{id}/datadog`.
#[derive(Debug, Default, Deserialize)]
pub struct DatadogEnvelope {
    #[serde(default)]
    pub datadog_payloads: Option<Vec<MonitoringRecord>>,
}

/// Envelope of `GET /hackathon/scenarios/{id}/slack`.
#[derive(Debug, Default, Deserialize)]
struct SlackEnvelope {
    #[serde(default)]
    slack_conversation: Option<Vec<SlackMessage>>,
}

/// Client for the hackathon API.
pub struct HackathonClient {
    http: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
    retries: usize,
    backoff_step: Duration,
}

impl HackathonClient {
    /// Build a client from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(ref auth) = config.auth {
            let mut value =
                HeaderValue::from_str(auth).context("Invalid Authorization header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
            retries: config.retries.max(1),
            backoff_step: Duration::try_from_secs_f64(config.backoff_seconds)
                .unwrap_or(Duration::ZERO),
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document, retrying on any failure.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut attempt = 1;

        loop {
            match self.try_get(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    let delay = backoff_delay(self.backoff_step, attempt);
                    warn!(
                        "GET {} failed (attempt {}/{}): {}. Retrying in {:.1}s",
                        url,
                        attempt,
                        self.retries,
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(url, self.timeout_seconds, e))?;
        let response = ensure_success(url, response).await?;

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// POST a JSON payload once.
    ///
    /// Non-JSON or empty bodies come back as `{"status": "ok", "raw": <body>}`.
    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, self.timeout_seconds, e))?;
        let response = ensure_success(&url, response).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, self.timeout_seconds, e))?;

        if is_json && !body.is_empty() {
            serde_json::from_str(&body).map_err(|e| ApiError::Decode {
                url,
                reason: e.to_string(),
            })
        } else {
            Ok(json!({"status": "ok", "raw": body}))
        }
    }

    /// `GET /hackathon/scenarios`; the body must be a JSON array.
    pub async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, ApiError> {
        let path = "/hackathon/scenarios";
        let value: Value = self.get_json(path).await?;

        if !value.is_array() {
            return Err(ApiError::UnexpectedShape {
                url: self.url(path),
                expected: "a JSON array of scenarios",
            });
        }

        serde_json::from_value(value).map_err(|e| ApiError::Decode {
            url: self.url(path),
            reason: e.to_string(),
        })
    }

    /// `GET /hackathon/scenarios/{id}`, body kept verbatim.
    pub async fn fetch_scenario(&self, scenario_id: &str) -> Result<ScenarioPayload, ApiError> {
        self.get_json(&format!("/hackathon/scenarios/{}", scenario_id))
            .await
    }

    /// Creation and update timestamps of a scenario, as sent.
    pub async fn fetch_scenario_times(
        &self,
        scenario_id: &str,
    ) -> Result<ScenarioTimes, ApiError> {
        self.get_json(&format!("/hackathon/scenarios/{}", scenario_id))
            .await
    }

    /// Slack transcript of a scenario; empty when the field is absent.
    pub async fn fetch_slack(&self, scenario_id: &str) -> Result<Vec<SlackMessage>, ApiError> {
        let envelope: SlackEnvelope = self
            .get_json(&format!("/hackathon/scenarios/{}/slack", scenario_id))
            .await?;
        Ok(envelope.slack_conversation.unwrap_or_default())
    }

    /// Monitoring payloads of a scenario; empty when the field is absent.
    pub async fn fetch_datadog(
        &self,
        scenario_id: &str,
    ) -> Result<Vec<MonitoringRecord>, ApiError> {
        let envelope: DatadogEnvelope = self
            .get_json(&format!("/hackathon/scenarios/{}/datadog", scenario_id))
            .await?;
        Ok(envelope.datadog_payloads.unwrap_or_default())
    }

    /// `POST /hackathon/reset` to reseed the scenarios.
    pub async fn reset(&self) -> Result<Value, ApiError> {
        self.post_json("/hackathon/reset", &json!({})).await
    }
}

/// Turn a non-2xx response into `ApiError::Status`, keeping the body.
pub async fn ensure_success(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        url: url.to_string(),
        status,
        body,
    })
}

/// Sleep before the next attempt: `step * attempt`.
pub fn backoff_delay(step: Duration, attempt: usize) -> Duration {
    step.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}
