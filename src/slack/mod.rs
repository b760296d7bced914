//! Slack Web API posting.

use crate::error::ApiError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Minimal `chat.postMessage` client.
pub struct SlackClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    timeout_seconds: u64,
}

impl SlackClient {
    pub fn new(api_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            token: token.to_string(),
            timeout_seconds,
        })
    }

    /// Post `text` to `channel`. Returns the message timestamp when Slack sends one.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<Option<String>, ApiError> {
        debug!("Posting {} chars to channel {}", text.len(), channel);

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&self.api_url, self.timeout_seconds, e))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: self.api_url.clone(),
                status,
                body,
            });
        }

        let body: PostMessageResponse = response.json().await.map_err(|e| ApiError::Decode {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        let ts = check_response(body)?;
        info!("Message sent to {}", channel);
        Ok(ts)
    }
}

fn check_response(body: PostMessageResponse) -> Result<Option<String>, ApiError> {
    if body.ok {
        Ok(body.ts)
    } else {
        Err(ApiError::Slack(
            body.error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(PostMessageRequest {
            channel: "C123",
            text: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"channel": "C123", "text": "hello"}));
    }

    #[test]
    fn test_check_response_ok() {
        let body: PostMessageResponse =
            serde_json::from_str(r#"{"ok": true, "ts": "1700000000.000100"}"#).unwrap();
        assert_eq!(
            check_response(body).unwrap().as_deref(),
            Some("1700000000.000100")
        );
    }

    #[test]
    fn test_check_response_error() {
        let body: PostMessageResponse =
            serde_json::from_str(r#"{"ok": false, "error": "not_in_channel"}"#).unwrap();
        match check_response(body) {
            Err(ApiError::Slack(reason)) => assert_eq!(reason, "not_in_channel"),
            other => panic!("unexpected result: {:?}", other),
        }

        let body: PostMessageResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(check_response(body), Err(ApiError::Slack(_))));
    }

    fn mock_client(server: &mockito::Server) -> SlackClient {
        let url = format!("{}/api/chat.postMessage", server.url());
        SlackClient::new(&url, "xoxb-test", 5).unwrap()
    }

    #[test]
    fn test_post_message_sends_bearer_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "channel": "C1",
                "text": "RCA ready"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "ts": "1700000000.000100"}"#)
            .create();

        let client = mock_client(&server);
        let ts = tokio_test::block_on(client.post_message("C1", "RCA ready")).unwrap();
        assert_eq!(ts.as_deref(), Some("1700000000.000100"));
        mock.assert();
    }

    #[test]
    fn test_post_message_not_ok() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/chat.postMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "error": "channel_not_found"}"#)
            .create();

        let client = mock_client(&server);
        match tokio_test::block_on(client.post_message("C404", "hi")) {
            Err(ApiError::Slack(reason)) => assert_eq!(reason, "channel_not_found"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_post_message_http_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/chat.postMessage")
            .with_status(429)
            .with_body("slow down")
            .create();

        let client = mock_client(&server);
        match tokio_test::block_on(client.post_message("C1", "hi")) {
            Err(ApiError::Status { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
