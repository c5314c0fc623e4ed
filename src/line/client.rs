//! LINE Messaging API client module
//!
//! Push messages and display-name lookups, all bearer-authenticated.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::errors::AlertError;

/// The outbound side of the notifier.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the push request fails or LINE rejects it.
    async fn push_text(&self, to: &str, text: &str) -> Result<(), AlertError>;

    /// Display name of a user, looked up in the group when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn profile_name(&self, user_id: &str, group_id: Option<&str>)
    -> Result<String, AlertError>;

    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn group_name(&self, group_id: &str) -> Result<String, AlertError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupSummaryResponse {
    group_name: String,
}

/// Builds the JSON body for `POST /v2/bot/message/push`.
#[must_use]
pub fn build_push_payload(to: &str, text: &str) -> Value {
    json!({
        "to": to,
        "messages": [ { "type": "text", "text": text } ]
    })
}

pub struct LineClient {
    token: Option<String>,
    base_url: Url,
    http: Client,
}

impl LineClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(token: Option<String>, base_url: &str) -> Result<Self, AlertError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AlertError::ConfigError(format!("LINE_API_BASE_URL: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            token,
            base_url,
            http,
        })
    }

    fn token(&self) -> Result<&str, AlertError> {
        self.token
            .as_deref()
            .ok_or_else(|| AlertError::ConfigError("LINE_BOT_TOKEN is not set".to_string()))
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, AlertError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AlertError::ConfigError("LINE_API_BASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, AlertError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let resp = self.http.get(url.clone()).bearer_auth(self.token()?).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(AlertError::LineApiError(format!(
                "GET {} HTTP {}: {}",
                url.path(),
                status,
                body_text
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| AlertError::LineApiError(format!("{} JSON parse error: {}", url.path(), e)))
    }
}

#[async_trait]
impl PushTransport for LineClient {
    async fn push_text(&self, to: &str, text: &str) -> Result<(), AlertError> {
        let url = self.endpoint(&["v2", "bot", "message", "push"])?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(self.token()?)
            .json(&build_push_payload(to, text))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(AlertError::LineApiError(format!(
                "message/push HTTP {}: {}",
                status, body_text
            )));
        }

        debug!("Pushed message to {}", to);
        Ok(())
    }

    async fn profile_name(
        &self,
        user_id: &str,
        group_id: Option<&str>,
    ) -> Result<String, AlertError> {
        let url = match group_id {
            Some(group_id) => self.endpoint(&["v2", "bot", "group", group_id, "member", user_id])?,
            None => self.endpoint(&["v2", "bot", "profile", user_id])?,
        };
        let profile: ProfileResponse = self.get_json(url).await?;
        Ok(profile.display_name)
    }

    async fn group_name(&self, group_id: &str) -> Result<String, AlertError> {
        let url = self.endpoint(&["v2", "bot", "group", group_id, "summary"])?;
        let summary: GroupSummaryResponse = self.get_json(url).await?;
        Ok(summary.group_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_push_payload() {
        let payload = build_push_payload("C123", "hello");
        assert_eq!(payload["to"], "C123");
        assert_eq!(payload["messages"][0]["type"], "text");
        assert_eq!(payload["messages"][0]["text"], "hello");
        assert_eq!(payload["messages"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = LineClient::new(None, "https://api.line.me").unwrap();
        let url = client.endpoint(&["v2", "bot", "message", "push"]).unwrap();
        assert_eq!(url.as_str(), "https://api.line.me/v2/bot/message/push");

        let client = LineClient::new(None, "http://localhost:8080/line/").unwrap();
        let url = client.endpoint(&["v2", "bot", "profile", "U1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/line/v2/bot/profile/U1");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let client = LineClient::new(None, "https://api.line.me").unwrap();
        let url = client
            .endpoint(&["v2", "bot", "profile", "U1/../x"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.line.me/v2/bot/profile/U1%2F..%2Fx");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            LineClient::new(None, "not a url"),
            Err(AlertError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_push_without_token_is_config_error() {
        let client = LineClient::new(None, "http://127.0.0.1:9").unwrap();
        match client.push_text("U1", "hi").await {
            Err(AlertError::ConfigError(msg)) => assert!(msg.contains("LINE_BOT_TOKEN")),
            other => panic!("Expected ConfigError, got: {other:?}"),
        }
    }
}
