//! Google Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use super::CompletionProvider;
use crate::errors::AlertError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub enum GeminiAuth {
    /// `x-goog-api-key` header
    ApiKey(String),
    /// Pre-minted Google OAuth access token
    Bearer(String),
    None,
}

pub struct GeminiClient {
    auth: GeminiAuth,
    model_name: String,
    base_url: String,
    http: Client,
}

impl GeminiClient {
    #[must_use]
    pub fn new(auth: GeminiAuth, model_name: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            auth,
            model_name,
            base_url: GEMINI_BASE_URL.to_string(),
            http,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }

    #[must_use]
    pub fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.0
            }
        })
    }
}

/// Joins the text parts of the first candidate.
#[must_use]
pub fn extract_reply_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let collected: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if collected.is_empty() {
        None
    } else {
        Some(collected.concat())
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AlertError> {
        let request = self
            .http
            .post(self.endpoint())
            .json(&Self::request_body(prompt));

        let request = match &self.auth {
            GeminiAuth::ApiKey(key) => request.header("x-goog-api-key", key),
            GeminiAuth::Bearer(token) => request.bearer_auth(token),
            GeminiAuth::None => {
                return Err(AlertError::ConfigError(
                    "GEMINI_API_KEY or GOOGLE_OAUTH_TOKEN is not set".to_string(),
                ));
            }
        };

        info!(model = %self.model_name, "Calling Gemini generateContent");

        let response = request
            .send()
            .await
            .map_err(|e| AlertError::HttpError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(AlertError::ProviderError(format!(
                "Gemini HTTP {}: {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            AlertError::ProviderError(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_reply_text(&response_json)
            .ok_or_else(|| AlertError::ProviderError("No text in Gemini response".to_string()))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
