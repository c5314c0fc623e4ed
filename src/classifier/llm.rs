use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::Classifier;
use crate::ai::CompletionProvider;
use crate::core::models::{
    Classification, ClassificationResult, DegradeReason, Message, UrgencyLevel,
};
use crate::prompt::{DEFAULT_RUBRIC, build_urgency_prompt};

/// Classifies through a remote text-generation model.
///
/// Any provider failure, timeout or unusable reply degrades to `NORMAL`.
pub struct LlmClassifier {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
    rubric: String,
}

impl LlmClassifier {
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            rubric: DEFAULT_RUBRIC.to_string(),
        }
    }

    #[must_use]
    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = rubric.into();
        self
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, message: &Message) -> Classification {
        let prompt = build_urgency_prompt(message, &self.rubric);

        #[cfg(feature = "debug-logs")]
        info!("Classification prompt:\n{}", prompt);

        let reply = match tokio::time::timeout(self.timeout, self.provider.complete(&prompt)).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), "Provider call failed: {}", e);
                return Classification::degraded(DegradeReason::ProviderUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    "Provider call timed out after {:?}", self.timeout
                );
                return Classification::degraded(DegradeReason::ProviderUnavailable(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        #[cfg(feature = "debug-logs")]
        info!("Provider replied:\n{}", reply);

        match parse_reply(&reply) {
            Ok(result) => {
                info!(
                    provider = self.provider.name(),
                    level = %result.level,
                    "Message classified"
                );
                Classification::Confident(result)
            }
            Err(reason) => {
                warn!(provider = self.provider.name(), "Unusable reply: {}", reason);
                Classification::degraded(reason)
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Parses a model reply into a result.
///
/// Markdown code fences around the JSON are tolerated. Identifiers echoed back
/// by the model are ignored.
///
/// # Errors
///
/// Returns the reason the reply cannot be used.
pub fn parse_reply(reply: &str) -> Result<ClassificationResult, DegradeReason> {
    let body = strip_code_fence(reply);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| DegradeReason::MalformedReply(format!("not JSON: {}", e)))?;

    let Some(object) = value.as_object() else {
        return Err(DegradeReason::MalformedReply(
            "reply is not a JSON object".to_string(),
        ));
    };

    let level = match object.get("level") {
        None | Some(Value::Null) => return Err(DegradeReason::MissingLevel),
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            return Err(DegradeReason::MissingLevel);
        }
        Some(Value::String(raw)) => raw
            .parse::<UrgencyLevel>()
            .map_err(DegradeReason::MalformedReply)?,
        Some(other) => {
            return Err(DegradeReason::MalformedReply(format!(
                "level is not a string: {}",
                other
            )));
        }
    };

    let mut result = ClassificationResult::new(level);
    result.categories = string_items(object.get("categories")).collect();
    result.keywords = string_items(object.get("keywords")).collect();
    Ok(result)
}

fn string_items(value: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
