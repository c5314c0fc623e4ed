//! Urgency classification strategies
//!
//! Exactly one strategy is active per deployment. Every strategy returns a
//! [`Classification`]; none of them can fail the request.

pub mod keyword;
pub mod llm;
pub mod nlp;

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::{CompletionProvider, GeminiAuth, GeminiClient, OpenAiClient};
use crate::core::config::{AppConfig, ClassifierKind};
use crate::core::models::{Classification, Message};

pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;
pub use nlp::NlpClassifier;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, message: &Message) -> Classification;

    fn name(&self) -> &str;
}

/// Builds the strategy selected by `CLASSIFIER`.
#[must_use]
pub fn from_config(config: &AppConfig) -> Arc<dyn Classifier> {
    match config.classifier {
        ClassifierKind::Keyword => Arc::new(match &config.alert_keywords {
            Some(keywords) => KeywordClassifier::new(keywords.clone()),
            None => KeywordClassifier::default(),
        }),
        ClassifierKind::Nlp => {
            let defaults = NlpClassifier::default();
            Arc::new(NlpClassifier::new(
                config
                    .nlp_high_priority_keywords
                    .clone()
                    .unwrap_or_else(|| defaults.high_priority().to_vec()),
                config
                    .nlp_urgent_keywords
                    .clone()
                    .unwrap_or_else(|| defaults.urgent().to_vec()),
            ))
        }
        ClassifierKind::Gemini => {
            let auth = match (&config.gemini_api_key, &config.google_oauth_token) {
                (Some(key), _) => GeminiAuth::ApiKey(key.clone()),
                (None, Some(token)) => GeminiAuth::Bearer(token.clone()),
                (None, None) => GeminiAuth::None,
            };
            let provider = GeminiClient::new(auth, config.gemini_model.clone());
            Arc::new(llm_from_config(config, Arc::new(provider)))
        }
        ClassifierKind::OpenAi => {
            let provider = OpenAiClient::new(
                config.openai_api_key.clone(),
                config.openai_org_id.clone(),
                config.openai_model.clone(),
            );
            Arc::new(llm_from_config(config, Arc::new(provider)))
        }
    }
}

fn llm_from_config(config: &AppConfig, provider: Arc<dyn CompletionProvider>) -> LlmClassifier {
    let classifier = LlmClassifier::new(provider, config.classify_timeout);
    match &config.classify_rubric {
        Some(rubric) => classifier.with_rubric(rubric.clone()),
        None => classifier,
    }
}
