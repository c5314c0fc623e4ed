use async_trait::async_trait;

use super::Classifier;
use crate::core::models::{Classification, ClassificationResult, Message, UrgencyLevel};

/// fire, accident, system down, legal case
pub const DEFAULT_ALERT_KEYWORDS: [&str; 4] = ["ไฟไหม้", "อุบัติเหตุ", "ระบบล่ม", "คดี"];

/// Case-sensitive substring match against a fixed list.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_KEYWORDS.iter().map(ToString::to_string).collect())
    }
}

impl KeywordClassifier {
    #[must_use]
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    #[must_use]
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        let matched: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .cloned()
            .collect();

        let level = if matched.is_empty() {
            UrgencyLevel::Normal
        } else {
            UrgencyLevel::Important
        };

        ClassificationResult {
            keywords: matched,
            ..ClassificationResult::new(level)
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, message: &Message) -> Classification {
        Classification::Confident(self.classify_text(&message.text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
