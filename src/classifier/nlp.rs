//! Local two-tier keyword classifier
//!
//! Text is lower-cased and split into letter/number runs, with a token break
//! wherever ASCII meets another script. Keywords spelled in ASCII must match
//! a whole token, so `fire` does not fire on `firewall`.
//! Anything else, Thai in particular, has no word separators and is matched
//! as a substring.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::Classifier;
use crate::core::models::{Classification, ClassificationResult, Message, UrgencyLevel};

pub const CATEGORY_HIGH_PRIORITY: &str = "high_priority";
pub const CATEGORY_URGENT: &str = "urgent";

pub const DEFAULT_HIGH_PRIORITY_KEYWORDS: [&str; 7] = [
    "ไฟไหม้",
    "อุบัติเหตุ",
    "ระบบล่ม",
    "คดี",
    "fire",
    "accident",
    "outage",
];

pub const DEFAULT_URGENT_KEYWORDS: [&str; 7] = [
    "ด่า",
    "ด่วน",
    "ฉุกเฉิน",
    "ช่วยด้วย",
    "urgent",
    "emergency",
    "asap",
];

// ASCII runs and other letter runs are separate tokens, so `มีfireที่` yields `fire`
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9]+|[[\p{L}\p{M}\p{N}]&&[^a-z0-9]]+").expect("static regex compile")
});

#[derive(Debug, Clone)]
pub struct NlpClassifier {
    high_priority: Vec<String>,
    urgent: Vec<String>,
}

impl Default for NlpClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_HIGH_PRIORITY_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            DEFAULT_URGENT_KEYWORDS.iter().map(ToString::to_string).collect(),
        )
    }
}

impl NlpClassifier {
    #[must_use]
    pub fn new(high_priority: Vec<String>, urgent: Vec<String>) -> Self {
        let normalize = |list: Vec<String>| -> Vec<String> {
            list.into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };

        Self {
            high_priority: normalize(high_priority),
            urgent: normalize(urgent),
        }
    }

    #[must_use]
    pub fn high_priority(&self) -> &[String] {
        &self.high_priority
    }

    #[must_use]
    pub fn urgent(&self) -> &[String] {
        &self.urgent
    }

    #[must_use]
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        let lowered = text.to_lowercase();
        let tokens = tokenize(&lowered);

        // (first byte offset, keyword)
        let mut hits: Vec<(usize, &str)> = Vec::new();
        let mut result = ClassificationResult::normal();

        for (category, keywords) in [
            (CATEGORY_HIGH_PRIORITY, &self.high_priority),
            (CATEGORY_URGENT, &self.urgent),
        ] {
            let mut category_hit = false;
            for keyword in keywords {
                if let Some(pos) = find_keyword(&lowered, &tokens, keyword) {
                    hits.push((pos, keyword.as_str()));
                    category_hit = true;
                }
            }
            if category_hit {
                result.categories.insert(category.to_string());
            }
        }

        result.level = if result.categories.contains(CATEGORY_URGENT) {
            UrgencyLevel::ImmediateAction
        } else if result.categories.contains(CATEGORY_HIGH_PRIORITY) {
            UrgencyLevel::HighPriority
        } else {
            UrgencyLevel::Normal
        };

        hits.sort_by_key(|(pos, _)| *pos);
        for (_, keyword) in hits {
            if !result.keywords.iter().any(|k| k == keyword) {
                result.keywords.push(keyword.to_string());
            }
        }

        result
    }
}

/// Tokens of already lower-cased text, with their byte offsets.
fn tokenize(lowered: &str) -> Vec<(usize, &str)> {
    TOKEN_RE
        .find_iter(lowered)
        .map(|m| (m.start(), m.as_str()))
        .collect()
}

fn find_keyword(lowered: &str, tokens: &[(usize, &str)], keyword: &str) -> Option<usize> {
    let whole_token = keyword.chars().all(|c| c.is_ascii_alphanumeric());
    if whole_token {
        tokens
            .iter()
            .find(|(_, token)| *token == keyword)
            .map(|(pos, _)| *pos)
    } else {
        lowered.find(keyword)
    }
}

#[async_trait]
impl Classifier for NlpClassifier {
    async fn classify(&self, message: &Message) -> Classification {
        Classification::Confident(self.classify_text(&message.text))
    }

    fn name(&self) -> &str {
        "nlp"
    }
}
