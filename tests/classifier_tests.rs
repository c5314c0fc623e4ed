mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use linealert::classifier::nlp::{CATEGORY_HIGH_PRIORITY, CATEGORY_URGENT};
use linealert::classifier::{Classifier, KeywordClassifier, LlmClassifier, NlpClassifier};
use linealert::core::models::{DegradeReason, Message, UrgencyLevel};
use test_helpers::FakeProvider;

fn llm(provider: &Arc<FakeProvider>) -> LlmClassifier {
    LlmClassifier::new(provider.clone(), Duration::from_secs(2))
}

#[tokio::test]
async fn test_keyword_hit_is_important() {
    let classifier = KeywordClassifier::default();
    let classification = classifier
        .classify(&Message::new("เกิดไฟไหม้ที่ชั้น3", "U123").with_group("C456"))
        .await;

    assert!(!classification.is_degraded());
    assert_eq!(classification.level(), UrgencyLevel::Important);
    assert_eq!(classification.result().keywords, vec!["ไฟไหม้".to_string()]);
}

#[tokio::test]
async fn test_keyword_miss_is_normal() {
    let classifier = KeywordClassifier::default();
    let classification = classifier.classify(&Message::new("สวัสดีครับ", "U1")).await;

    assert!(!classification.is_degraded());
    assert_eq!(classification.level(), UrgencyLevel::Normal);
    assert!(classification.result().keywords.is_empty());
}

#[test]
fn test_keyword_match_is_case_sensitive() {
    let classifier = KeywordClassifier::new(vec!["Outage".to_string()]);
    assert_eq!(
        classifier.classify_text("Outage in zone 2").level,
        UrgencyLevel::Important
    );
    assert_eq!(
        classifier.classify_text("outage in zone 2").level,
        UrgencyLevel::Normal
    );
}

#[test]
fn test_keyword_reports_every_match_in_list_order() {
    let classifier = KeywordClassifier::default();
    let result = classifier.classify_text("คดีอุบัติเหตุ");
    assert_eq!(
        result.keywords,
        vec!["อุบัติเหตุ".to_string(), "คดี".to_string()]
    );
}

#[tokio::test]
async fn test_nlp_urgent_and_high_priority() {
    let classifier = NlpClassifier::default();
    let classification = classifier
        .classify(&Message::new("ด่าไฟไหม้", "U1").with_group("C1"))
        .await;

    let result = classification.result();
    assert_eq!(result.level, UrgencyLevel::ImmediateAction);
    assert!(result.categories.contains(CATEGORY_URGENT));
    assert!(result.categories.contains(CATEGORY_HIGH_PRIORITY));
    assert_eq!(
        result.keywords,
        vec!["ด่า".to_string(), "ไฟไหม้".to_string()]
    );
}

#[test]
fn test_nlp_high_priority_only() {
    let classifier = NlpClassifier::default();
    let result = classifier.classify_text("Accident near the gate");

    assert_eq!(result.level, UrgencyLevel::HighPriority);
    assert_eq!(result.categories.len(), 1);
    assert!(result.categories.contains(CATEGORY_HIGH_PRIORITY));
    assert_eq!(result.keywords, vec!["accident".to_string()]);
}

#[test]
fn test_nlp_english_keyword_inside_thai_text() {
    let classifier = NlpClassifier::default();

    let result = classifier.classify_text("มีfireที่ตึกA");
    assert_eq!(result.level, UrgencyLevel::HighPriority);
    assert_eq!(result.keywords, vec!["fire".to_string()]);

    let result = classifier.classify_text("เกิดoutageครับ");
    assert_eq!(result.level, UrgencyLevel::HighPriority);

    let result = classifier.classify_text("ขอความช่วยเหลือASAPนะ");
    assert_eq!(result.level, UrgencyLevel::ImmediateAction);
    assert_eq!(result.keywords, vec!["asap".to_string()]);
}

#[test]
fn test_nlp_nothing_matched() {
    let classifier = NlpClassifier::default();
    let result = classifier.classify_text("the firewall rules were updated");

    assert_eq!(result.level, UrgencyLevel::Normal);
    assert!(result.categories.is_empty());
    assert!(result.keywords.is_empty());
}

#[tokio::test]
async fn test_llm_valid_reply_is_confident() {
    let provider = Arc::new(FakeProvider::replying(
        "```json\n{\"level\": \"IMPORTANT\", \"keywords\": [\"ไฟไหม้\"]}\n```",
    ));
    let classification = llm(&provider)
        .classify(&Message::new("เกิดไฟไหม้ที่ชั้น3", "U123").with_group("C456"))
        .await;

    assert!(!classification.is_degraded());
    assert_eq!(classification.level(), UrgencyLevel::Important);
    assert_eq!(classification.result().keywords, vec!["ไฟไหม้".to_string()]);

    assert_eq!(provider.calls(), 1);
    let prompt = provider.last_prompt().unwrap();
    assert!(prompt.contains("เกิดไฟไหม้ที่ชั้น3"));
    assert!(prompt.contains("C456"));
}

#[tokio::test]
async fn test_llm_malformed_reply_degrades() {
    let provider = Arc::new(FakeProvider::replying("I think this is important"));
    let classification = llm(&provider).classify(&Message::new("hello", "U1")).await;

    assert!(classification.is_degraded());
    assert_eq!(classification.level(), UrgencyLevel::Normal);
    assert!(matches!(
        classification.degrade_reason(),
        Some(DegradeReason::MalformedReply(_))
    ));
}

#[tokio::test]
async fn test_llm_reply_without_level_degrades() {
    let provider = Arc::new(FakeProvider::replying(r#"{"keywords": ["x"]}"#));
    let classification = llm(&provider).classify(&Message::new("hello", "U1")).await;

    assert_eq!(classification.level(), UrgencyLevel::Normal);
    assert_eq!(
        classification.degrade_reason(),
        Some(&DegradeReason::MissingLevel)
    );
}

#[tokio::test]
async fn test_llm_provider_error_degrades() {
    let provider = Arc::new(FakeProvider::failing("connection refused"));
    let classification = llm(&provider).classify(&Message::new("ไฟไหม้", "U1")).await;

    assert_eq!(classification.level(), UrgencyLevel::Normal);
    assert!(matches!(
        classification.degrade_reason(),
        Some(DegradeReason::ProviderUnavailable(detail)) if detail.contains("connection refused")
    ));
}

#[tokio::test]
async fn test_llm_timeout_degrades() {
    let provider = Arc::new(FakeProvider::slow(Duration::from_secs(5)));
    let classifier = LlmClassifier::new(provider.clone(), Duration::from_millis(50));
    let classification = classifier.classify(&Message::new("ไฟไหม้", "U1")).await;

    assert_eq!(classification.level(), UrgencyLevel::Normal);
    assert!(matches!(
        classification.degrade_reason(),
        Some(DegradeReason::ProviderUnavailable(_))
    ));
}

#[tokio::test]
async fn test_llm_custom_rubric_reaches_prompt() {
    let provider = Arc::new(FakeProvider::replying(r#"{"level":"NORMAL"}"#));
    let classifier = llm(&provider).with_rubric("IMPORTANT = server down");
    let classification = classifier.classify(&Message::new("hi", "U1")).await;

    assert!(!classification.is_degraded());
    assert!(
        provider
            .last_prompt()
            .unwrap()
            .contains("IMPORTANT = server down")
    );
}
