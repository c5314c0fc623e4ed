use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::core::models::UrgencyLevel;
use crate::line::message_formatter::{AlertLayout, UNKNOWN_GROUP_PLACEHOLDER};

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5";
pub const DEFAULT_CLASSIFY_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PUSH_RETRY_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Keyword,
    Nlp,
    Gemini,
    OpenAi,
}

/// When an alert is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchCondition {
    Always,
    MinLevel(UrgencyLevel),
}

impl DispatchCondition {
    #[must_use]
    pub fn admits(self, level: UrgencyLevel) -> bool {
        match self {
            DispatchCondition::Always => true,
            DispatchCondition::MinLevel(min) => level.rank() >= min.rank(),
        }
    }
}

/// Who receives the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationPolicy {
    /// The group when there is one, otherwise the reporting user.
    Group,
    /// Always the reporting user; the group only appears in the body.
    Reporter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFailurePolicy {
    /// Single attempt in a detached task, failure logged.
    Log,
    /// Detached task, retried with backoff up to `max_attempts` total tries.
    Retry { max_attempts: usize },
    /// Awaited; the outcome is reported in the response body.
    Surface,
}

/// What `/analyze` does when the AI provider itself cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailureMode {
    /// Answer 200 with a degraded `NORMAL` result.
    Degrade,
    /// Answer 500 `AI analysis failed` carrying the fallback result.
    Reject,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub line_bot_token: Option<String>,
    pub line_channel_secret: Option<String>,
    pub line_api_base_url: String,
    pub classifier: ClassifierKind,
    pub gemini_api_key: Option<String>,
    pub google_oauth_token: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_org_id: Option<String>,
    pub openai_model: String,
    pub classify_timeout: Duration,
    /// Replaces the built-in rubric in LLM prompts. A literal `\n` in the
    /// env value is a line break.
    pub classify_rubric: Option<String>,
    pub alert_keywords: Option<Vec<String>>,
    pub nlp_high_priority_keywords: Option<Vec<String>>,
    pub nlp_urgent_keywords: Option<Vec<String>>,
    pub dispatch_condition: DispatchCondition,
    pub destination: DestinationPolicy,
    pub layout: AlertLayout,
    pub unknown_group: String,
    pub timezone: Tz,
    pub push_failure_policy: PushFailurePolicy,
    pub provider_failure_mode: ProviderFailureMode,
    pub resolve_display_names: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| format!("PORT: {}", e))?,
            None => DEFAULT_PORT,
        };

        let classifier = match get("CLASSIFIER").as_deref() {
            None => ClassifierKind::Gemini,
            Some(raw) => parse_classifier(raw)?,
        };

        let classify_timeout = match get("CLASSIFY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|e| format!("CLASSIFY_TIMEOUT_SECS: {}", e))?;
                if secs == 0 {
                    return Err("CLASSIFY_TIMEOUT_SECS: must be greater than zero".to_string());
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_CLASSIFY_TIMEOUT_SECS),
        };

        let dispatch_condition = match get("DISPATCH_CONDITION").as_deref() {
            None => DispatchCondition::MinLevel(UrgencyLevel::Important),
            Some(raw) => parse_dispatch_condition(raw)?,
        };

        let destination = match get("PUSH_DESTINATION").as_deref() {
            None => DestinationPolicy::Group,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "group" => DestinationPolicy::Group,
                "reporter" | "user" => DestinationPolicy::Reporter,
                other => return Err(format!("PUSH_DESTINATION: unknown value '{}'", other)),
            },
        };

        let layout = match get("ALERT_LAYOUT").as_deref() {
            None => match get("ALERT_TEMPLATE") {
                Some(template) => AlertLayout::Custom(template),
                None => AlertLayout::Banner,
            },
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "banner" => AlertLayout::Banner,
                "compact" => AlertLayout::Compact,
                "custom" => AlertLayout::Custom(get("ALERT_TEMPLATE").ok_or_else(|| {
                    "ALERT_TEMPLATE: required when ALERT_LAYOUT=custom".to_string()
                })?),
                other => return Err(format!("ALERT_LAYOUT: unknown value '{}'", other)),
            },
        };

        let timezone = match get("ALERT_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| format!("ALERT_TIMEZONE: {}", e))?,
            None => chrono_tz::Asia::Bangkok,
        };

        let push_failure_policy = match get("PUSH_FAILURE_POLICY").as_deref() {
            None => PushFailurePolicy::Log,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "log" => PushFailurePolicy::Log,
                "retry" => {
                    let max_attempts = match get("PUSH_RETRY_ATTEMPTS") {
                        Some(n) => n
                            .parse::<usize>()
                            .map_err(|e| format!("PUSH_RETRY_ATTEMPTS: {}", e))?,
                        None => DEFAULT_PUSH_RETRY_ATTEMPTS,
                    };
                    if max_attempts == 0 {
                        return Err("PUSH_RETRY_ATTEMPTS: must be at least 1".to_string());
                    }
                    PushFailurePolicy::Retry { max_attempts }
                }
                "surface" => PushFailurePolicy::Surface,
                other => return Err(format!("PUSH_FAILURE_POLICY: unknown value '{}'", other)),
            },
        };

        let provider_failure_mode = match get("PROVIDER_FAILURE_MODE").as_deref() {
            None => ProviderFailureMode::Degrade,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "degrade" => ProviderFailureMode::Degrade,
                "reject" => ProviderFailureMode::Reject,
                other => return Err(format!("PROVIDER_FAILURE_MODE: unknown value '{}'", other)),
            },
        };

        let resolve_display_names = match get("RESOLVE_DISPLAY_NAMES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                format!("RESOLVE_DISPLAY_NAMES: expected true or false, got '{}'", raw)
            })?,
            None => false,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            line_bot_token: get("LINE_BOT_TOKEN"),
            line_channel_secret: get("LINE_CHANNEL_SECRET"),
            line_api_base_url: get("LINE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LINE_API_BASE_URL.to_string()),
            classifier,
            gemini_api_key: get("GEMINI_API_KEY"),
            google_oauth_token: get("GOOGLE_OAUTH_TOKEN"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_org_id: get("OPENAI_ORG_ID"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            classify_timeout,
            classify_rubric: get("CLASSIFY_RUBRIC").map(|raw| raw.replace("\\n", "\n")),
            alert_keywords: get("ALERT_KEYWORDS").map(|raw| split_list(&raw)),
            nlp_high_priority_keywords: get("NLP_HIGH_PRIORITY_KEYWORDS")
                .map(|raw| split_list(&raw)),
            nlp_urgent_keywords: get("NLP_URGENT_KEYWORDS").map(|raw| split_list(&raw)),
            dispatch_condition,
            destination,
            layout,
            unknown_group: get("ALERT_UNKNOWN_GROUP")
                .unwrap_or_else(|| UNKNOWN_GROUP_PLACEHOLDER.to_string()),
            timezone,
            push_failure_policy,
            provider_failure_mode,
            resolve_display_names,
        })
    }

    /// Logs which credentials are present. Values are never logged.
    pub fn log_summary(&self) {
        let presence = |v: &Option<String>| if v.is_some() { "OK" } else { "MISSING" };

        info!(
            classifier = ?self.classifier,
            dispatch_condition = ?self.dispatch_condition,
            destination = ?self.destination,
            push_failure_policy = ?self.push_failure_policy,
            "Loaded configuration"
        );
        info!(
            "LINE_BOT_TOKEN: {}, LINE_CHANNEL_SECRET: {}",
            presence(&self.line_bot_token),
            presence(&self.line_channel_secret)
        );

        match self.classifier {
            ClassifierKind::Gemini => {
                if self.gemini_api_key.is_none() && self.google_oauth_token.is_none() {
                    warn!("GEMINI_API_KEY and GOOGLE_OAUTH_TOKEN are both MISSING");
                } else {
                    info!(
                        "GEMINI_API_KEY: {}, GOOGLE_OAUTH_TOKEN: {}",
                        presence(&self.gemini_api_key),
                        presence(&self.google_oauth_token)
                    );
                }
            }
            ClassifierKind::OpenAi => {
                if self.openai_api_key.is_none() {
                    warn!("OPENAI_API_KEY: MISSING");
                } else {
                    info!("OPENAI_API_KEY: OK");
                }
            }
            ClassifierKind::Keyword | ClassifierKind::Nlp => {}
        }

        if self.line_bot_token.is_none() {
            warn!("LINE_BOT_TOKEN is not set; alerts will fail until it is configured");
        }
    }
}

fn parse_classifier(raw: &str) -> Result<ClassifierKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "keyword" | "keywords" => Ok(ClassifierKind::Keyword),
        "nlp" | "local" => Ok(ClassifierKind::Nlp),
        "gemini" => Ok(ClassifierKind::Gemini),
        "openai" => Ok(ClassifierKind::OpenAi),
        other => Err(format!("CLASSIFIER: unknown value '{}'", other)),
    }
}

fn parse_dispatch_condition(raw: &str) -> Result<DispatchCondition, String> {
    match raw.to_ascii_lowercase().as_str() {
        "always" => Ok(DispatchCondition::Always),
        "immediate" => Ok(DispatchCondition::MinLevel(UrgencyLevel::ImmediateAction)),
        other => other
            .parse::<UrgencyLevel>()
            .map(DispatchCondition::MinLevel)
            .map_err(|e| format!("DISPATCH_CONDITION: {}", e)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.classifier, ClassifierKind::Gemini);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(
            config.dispatch_condition,
            DispatchCondition::MinLevel(UrgencyLevel::Important)
        );
        assert_eq!(config.destination, DestinationPolicy::Group);
        assert_eq!(config.layout, AlertLayout::Banner);
        assert_eq!(config.push_failure_policy, PushFailurePolicy::Log);
        assert_eq!(config.provider_failure_mode, ProviderFailureMode::Degrade);
        assert_eq!(config.timezone, chrono_tz::Asia::Bangkok);
        assert!(config.line_bot_token.is_none());
        assert!(!config.resolve_display_names);
    }

    #[test]
    fn test_classify_rubric_line_breaks() {
        let config = config_from(&[("CLASSIFY_RUBRIC", r"IMPORTANT = server down\nNORMAL = chat")])
            .unwrap();
        assert_eq!(
            config.classify_rubric.as_deref(),
            Some("IMPORTANT = server down\nNORMAL = chat")
        );
        assert!(config_from(&[]).unwrap().classify_rubric.is_none());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("LINE_BOT_TOKEN", "  "), ("PORT", "")]).unwrap();
        assert!(config.line_bot_token.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_retry_policy_reads_attempts() {
        let config =
            config_from(&[("PUSH_FAILURE_POLICY", "retry"), ("PUSH_RETRY_ATTEMPTS", "5")]).unwrap();
        assert_eq!(
            config.push_failure_policy,
            PushFailurePolicy::Retry { max_attempts: 5 }
        );

        assert!(
            config_from(&[("PUSH_FAILURE_POLICY", "retry"), ("PUSH_RETRY_ATTEMPTS", "0")])
                .is_err()
        );
    }

    #[test]
    fn test_dispatch_condition_values() {
        let always = config_from(&[("DISPATCH_CONDITION", "always")]).unwrap();
        assert_eq!(always.dispatch_condition, DispatchCondition::Always);

        let immediate = config_from(&[("DISPATCH_CONDITION", "immediate")]).unwrap();
        assert_eq!(
            immediate.dispatch_condition,
            DispatchCondition::MinLevel(UrgencyLevel::ImmediateAction)
        );

        assert!(config_from(&[("DISPATCH_CONDITION", "sometimes")]).is_err());
    }

    #[test]
    fn test_custom_layout_requires_template() {
        assert!(config_from(&[("ALERT_LAYOUT", "custom")]).is_err());

        let config = config_from(&[("ALERT_TEMPLATE", "{user}: {text}")]).unwrap();
        assert_eq!(
            config.layout,
            AlertLayout::Custom("{user}: {text}".to_string())
        );
    }

    #[test]
    fn test_keyword_lists_are_split_and_trimmed() {
        let config = config_from(&[("ALERT_KEYWORDS", "fire, flood,,outage ")]).unwrap();
        assert_eq!(
            config.alert_keywords,
            Some(vec![
                "fire".to_string(),
                "flood".to_string(),
                "outage".to_string()
            ])
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("CLASSIFIER", "oracle")]).is_err());
        assert!(config_from(&[("ALERT_TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(config_from(&[("CLASSIFY_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("RESOLVE_DISPLAY_NAMES", "maybe")]).is_err());
    }

    #[test]
    fn test_condition_admits_by_rank() {
        let condition = DispatchCondition::MinLevel(UrgencyLevel::Important);
        assert!(!condition.admits(UrgencyLevel::Normal));
        assert!(condition.admits(UrgencyLevel::Important));
        assert!(condition.admits(UrgencyLevel::HighPriority));
        assert!(condition.admits(UrgencyLevel::ImmediateAction));
        assert!(DispatchCondition::Always.admits(UrgencyLevel::Normal));
    }
}
