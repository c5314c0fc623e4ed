use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Urgency of a chat message, from least to most pressing.
///
/// `Important` and `HighPriority` share a rank: they come from different
/// strategies but mean the same thing to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Normal,
    Important,
    HighPriority,
    ImmediateAction,
}

impl UrgencyLevel {
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            UrgencyLevel::Normal => 0,
            UrgencyLevel::Important | UrgencyLevel::HighPriority => 1,
            UrgencyLevel::ImmediateAction => 2,
        }
    }

    #[must_use]
    pub fn is_alert(self) -> bool {
        self.rank() > 0
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyLevel::Normal => "NORMAL",
            UrgencyLevel::Important => "IMPORTANT",
            UrgencyLevel::HighPriority => "HIGH_PRIORITY",
            UrgencyLevel::ImmediateAction => "IMMEDIATE_ACTION",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "NORMAL" => Ok(UrgencyLevel::Normal),
            "IMPORTANT" => Ok(UrgencyLevel::Important),
            "HIGH_PRIORITY" => Ok(UrgencyLevel::HighPriority),
            "IMMEDIATE_ACTION" => Ok(UrgencyLevel::ImmediateAction),
            _ => Err(format!("unknown urgency level: {s}")),
        }
    }
}

/// An inbound chat message. Never mutated after intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl Message {
    #[must_use]
    pub fn new(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            group_id: None,
            user_name: None,
            group_name: None,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_names(mut self, user_name: Option<String>, group_name: Option<String>) -> Self {
        self.user_name = user_name;
        self.group_name = group_name;
        self
    }

    /// Reporter name, falling back to the user id.
    #[must_use]
    pub fn display_user_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.user_id)
    }

    /// Group name, falling back to the group id. `None` for direct chats.
    #[must_use]
    pub fn display_group_name(&self) -> Option<&str> {
        self.group_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.group_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub level: UrgencyLevel,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl ClassificationResult {
    #[must_use]
    pub fn new(level: UrgencyLevel) -> Self {
        Self {
            level,
            categories: BTreeSet::new(),
            keywords: Vec::new(),
        }
    }

    #[must_use]
    pub fn normal() -> Self {
        Self::new(UrgencyLevel::Normal)
    }
}

/// Why a classification fell back to `NORMAL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Network error, non-2xx reply, timeout, or missing credentials.
    ProviderUnavailable(String),
    /// Reply was not a JSON object or carried an unknown level.
    MalformedReply(String),
    MissingLevel,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::ProviderUnavailable(detail) => {
                write!(f, "provider unavailable: {detail}")
            }
            DegradeReason::MalformedReply(detail) => write!(f, "malformed reply: {detail}"),
            DegradeReason::MissingLevel => f.write_str("reply has no level"),
        }
    }
}

/// Outcome of a classifier run.
///
/// A degraded classification is always `NORMAL`, but it is not the same thing
/// as a confident `NORMAL`: the caller can tell the provider failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Confident(ClassificationResult),
    Degraded {
        result: ClassificationResult,
        reason: DegradeReason,
    },
}

impl Classification {
    #[must_use]
    pub fn degraded(reason: DegradeReason) -> Self {
        Classification::Degraded {
            result: ClassificationResult::normal(),
            reason,
        }
    }

    #[must_use]
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Classification::Confident(result) | Classification::Degraded { result, .. } => result,
        }
    }

    #[must_use]
    pub fn level(&self) -> UrgencyLevel {
        self.result().level
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Classification::Degraded { .. })
    }

    #[must_use]
    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            Classification::Confident(_) => None,
            Classification::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// What happened to an alert. Logged, and only reported to HTTP callers
/// under the `surface` push-failure policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered { target: String },
    Skipped { level: UrgencyLevel },
    Failed { target: String, error: String },
}

/// Classification result plus the identifiers it was computed for, as
/// returned by `/analyze` and `/summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub text: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AnalysisReport {
    #[must_use]
    pub fn new(message: &Message, classification: &Classification) -> Self {
        Self {
            result: classification.result().clone(),
            text: message.text.clone(),
            user_id: message.user_id.clone(),
            group_id: message.group_id.clone(),
            degraded: classification.is_degraded(),
            reason: classification.degrade_reason().map(ToString::to_string),
        }
    }
}
