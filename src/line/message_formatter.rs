//! Alert text rendering.
//!
//! Every layout is a template over the same named fields; built-in layouts
//! are just fixed templates.

use chrono::DateTime;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::core::models::{Message, UrgencyLevel};

/// Shown when a message has neither a group name nor a group id
pub const UNKNOWN_GROUP_PLACEHOLDER: &str = "ไม่ทราบกลุ่ม";

/// LINE rejects text messages longer than this many characters
pub const LINE_TEXT_LIMIT: usize = 5000;

pub const BANNER_TEMPLATE: &str =
    "{headline}\n🏢 กลุ่ม: {group}\n👤 ผู้ส่ง: {user}\n💬 ข้อความ: {text}";

pub const COMPACT_TEMPLATE: &str = "{marker}[{level}] {user} @ {group}: {text}";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("static regex compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertLayout {
    Banner,
    Compact,
    /// Placeholders: `{marker}` `{headline}` `{level}` `{user}` `{group}`
    /// `{text}` `{time}`
    Custom(String),
}

impl AlertLayout {
    #[must_use]
    pub fn template(&self) -> &str {
        match self {
            AlertLayout::Banner => BANNER_TEMPLATE,
            AlertLayout::Compact => COMPACT_TEMPLATE,
            AlertLayout::Custom(template) => template,
        }
    }
}

/// Named fields available to alert templates.
#[derive(Debug, Clone)]
pub struct AlertFields<'a> {
    pub level: UrgencyLevel,
    pub user: &'a str,
    pub group: &'a str,
    pub text: &'a str,
    pub time: String,
}

impl<'a> AlertFields<'a> {
    #[must_use]
    pub fn new(
        message: &'a Message,
        level: UrgencyLevel,
        unknown_group: &'a str,
        time: DateTime<Tz>,
    ) -> Self {
        Self {
            level,
            user: message.display_user_name(),
            group: message.display_group_name().unwrap_or(unknown_group),
            text: &message.text,
            time: time.format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "marker" => Some(marker_for(self.level).to_string()),
            "headline" => Some(headline_for(self.level)),
            "level" => Some(self.level.as_str().to_string()),
            "user" => Some(self.user.to_string()),
            "group" => Some(self.group.to_string()),
            "text" => Some(self.text.to_string()),
            "time" => Some(self.time.clone()),
            _ => None,
        }
    }
}

/// Urgency glyph, with its trailing space. Empty for `NORMAL`.
#[must_use]
pub fn marker_for(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Normal => "",
        UrgencyLevel::Important | UrgencyLevel::HighPriority => "🚨 ",
        UrgencyLevel::ImmediateAction => "🔥 ",
    }
}

#[must_use]
pub fn headline_for(level: UrgencyLevel) -> String {
    let title = match level {
        UrgencyLevel::Normal => "ข้อความจาก BOT",
        UrgencyLevel::Important | UrgencyLevel::HighPriority => "ข้อความสำคัญจาก BOT",
        UrgencyLevel::ImmediateAction => "ข้อความด่วนที่สุดจาก BOT",
    };
    format!("{}{}", marker_for(level), title)
}

/// Expands `{field}` placeholders in one pass. Unknown placeholders are kept
/// as written, and field values are never re-expanded.
#[must_use]
pub fn render_template(template: &str, fields: &AlertFields<'_>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            fields.lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[must_use]
pub fn render_alert(fields: &AlertFields<'_>, layout: &AlertLayout) -> String {
    truncate_for_line(render_template(layout.template(), fields))
}

#[must_use]
pub fn truncate_for_line(text: String) -> String {
    if text.chars().count() <= LINE_TEXT_LIMIT {
        return text;
    }
    let mut truncated: String = text.chars().take(LINE_TEXT_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}
