use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::RetryIf;
use tracing::{error, info, warn};

use crate::core::config::{AppConfig, DestinationPolicy, DispatchCondition, PushFailurePolicy};
use crate::core::models::{DispatchOutcome, Message, UrgencyLevel};
use crate::errors::AlertError;
use crate::line::PushTransport;
use crate::line::message_formatter::{
    AlertFields, AlertLayout, UNKNOWN_GROUP_PLACEHOLDER, render_alert,
};

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub condition: DispatchCondition,
    pub destination: DestinationPolicy,
    pub layout: AlertLayout,
    pub unknown_group: String,
    pub timezone: Tz,
    pub failure_policy: PushFailurePolicy,
    pub resolve_display_names: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            condition: DispatchCondition::MinLevel(UrgencyLevel::Important),
            destination: DestinationPolicy::Group,
            layout: AlertLayout::Banner,
            unknown_group: UNKNOWN_GROUP_PLACEHOLDER.to_string(),
            timezone: chrono_tz::Asia::Bangkok,
            failure_policy: PushFailurePolicy::Log,
            resolve_display_names: false,
        }
    }
}

impl NotifierSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            condition: config.dispatch_condition,
            destination: config.destination,
            layout: config.layout.clone(),
            unknown_group: config.unknown_group.clone(),
            timezone: config.timezone,
            failure_policy: config.push_failure_policy,
            resolve_display_names: config.resolve_display_names,
        }
    }
}

/// A rendered alert and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAlert {
    pub target: String,
    pub text: String,
}

/// Push recipient for a message under the given policy.
#[must_use]
pub fn select_target(message: &Message, policy: DestinationPolicy) -> &str {
    match (policy, message.group_id.as_deref()) {
        (DestinationPolicy::Group, Some(group_id)) if !group_id.is_empty() => group_id,
        _ => &message.user_id,
    }
}

/// A dispatch running on its own task. Dropping the handle detaches it; the
/// task still runs to completion and logs its own outcome.
#[derive(Debug)]
pub struct DispatchHandle(JoinHandle<DispatchOutcome>);

impl DispatchHandle {
    /// Waits for the dispatch. `None` if the task panicked or was cancelled.
    pub async fn join(self) -> Option<DispatchOutcome> {
        self.0.await.ok()
    }
}

/// Decides whether to alert, renders the alert and pushes it.
pub struct Notifier {
    transport: Arc<dyn PushTransport>,
    settings: NotifierSettings,
}

impl Notifier {
    #[must_use]
    pub fn new(transport: Arc<dyn PushTransport>, settings: NotifierSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    #[must_use]
    pub fn should_dispatch(&self, level: UrgencyLevel) -> bool {
        self.settings.condition.admits(level)
    }

    /// Whether the HTTP response waits for this notifier.
    #[must_use]
    pub fn is_surfaced(&self) -> bool {
        self.settings.failure_policy == PushFailurePolicy::Surface
    }

    #[must_use]
    pub fn target<'a>(&self, message: &'a Message) -> &'a str {
        select_target(message, self.settings.destination)
    }

    /// Fills in missing display names from LINE when enabled. Lookup
    /// failures keep the id-based defaults.
    async fn with_display_names(&self, message: &Message) -> Message {
        let mut resolved = message.clone();
        if !self.settings.resolve_display_names {
            return resolved;
        }

        if resolved.user_name.is_none() {
            match self
                .transport
                .profile_name(&message.user_id, message.group_id.as_deref())
                .await
            {
                Ok(name) => resolved.user_name = Some(name),
                Err(e) => warn!("Failed to resolve profile for {}: {}", message.user_id, e),
            }
        }

        if resolved.group_name.is_none() {
            if let Some(group_id) = message.group_id.as_deref() {
                match self.transport.group_name(group_id).await {
                    Ok(name) => resolved.group_name = Some(name),
                    Err(e) => warn!("Failed to resolve group summary for {}: {}", group_id, e),
                }
            }
        }

        resolved
    }

    pub async fn prepare(&self, message: &Message, level: UrgencyLevel) -> PreparedAlert {
        let message = self.with_display_names(message).await;
        let now = Utc::now().with_timezone(&self.settings.timezone);
        let fields = AlertFields::new(&message, level, &self.settings.unknown_group, now);

        PreparedAlert {
            target: self.target(&message).to_string(),
            text: render_alert(&fields, &self.settings.layout),
        }
    }

    async fn send(&self, alert: &PreparedAlert) -> Result<(), AlertError> {
        match self.settings.failure_policy {
            PushFailurePolicy::Retry { max_attempts } => {
                // 100ms, 200ms, 400ms... capped at 2s, jittered
                let strategy = ExponentialBackoff::from_millis(2)
                    .factor(50)
                    .max_delay(Duration::from_secs(2))
                    .map(jitter)
                    .take(max_attempts.saturating_sub(1));

                // Configuration errors fail on the first attempt
                RetryIf::start(
                    strategy,
                    || self.transport.push_text(&alert.target, &alert.text),
                    |e: &AlertError| !matches!(e, AlertError::ConfigError(_)),
                )
                .await
            }
            PushFailurePolicy::Log | PushFailurePolicy::Surface => {
                self.transport.push_text(&alert.target, &alert.text).await
            }
        }
    }

    /// Runs one dispatch to completion and logs the outcome. Never fails.
    pub async fn dispatch(
        &self,
        message: &Message,
        level: UrgencyLevel,
        corr_id: &str,
    ) -> DispatchOutcome {
        if !self.should_dispatch(level) {
            info!(level = %level, corr_id = %corr_id, "Level below dispatch condition, no alert");
            return DispatchOutcome::Skipped { level };
        }

        let alert = self.prepare(message, level).await;
        info!(
            target_id = %alert.target,
            level = %level,
            corr_id = %corr_id,
            "Sending alert to LINE"
        );

        match self.send(&alert).await {
            Ok(()) => {
                info!(target_id = %alert.target, corr_id = %corr_id, "Alert delivered");
                DispatchOutcome::Delivered {
                    target: alert.target,
                }
            }
            Err(e) => {
                error!(
                    target_id = %alert.target,
                    corr_id = %corr_id,
                    "Failed to send LINE message: {}", e
                );
                DispatchOutcome::Failed {
                    target: alert.target,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Spawns the dispatch so the caller does not wait for it.
    pub fn dispatch_detached(
        self: &Arc<Self>,
        message: Message,
        level: UrgencyLevel,
        corr_id: String,
    ) -> DispatchHandle {
        let notifier = Arc::clone(self);
        DispatchHandle(tokio::spawn(async move {
            notifier.dispatch(&message, level, &corr_id).await
        }))
    }
}
