// tests/test_helpers/mod.rs
// Fake providers and transports shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use linealert::ai::CompletionProvider;
use linealert::errors::AlertError;
use linealert::line::PushTransport;

/// Completion provider with a canned reply.
pub struct FakeProvider {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FakeProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            ..Self::replying("")
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(r#"{"level":"IMPORTANT"}"#)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, AlertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply
            .clone()
            .map_err(AlertError::HttpError)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Push transport that records every attempt.
#[derive(Default)]
pub struct RecordingTransport {
    /// Number of leading push attempts that fail; `usize::MAX` fails forever
    fail_first: usize,
    /// Fail every push with a configuration error
    misconfigured: bool,
    attempts: AtomicUsize,
    pushes: Mutex<Vec<(String, String)>>,
    profile: Option<String>,
    group: Option<String>,
    lookups: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            fail_first: usize::MAX,
            ..Self::default()
        }
    }

    pub fn misconfigured() -> Self {
        Self {
            misconfigured: true,
            ..Self::default()
        }
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn with_names(profile: &str, group: &str) -> Self {
        Self {
            profile: Some(profile.to_string()),
            group: Some(group.to_string()),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Successful pushes as `(to, text)`.
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    /// Polls until at least `n` push attempts were made, up to two seconds.
    pub async fn wait_for_attempts(&self, n: usize) {
        for _ in 0..200 {
            if self.attempts() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn push_text(&self, to: &str, text: &str) -> Result<(), AlertError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.misconfigured {
            return Err(AlertError::ConfigError("LINE_BOT_TOKEN is not set".to_string()));
        }
        if attempt < self.fail_first {
            return Err(AlertError::HttpError("connection refused".to_string()));
        }
        self.pushes
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }

    async fn profile_name(
        &self,
        user_id: &str,
        _group_id: Option<&str>,
    ) -> Result<String, AlertError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.profile
            .clone()
            .ok_or_else(|| AlertError::LineApiError(format!("no profile for {user_id}")))
    }

    async fn group_name(&self, group_id: &str) -> Result<String, AlertError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.group
            .clone()
            .ok_or_else(|| AlertError::LineApiError(format!("no summary for {group_id}")))
    }
}
