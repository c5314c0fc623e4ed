//! HTTP router and handlers.
//!
//! - `GET /` liveness
//! - `GET /analyze` classify only, no push
//! - `POST /analyze` classify, then alert
//! - `POST /summary` alert for a pre-computed level
//! - `POST /webhook` LINE webhook, acked before any processing

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{helpers, parsing, signature};
use super::helpers::ApiError;
use crate::classifier::{self, Classifier};
use crate::core::config::{AppConfig, ProviderFailureMode};
use crate::core::models::{
    AnalysisReport, Classification, ClassificationResult, DegradeReason, DispatchOutcome, Message,
    UrgencyLevel,
};
use crate::errors::AlertError;
use crate::line::LineClient;
use crate::worker::{self, Notifier, NotifierSettings};

pub const LIVENESS_TEXT: &str = "🚀 LINE alert API running";

const LINE_SIGNATURE_HEADER: &str = "x-line-signature";

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub notifier: Arc<Notifier>,
    pub provider_failure_mode: ProviderFailureMode,
    pub line_channel_secret: Option<String>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the LINE client cannot be built from the config.
    pub fn from_config(config: &AppConfig) -> Result<Self, AlertError> {
        let transport = LineClient::new(config.line_bot_token.clone(), &config.line_api_base_url)?;
        let notifier = Notifier::new(Arc::new(transport), NotifierSettings::from_config(config));

        Ok(Self {
            classifier: classifier::from_config(config),
            notifier: Arc::new(notifier),
            provider_failure_mode: config.provider_failure_mode,
            line_channel_secret: config.line_channel_secret.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/analyze", get(analyze_query).post(analyze))
        .route("/summary", post(summary))
        .route("/webhook", post(line_webhook))
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn analyze_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let Some(message) = parsing::message_from_params(&params) else {
        warn!("GET /analyze missing text or userId");
        return Err(ApiError::missing_parameters());
    };

    let classification = state.classifier.classify(&message).await;
    Ok(helpers::ok_result(
        &AnalysisReport::new(&message, &classification),
        None,
    ))
}

#[tracing::instrument(level = "info", skip_all, fields(corr_id = tracing::field::Empty))]
async fn analyze(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let corr_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("corr_id", corr_id.as_str());

    let message = read_message(&body)?;
    info!(
        user_id = %message.user_id,
        group_id = ?message.group_id,
        "POST /analyze"
    );

    let classification = state.classifier.classify(&message).await;
    let report = AnalysisReport::new(&message, &classification);

    if let (ProviderFailureMode::Reject, Some(DegradeReason::ProviderUnavailable(detail))) =
        (state.provider_failure_mode, classification.degrade_reason())
    {
        error!("AI analysis failed: {}", detail);
        return Err(helpers::analysis_failed(detail, &report));
    }

    let dispatch = dispatch_alert(&state, message, classification.level(), corr_id).await;
    Ok(helpers::ok_result(&report, dispatch.as_ref()))
}

#[tracing::instrument(level = "info", skip_all, fields(corr_id = tracing::field::Empty))]
async fn summary(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let corr_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("corr_id", corr_id.as_str());

    let payload = parse_body(&body)?;
    let (Some(message), Some(raw_level)) = (
        parsing::message_from_value(&payload),
        parsing::v_str(&payload, &["level"]),
    ) else {
        warn!("POST /summary missing text, userId or level");
        return Err(ApiError::missing_parameters());
    };

    let level = raw_level.parse::<UrgencyLevel>().map_err(|e| {
        warn!("POST /summary with {}", e);
        ApiError::bad_request(helpers::INVALID_LEVEL)
    })?;
    info!(user_id = %message.user_id, level = %level, "POST /summary");

    let classification = Classification::Confident(ClassificationResult::new(level));
    let report = AnalysisReport::new(&message, &classification);
    let dispatch = dispatch_alert(&state, message, level, corr_id).await;
    Ok(helpers::ok_result(&report, dispatch.as_ref()))
}

async fn line_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(secret) = state.line_channel_secret.as_deref() else {
        error!("Webhook received but LINE_CHANNEL_SECRET is not configured");
        return Err(ApiError::internal("LINE_CHANNEL_SECRET is not configured"));
    };

    let Some(sig) = headers
        .get(LINE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        error!("Missing X-Line-Signature header");
        return Err(ApiError::unauthorized("Missing X-Line-Signature header"));
    };

    if !signature::verify_line_signature(&body, sig, secret) {
        return Err(ApiError::unauthorized("Invalid LINE signature"));
    }

    let payload = parse_body(&body)?;
    let messages = parsing::text_messages_from_webhook(&payload);
    info!("Webhook carried {} text message(s)", messages.len());

    for message in messages {
        let classifier = Arc::clone(&state.classifier);
        let notifier = Arc::clone(&state.notifier);
        let corr_id = Uuid::new_v4().to_string();
        tokio::spawn(async move {
            worker::classify_and_dispatch(classifier.as_ref(), &notifier, &message, &corr_id).await;
        });
    }

    Ok(helpers::ok_empty())
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    parsing::parse_json_body(body).map_err(|e| {
        warn!("{}", e);
        ApiError::bad_request(helpers::INVALID_JSON_BODY)
    })
}

fn read_message(body: &[u8]) -> Result<Message, ApiError> {
    let payload = parse_body(body)?;
    parsing::message_from_value(&payload).ok_or_else(|| {
        warn!("Request missing text or userId");
        ApiError::missing_parameters()
    })
}

/// Awaits the dispatch under the `surface` policy; otherwise detaches it and
/// returns `None` straight away.
async fn dispatch_alert(
    state: &AppState,
    message: Message,
    level: UrgencyLevel,
    corr_id: String,
) -> Option<DispatchOutcome> {
    if state.notifier.is_surfaced() {
        return Some(state.notifier.dispatch(&message, level, &corr_id).await);
    }

    if state.notifier.should_dispatch(level) {
        // Dropping the handle detaches the task
        let _ = state.notifier.dispatch_detached(message, level, corr_id);
    } else {
        info!(level = %level, corr_id = %corr_id, "Level below dispatch condition, no alert");
    }
    None
}
