//! Background alert processing

pub mod dispatch;

use tracing::info;

use crate::classifier::Classifier;
use crate::core::models::{Classification, DispatchOutcome, Message};

pub use dispatch::{DispatchHandle, Notifier, NotifierSettings, PreparedAlert, select_target};

/// Classifies a message and dispatches its alert, awaiting both.
pub async fn classify_and_dispatch(
    classifier: &dyn Classifier,
    notifier: &Notifier,
    message: &Message,
    corr_id: &str,
) -> (Classification, DispatchOutcome) {
    let classification = classifier.classify(message).await;
    info!(
        classifier = classifier.name(),
        level = %classification.level(),
        degraded = classification.is_degraded(),
        corr_id = %corr_id,
        "Classified message"
    );

    let outcome = notifier
        .dispatch(message, classification.level(), corr_id)
        .await;
    (classification, outcome)
}
