//! linealert - an HTTP service that classifies the urgency of chat messages and
//! pushes alerts for the urgent ones through the LINE Messaging API.
//!
//! # Architecture
//!
//! A request flows through two components:
//! 1. A [`classifier::Classifier`] maps the message text to an urgency level,
//!    using a keyword list, a local two-tier keyword model, or a remote model
//!    (Gemini or `OpenAI`). It never fails: provider trouble degrades to
//!    `NORMAL` and is reported as such.
//! 2. A [`worker::Notifier`] decides whether the level warrants an alert,
//!    renders it, and pushes it to the group or the reporting user on a
//!    detached task, so push failures never reach the caller.
//!
//! The system uses:
//! - axum and Tokio for the HTTP server
//! - reqwest for the AI provider and LINE API calls
//! - tracing for structured JSON logs
//!
//! # Example
//!
//! ```no_run
//! use linealert::api::{AppState, router};
//! use linealert::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     linealert::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let app = router(AppState::from_config(&config)?);
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod api;
pub mod classifier;
pub mod core;
pub mod errors;
pub mod line;
pub mod prompt;
pub mod worker;

/// Configure structured logging with JSON output.
///
/// Log level comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// linealert::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
