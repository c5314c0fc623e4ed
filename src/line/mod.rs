//! All LINE-specific functionality

pub mod client;
pub mod message_formatter;

// Re-export main types for convenience
pub use client::{LineClient, PushTransport, build_push_payload};
pub use message_formatter::{AlertFields, AlertLayout, render_alert};
