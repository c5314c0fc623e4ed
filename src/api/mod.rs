//! HTTP surface and request processing

pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod signature;

// Re-export the router for convenience
pub use handler::{AppState, router};
